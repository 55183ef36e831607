use crate::content::Content;
use crate::seo::checks::MIN_TITLE_LEN;
use crate::seo::generate::{generate_seo_description, generate_seo_title};
use crate::seo::keywords::extract_keywords;
use crate::seo::types::{
    CheckName, CheckStatus, RecommendationKind, SeoCheck, SeoRecommendation, Severity,
};

const SUGGESTED_KEYWORDS: usize = 5;

/// Actionable follow-ups for failing or warning checks. Checks without a
/// template produce nothing.
pub fn recommend(content: &Content, checks: &[SeoCheck]) -> Vec<SeoRecommendation> {
    checks
        .iter()
        .filter(|c| c.status != CheckStatus::Pass)
        .filter_map(|check| template(content, check))
        .collect()
}

fn template(content: &Content, check: &SeoCheck) -> Option<SeoRecommendation> {
    match check.name {
        CheckName::TitleLength if content.title.trim().chars().count() < MIN_TITLE_LEN => {
            Some(SeoRecommendation {
                kind: RecommendationKind::Title,
                priority: Severity::Medium,
                title: "Lengthen the title".into(),
                description: "Titles between 30 and 60 characters display fully and describe the page better.".into(),
                current_value: Some(content.title.clone()),
                suggested_value: Some(generate_seo_title(&content.title, &content.seo_keywords)),
            })
        }
        CheckName::MetaDescription if check.status == CheckStatus::Fail => Some(SeoRecommendation {
            kind: RecommendationKind::Description,
            priority: Severity::High,
            title: "Add a meta description".into(),
            description: "Search engines show the meta description under the title; write 120-160 characters.".into(),
            current_value: None,
            suggested_value: Some(generate_seo_description(&content.body.plain_text))
                .filter(|s| !s.is_empty()),
        }),
        CheckName::FocusKeywords => {
            let suggested = extract_keywords(&content.body.plain_text, SUGGESTED_KEYWORDS);
            Some(SeoRecommendation {
                kind: RecommendationKind::Keywords,
                priority: Severity::Medium,
                title: "Define focus keywords".into(),
                description: "Focus keywords let the analyzer check title and body coverage.".into(),
                current_value: None,
                suggested_value: (!suggested.is_empty()).then(|| suggested.join(", ")),
            })
        }
        _ => None,
    }
}
