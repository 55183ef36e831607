//! Rule-based SEO analysis.
//!
//! [`analyze`] runs every check group over a record, folds the results into
//! a weighted score and derives recommendations from the actionable ones.

pub mod checks;
pub mod generate;
pub mod keywords;
pub mod recommendations;
pub mod types;

use chrono::Utc;

use crate::content::Content;

pub use generate::{
    MAX_SEO_DESCRIPTION_LEN, MAX_SEO_TITLE_LEN, MAX_SLUG_LEN, generate_seo_description,
    generate_seo_slug, generate_seo_title,
};
pub use keywords::extract_keywords;
pub use types::{
    CheckName, CheckStatus, RecommendationKind, SeoAnalysis, SeoCheck, SeoRecommendation, Severity,
};

type CheckGroup = fn(&Content) -> Vec<SeoCheck>;

const CHECK_GROUPS: &[CheckGroup] = &[
    checks::check_title,
    checks::check_description,
    checks::check_headings,
    checks::check_content_length,
    checks::check_images,
    checks::check_links,
    checks::check_keywords,
    checks::check_readability,
];

pub fn analyze(content: &Content) -> SeoAnalysis {
    let checks: Vec<SeoCheck> = CHECK_GROUPS.iter().flat_map(|group| group(content)).collect();
    let score = score(&checks);
    let recommendations = recommendations::recommend(content, &checks);

    tracing::debug!(content_id = %content.id, score, checks = checks.len(), "seo analysis complete");

    SeoAnalysis {
        score,
        checks,
        recommendations,
        analyzed_at: Utc::now(),
    }
}

/// Weighted percentage of the best achievable outcome. No checks scores 100.
pub fn score(checks: &[SeoCheck]) -> u8 {
    let max: u32 = checks.iter().map(|c| c.impact.weight() * 100).sum();
    if max == 0 {
        return 100;
    }
    let achieved: u32 = checks.iter().map(|c| c.impact.weight() * c.status.value()).sum();
    (100.0 * achieved as f64 / max as f64).round().min(100.0) as u8
}
