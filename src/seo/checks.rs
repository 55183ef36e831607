//! Independent rule groups. Each returns zero or more checks for one aspect
//! of a record and never looks at the output of another group.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::content::Content;
use crate::seo::types::{CheckName, SeoCheck, Severity};

pub const MIN_TITLE_LEN: usize = 30;
pub const MAX_TITLE_LEN: usize = 60;
pub const MIN_DESCRIPTION_LEN: usize = 120;
pub const MAX_DESCRIPTION_LEN: usize = 160;
pub const MIN_WORD_COUNT: usize = 300;
pub const MAX_AVG_SENTENCE_WORDS: f64 = 20.0;
/// Bodies shorter than this get no readability check at all; the content
/// length check already flags them.
pub const MIN_READABILITY_WORDS: usize = 100;

const GENERIC_TITLE_MARKERS: &[&str] = &["untitled", "new post"];

static IMG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static SENTENCE_SPLIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

pub fn check_title(content: &Content) -> Vec<SeoCheck> {
    let title = content.title.trim();
    let len = title.chars().count();
    let mut checks = Vec::with_capacity(2);

    checks.push(if len < MIN_TITLE_LEN {
        SeoCheck::warning(
            CheckName::TitleLength,
            Severity::Medium,
            format!("Title is {len} characters; aim for {MIN_TITLE_LEN}-{MAX_TITLE_LEN}"),
        )
    } else if len > MAX_TITLE_LEN {
        SeoCheck::warning(
            CheckName::TitleLength,
            Severity::High,
            format!("Title is {len} characters and may be truncated in search results"),
        )
    } else {
        SeoCheck::pass(CheckName::TitleLength, Severity::High, "Title length is optimal")
    });

    let lower = title.to_lowercase();
    if GENERIC_TITLE_MARKERS.iter().any(|m| lower.contains(m)) {
        checks.push(SeoCheck::fail(
            CheckName::TitleGeneric,
            Severity::Medium,
            "Title looks like a placeholder",
        ));
    }

    checks
}

pub fn check_description(content: &Content) -> Vec<SeoCheck> {
    let len = content.meta_description().trim().chars().count();

    let check = if len == 0 {
        SeoCheck::fail(
            CheckName::MetaDescription,
            Severity::High,
            "Meta description is missing",
        )
    } else if len < MIN_DESCRIPTION_LEN {
        SeoCheck::warning(
            CheckName::MetaDescription,
            Severity::Medium,
            format!("Meta description is {len} characters; aim for {MIN_DESCRIPTION_LEN}-{MAX_DESCRIPTION_LEN}"),
        )
    } else if len > MAX_DESCRIPTION_LEN {
        SeoCheck::warning(
            CheckName::MetaDescription,
            Severity::Medium,
            format!("Meta description is {len} characters and may be truncated"),
        )
    } else {
        SeoCheck::pass(
            CheckName::MetaDescription,
            Severity::High,
            "Meta description length is optimal",
        )
    };

    vec![check]
}

pub fn check_headings(content: &Content) -> Vec<SeoCheck> {
    let headings = &content.body.structured.headings;
    let h1_count = headings.iter().filter(|h| h.level == 1).count();
    let mut checks = Vec::with_capacity(2);

    checks.push(match h1_count {
        0 => SeoCheck::warning(CheckName::H1Count, Severity::Medium, "No H1 heading found"),
        1 => SeoCheck::pass(CheckName::H1Count, Severity::Medium, "Exactly one H1 heading"),
        n => SeoCheck::warning(
            CheckName::H1Count,
            Severity::Medium,
            format!("{n} H1 headings found; use a single H1"),
        ),
    });

    if !headings.is_empty() {
        let skip = headings
            .windows(2)
            .find(|pair| pair[1].level > pair[0].level + 1);
        checks.push(match skip {
            Some(pair) => SeoCheck::warning(
                CheckName::HeadingHierarchy,
                Severity::Low,
                format!("Heading levels skip from h{} to h{}", pair[0].level, pair[1].level),
            ),
            None => SeoCheck::pass(
                CheckName::HeadingHierarchy,
                Severity::Low,
                "Heading structure is sequential",
            ),
        });
    }

    checks
}

pub fn check_content_length(content: &Content) -> Vec<SeoCheck> {
    let words = content.word_count;
    let check = if words < MIN_WORD_COUNT {
        SeoCheck::warning(
            CheckName::ContentLength,
            Severity::Medium,
            format!("Content has {words} words; aim for at least {MIN_WORD_COUNT}"),
        )
    } else {
        SeoCheck::pass(
            CheckName::ContentLength,
            Severity::Medium,
            format!("Content has {words} words"),
        )
    };
    vec![check]
}

pub fn check_images(content: &Content) -> Vec<SeoCheck> {
    let fragment = Html::parse_fragment(&content.body.html);
    let mut total = 0usize;
    let mut missing_alt = 0usize;
    for img in fragment.select(&IMG_SELECTOR) {
        total += 1;
        if img.value().attr("alt").is_none_or(|alt| alt.trim().is_empty()) {
            missing_alt += 1;
        }
    }

    let check = if total == 0 {
        SeoCheck::warning(
            CheckName::Images,
            Severity::Low,
            "No images; consider adding visual content",
        )
    } else if missing_alt > 0 {
        SeoCheck::fail(
            CheckName::ImageAlt,
            Severity::Medium,
            format!("{missing_alt} of {total} images are missing alt text"),
        )
    } else {
        SeoCheck::pass(
            CheckName::ImageAlt,
            Severity::Low,
            "All images have alt text",
        )
    };
    vec![check]
}

pub fn check_links(content: &Content) -> Vec<SeoCheck> {
    let fragment = Html::parse_fragment(&content.body.html);
    let mut internal = 0usize;
    let mut external = 0usize;
    let mut total = 0usize;
    for link in fragment.select(&LINK_SELECTOR) {
        total += 1;
        match classify_href(link.value().attr("href").unwrap_or_default()) {
            LinkKind::Internal => internal += 1,
            LinkKind::External => external += 1,
            LinkKind::Other => {}
        }
    }

    if total == 0 {
        return vec![SeoCheck::warning(
            CheckName::Links,
            Severity::Low,
            "No links; add internal or external references",
        )];
    }

    let mut checks = Vec::with_capacity(2);
    if internal > 0 {
        checks.push(SeoCheck::pass(
            CheckName::InternalLinks,
            Severity::Low,
            format!("{internal} internal links"),
        ));
    }
    if external > 0 {
        checks.push(SeoCheck::pass(
            CheckName::ExternalLinks,
            Severity::Low,
            format!("{external} external links"),
        ));
    }
    checks
}

#[derive(Debug, PartialEq, Eq)]
enum LinkKind {
    Internal,
    External,
    Other,
}

fn classify_href(href: &str) -> LinkKind {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return LinkKind::Other;
    }
    if href.starts_with("//") {
        return LinkKind::External;
    }
    match Url::parse(href) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => LinkKind::External,
        Ok(_) => LinkKind::Other,
        Err(_) => LinkKind::Internal,
    }
}

pub fn check_keywords(content: &Content) -> Vec<SeoCheck> {
    let keywords: Vec<String> = content
        .seo_keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return vec![SeoCheck::warning(
            CheckName::FocusKeywords,
            Severity::Medium,
            "Define focus keywords",
        )];
    }

    let total = keywords.len();
    let title = content.title.to_lowercase();
    let body = content.body.plain_text.to_lowercase();
    let in_title = keywords.iter().filter(|k| title.contains(k.as_str())).count();
    let in_body = keywords.iter().filter(|k| body.contains(k.as_str())).count();

    let title_message = format!("{in_title} of {total} focus keywords appear in the title");
    let body_message = format!("{in_body} of {total} focus keywords appear in the content");

    vec![
        if in_title > 0 {
            SeoCheck::pass(CheckName::KeywordInTitle, Severity::High, title_message)
        } else {
            SeoCheck::warning(CheckName::KeywordInTitle, Severity::High, title_message)
        },
        if in_body > 0 {
            SeoCheck::pass(CheckName::KeywordInContent, Severity::Medium, body_message)
        } else {
            SeoCheck::warning(CheckName::KeywordInContent, Severity::Medium, body_message)
        },
    ]
}

pub fn check_readability(content: &Content) -> Vec<SeoCheck> {
    let words = content.word_count;
    if words < MIN_READABILITY_WORDS {
        return Vec::new();
    }

    let avg = average_sentence_length(&content.body.plain_text, words);
    let check = if avg > MAX_AVG_SENTENCE_WORDS {
        SeoCheck::warning(
            CheckName::Readability,
            Severity::Medium,
            format!("Sentences average {avg:.1} words; shorten them"),
        )
    } else {
        SeoCheck::pass(
            CheckName::Readability,
            Severity::Medium,
            format!("Sentences average {avg:.1} words"),
        )
    };
    vec![check]
}

/// Words per sentence, splitting on `.`, `!` and `?`.
pub fn average_sentence_length(plain_text: &str, word_count: usize) -> f64 {
    let sentences = SENTENCE_SPLIT_REGEX
        .split(plain_text)
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1);
    word_count as f64 / sentences as f64
}
