//! Deterministic content scoring layered onto a record as `ai_analysis`.
//!
//! The three scores here are heuristics of their own and deliberately do
//! not reuse `SeoAnalysis::score`. The same function serves manually
//! authored and syndicated content.

use regex::Regex;
use std::sync::LazyLock;

use crate::content::{Content, ContentAiAnalysis, Sentiment};
use crate::sanitizer::truncate;
use crate::seo::{self, SeoAnalysis, checks, extract_keywords};

const BASE_QUALITY: u32 = 50;
const BASE_SEO: u32 = 50;
const MAX_KEYWORDS: usize = 5;
const MAX_TOPICS: usize = 5;
const SUMMARY_BUDGET: usize = 200;
const LONG_WORD_CHARS: usize = 13;

static SENTENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").unwrap());
static LIST_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(ul|ol)[\s>]").unwrap());
static IMG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img[\s>]").unwrap());

const POSITIVE_WORDS: &[&str] = &[
    "amazing", "awesome", "benefit", "best", "better", "brilliant", "easy", "effective",
    "excellent", "fantastic", "fast", "good", "great", "happy", "improve", "improved", "love",
    "perfect", "positive", "powerful", "success", "successful", "win", "wonderful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "awful", "bad", "broken", "bug", "crash", "difficult", "fail", "failed", "failure", "hard",
    "hate", "poor", "problem", "risk", "sad", "slow", "terrible", "worse", "worst", "wrong",
];

pub fn analyze_content(content: &Content) -> ContentAiAnalysis {
    let seo_analysis = seo::analyze(content);
    let keywords = extract_keywords(&content.body.plain_text, MAX_KEYWORDS);
    let topics = topics(content, &keywords);
    let readability_score = readability_score(content);

    ContentAiAnalysis {
        quality_score: quality_score(content),
        readability_score,
        seo_score: seo_score(content),
        sentiment: sentiment(&content.body.plain_text),
        topics,
        keywords,
        suggestions: suggestions(&seo_analysis, readability_score),
        summary: summarize(&content.body.plain_text, SUMMARY_BUDGET),
        seo_analysis,
    }
}

pub fn quality_score(content: &Content) -> u8 {
    let mut score = BASE_QUALITY;

    score += match content.word_count {
        w if w >= 1000 => 20,
        w if w >= 600 => 15,
        w if w >= 300 => 10,
        w if w >= 150 => 5,
        _ => 0,
    };

    if !content.seo_title.trim().is_empty() {
        score += 5;
    }
    if !content.meta_description().trim().is_empty() {
        score += 5;
    }
    if !content.seo_keywords.is_empty() {
        score += 5;
    }

    if content.featured_image.is_some() || IMG_REGEX.is_match(&content.body.html) {
        score += 5;
    }
    if !content.body.structured.headings.is_empty() {
        score += 5;
    }
    if LIST_REGEX.is_match(&content.body.html) {
        score += 5;
    }

    score.min(100) as u8
}

pub fn readability_score(content: &Content) -> u8 {
    let words = content.word_count;
    if words == 0 {
        return 0;
    }

    let mut penalty = 0u32;
    let avg = checks::average_sentence_length(&content.body.plain_text, words);
    if avg > 25.0 {
        penalty += 30;
    } else if avg > checks::MAX_AVG_SENTENCE_WORDS {
        penalty += 15;
    }

    if words < 100 {
        penalty += 20;
    } else if words < checks::MIN_WORD_COUNT {
        penalty += 10;
    }

    let long_words = content
        .body
        .plain_text
        .split_whitespace()
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() >= LONG_WORD_CHARS)
        .count();
    if long_words * 100 > words * 15 {
        penalty += 10;
    }

    100u32.saturating_sub(penalty) as u8
}

pub fn seo_score(content: &Content) -> u8 {
    let mut score = BASE_SEO;

    let title_len = content.title.trim().chars().count();
    if (checks::MIN_TITLE_LEN..=checks::MAX_TITLE_LEN).contains(&title_len) {
        score += 10;
    }
    let description_len = content.meta_description().trim().chars().count();
    if (checks::MIN_DESCRIPTION_LEN..=checks::MAX_DESCRIPTION_LEN).contains(&description_len) {
        score += 10;
    }

    if let Some(primary) = content.primary_keyword() {
        let primary = primary.to_lowercase();
        score += 5;
        if content.title.to_lowercase().contains(&primary) {
            score += 5;
        }
        if content.body.plain_text.to_lowercase().contains(&primary) {
            score += 5;
        }
        if content.seo_keywords.len() >= 3 {
            score += 5;
        }
    }

    if content.word_count >= checks::MIN_WORD_COUNT {
        score += 10;
    }

    score.min(100) as u8
}

pub fn sentiment(text: &str) -> Sentiment {
    let (mut positive, mut negative) = (0usize, 0usize);
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if POSITIVE_WORDS.contains(&word.as_str()) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(&word.as_str()) {
            negative += 1;
        }
    }
    match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Sentiment::Positive,
        std::cmp::Ordering::Less => Sentiment::Negative,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

fn topics(content: &Content, keywords: &[String]) -> Vec<String> {
    let mut headline_text = content.title.clone();
    for heading in &content.body.structured.headings {
        headline_text.push(' ');
        headline_text.push_str(&heading.text);
    }
    let topics = extract_keywords(&headline_text, MAX_TOPICS);
    if topics.is_empty() {
        keywords.iter().take(3).cloned().collect()
    } else {
        topics
    }
}

/// Leading sentences that fit in `budget` characters. A first sentence
/// longer than the budget is truncated on a word boundary.
pub fn summarize(text: &str, budget: usize) -> String {
    let mut summary = String::new();
    for sentence in SENTENCE_REGEX.find_iter(text) {
        let sentence = sentence.as_str().trim();
        if sentence.is_empty() {
            continue;
        }
        let extra = if summary.is_empty() { 0 } else { 1 };
        if summary.chars().count() + extra + sentence.chars().count() > budget {
            break;
        }
        if extra == 1 {
            summary.push(' ');
        }
        summary.push_str(sentence);
    }

    if summary.is_empty() {
        truncate(text.trim(), budget)
    } else {
        summary
    }
}

fn suggestions(analysis: &SeoAnalysis, readability: u8) -> Vec<String> {
    let mut out: Vec<String> = analysis.recommendations.iter().map(|r| r.title.clone()).collect();
    if readability < 60 {
        out.push("Shorten sentences and expand thin sections to improve readability".into());
    }
    out
}
