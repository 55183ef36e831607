use chrono::{DateTime, Utc};
use pulldown_cmark::{Options, Parser, html};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::fingerprint::id_from_string;
use crate::sanitizer::{reading_time, sanitize, to_markdown, to_plain_text, word_count};
use crate::seo::SeoAnalysis;

pub const MAX_EXCERPT_LEN: usize = 300;

static HEADING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Manual,
    Syndicated,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Approved,
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Approved => "approved",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Manual,
    RssFeed,
    Other,
}

/// Authoring format of `ContentBody::raw`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFormat {
    #[default]
    Html,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredBody {
    pub markdown: String,
    pub headings: Vec<Heading>,
}

/// Body in its authoring format plus the renditions derived from it.
/// Only `raw` is ever written by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBody {
    pub raw: String,
    pub format: BodyFormat,
    pub html: String,
    pub plain_text: String,
    pub structured: StructuredBody,
}

impl ContentBody {
    pub fn from_raw(raw: impl Into<String>, format: BodyFormat) -> Self {
        let raw = raw.into();
        let html = match format {
            BodyFormat::Html => sanitize(&raw),
            BodyFormat::Markdown => sanitize(&render_markdown(&raw)),
        };
        let markdown = match format {
            BodyFormat::Html => to_markdown(&html),
            BodyFormat::Markdown => raw.clone(),
        };
        Self::assemble(raw, format, html, markdown)
    }

    /// Body whose HTML was already sanitized upstream (syndicated content).
    pub fn from_sanitized_html(html: String, markdown: String) -> Self {
        Self::assemble(html.clone(), BodyFormat::Html, html, markdown)
    }

    fn assemble(raw: String, format: BodyFormat, html: String, markdown: String) -> Self {
        let plain_text = to_plain_text(&html);
        let headings = extract_headings(&html);
        Self {
            raw,
            format,
            html,
            plain_text,
            structured: StructuredBody { markdown, headings },
        }
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.plain_text)
    }
}

fn render_markdown(markdown: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

fn extract_headings(html: &str) -> Vec<Heading> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&HEADING_SELECTOR)
        .map(|el| Heading {
            level: el.value().name()[1..].parse().unwrap_or(1),
            text: to_plain_text(&el.inner_html()),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

impl Tag {
    /// Tag whose id is derived from the case-folded name, so the same name
    /// always resolves to the same id.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        Self {
            id: id_from_string(&name.to_lowercase()),
            name: name.to_string(),
        }
    }

    /// Blank names are skipped and repeated names keep their first spelling.
    pub fn from_names<I, S>(names: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: Vec<Self> = Vec::new();
        for name in names {
            if name.as_ref().trim().is_empty() {
                continue;
            }
            let tag = Self::from_name(name.as_ref());
            if tags.iter().all(|t| t.id != tag.id) {
                tags.push(tag);
            }
        }
        tags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Derived scores layered onto a record. The three scores are computed
/// independently of `seo_analysis.score`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAiAnalysis {
    pub quality_score: u8,
    pub readability_score: u8,
    pub seo_score: u8,
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
    pub keywords: Vec<String>,
    pub suggestions: Vec<String>,
    pub summary: String,
    pub seo_analysis: SeoAnalysis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyndicationData {
    pub source_url: String,
    pub source_name: String,
    pub source_type: ContentSource,
    pub original_published_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
    pub feed_id: String,
    pub fingerprint: String,
}

/// Snapshot of a record taken just before an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVersion {
    pub version: u32,
    pub title: String,
    pub description: String,
    pub excerpt: String,
    pub body: ContentBody,
    pub status: ContentStatus,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub slug: String,
    pub version: u32,
    /// Storage revision. Bumped by the repository on every successful write,
    /// including status changes that leave `version` alone.
    #[serde(default)]
    pub revision: u64,
    pub content_type: ContentType,
    pub status: ContentStatus,
    pub source: ContentSource,

    pub title: String,
    pub description: String,
    pub excerpt: String,
    pub body: ContentBody,
    pub language: Option<String>,
    pub featured_image: Option<String>,

    pub seo_title: String,
    pub seo_description: String,
    pub seo_keywords: Vec<String>,

    pub word_count: usize,
    pub reading_time: u32,
    pub ai_analysis: Option<ContentAiAnalysis>,

    pub author_ids: Vec<String>,
    pub category_id: Option<String>,
    pub tags: Vec<Tag>,
    pub parent_id: Option<String>,
    pub syndication: Option<SyndicationData>,

    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub versions: Vec<ContentVersion>,
}

impl Content {
    /// Fresh draft at version 1 with metrics derived from `body`.
    pub fn new(
        id: impl Into<String>,
        content_type: ContentType,
        source: ContentSource,
        title: impl Into<String>,
        body: ContentBody,
        now: DateTime<Utc>,
    ) -> Self {
        let mut content = Self {
            id: id.into(),
            slug: String::new(),
            version: 1,
            revision: 0,
            content_type,
            status: ContentStatus::Draft,
            source,
            title: title.into(),
            description: String::new(),
            excerpt: String::new(),
            body,
            language: None,
            featured_image: None,
            seo_title: String::new(),
            seo_description: String::new(),
            seo_keywords: Vec::new(),
            word_count: 0,
            reading_time: 0,
            ai_analysis: None,
            author_ids: Vec::new(),
            category_id: None,
            tags: Vec::new(),
            parent_id: None,
            syndication: None,
            published_at: None,
            scheduled_at: None,
            created_at: now,
            updated_at: now,
            versions: Vec::new(),
        };
        content.refresh_metrics();
        content
    }

    /// Recompute word count and reading time from the current plain text.
    pub fn refresh_metrics(&mut self) {
        self.word_count = self.body.word_count();
        self.reading_time = reading_time(self.word_count);
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.syndication.as_ref().map(|s| s.fingerprint.as_str())
    }

    pub fn primary_keyword(&self) -> Option<&str> {
        self.seo_keywords
            .first()
            .map(String::as_str)
            .filter(|k| !k.trim().is_empty())
    }

    /// Description used for search snippets: the SEO override when set.
    pub fn meta_description(&self) -> &str {
        if self.seo_description.trim().is_empty() {
            &self.description
        } else {
            &self.seo_description
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> ContentVersion {
        ContentVersion {
            version: self.version,
            title: self.title.clone(),
            description: self.description.clone(),
            excerpt: self.excerpt.clone(),
            body: self.body.clone(),
            status: self.status,
            seo_title: self.seo_title.clone(),
            seo_description: self.seo_description.clone(),
            seo_keywords: self.seo_keywords.clone(),
            created_at: now,
        }
    }
}

/// Editor input. Absent fields are left untouched on update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentFormData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub body_format: Option<BodyFormat>,
    pub slug: Option<String>,
    pub status: Option<ContentStatus>,
    pub content_type: Option<ContentType>,
    pub featured_image: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub seo_keywords: Option<Vec<String>>,
    pub category_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Version the editor last read; a mismatch rejects the update.
    pub expected_version: Option<u32>,
}
