use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fingerprint::fingerprint;

/// One entry of a fetched feed, normalized across RSS and Atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub guid: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    /// Date exactly as the feed carried it; `None` when the feed had none.
    pub published_raw: Option<String>,
    pub author: Option<String>,
    pub categories: Vec<String>,
    /// Raw (unsanitized) HTML body when the feed ships one.
    pub content: Option<String>,
    pub fingerprint: String,
}

impl FeedItem {
    /// Build an item from its identifying fields. The publish date falls back
    /// to now when `published_raw` is absent or unparseable, while the
    /// fingerprint always hashes the raw string so it stays stable.
    pub fn new(
        guid: impl Into<String>,
        title: impl Into<String>,
        link: impl Into<String>,
        published_raw: Option<&str>,
    ) -> Self {
        let title = title.into();
        let link = link.into();
        let published_at = published_raw
            .and_then(parse_feed_date)
            .unwrap_or_else(Utc::now);
        let fingerprint = fingerprint(&title, &link, published_raw.unwrap_or_default());

        Self {
            guid: guid.into(),
            title,
            description: String::new(),
            link,
            published_at,
            published_raw: published_raw.map(str::to_string),
            author: None,
            categories: Vec::new(),
            content: None,
            fingerprint,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }
}

/// Per-feed syndication policy. Supplied by the caller, typically loaded from
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RssFeed {
    pub id: String,
    pub url: String,
    pub name: String,
    #[serde(default)]
    pub auto_publish: bool,
    #[serde(default)]
    pub enable_ai_analysis: bool,
    #[serde(default)]
    pub minimum_quality_score: Option<u8>,
    #[serde(default)]
    pub include_keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub max_items_per_sync: Option<usize>,
}

impl RssFeed {
    pub fn new(id: impl Into<String>, url: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            name: name.into(),
            auto_publish: false,
            enable_ai_analysis: false,
            minimum_quality_score: None,
            include_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            category_id: None,
            tags: Vec::new(),
            max_items_per_sync: None,
        }
    }
}

/// Parse the date formats seen in the wild: RFC 3339, RFC 2822 and bare
/// `YYYY-MM-DD`.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
