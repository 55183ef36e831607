//! Feed items to canonical content records.

pub mod filter;

use chrono::Utc;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use crate::content::{
    Content, ContentBody, ContentSource, ContentStatus, ContentType, MAX_EXCERPT_LEN,
    SyndicationData, Tag, lifecycle,
};
use crate::feeds::{FeedItem, RssFeed};
use crate::fingerprint::{content_id_from_fingerprint, id_from_string};
use crate::sanitizer::{
    detect_language, normalize_whitespace, sanitize, sanitize_with_base, to_markdown, truncate,
};
use crate::seo::{generate_seo_description, generate_seo_slug, generate_seo_title};

pub use filter::should_process;

const MAX_FEED_KEYWORDS: usize = 5;

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").unwrap());

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("item {guid} has neither a title nor a link")]
    MissingIdentity { guid: String },

    #[error("item link {link} is not a valid URL: {source}")]
    InvalidLink {
        link: String,
        #[source]
        source: url::ParseError,
    },
}

/// Builds the canonical record for `item` under the policy of `feed`.
///
/// The id is derived from the item fingerprint, so converting the same entry
/// twice yields the same id. Status is `published` exactly when the feed
/// auto-publishes.
pub fn convert(item: &FeedItem, feed: &RssFeed) -> Result<Content, ConversionError> {
    let title = normalize_whitespace(&item.title);
    let link = item.link.trim();
    if title.is_empty() && link.is_empty() {
        return Err(ConversionError::MissingIdentity {
            guid: item.guid.clone(),
        });
    }

    let base = if link.is_empty() {
        None
    } else {
        Some(Url::parse(link).map_err(|source| ConversionError::InvalidLink {
            link: link.to_string(),
            source,
        })?)
    };

    let raw_html = match item.content.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(html) => html.to_string(),
        None => format!("<p>{}</p>", sanitize(&item.description)),
    };
    let html = match &base {
        Some(base) => sanitize_with_base(&raw_html, base),
        None => sanitize(&raw_html),
    };
    let markdown = to_markdown(&html);
    let body = ContentBody::from_sanitized_html(html, markdown);

    let now = Utc::now();
    let id = content_id_from_fingerprint(&item.fingerprint);
    let title = if title.is_empty() { link.to_string() } else { title };
    let mut content = Content::new(
        id.clone(),
        ContentType::Syndicated,
        ContentSource::RssFeed,
        title,
        body,
        now,
    );

    content.slug = match generate_seo_slug(&content.title) {
        slug if slug.is_empty() => id.clone(),
        slug => slug,
    };

    let description = normalize_whitespace(&item.description);
    let summary_source = if description.is_empty() {
        content.body.plain_text.clone()
    } else {
        description.clone()
    };
    content.description = description;
    content.excerpt = truncate(&summary_source, MAX_EXCERPT_LEN);

    content.seo_keywords = item
        .categories
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .take(MAX_FEED_KEYWORDS)
        .collect();
    content.seo_title = generate_seo_title(&content.title, &content.seo_keywords);
    content.seo_description = generate_seo_description(&summary_source);

    content.tags = Tag::from_names(feed.tags.iter().chain(item.categories.iter()));
    content.author_ids = item
        .author
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(|a| id_from_string(&a.to_lowercase()))
        .collect();
    content.category_id = feed.category_id.clone();
    content.language = detect_language(&content.body.plain_text);
    content.featured_image = first_image(&content.body.html);

    content.syndication = Some(SyndicationData {
        source_url: link.to_string(),
        source_name: feed.name.clone(),
        source_type: ContentSource::RssFeed,
        original_published_at: item.published_at,
        last_synced_at: now,
        feed_id: feed.id.clone(),
        fingerprint: item.fingerprint.clone(),
    });

    if feed.auto_publish {
        content.published_at = Some(item.published_at);
        lifecycle::set_status(&mut content, ContentStatus::Published, now);
    }

    debug!(content_id = %content.id, feed_id = %feed.id, words = content.word_count, "converted feed item");
    Ok(content)
}

fn first_image(html: &str) -> Option<String> {
    let fragment = Html::parse_fragment(html);
    fragment
        .select(&IMG_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.starts_with("http://") || src.starts_with("https://"))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::SYNDICATED_ID_PREFIX;

    fn feed() -> RssFeed {
        let mut feed = RssFeed::new("feed-1", "https://blog.example.com/feed", "Example Blog");
        feed.tags = vec!["Engineering".into()];
        feed.category_id = Some("cat-1".into());
        feed
    }

    fn item() -> FeedItem {
        FeedItem::new(
            "guid-1",
            "Shipping a Rust   service",
            "https://blog.example.com/posts/rust-service",
            Some("Mon, 01 Jan 2024 10:00:00 +0000"),
        )
        .with_description("How we shipped it.")
        .with_content(
            r#"<h2>Intro</h2><p>We <a href="/about">shipped</a> it.</p><img src="img/cover.png" alt="cover"><script>x()</script>"#,
        )
        .with_author("Jane Doe")
        .with_categories(vec!["Rust".into(), "engineering".into()])
    }

    #[test]
    fn test_convert_builds_syndicated_record() {
        let item = item();
        let content = convert(&item, &feed()).unwrap();

        assert!(content.id.starts_with(SYNDICATED_ID_PREFIX));
        assert_eq!(content.id, content_id_from_fingerprint(&item.fingerprint));
        assert_eq!(content.title, "Shipping a Rust service");
        assert_eq!(content.slug, "shipping-a-rust-service");
        assert_eq!(content.content_type, ContentType::Syndicated);
        assert_eq!(content.source, ContentSource::RssFeed);
        assert_eq!(content.status, ContentStatus::Draft);
        assert!(content.published_at.is_none());
        assert_eq!(content.category_id.as_deref(), Some("cat-1"));
        assert_eq!(content.excerpt, "How we shipped it.");
        assert_eq!(content.seo_keywords, vec!["rust".to_string(), "engineering".to_string()]);

        assert!(!content.body.html.contains("script"));
        assert!(content.body.html.contains(r#"href="https://blog.example.com/about""#));
        assert_eq!(
            content.featured_image.as_deref(),
            Some("https://blog.example.com/posts/img/cover.png")
        );

        let names: Vec<_> = content.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Engineering", "Rust"]);
        assert_eq!(content.author_ids, vec![id_from_string("jane doe")]);

        let syndication = content.syndication.unwrap();
        assert_eq!(syndication.feed_id, "feed-1");
        assert_eq!(syndication.fingerprint, item.fingerprint);
        assert_eq!(syndication.source_name, "Example Blog");
    }

    #[test]
    fn test_auto_publish_sets_published_at() {
        let mut feed = feed();
        feed.auto_publish = true;
        let item = item();
        let content = convert(&item, &feed).unwrap();
        assert_eq!(content.status, ContentStatus::Published);
        assert_eq!(content.published_at, Some(item.published_at));
    }

    #[test]
    fn test_description_only_item() {
        let item = FeedItem::new("g", "Plain", "https://x.com/p", None)
            .with_description("Just a <b>summary</b> line");
        let content = convert(&item, &feed()).unwrap();
        assert_eq!(content.body.plain_text, "Just a summary line");
        assert_eq!(content.word_count, 4);
    }

    #[test]
    fn test_rejects_items_without_identity_or_bad_links() {
        let anonymous = FeedItem::new("g", "  ", "", None);
        assert!(matches!(
            convert(&anonymous, &feed()),
            Err(ConversionError::MissingIdentity { .. })
        ));

        let bad = FeedItem::new("g", "Title", "not a url", None);
        assert!(matches!(
            convert(&bad, &feed()),
            Err(ConversionError::InvalidLink { .. })
        ));
    }

    #[test]
    fn test_same_entry_same_id() {
        let a = item().with_description("first");
        let b = item().with_description("second");
        assert_eq!(convert(&a, &feed()).unwrap().id, convert(&b, &feed()).unwrap().id);
    }
}
