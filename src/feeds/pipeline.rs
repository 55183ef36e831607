use encoding_rs::Encoding;
use feed_rs::model::{Entry, Link};
use regex::Regex;
use std::sync::LazyLock;

use crate::feeds::{errors::FetchFailure, types::FeedItem};
use crate::sanitizer::{normalize_whitespace, to_plain_text};

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static XML_ENCODING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<\?xml[^>]*?encoding\s*=\s*["']([^"']+)["']"#).unwrap()
});

/// Decode a raw feed body and turn its entries into [`FeedItem`]s, in
/// document order.
pub fn parse_feed(body: &[u8], content_type: &str) -> Result<Vec<FeedItem>, FetchFailure> {
    let encoding = detect_charset(content_type, body);
    let xml = decode_to_utf8(body, encoding)?;
    let feed = feed_rs::parser::parse(xml.as_bytes())?;

    Ok(feed.entries.into_iter().map(entry_to_item).collect())
}

fn detect_charset(content_type: &str, body: &[u8]) -> &'static Encoding {
    // 1. Content-Type header
    if let Some(encoding) = CHARSET_REGEX
        .captures(content_type)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
    {
        return encoding;
    }

    // 2. XML declaration in the first bytes of the document
    let head = String::from_utf8_lossy(&body[..body.len().min(1024)]);
    if let Some(encoding) = XML_ENCODING_REGEX
        .captures(&head)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
    {
        return encoding;
    }

    // 3. Heuristic detection
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(&body[..body.len().min(4096)], false);
    detector.guess(None, true)
}

fn decode_to_utf8(body: &[u8], encoding: &'static Encoding) -> Result<String, FetchFailure> {
    let (decoded, actual, had_errors) = encoding.decode(body);
    if had_errors {
        return Err(FetchFailure::Charset(format!(
            "failed to decode feed with encoding: {}",
            actual.name()
        )));
    }

    // The parser sees UTF-8 from here on, so the declaration must agree.
    if actual == encoding_rs::UTF_8 {
        Ok(decoded.into_owned())
    } else {
        Ok(XML_ENCODING_REGEX
            .replace(&decoded, |caps: &regex::Captures| {
                caps[0].replace(&caps[1], "UTF-8")
            })
            .into_owned())
    }
}

fn entry_to_item(entry: Entry) -> FeedItem {
    let title = entry
        .title
        .as_ref()
        .map(|t| normalize_whitespace(&t.content))
        .unwrap_or_default();
    let link = primary_link(&entry.links).unwrap_or_default();
    let published_raw = entry.published.or(entry.updated).map(|d| d.to_rfc3339());

    let summary_html = entry.summary.as_ref().map(|s| s.content.clone());
    let content_html = entry.content.as_ref().and_then(|c| c.body.clone());

    // content snippet, then summary, then nothing
    let description = content_html
        .as_deref()
        .map(to_plain_text)
        .filter(|text| !text.is_empty())
        .or_else(|| summary_html.as_deref().map(to_plain_text))
        .unwrap_or_default();

    let mut item = FeedItem::new(entry.id, title, link, published_raw.as_deref())
        .with_description(description)
        .with_categories(entry.categories.into_iter().map(|c| c.term).collect());

    if let Some(author) = entry.authors.into_iter().next().map(|p| p.name) {
        item = item.with_author(author);
    }
    if let Some(html) = content_html.or(summary_html) {
        item = item.with_content(html);
    }
    item
}

fn primary_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}
