use once_cell::sync::Lazy;
use reqwest::{
    Client, ClientBuilder,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::feeds::{
    errors::{FeedFetchError, FetchFailure},
    pipeline::parse_feed,
    types::FeedItem,
};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const USER_AGENT: &str = "Syndicator/0.1 (+https://syndicator.example.com)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "application/rss+xml, application/atom+xml, application/feed+json, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.5",
        ),
    );
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(DEFAULT_TIMEOUT)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .default_headers(headers)
        .build()
        .expect("Failed to build HTTP client")
});

/// Fetch and parse the RSS/Atom feed at `url`.
pub async fn fetch_feed(url: &str) -> Result<Vec<FeedItem>, FeedFetchError> {
    fetch_feed_with_timeout(url, DEFAULT_TIMEOUT).await
}

/// As [`fetch_feed`], bounding the whole request by `timeout`.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_feed_with_timeout(
    url: &str,
    timeout: Duration,
) -> Result<Vec<FeedItem>, FeedFetchError> {
    let items = download(url, timeout)
        .await
        .map_err(|source| FeedFetchError::new(url, source))?;
    debug!(items = items.len(), "feed parsed");
    Ok(items)
}

async fn download(url: &str, timeout: Duration) -> Result<Vec<FeedItem>, FetchFailure> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .timeout(timeout)
        .send()
        .await
        .map_err(FetchFailure::from_reqwest_error)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > MAX_BODY_SIZE
    {
        return Err(FetchFailure::BodyTooLarge(content_length));
    }

    let status = response.status();
    if !status.is_success() {
        return Err(FetchFailure::http(status));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("application/xml")
        .to_string();

    if !is_feed_content_type(&content_type) {
        return Err(FetchFailure::UnsupportedContentType(content_type));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| FetchFailure::Io(e.to_string()))?;

    // Content-Length may have been missing
    if body.len() as u64 > MAX_BODY_SIZE {
        return Err(FetchFailure::BodyTooLarge(body.len() as u64));
    }

    parse_feed(&body, &content_type)
}

fn is_feed_content_type(content_type: &str) -> bool {
    let lower = content_type.to_ascii_lowercase();
    ["xml", "rss", "atom", "json"]
        .iter()
        .any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_content_types() {
        assert!(is_feed_content_type("application/rss+xml; charset=utf-8"));
        assert!(is_feed_content_type("application/atom+xml"));
        assert!(is_feed_content_type("text/xml"));
        assert!(is_feed_content_type("application/feed+json"));
        assert!(!is_feed_content_type("text/html"));
        assert!(!is_feed_content_type("image/jpeg"));
    }
}
