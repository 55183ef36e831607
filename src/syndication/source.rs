use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{instrument, warn};

use crate::feeds::{
    DEFAULT_TIMEOUT, FeedFetchError, FeedItem, RssFeed, calculate_backoff_delay,
    fetch_feed_with_timeout,
};

/// Where feed items come from. The orchestrator never retries; sources
/// decide that themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, feed: &RssFeed) -> Result<Vec<FeedItem>, FeedFetchError>;
}

/// HTTP source with a per-request timeout and jittered exponential retry on
/// retriable failures.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    timeout: Duration,
    max_retries: u32,
    base_backoff: Duration,
}

impl Default for HttpFeedSource {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl HttpFeedSource {
    pub fn new(timeout: Duration, max_retries: u32) -> Self {
        Self {
            timeout,
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_base_backoff(mut self, base_backoff: Duration) -> Self {
        self.base_backoff = base_backoff;
        self
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    #[instrument(skip_all, fields(feed_id = %feed.id, url = %feed.url))]
    async fn fetch(&self, feed: &RssFeed) -> Result<Vec<FeedItem>, FeedFetchError> {
        let mut attempt = 0;
        loop {
            match fetch_feed_with_timeout(&feed.url, self.timeout).await {
                Ok(items) => return Ok(items),
                Err(e) if e.should_retry() && attempt < self.max_retries => {
                    let delay = calculate_backoff_delay(attempt, self.base_backoff);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying feed fetch");
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
