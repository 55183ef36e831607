pub mod backoff;
pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use backoff::calculate_backoff_delay;
pub use client::{DEFAULT_TIMEOUT, fetch_feed, fetch_feed_with_timeout};
pub use errors::{FeedFetchError, FetchFailure};
pub use types::{FeedItem, RssFeed, parse_feed_date};
