//! Feed syndication: sources, batch orchestration, analytics fan-out and
//! the periodic scheduler.

pub mod analytics;
pub mod orchestrator;
pub mod scheduler;
pub mod source;

pub use analytics::{Analytics, AnalyticsEvent, AnalyticsProvider, Identity, TracingAnalytics};
pub use orchestrator::{
    DEFAULT_MAX_CONCURRENT, FeedSyncReport, SyncReport, SyndicationOrchestrator,
    deduplicate_content, process_feed_items,
};
pub use scheduler::{SchedulerConfig, SyncScheduler};
pub use source::{FeedSource, HttpFeedSource};
