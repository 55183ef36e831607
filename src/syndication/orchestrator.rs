//! Batch syndication: fetch feeds with bounded concurrency, filter and
//! convert their items, drop what is already stored and persist the rest.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::content::{Content, analyze_content};
use crate::converter::{convert, should_process};
use crate::feeds::{FeedFetchError, FeedItem, RssFeed};
use crate::repositories::{ContentRepository, RepositoryError};
use crate::syndication::analytics::{Analytics, AnalyticsEvent};
use crate::syndication::source::FeedSource;

pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Filters and converts the items of one feed, in feed order.
///
/// Items rejected by the keyword policy are skipped, as are items that fail
/// to convert (logged). When both the global switch and the feed enable
/// analysis, each record is scored and dropped if its quality falls below
/// the feed's minimum.
pub fn process_feed_items(items: &[FeedItem], feed: &RssFeed, ai_analysis_enabled: bool) -> Vec<Content> {
    let analyze = ai_analysis_enabled && feed.enable_ai_analysis;
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        if !should_process(item, feed) {
            debug!(guid = %item.guid, "item filtered by keyword policy");
            continue;
        }

        let mut content = match convert(item, feed) {
            Ok(content) => content,
            Err(e) => {
                warn!(feed_id = %feed.id, guid = %item.guid, error = %e, "skipping feed item");
                continue;
            }
        };

        if analyze {
            let analysis = analyze_content(&content);
            if let Some(minimum) = feed.minimum_quality_score
                && analysis.quality_score < minimum
            {
                debug!(
                    content_id = %content.id,
                    quality = analysis.quality_score,
                    minimum,
                    "item below quality threshold"
                );
                continue;
            }
            content.ai_analysis = Some(analysis);
        }

        out.push(content);
    }

    out
}

/// Keeps the records whose fingerprint is neither in `existing` nor seen
/// earlier in `contents`. Records without a fingerprint always pass.
pub fn deduplicate_content(contents: Vec<Content>, existing: &HashSet<String>) -> Vec<Content> {
    let mut seen: HashSet<String> = HashSet::new();
    contents
        .into_iter()
        .filter(|content| match content.fingerprint() {
            Some(fp) => !existing.contains(fp) && seen.insert(fp.to_string()),
            None => true,
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FeedSyncReport {
    pub feed_id: String,
    /// Records that survived filtering and conversion.
    pub processed: usize,
    pub new: usize,
    pub stored: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub feeds: Vec<FeedSyncReport>,
}

impl SyncReport {
    pub fn stored(&self) -> usize {
        self.feeds.iter().map(|f| f.stored).sum()
    }

    pub fn failed_feeds(&self) -> usize {
        self.feeds.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn feed(&self, feed_id: &str) -> Option<&FeedSyncReport> {
        self.feeds.iter().find(|f| f.feed_id == feed_id)
    }
}

pub struct SyndicationOrchestrator {
    source: Arc<dyn FeedSource>,
    repo: Arc<dyn ContentRepository>,
    analytics: Analytics,
}

impl SyndicationOrchestrator {
    pub fn new(
        source: Arc<dyn FeedSource>,
        repo: Arc<dyn ContentRepository>,
        analytics: Analytics,
    ) -> Self {
        Self {
            source,
            repo,
            analytics,
        }
    }

    async fn process_feed(
        &self,
        feed: &RssFeed,
        ai_analysis_enabled: bool,
    ) -> Result<Vec<Content>, FeedFetchError> {
        let items = self.source.fetch(feed).await?;
        let contents = process_feed_items(&items, feed, ai_analysis_enabled);
        debug!(items = items.len(), kept = contents.len(), "feed processed");
        Ok(contents)
    }

    /// Runs feeds in consecutive batches of `max_concurrent`; a batch starts
    /// only after every feed of the previous one has settled. Results keep
    /// input order.
    async fn run_batches(
        &self,
        feeds: &[RssFeed],
        ai_analysis_enabled: bool,
        max_concurrent: usize,
    ) -> Vec<(String, Result<Vec<Content>, FeedFetchError>)> {
        let mut results = Vec::with_capacity(feeds.len());
        for batch in feeds.chunks(max_concurrent.max(1)) {
            let settled = join_all(batch.iter().map(|feed| {
                self.process_feed(feed, ai_analysis_enabled)
                    .instrument(info_span!("feed", feed_id = %feed.id, url = %feed.url))
            }))
            .await;

            for (feed, result) in batch.iter().zip(settled) {
                if let Err(e) = &result {
                    warn!(feed_id = %feed.id, error = %e, "feed failed");
                    self.analytics
                        .track(AnalyticsEvent::FeedFailed {
                            feed_id: feed.id.clone(),
                            error: e.to_string(),
                        })
                        .await;
                }
                results.push((feed.id.clone(), result));
            }
        }
        results
    }

    /// Converted records per feed id. A feed that fails maps to an empty
    /// list and never affects the others. Feed ids should be unique; feeds
    /// sharing one have their records merged under it.
    pub async fn process_feeds_in_batch(
        &self,
        feeds: &[RssFeed],
        ai_analysis_enabled: bool,
        max_concurrent: usize,
    ) -> HashMap<String, Vec<Content>> {
        let mut by_feed: HashMap<String, Vec<Content>> = HashMap::with_capacity(feeds.len());
        for (feed_id, result) in self.run_batches(feeds, ai_analysis_enabled, max_concurrent).await {
            let contents = result.unwrap_or_default();
            match by_feed.entry(feed_id) {
                Entry::Occupied(mut slot) => {
                    warn!(feed_id = %slot.key(), "duplicate feed id in batch, merging results");
                    slot.get_mut().extend(contents);
                }
                Entry::Vacant(slot) => {
                    slot.insert(contents);
                }
            }
        }
        by_feed
    }

    /// Fetches every feed, drops records already stored for that feed and
    /// persists the rest, honouring `max_items_per_sync`.
    pub async fn sync(
        &self,
        feeds: &[RssFeed],
        ai_analysis_enabled: bool,
        max_concurrent: usize,
    ) -> SyncReport {
        let started_at = Utc::now();
        let results = self.run_batches(feeds, ai_analysis_enabled, max_concurrent).await;

        let mut reports = Vec::with_capacity(results.len());
        for (feed, (_, result)) in feeds.iter().zip(results) {
            let report = match result {
                Ok(contents) => self.persist(feed, contents).await,
                Err(e) => FeedSyncReport {
                    feed_id: feed.id.clone(),
                    error: Some(e.to_string()),
                    ..Default::default()
                },
            };
            reports.push(report);
        }

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            feeds: reports,
        };
        info!(
            feeds = feeds.len(),
            stored = report.stored(),
            failed_feeds = report.failed_feeds(),
            "sync finished"
        );
        report
    }

    async fn persist(&self, feed: &RssFeed, contents: Vec<Content>) -> FeedSyncReport {
        let mut report = FeedSyncReport {
            feed_id: feed.id.clone(),
            processed: contents.len(),
            ..Default::default()
        };

        let existing = match self.repo.list_fingerprints(&feed.id).await {
            Ok(existing) => existing,
            Err(e) => {
                warn!(feed_id = %feed.id, error = %e, "could not load stored fingerprints");
                report.error = Some(e.to_string());
                return report;
            }
        };

        let mut fresh = deduplicate_content(contents, &existing);
        report.duplicates = report.processed - fresh.len();
        if let Some(max) = feed.max_items_per_sync {
            fresh.truncate(max);
        }
        report.new = fresh.len();

        for content in &fresh {
            match self.repo.create(content).await {
                Ok(()) => report.stored += 1,
                Err(RepositoryError::AlreadyExists(_)) => report.duplicates += 1,
                Err(e) => {
                    warn!(content_id = %content.id, error = %e, "failed to store content");
                    report.failed += 1;
                }
            }
        }

        self.analytics
            .track(AnalyticsEvent::FeedSynced {
                feed_id: feed.id.clone(),
                fetched: report.processed,
                stored: report.stored,
            })
            .await;
        report
    }
}
