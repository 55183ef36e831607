use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};

use crate::content::ContentManager;
use crate::feeds::RssFeed;
use crate::syndication::orchestrator::{DEFAULT_MAX_CONCURRENT, SyncReport, SyndicationOrchestrator};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub max_concurrent: usize,
    pub ai_analysis_enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900), // 15 minutes
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            ai_analysis_enabled: true,
        }
    }
}

/// Periodic sync loop: every tick syncs all feeds, then publishes scheduled
/// content whose time has come. Stops when its token is cancelled.
pub struct SyncScheduler {
    orchestrator: Arc<SyndicationOrchestrator>,
    manager: ContentManager,
    feeds: Vec<RssFeed>,
    config: SchedulerConfig,
    shutdown_token: CancellationToken,
}

impl SyncScheduler {
    pub fn new(
        orchestrator: Arc<SyndicationOrchestrator>,
        manager: ContentManager,
        feeds: Vec<RssFeed>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            orchestrator,
            manager,
            feeds,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// One sync pass followed by scheduled publishing.
    pub async fn run_once(&self) -> SyncReport {
        let report = self
            .orchestrator
            .sync(
                &self.feeds,
                self.config.ai_analysis_enabled,
                self.config.max_concurrent,
            )
            .await;

        if let Err(e) = self.manager.publish_due(Utc::now()).await {
            error!("Failed to publish scheduled content: {}", e);
        }
        report
    }

    pub async fn run(self) {
        info!(
            feeds = self.feeds.len(),
            interval_secs = self.config.interval.as_secs(),
            max_concurrent = self.config.max_concurrent,
            "Starting sync scheduler"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick: u64 = 0;

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    tick += 1;
                    self.run_once().instrument(info_span!("sync", tick)).await;
                }
            }
        }
    }
}
