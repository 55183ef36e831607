use anyhow::{Context, Result};
use std::sync::Arc;
use syndicator::{
    config::{Config, load_feeds},
    content::ContentManager,
    repositories::{ContentRepository, InMemoryContentRepository, PgContentRepository},
    syndication::{Analytics, HttpFeedSource, SyncScheduler, SyndicationOrchestrator, TracingAnalytics},
};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let feeds = load_feeds(config.feeds_file())
        .with_context(|| format!("loading feeds from {}", config.feeds_file().display()))?;
    if feeds.is_empty() {
        warn!("No feeds configured; only scheduled publishing will run");
    }

    let repo: Arc<dyn ContentRepository> = match config.database_url() {
        Some(url) => {
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("Using PostgreSQL content store");
            Arc::new(PgContentRepository::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using in-memory content store");
            Arc::new(InMemoryContentRepository::new())
        }
    };

    let analytics = Analytics::new(vec![Arc::new(TracingAnalytics)]);
    let source = HttpFeedSource::new(config.feed_timeout(), config.feed_max_retries());
    let orchestrator = Arc::new(SyndicationOrchestrator::new(
        Arc::new(source),
        repo.clone(),
        analytics.clone(),
    ));
    let manager = ContentManager::new(repo, analytics);

    let scheduler = SyncScheduler::new(orchestrator, manager, feeds, config.scheduler_config());

    // Spawn shutdown handler
    let shutdown_token = scheduler.shutdown_token();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_token.cancel();
    });

    scheduler.run().await;
    Ok(())
}
