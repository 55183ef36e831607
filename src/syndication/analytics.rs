//! Analytics fan-out. Providers are handed in explicitly; there is no
//! global registry. A failing provider never fails the operation that
//! emitted the event.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::content::ContentStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    ContentCreated {
        content_id: String,
        author_id: String,
    },
    ContentUpdated {
        content_id: String,
        version: u32,
    },
    ContentStatusChanged {
        content_id: String,
        from: ContentStatus,
        to: ContentStatus,
    },
    ContentDeleted {
        content_id: String,
    },
    FeedSynced {
        feed_id: String,
        fetched: usize,
        stored: usize,
    },
    FeedFailed {
        feed_id: String,
        error: String,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ContentCreated { .. } => "content_created",
            Self::ContentUpdated { .. } => "content_updated",
            Self::ContentStatusChanged { .. } => "content_status_changed",
            Self::ContentDeleted { .. } => "content_deleted",
            Self::FeedSynced { .. } => "feed_synced",
            Self::FeedFailed { .. } => "feed_failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("analytics provider {provider} failed: {reason}")]
pub struct AnalyticsError {
    pub provider: String,
    pub reason: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn track(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError>;

    async fn identify(&self, identity: &Identity) -> Result<(), AnalyticsError>;
}

/// Writes events to the `analytics` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAnalytics;

#[async_trait]
impl AnalyticsProvider for TracingAnalytics {
    fn name(&self) -> &str {
        "tracing"
    }

    async fn track(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        let payload = serde_json::to_string(event).map_err(|e| AnalyticsError {
            provider: self.name().to_string(),
            reason: e.to_string(),
        })?;
        info!(target: "analytics", event = event.name(), %payload, "track");
        Ok(())
    }

    async fn identify(&self, identity: &Identity) -> Result<(), AnalyticsError> {
        info!(target: "analytics", user_id = %identity.user_id, "identify");
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct Analytics {
    providers: Vec<Arc<dyn AnalyticsProvider>>,
}

impl Analytics {
    pub fn new(providers: Vec<Arc<dyn AnalyticsProvider>>) -> Self {
        Self { providers }
    }

    /// No providers; every call is a no-op.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn AnalyticsProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub async fn track(&self, event: AnalyticsEvent) {
        for provider in &self.providers {
            if let Err(e) = provider.track(&event).await {
                warn!(provider = provider.name(), event = event.name(), error = %e, "analytics track failed");
            }
        }
    }

    pub async fn identify(&self, identity: Identity) {
        for provider in &self.providers {
            if let Err(e) = provider.identify(&identity).await {
                warn!(provider = provider.name(), error = %e, "analytics identify failed");
            }
        }
    }
}

impl std::fmt::Debug for Analytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("Analytics").field("providers", &names).finish()
    }
}
