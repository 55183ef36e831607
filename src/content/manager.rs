use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::content::analysis::analyze_content;
use crate::content::lifecycle::{self, Transition};
use crate::content::{
    Content, ContentAiAnalysis, ContentBody, ContentError, ContentFormData,
    ContentSource, ContentStatus, ContentType, MAX_EXCERPT_LEN, Tag,
};
use crate::repositories::ContentRepository;
use crate::sanitizer::{detect_language, truncate};
use crate::seo::{
    MAX_SEO_TITLE_LEN, generate_seo_description, generate_seo_slug, generate_seo_title,
};
use crate::syndication::analytics::{Analytics, AnalyticsEvent, Identity};

/// Per-item result of a bulk operation.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, ContentError)>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns creation, editing and status transitions of content records.
#[derive(Clone)]
pub struct ContentManager {
    repo: Arc<dyn ContentRepository>,
    analytics: Analytics,
}

impl ContentManager {
    pub fn new(repo: Arc<dyn ContentRepository>, analytics: Analytics) -> Self {
        Self { repo, analytics }
    }

    pub fn repository(&self) -> &Arc<dyn ContentRepository> {
        &self.repo
    }

    pub async fn get_content(&self, id: &str) -> Result<Content, ContentError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| ContentError::NotFound(id.to_string()))
    }

    #[instrument(skip_all, fields(author_id = %author_id))]
    pub async fn create_content(
        &self,
        form: ContentFormData,
        author_id: &str,
        enable_seo: bool,
    ) -> Result<Content, ContentError> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        let body = ContentBody::from_raw(
            form.body.unwrap_or_default(),
            form.body_format.unwrap_or_default(),
        );
        let mut content = Content::new(
            id.clone(),
            form.content_type.unwrap_or(ContentType::Manual),
            ContentSource::Manual,
            form.title.unwrap_or_default(),
            body,
            now,
        );

        content.slug = form
            .slug
            .map(|s| generate_seo_slug(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generate_seo_slug(&content.title));
        if content.slug.is_empty() {
            content.slug = id.clone();
        }

        content.description = form.description.unwrap_or_default();
        content.excerpt = match form.excerpt {
            Some(excerpt) => truncate(&excerpt, MAX_EXCERPT_LEN),
            None => truncate(&content.body.plain_text, MAX_EXCERPT_LEN),
        };
        content.seo_keywords = form.seo_keywords.unwrap_or_default();
        content.seo_title = match form.seo_title {
            Some(title) => truncate(title.trim(), MAX_SEO_TITLE_LEN),
            None => generate_seo_title(&content.title, &content.seo_keywords),
        };
        // Without an override the meta description falls back to `description`.
        content.seo_description = form
            .seo_description
            .map(|d| generate_seo_description(&d))
            .unwrap_or_default();

        content.featured_image = form.featured_image;
        content.category_id = form.category_id;
        content.tags = Tag::from_names(form.tags.unwrap_or_default());
        content.author_ids = vec![author_id.to_string()];
        content.language = detect_language(&content.body.plain_text);

        content.scheduled_at = form.scheduled_at;
        lifecycle::set_status(&mut content, form.status.unwrap_or(ContentStatus::Draft), now);

        if enable_seo {
            content.ai_analysis = Some(analyze_content(&content));
        }

        self.repo.create(&content).await?;
        info!(content_id = %content.id, status = %content.status, words = content.word_count, "content created");

        self.analytics.identify(Identity::new(author_id)).await;
        self.analytics
            .track(AnalyticsEvent::ContentCreated {
                content_id: content.id.clone(),
                author_id: author_id.to_string(),
            })
            .await;

        Ok(content)
    }

    /// Applies the fields present in `form` and bumps the version by one.
    ///
    /// When `form.expected_version` is set and the stored record has moved
    /// past it the update is rejected with `Conflict`. The write itself is
    /// compare-and-swap on the revision read here, and the pre-update
    /// snapshot is only stored once that write has landed.
    #[instrument(skip_all, fields(content_id = %id))]
    pub async fn update_content(
        &self,
        id: &str,
        form: ContentFormData,
        create_version: bool,
    ) -> Result<Content, ContentError> {
        let existing = self.get_content(id).await?;
        if let Some(expected) = form.expected_version
            && expected != existing.version
        {
            return Err(ContentError::Conflict {
                id: id.to_string(),
                expected,
                actual: existing.version,
            });
        }

        let now = Utc::now();
        let mut updated = existing.clone();

        let mut body_changed = false;
        let mut title_changed = false;
        let mut keywords_changed = false;

        if let Some(title) = form.title {
            title_changed = title != updated.title;
            updated.title = title;
        }
        if let Some(slug) = form.slug {
            let slug = generate_seo_slug(&slug);
            if !slug.is_empty() {
                updated.slug = slug;
            }
        }
        if let Some(description) = form.description {
            updated.description = description;
        }
        if let Some(raw) = form.body {
            let format = form.body_format.unwrap_or(updated.body.format);
            body_changed = raw != updated.body.raw || format != updated.body.format;
            updated.body = ContentBody::from_raw(raw, format);
        } else if let Some(format) = form.body_format
            && format != updated.body.format
        {
            body_changed = true;
            updated.body = ContentBody::from_raw(updated.body.raw.clone(), format);
        }

        match form.excerpt {
            Some(excerpt) => updated.excerpt = truncate(&excerpt, MAX_EXCERPT_LEN),
            None if body_changed => {
                updated.excerpt = truncate(&updated.body.plain_text, MAX_EXCERPT_LEN)
            }
            None => {}
        }

        if let Some(seo_title) = form.seo_title {
            updated.seo_title = truncate(seo_title.trim(), MAX_SEO_TITLE_LEN);
        }
        if let Some(seo_description) = form.seo_description {
            updated.seo_description = generate_seo_description(&seo_description);
        }
        if let Some(keywords) = form.seo_keywords {
            keywords_changed = keywords != updated.seo_keywords;
            updated.seo_keywords = keywords;
        }
        if let Some(content_type) = form.content_type {
            updated.content_type = content_type;
        }
        if let Some(image) = form.featured_image {
            updated.featured_image = Some(image).filter(|s| !s.is_empty());
        }
        if let Some(category) = form.category_id {
            updated.category_id = Some(category).filter(|s| !s.is_empty());
        }
        if let Some(tags) = form.tags {
            updated.tags = Tag::from_names(tags);
        }
        if let Some(at) = form.scheduled_at {
            updated.scheduled_at = Some(at);
        }
        if let Some(status) = form.status {
            lifecycle::set_status(&mut updated, status, now);
        }

        if body_changed {
            updated.refresh_metrics();
            updated.language = detect_language(&updated.body.plain_text);
        }
        if (body_changed || title_changed || keywords_changed) && updated.ai_analysis.is_some() {
            updated.ai_analysis = Some(analyze_content(&updated));
        }

        updated.version = existing.version + 1;
        updated.updated_at = now;

        updated.revision = self.repo.update(&updated).await?;
        if create_version {
            let snapshot = existing.snapshot(now);
            self.repo.append_version(id, &snapshot).await?;
            updated.versions.push(snapshot);
        }
        debug!(version = updated.version, body_changed, "content updated");

        self.analytics
            .track(AnalyticsEvent::ContentUpdated {
                content_id: updated.id.clone(),
                version: updated.version,
            })
            .await;

        Ok(updated)
    }

    /// Copies a record under a new id as an unpublished manual draft.
    #[instrument(skip_all, fields(content_id = %id))]
    pub async fn duplicate_content(
        &self,
        id: &str,
        title: Option<String>,
    ) -> Result<Content, ContentError> {
        let original = self.get_content(id).await?;
        let now = Utc::now();

        let mut copy = original.clone();
        copy.id = Uuid::new_v4().to_string();
        copy.title = title.unwrap_or_else(|| format!("{} (Copy)", original.title));
        copy.slug = match generate_seo_slug(&copy.title) {
            slug if slug.is_empty() => copy.id.clone(),
            slug => slug,
        };
        copy.version = 1;
        copy.revision = 0;
        copy.status = ContentStatus::Draft;
        copy.content_type = ContentType::Manual;
        copy.source = ContentSource::Manual;
        copy.syndication = None;
        copy.parent_id = Some(original.id.clone());
        copy.published_at = None;
        copy.scheduled_at = None;
        copy.versions.clear();
        copy.created_at = now;
        copy.updated_at = now;

        self.repo.create(&copy).await?;
        info!(copy_id = %copy.id, "content duplicated");
        Ok(copy)
    }

    pub async fn publish_content(&self, id: &str) -> Result<Content, ContentError> {
        self.transition(id, Transition::Publish).await
    }

    pub async fn unpublish_content(&self, id: &str) -> Result<Content, ContentError> {
        self.transition(id, Transition::Unpublish).await
    }

    pub async fn schedule_content(
        &self,
        id: &str,
        at: DateTime<Utc>,
    ) -> Result<Content, ContentError> {
        self.transition(id, Transition::Schedule { at }).await
    }

    pub async fn archive_content(&self, id: &str) -> Result<Content, ContentError> {
        self.transition(id, Transition::Archive).await
    }

    pub async fn restore_content(&self, id: &str) -> Result<Content, ContentError> {
        self.transition(id, Transition::Restore).await
    }

    /// Status and timestamps only: no version bump, no re-analysis.
    #[instrument(skip_all, fields(content_id = %id, action = transition.action()))]
    async fn transition(&self, id: &str, transition: Transition) -> Result<Content, ContentError> {
        let mut content = self.get_content(id).await?;
        let from = content.status;
        lifecycle::apply(&mut content, transition, Utc::now())?;
        content.revision = self.repo.update(&content).await?;

        info!(%from, to = %content.status, "content status changed");
        self.analytics
            .track(AnalyticsEvent::ContentStatusChanged {
                content_id: content.id.clone(),
                from,
                to: content.status,
            })
            .await;
        Ok(content)
    }

    /// Forces `status` on every id, bypassing the transition rules. One
    /// failure does not stop the rest.
    pub async fn bulk_update_status(&self, ids: &[String], status: ContentStatus) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.set_status(id, status).await {
                Ok(()) => outcome.succeeded.push(id.clone()),
                Err(e) => {
                    warn!(content_id = %id, error = %e, "bulk status update failed");
                    outcome.failed.push((id.clone(), e));
                }
            }
        }
        outcome
    }

    async fn set_status(&self, id: &str, status: ContentStatus) -> Result<(), ContentError> {
        let mut content = self.get_content(id).await?;
        let from = content.status;
        let now = Utc::now();
        lifecycle::set_status(&mut content, status, now);
        content.updated_at = now;
        self.repo.update(&content).await?;
        self.analytics
            .track(AnalyticsEvent::ContentStatusChanged {
                content_id: id.to_string(),
                from,
                to: status,
            })
            .await;
        Ok(())
    }

    pub async fn bulk_delete(&self, ids: &[String]) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            match self.repo.delete(id).await {
                Ok(true) => {
                    outcome.succeeded.push(id.clone());
                    self.analytics
                        .track(AnalyticsEvent::ContentDeleted {
                            content_id: id.clone(),
                        })
                        .await;
                }
                Ok(false) => outcome.failed.push((id.clone(), ContentError::NotFound(id.clone()))),
                Err(e) => {
                    warn!(content_id = %id, error = %e, "bulk delete failed");
                    outcome.failed.push((id.clone(), e.into()));
                }
            }
        }
        outcome
    }

    /// Recomputes and stores `ai_analysis` without bumping the version.
    #[instrument(skip_all, fields(content_id = %id))]
    pub async fn analyze_content(&self, id: &str) -> Result<ContentAiAnalysis, ContentError> {
        let mut content = self.get_content(id).await?;
        let analysis = analyze_content(&content);
        content.ai_analysis = Some(analysis.clone());
        self.repo.update(&content).await?;
        Ok(analysis)
    }

    /// Publishes approved records whose schedule has elapsed. Returns the
    /// ids that were published; failures are logged and skipped.
    #[instrument(skip_all)]
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<String>, ContentError> {
        let due = self.repo.list_due_scheduled(now).await?;
        let mut published = Vec::with_capacity(due.len());
        for mut content in due {
            if let Err(e) = lifecycle::apply(&mut content, Transition::Publish, now) {
                warn!(content_id = %content.id, error = %e, "scheduled publish skipped");
                continue;
            }
            match self.repo.update(&content).await {
                Ok(_) => {
                    self.analytics
                        .track(AnalyticsEvent::ContentStatusChanged {
                            content_id: content.id.clone(),
                            from: ContentStatus::Approved,
                            to: ContentStatus::Published,
                        })
                        .await;
                    published.push(content.id);
                }
                Err(e) => warn!(content_id = %content.id, error = %e, "scheduled publish failed"),
            }
        }
        if !published.is_empty() {
            info!(count = published.len(), "published scheduled content");
        }
        Ok(published)
    }
}
