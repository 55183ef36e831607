use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use syndicator::{
    content::{
        Content, ContentError, ContentFormData, ContentManager, ContentStatus, ContentVersion,
        Transition, lifecycle,
    },
    repositories::{ContentRepository, InMemoryContentRepository, RepositoryError},
    syndication::{Analytics, TracingAnalytics},
};

fn manager() -> ContentManager {
    ContentManager::new(
        Arc::new(InMemoryContentRepository::new()),
        Analytics::new(vec![Arc::new(TracingAnalytics)]),
    )
}

fn hello_world() -> ContentFormData {
    ContentFormData {
        title: Some("Hello World".into()),
        body: Some(format!("<h1>Hi</h1><p>{}</p>", "word ".repeat(350))),
        seo_keywords: Some(vec!["hello".into()]),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_content_scores_length_and_keywords() {
    let content = manager()
        .create_content(hello_world(), "author1", true)
        .await
        .unwrap();

    assert!((349..=352).contains(&content.word_count));
    assert_eq!(content.reading_time, 2);
    assert_eq!(content.status, ContentStatus::Draft);
    assert_eq!(content.version, 1);

    let analysis = content.ai_analysis.expect("analysis requested");
    assert!(analysis.quality_score >= 70);
    assert!(analysis.seo_score > 50);
    assert!(analysis.keywords.contains(&"word".to_string()));
}

#[tokio::test]
async fn test_update_unknown_id_is_rejected() {
    let err = manager()
        .update_content("does-not-exist", ContentFormData::default(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, ContentError::NotFound(_)));
    assert!(err.to_string().contains("Content not found"));
}

#[tokio::test]
async fn test_version_grows_by_one_per_update() {
    let manager = manager();
    let content = manager.create_content(hello_world(), "a", false).await.unwrap();

    let updates = 5;
    for i in 0..updates {
        let form = ContentFormData {
            description: Some(format!("revision {i}")),
            expected_version: Some(1 + i),
            ..Default::default()
        };
        manager.update_content(&content.id, form, i % 2 == 0).await.unwrap();
    }

    let stored = manager.get_content(&content.id).await.unwrap();
    assert_eq!(stored.version, 1 + updates);
    assert_eq!(stored.description, "revision 4");
    assert_eq!(stored.versions.len(), 3);
    let snapshot_versions: Vec<u32> = stored.versions.iter().map(|v| v.version).collect();
    assert_eq!(snapshot_versions, vec![1, 3, 5]);
}

#[tokio::test]
async fn test_published_iff_published_at_across_transitions() {
    let manager = manager();
    let content = manager.create_content(hello_world(), "a", false).await.unwrap();
    let id = content.id.clone();

    let check = |c: &syndicator::content::Content| {
        assert_eq!(c.status == ContentStatus::Published, c.published_at.is_some());
    };

    check(&manager.schedule_content(&id, Utc::now() + Duration::days(1)).await.unwrap());
    check(&manager.publish_content(&id).await.unwrap());
    check(&manager.unpublish_content(&id).await.unwrap());
    check(&manager.publish_content(&id).await.unwrap());
    check(&manager.archive_content(&id).await.unwrap());
    check(&manager.restore_content(&id).await.unwrap());

    let outcome = manager
        .bulk_update_status(&[id.clone()], ContentStatus::Published)
        .await;
    assert!(outcome.is_complete());
    check(&manager.get_content(&id).await.unwrap());

    let edited = manager
        .update_content(
            &id,
            ContentFormData {
                status: Some(ContentStatus::Archived),
                ..Default::default()
            },
            false,
        )
        .await
        .unwrap();
    check(&edited);
}

#[tokio::test]
async fn test_markdown_authoring() {
    let form = ContentFormData {
        title: Some("Markdown post".into()),
        body: Some("# Heading\n\n- one\n- two\n\nSee [docs](https://docs.rs).".into()),
        body_format: Some(syndicator::content::BodyFormat::Markdown),
        ..Default::default()
    };
    let content = manager().create_content(form, "a", true).await.unwrap();

    assert!(content.body.html.contains("<h1>Heading</h1>"));
    assert!(content.body.html.contains(r#"<a href="https://docs.rs">docs</a>"#));
    assert_eq!(content.body.structured.headings.len(), 1);
    assert!(content.body.raw.starts_with("# Heading"));
}

/// Store that, once armed, publishes the record just before the next write
/// lands, as a second editor would.
#[derive(Default)]
struct PublishBeforeWrite {
    inner: InMemoryContentRepository,
    armed: AtomicBool,
}

#[async_trait]
impl ContentRepository for PublishBeforeWrite {
    async fn get(&self, id: &str) -> Result<Option<Content>, RepositoryError> {
        self.inner.get(id).await
    }

    async fn create(&self, content: &Content) -> Result<(), RepositoryError> {
        self.inner.create(content).await
    }

    async fn update(&self, content: &Content) -> Result<u64, RepositoryError> {
        if self.armed.swap(false, Ordering::SeqCst) {
            let mut current = self.inner.get(&content.id).await?.expect("record stored");
            lifecycle::apply(&mut current, Transition::Publish, Utc::now()).expect("draft publishes");
            self.inner.update(&current).await?;
        }
        self.inner.update(content).await
    }

    async fn delete(&self, id: &str) -> Result<bool, RepositoryError> {
        self.inner.delete(id).await
    }

    async fn list_fingerprints(&self, feed_id: &str) -> Result<HashSet<String>, RepositoryError> {
        self.inner.list_fingerprints(feed_id).await
    }

    async fn append_version(
        &self,
        content_id: &str,
        version: &ContentVersion,
    ) -> Result<(), RepositoryError> {
        self.inner.append_version(content_id, version).await
    }

    async fn list_due_scheduled(&self, now: DateTime<Utc>) -> Result<Vec<Content>, RepositoryError> {
        self.inner.list_due_scheduled(now).await
    }
}

#[tokio::test]
async fn test_edit_racing_a_publish_is_rejected() {
    let repo = Arc::new(PublishBeforeWrite::default());
    let manager = ContentManager::new(repo.clone(), Analytics::disabled());
    let created = manager.create_content(hello_world(), "a", false).await.unwrap();

    repo.armed.store(true, Ordering::SeqCst);
    let err = manager
        .update_content(
            &created.id,
            ContentFormData {
                title: Some("Edited".into()),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentError::ConcurrentWrite { expected: 0, actual: 1, .. }));

    let stored = manager.get_content(&created.id).await.unwrap();
    assert_eq!(stored.status, ContentStatus::Published);
    assert!(stored.published_at.is_some());
    assert_eq!(stored.title, "Hello World");
    assert_eq!(stored.version, 1);
    assert!(stored.versions.is_empty());

    let retried = manager
        .update_content(
            &created.id,
            ContentFormData {
                title: Some("Edited".into()),
                ..Default::default()
            },
            true,
        )
        .await
        .unwrap();
    assert_eq!(retried.status, ContentStatus::Published);
    assert_eq!(retried.version, 2);
    assert_eq!(retried.versions.len(), 1);
}
