use std::sync::Arc;
use std::time::Duration;

use syndicator::{
    feeds::RssFeed,
    repositories::{ContentRepository, InMemoryContentRepository},
    syndication::{Analytics, HttpFeedSource, SyndicationOrchestrator},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn rss(prefix: &str, count: usize) -> String {
    let items: String = (1..=count)
        .map(|i| {
            format!(
                "<item><guid>{prefix}-{i}</guid><title>{prefix} post {i}</title>\
                 <link>https://{prefix}.example.com/{i}</link>\
                 <pubDate>0{i} Jan 2024 10:00:00 +0000</pubDate>\
                 <description>Post {i} from {prefix}</description></item>"
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>{prefix}</title><link>https://{prefix}.example.com</link><description>d</description>{items}</channel></rss>"#
    )
}

async fn mount_feed(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.into_bytes())
                .insert_header("Content-Type", "application/rss+xml; charset=utf-8"),
        )
        .mount(server)
        .await;
}

fn feed(server: &MockServer, id: &str) -> RssFeed {
    RssFeed::new(id, format!("{}/{id}.xml", server.uri()), id)
}

fn orchestrator(repo: Arc<InMemoryContentRepository>, max_retries: u32) -> SyndicationOrchestrator {
    let source = HttpFeedSource::new(Duration::from_secs(5), max_retries)
        .with_base_backoff(Duration::from_millis(10));
    SyndicationOrchestrator::new(Arc::new(source), repo, Analytics::disabled())
}

#[tokio::test]
async fn test_failing_feed_does_not_affect_siblings() {
    let server = MockServer::start().await;
    mount_feed(&server, "/feed-a.xml", rss("a", 2)).await;
    mount_feed(&server, "/feed-c.xml", rss("c", 3)).await;
    Mock::given(method("GET"))
        .and(path("/feed-b.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let repo = Arc::new(InMemoryContentRepository::new());
    let orchestrator = orchestrator(repo, 0);
    let feeds = vec![feed(&server, "feed-a"), feed(&server, "feed-b"), feed(&server, "feed-c")];

    let results = orchestrator.process_feeds_in_batch(&feeds, true, 2).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results["feed-a"].len(), 2);
    assert!(results["feed-b"].is_empty());
    assert_eq!(results["feed-c"].len(), 3);
    assert_eq!(results["feed-c"][0].title, "c post 1");
}

#[tokio::test]
async fn test_retriable_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_feed(&server, "/flaky.xml", rss("flaky", 1)).await;

    let repo = Arc::new(InMemoryContentRepository::new());
    let report = orchestrator(repo.clone(), 2)
        .sync(&[feed(&server, "flaky")], false, 3)
        .await;

    assert_eq!(report.failed_feeds(), 0);
    assert_eq!(report.stored(), 1);
    assert_eq!(repo.len(), 1);
}

#[tokio::test]
async fn test_sync_persists_and_dedups_across_runs() {
    let server = MockServer::start().await;
    mount_feed(&server, "/blog.xml", rss("blog", 3)).await;

    let repo = Arc::new(InMemoryContentRepository::new());
    let orchestrator = orchestrator(repo.clone(), 0);
    let mut blog = feed(&server, "blog");
    blog.auto_publish = true;
    let feeds = vec![blog];

    let first = orchestrator.sync(&feeds, false, 3).await;
    assert_eq!(first.stored(), 3);

    let second = orchestrator.sync(&feeds, false, 3).await;
    assert_eq!(second.stored(), 0);
    assert_eq!(second.feed("blog").unwrap().duplicates, 3);

    let fingerprints = repo.list_fingerprints("blog").await.unwrap();
    assert_eq!(fingerprints.len(), 3);
    for content in repo.all() {
        assert!(content.published_at.is_some());
        assert!(content.id.starts_with("rss_"));
    }
}
