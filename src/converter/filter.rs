use crate::feeds::{FeedItem, RssFeed};

/// Keyword policy of a feed applied to one item.
///
/// Matching is a case-insensitive substring test over the item's content and
/// description. A non-empty include list requires at least one hit; any
/// exclude hit rejects the item.
pub fn should_process(item: &FeedItem, feed: &RssFeed) -> bool {
    let haystack = format!(
        "{} {}",
        item.content.as_deref().unwrap_or_default(),
        item.description
    )
    .to_lowercase();

    let mentions = |keyword: &String| {
        let keyword = keyword.trim().to_lowercase();
        !keyword.is_empty() && haystack.contains(&keyword)
    };

    let includes: Vec<&String> = feed
        .include_keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .collect();
    if !includes.is_empty() && !includes.into_iter().any(mentions) {
        return false;
    }

    !feed.exclude_keywords.iter().any(mentions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(description: &str, content: Option<&str>) -> FeedItem {
        let item = FeedItem::new("g", "Title", "https://x.com/p", Some("2024-01-01"))
            .with_description(description);
        match content {
            Some(c) => item.with_content(c),
            None => item,
        }
    }

    fn feed(include: &[&str], exclude: &[&str]) -> RssFeed {
        let mut feed = RssFeed::new("f", "https://x.com/feed", "X");
        feed.include_keywords = include.iter().map(|s| s.to_string()).collect();
        feed.exclude_keywords = exclude.iter().map(|s| s.to_string()).collect();
        feed
    }

    #[test]
    fn test_no_keywords_accepts_everything() {
        assert!(should_process(&item("anything", None), &feed(&[], &[])));
        assert!(should_process(&item("anything", None), &feed(&["  "], &[""])));
    }

    #[test]
    fn test_include_requires_a_match() {
        let f = feed(&["Rust", "tokio"], &[]);
        assert!(should_process(&item("Learning RUST today", None), &f));
        assert!(should_process(&item("", Some("<p>Tokio internals</p>")), &f));
        assert!(!should_process(&item("Go generics", None), &f));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let f = feed(&["rust"], &["sponsored"]);
        assert!(!should_process(&item("Rust post (Sponsored)", None), &f));
        assert!(should_process(&item("Rust post", None), &f));
    }

    #[test]
    fn test_title_alone_does_not_match() {
        let f = feed(&["title"], &[]);
        assert!(!should_process(&item("body text", None), &f));
    }
}
