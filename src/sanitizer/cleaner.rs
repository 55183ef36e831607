use ammonia::{Builder, UrlRelative};
use std::collections::{HashMap, HashSet};
use url::Url;

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "hr", "div", "span", "section", "article", "figure", "figcaption", "h1", "h2",
    "h3", "h4", "h5", "h6", "strong", "b", "em", "i", "u", "s", "sub", "sup", "small", "mark",
    "abbr", "cite", "q", "blockquote", "code", "pre", "kbd", "ul", "ol", "li", "dl", "dt", "dd",
    "a", "img", "table", "caption", "thead", "tbody", "tfoot", "tr", "th", "td",
];

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn builder<'a>(url_relative: UrlRelative) -> Builder<'a> {
    let mut builder = Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect())
        .generic_attributes(HashSet::from(["class"]))
        .tag_attributes(HashMap::from([
            ("a", HashSet::from(["href", "title"])),
            ("img", HashSet::from(["src", "alt", "title", "width", "height"])),
        ]))
        .url_schemes(ALLOWED_SCHEMES.iter().copied().collect())
        .url_relative(url_relative)
        .link_rel(None);
    builder
}

/// Strip everything outside the tag, attribute and scheme allow-lists.
///
/// Disallowed elements are removed (script and style together with their
/// content), relative URLs are kept as written.
pub fn sanitize(html: &str) -> String {
    builder(UrlRelative::PassThrough).clean(html).to_string()
}

/// Same as [`sanitize`], with relative `href`/`src` values rewritten against
/// `base`. Used for syndicated bodies whose links point back at the source.
pub fn sanitize_with_base(html: &str, base: &Url) -> String {
    builder(UrlRelative::RewriteWithBase(base.clone()))
        .clean(html)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_dangerous_elements() {
        let html =
            r#"<p>Hello world</p><script>alert('xss')</script><style>body{color:red}</style>"#;
        let clean = sanitize(html);

        assert!(!clean.contains("<script"));
        assert!(!clean.contains("alert"));
        assert!(!clean.contains("<style"));
        assert!(clean.contains("<p>Hello world</p>"));
    }

    #[test]
    fn test_sanitize_filters_attributes() {
        let html = r#"<p class="lead" style="color:red" onclick="x()">Hi</p><a href="https://example.com" target="_blank" title="t">link</a>"#;
        let clean = sanitize(html);

        assert!(clean.contains(r#"class="lead""#));
        assert!(!clean.contains("style="));
        assert!(!clean.contains("onclick"));
        assert!(!clean.contains("target="));
        assert!(clean.contains(r#"href="https://example.com""#));
        assert!(clean.contains(r#"title="t""#));
    }

    #[test]
    fn test_sanitize_drops_unsafe_schemes() {
        let html = r#"<a href="javascript:alert(1)">bad</a><img src="data:image/png;base64,AAAA" alt="x"><a href="mailto:me@example.com">mail</a>"#;
        let clean = sanitize(html);

        assert!(!clean.contains("javascript:"));
        assert!(!clean.contains("data:image"));
        assert!(clean.contains("mailto:me@example.com"));
    }

    #[test]
    fn test_sanitize_strips_unknown_tags_keeps_text() {
        let clean = sanitize("<custom-widget>inner text</custom-widget><iframe src=\"https://x.com\"></iframe>");
        assert!(!clean.contains("custom-widget"));
        assert!(!clean.contains("iframe"));
        assert!(clean.contains("inner text"));
    }

    #[test]
    fn test_sanitize_keeps_relative_links() {
        let clean = sanitize(r#"<a href="/about">About</a>"#);
        assert!(clean.contains(r#"href="/about""#));
    }

    #[test]
    fn test_sanitize_with_base_resolves_links() {
        let base = Url::parse("https://example.com/article/").unwrap();
        let clean = sanitize_with_base(
            r#"<p><a href="/page">Click here</a></p><img src="image.jpg" alt="test">"#,
            &base,
        );

        assert!(clean.contains("https://example.com/page"));
        assert!(clean.contains("https://example.com/article/image.jpg"));
    }
}
