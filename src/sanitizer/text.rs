use regex::Regex;
use scraper::{ElementRef, Html, node::Node};
use std::sync::LazyLock;

pub const WORDS_PER_MINUTE: usize = 200;

const ELLIPSIS: &str = "...";

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

// Elements whose boundaries separate words even without surrounding whitespace.
const BREAKING_TAGS: &[&str] = &[
    "p", "br", "hr", "div", "section", "article", "header", "footer", "aside", "nav", "figure",
    "figcaption", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre", "ul", "ol", "li", "dl",
    "dt", "dd", "table", "caption", "thead", "tbody", "tfoot", "tr", "th", "td", "img",
];

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Visible text of an HTML fragment, whitespace-normalized.
pub fn to_plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    collect_text(fragment.root_element(), &mut out);
    normalize_whitespace(&out)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if SKIPPED_TAGS.contains(&name) {
                    continue;
                }
                let breaking = BREAKING_TAGS.contains(&name);
                if breaking {
                    out.push(' ');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if breaking {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Cut `text` so that the result, ellipsis included, is at most `max_len`
/// characters. The cut backs off to the last whitespace when it would split
/// a word. Text that already fits is returned unchanged.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len <= ELLIPSIS.len() {
        return text.chars().take(max_len).collect();
    }

    let budget = max_len - ELLIPSIS.len();
    let cut: String = text.chars().take(budget).collect();
    let at_boundary = text.chars().nth(budget).is_some_and(char::is_whitespace);

    let kept = if at_boundary {
        cut.as_str()
    } else {
        match cut.rfind(char::is_whitespace) {
            Some(idx) if idx > 0 => &cut[..idx],
            _ => cut.as_str(),
        }
    };

    format!("{}{ELLIPSIS}", kept.trim_end())
}

pub fn word_count(plain_text: &str) -> usize {
    plain_text.split_whitespace().count()
}

/// Minutes at [`WORDS_PER_MINUTE`], rounded up.
pub fn reading_time(word_count: usize) -> u32 {
    word_count.div_ceil(WORDS_PER_MINUTE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Hello    world  \n\n\n  Test  "),
            "Hello world Test"
        );
    }

    #[test]
    fn test_plain_text_separates_blocks() {
        let text = to_plain_text("<h1>Title</h1><p>First <b>bold</b> para.</p><p>Second</p>");
        assert_eq!(text, "Title First bold para. Second");
    }

    #[test]
    fn test_plain_text_skips_scripts_and_decodes_entities() {
        let text = to_plain_text("<p>Fish &amp; chips</p><script>var x = 1;</script>");
        assert_eq!(text, "Fish & chips");
    }

    #[test]
    fn test_plain_text_of_plain_input() {
        assert_eq!(to_plain_text("just some words"), "just some words");
        assert_eq!(to_plain_text(""), "");
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("short text", 20), "short text");
    }

    #[test]
    fn test_truncate_backs_off_to_word_boundary() {
        let out = truncate("The quick brown fox jumps over the lazy dog", 20);
        assert_eq!(out, "The quick brown...");
        assert!(out.chars().count() <= 20);
    }

    #[test]
    fn test_truncate_cut_on_space() {
        // budget of 9 lands exactly before a space
        assert_eq!(truncate("The quick brown fox", 12), "The quick...");
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let text = "word ".repeat(100);
        let once = truncate(&text, 300);
        assert!(once.chars().count() <= 300);
        assert_eq!(truncate(&once, 300), once);
    }

    #[test]
    fn test_truncate_without_whitespace() {
        let out = truncate(&"x".repeat(50), 10);
        assert_eq!(out, "xxxxxxx...");
    }

    #[test]
    fn test_reading_time_rounds_up() {
        assert_eq!(reading_time(0), 0);
        assert_eq!(reading_time(1), 1);
        assert_eq!(reading_time(200), 1);
        assert_eq!(reading_time(351), 2);
    }
}
