pub mod cleaner;
pub mod language;
pub mod markdown;
pub mod text;

pub use cleaner::{sanitize, sanitize_with_base};
pub use language::detect_language;
pub use markdown::to_markdown;
pub use text::{normalize_whitespace, reading_time, to_plain_text, truncate, word_count};

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_sanitize_pipeline_never_panics(html in ".*") {
            let clean = sanitize(&html);
            let _ = to_plain_text(&clean);
            let _ = to_markdown(&clean);
            prop_assert!(!clean.contains("<script"));
        }

        #[test]
        fn test_truncate_respects_cap(text in ".*", max_len in 0usize..400) {
            let out = truncate(&text, max_len);
            prop_assert!(out.chars().count() <= max_len);
            prop_assert_eq!(truncate(&out, max_len), out.clone());
        }
    }
}
