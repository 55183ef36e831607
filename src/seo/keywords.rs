use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static WORD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}']+").unwrap());

const MIN_KEYWORD_LEN: usize = 4;

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "because", "been", "before", "being",
    "below", "between", "both", "could", "does", "doing", "down", "during", "each", "from",
    "further", "have", "having", "here", "into", "itself", "just", "more", "most", "much", "only",
    "other", "over", "same", "should", "some", "such", "than", "that", "their", "theirs", "them",
    "then", "there", "these", "they", "this", "those", "through", "under", "until", "very",
    "were", "what", "when", "where", "which", "while", "whom", "will", "with", "would", "your",
    "yours", "yourself",
];

/// Most frequent words longer than three characters, stopwords excluded.
/// Ties keep first-occurrence order.
pub fn extract_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, m) in WORD_REGEX.find_iter(text).enumerate() {
        let word = m.as_str().trim_matches('\'').to_lowercase();
        if word.chars().count() < MIN_KEYWORD_LEN
            || STOPWORDS.contains(&word.as_str())
            || word.chars().all(|c| c.is_numeric())
        {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    ranked.into_iter().take(limit).map(|(word, _)| word).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_by_frequency_then_position() {
        let text = "Rust makes systems programming pleasant. Rust tooling is great, and \
                    systems people like Rust.";
        assert_eq!(
            extract_keywords(text, 3),
            vec!["rust".to_string(), "systems".to_string(), "makes".to_string()]
        );
    }

    #[test]
    fn test_skips_short_words_and_stopwords() {
        let keywords = extract_keywords("the and but this that with 2024 code code", 5);
        assert_eq!(keywords, vec!["code".to_string()]);
        assert!(extract_keywords("", 5).is_empty());
    }
}
