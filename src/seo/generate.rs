use unicode_normalization::UnicodeNormalization;

use crate::sanitizer::{normalize_whitespace, truncate};

pub const MAX_SLUG_LEN: usize = 60;
pub const MAX_SEO_TITLE_LEN: usize = 60;
pub const MAX_SEO_DESCRIPTION_LEN: usize = 160;

/// URL-safe slug over `[a-z0-9-]`, at most [`MAX_SLUG_LEN`] characters, cut
/// on a dash when it has to be shortened. Accents are folded to ASCII.
pub fn generate_seo_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if c == '\'' {
            continue;
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    let slug = slug.trim_end_matches('-');
    if slug.len() <= MAX_SLUG_LEN {
        return slug.to_string();
    }

    let cut = &slug[..MAX_SLUG_LEN];
    let on_boundary = slug.as_bytes()[MAX_SLUG_LEN] == b'-';
    let cut = match cut.rfind('-') {
        Some(idx) if !on_boundary && idx > 0 => &cut[..idx],
        _ => cut,
    };
    cut.trim_end_matches('-').to_string()
}

/// Search title: the primary keyword is prefixed when the title lacks it,
/// then the result is capped at [`MAX_SEO_TITLE_LEN`].
pub fn generate_seo_title(title: &str, keywords: &[String]) -> String {
    let title = normalize_whitespace(title);
    let keyword = keywords
        .first()
        .map(|k| normalize_whitespace(k))
        .filter(|k| !k.is_empty());

    let candidate = match keyword {
        Some(kw) if !title.to_lowercase().contains(&kw.to_lowercase()) => {
            if title.is_empty() {
                kw
            } else {
                format!("{kw}: {title}")
            }
        }
        _ => title,
    };

    truncate(&candidate, MAX_SEO_TITLE_LEN)
}

/// Search description from arbitrary text, capped at
/// [`MAX_SEO_DESCRIPTION_LEN`].
pub fn generate_seo_description(text: &str) -> String {
    truncate(&normalize_whitespace(text), MAX_SEO_DESCRIPTION_LEN)
}
