use md5::Context;

/// Prefix for content ids derived from a feed item fingerprint.
pub const SYNDICATED_ID_PREFIX: &str = "rss_";

const ID_HEX_LEN: usize = 12;
const SHORT_ID_HEX_LEN: usize = 8;

/// Stable hash identifying a syndicated item.
///
/// Only the title, link and raw publish date take part, so two copies of the
/// same entry whose description or body differ still collide.
pub fn fingerprint(title: &str, link: &str, published_raw: &str) -> String {
    let mut hasher = Context::new();
    hasher.consume(title.as_bytes());
    hasher.consume(link.as_bytes());
    hasher.consume(published_raw.as_bytes());
    format!("{:x}", hasher.compute())
}

pub fn content_id_from_fingerprint(fingerprint: &str) -> String {
    let hex: String = fingerprint.chars().take(ID_HEX_LEN).collect();
    format!("{SYNDICATED_ID_PREFIX}{hex}")
}

/// Short id for tags and authors resolved by name.
pub fn id_from_string(value: &str) -> String {
    let digest = format!("{:x}", md5::compute(value.as_bytes()));
    digest[..SHORT_ID_HEX_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint("Post", "https://x.com/p1", "2024-01-01");
        let b = fingerprint("Post", "https://x.com/p1", "2024-01-01");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_changes_with_each_field() {
        let base = fingerprint("Post", "https://x.com/p1", "2024-01-01");
        assert_ne!(base, fingerprint("Post 2", "https://x.com/p1", "2024-01-01"));
        assert_ne!(base, fingerprint("Post", "https://x.com/p2", "2024-01-01"));
        assert_ne!(base, fingerprint("Post", "https://x.com/p1", "2024-01-02"));
    }

    #[test]
    fn test_content_id_uses_fingerprint_prefix() {
        let fp = fingerprint("Post", "https://x.com/p1", "2024-01-01");
        let id = content_id_from_fingerprint(&fp);
        assert_eq!(id, format!("rss_{}", &fp[..12]));
        assert_eq!(id, content_id_from_fingerprint(&fp));
    }

    #[test]
    fn test_id_from_string() {
        let id = id_from_string("rust");
        assert_eq!(id.len(), 8);
        assert_eq!(id, id_from_string("rust"));
        assert_ne!(id, id_from_string("Rust"));
    }
}
