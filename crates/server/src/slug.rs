//! Slug generation.
//!
//! Slugs are the public-facing identifiers for articles and categories:
//! URL-safe, globally unique per table, and stable once created (an edit
//! never regenerates the slug, so shared URLs keep working).

use std::collections::HashSet;

use uuid::Uuid;

/// Convert text into a URL-safe slug.
///
/// Transforms to lowercase, replaces non-alphanumeric characters with hyphens,
/// collapses consecutive hyphens, and trims leading/trailing hyphens.
pub fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    // Collapse consecutive hyphens and trim
    let mut result = String::with_capacity(slug.len());
    let mut prev_was_hyphen = true; // Start true to skip leading hyphens
    for c in slug.chars() {
        if c == '-' {
            if !prev_was_hyphen {
                result.push('-');
            }
            prev_was_hyphen = true;
        } else {
            result.push(c);
            prev_was_hyphen = false;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    // Truncate to reasonable length without cutting mid-word
    if result.len() > 128 {
        let truncated = &result[..128];
        if let Some(last_hyphen) = truncated.rfind('-') {
            return truncated[..last_hyphen].to_string();
        }
        return truncated.to_string();
    }

    result
}

/// Pick a slug that does not collide with any of `existing`.
///
/// Tries the base first, then numeric suffixes, then falls back to a UUID
/// fragment for guaranteed uniqueness. Empty bases (e.g. a pure non-ASCII
/// title) become a bare UUID fragment.
pub fn disambiguate(base: &str, existing: &HashSet<String>) -> String {
    if base.is_empty() {
        return Uuid::now_v7().to_string()[..8].to_string();
    }

    if !existing.contains(base) {
        return base.to_string();
    }

    for i in 1..100 {
        let candidate = format!("{base}-{i}");
        if !existing.contains(&candidate) {
            return candidate;
        }
    }

    let fragment = &Uuid::now_v7().to_string()[..8];
    format!("{base}-{fragment}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Pontigram Meraih Juara"), "pontigram-meraih-juara");
    }

    #[test]
    fn slugify_special_chars() {
        assert_eq!(slugify("What's New?"), "what-s-new");
        assert_eq!(slugify("Liga #1: Hasil Akhir"), "liga-1-hasil-akhir");
    }

    #[test]
    fn slugify_consecutive_hyphens() {
        assert_eq!(slugify("hello   world"), "hello-world");
        assert_eq!(slugify("a---b"), "a-b");
    }

    #[test]
    fn slugify_leading_trailing() {
        assert_eq!(slugify("  hello  "), "hello");
        assert_eq!(slugify("---hello---"), "hello");
    }

    #[test]
    fn slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slugify_long_text() {
        let long_title = "a".repeat(200);
        assert!(slugify(&long_title).len() <= 128);
    }

    #[test]
    fn slugify_is_deterministic() {
        assert_eq!(slugify("Breaking: Flood in Pontianak"), slugify("Breaking: Flood in Pontianak"));
    }

    #[test]
    fn disambiguate_no_collision() {
        let existing = HashSet::new();
        assert_eq!(disambiguate("my-post", &existing), "my-post");
    }

    #[test]
    fn disambiguate_single_collision() {
        let existing: HashSet<String> = ["my-post".to_string()].into();
        assert_eq!(disambiguate("my-post", &existing), "my-post-1");
    }

    #[test]
    fn disambiguate_multiple_collisions() {
        let existing: HashSet<String> =
            ["my-post".to_string(), "my-post-1".to_string(), "my-post-2".to_string()].into();
        assert_eq!(disambiguate("my-post", &existing), "my-post-3");
    }

    #[test]
    fn disambiguate_exhausted_suffixes_falls_back_to_fragment() {
        let mut existing: HashSet<String> = ["my-post".to_string()].into();
        for i in 1..100 {
            existing.insert(format!("my-post-{i}"));
        }
        let slug = disambiguate("my-post", &existing);
        assert!(slug.starts_with("my-post-"));
        assert!(!existing.contains(&slug));
    }

    #[test]
    fn disambiguate_empty_base() {
        let slug = disambiguate("", &HashSet::new());
        assert_eq!(slug.len(), 8);
    }
}
