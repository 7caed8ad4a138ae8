use regex::Regex;
use std::sync::LazyLock;

static NON_SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 -]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static HYPHEN_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

/// Derives a URL-safe slug from an article title.
///
/// Lowercases, strips everything outside `[a-z0-9 -]`, collapses whitespace
/// runs to single hyphens, collapses repeated hyphens, and trims hyphens at
/// both ends. Pure and idempotent: feeding a derived slug back in returns it
/// unchanged.
pub fn derive_slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUN.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUN.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_hyphenates() {
        assert_eq!(derive_slug("Hello, World!!!"), "hello-world");
    }

    #[test]
    fn collapses_whitespace_and_hyphen_runs() {
        assert_eq!(derive_slug("  A -- B  "), "a-b");
    }

    #[test]
    fn empty_title_yields_empty_slug() {
        assert_eq!(derive_slug(""), "");
    }

    #[test]
    fn all_stripped_title_yields_empty_slug() {
        assert_eq!(derive_slug("!!!"), "");
    }

    #[test]
    fn idempotent_on_derived_slugs() {
        let once = derive_slug("Rust for Blog Authors: A Field Guide (2025)");
        assert_eq!(derive_slug(&once), once);
    }

    #[test]
    fn preserves_digits() {
        assert_eq!(derive_slug("Top 10 Axum Tips"), "top-10-axum-tips");
    }
}
