//! Quiz slug generation.
//!
//! A slug is the public identifier of a quiz, used in share links such as
//! `/quiz/{slug}`. It is derived from the quiz name and made unique (with high
//! probability) by a short random suffix:
//!
//! ```text
//! "My Quiz!"  ->  "my-quiz"  ->  "my-quiz-3f9a1c"
//! ```

use uuid::Uuid;

/// Number of random characters appended to every generated slug.
pub const SLUG_SUFFIX_LEN: usize = 6;

/// Base used when a name has no characters left after slugification.
pub const FALLBACK_SLUG_BASE: &str = "quiz";

/// Convert a free-text name into a URL-safe slug.
///
/// The name is lower-cased and trimmed, runs of whitespace and underscores
/// become a single `-`, everything outside `[a-z0-9-]` is dropped and repeated
/// hyphens are collapsed.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();

    let mut hyphenated = String::with_capacity(lowered.len());
    let mut in_separator = false;
    for c in lowered.trim().chars() {
        if c.is_whitespace() || c == '_' {
            if !in_separator {
                hyphenated.push('-');
                in_separator = true;
            }
        } else {
            hyphenated.push(c);
            in_separator = false;
        }
    }

    let mut slug = String::with_capacity(hyphenated.len());
    for c in hyphenated.chars() {
        match c {
            'a'..='z' | '0'..='9' => slug.push(c),
            '-' if !slug.ends_with('-') => slug.push('-'),
            _ => {}
        }
    }

    slug
}

/// Produce a random suffix of [`SLUG_SUFFIX_LEN`] lowercase hex characters.
pub fn random_suffix() -> String {
    let mut simple = Uuid::new_v4().simple().to_string();
    simple.truncate(SLUG_SUFFIX_LEN);
    simple
}

/// Generate a slug for a quiz name: `slugify(name)` plus a random suffix.
pub fn generate_slug(name: &str) -> String {
    with_suffix(name, &random_suffix())
}

fn with_suffix(name: &str, suffix: &str) -> String {
    let base = slugify(name);
    let base = if base.is_empty() || base == "-" {
        FALLBACK_SLUG_BASE
    } else {
        base.as_str()
    };
    format!("{}-{}", base, suffix)
}

// =============================================================================
// Tests
// =============================================================================
