//! Slug generation, slug validation, and language-code helpers.

use crate::error::CoreError;

/// Maximum length of a generated slug.
pub const MAX_SLUG_LEN: usize = 80;

/// Language codes the store recognises. Group slugs must not collide with
/// these, since a leading path segment is otherwise ambiguous.
pub const KNOWN_LANGUAGE_CODES: &[&str] = &[
    "ar", "cs", "da", "de", "el", "en", "es", "fi", "fr", "he", "hi", "hu", "id", "it", "ja", "ko",
    "nl", "no", "pl", "pt", "ro", "ru", "sk", "sv", "th", "tr", "uk", "vi", "zh",
];

/// Whether `s` is a recognised language code.
pub fn is_language_code(s: &str) -> bool {
    KNOWN_LANGUAGE_CODES.contains(&s)
}

// ---------------------------------------------------------------------------
// Slug generation
// ---------------------------------------------------------------------------

/// Generate a URL-safe slug from a free-form title.
///
/// Converts to lowercase, replaces non-alphanumeric characters with hyphens,
/// collapses consecutive hyphens, trims leading/trailing hyphens, and caps
/// the result at [`MAX_SLUG_LEN`] characters.
pub fn generate_slug(title: &str) -> String {
    let raw: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();

    // Collapse consecutive hyphens.
    let mut result = String::with_capacity(raw.len());
    let mut prev_hyphen = false;
    for c in raw.chars() {
        if c == '-' {
            if !prev_hyphen {
                result.push('-');
            }
            prev_hyphen = true;
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    let trimmed = result.trim_matches('-');
    trimmed.chars().take(MAX_SLUG_LEN).collect()
}

/// Generate a slug from `title` that does not collide with `exists`.
///
/// Collisions are resolved by appending `-2`, `-3`, ... to the base slug.
/// An empty base (title with no alphanumeric characters) becomes `"untitled"`.
pub fn unique_slug(title: &str, exists: impl Fn(&str) -> bool) -> String {
    let mut base = generate_slug(title);
    if base.is_empty() {
        base = "untitled".to_string();
    }
    if !exists(&base) {
        return base;
    }
    let mut n = 2u64;
    loop {
        let candidate = format!("{base}-{n}");
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a slug (non-empty, lowercase alphanumeric + hyphens only).
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if slug.is_empty() {
        return Err(CoreError::InvalidSlug("slug must not be empty".into()));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(CoreError::InvalidSlug(format!(
            "slug '{slug}' must contain only lowercase alphanumeric characters and hyphens"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
