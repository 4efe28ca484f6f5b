//! The path codec: on-disk layouts and free-form identifier parsing.
//!
//! Two directory layouts exist per group mode:
//!
//! - timestamp: `{group}/{YYYY-MM-DD}/{HH:MM}/v{N}/{language}.md`
//! - slug:      `{group}/{slug}/v{N}/{language}.md`
//!
//! Legacy posts predate versioning and omit the `v{N}` segment, keeping
//! language files directly under the post directory.

use std::path::{Path, PathBuf};

use crate::types::GroupMode;

/// File extension of content files.
pub const CONTENT_EXT: &str = "md";

// ---------------------------------------------------------------------------
// PostId
// ---------------------------------------------------------------------------

/// Identity of a post within its group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostId {
    /// Slug-mode identity, a single path segment.
    Slug(String),
    /// Timestamp-mode identity: a `YYYY-MM-DD` date and `HH:MM` time pair,
    /// spanning two path segments.
    Stamp { date: String, time: String },
}

impl PostId {
    /// Interpret a base identifier under the given group mode.
    ///
    /// Timestamp mode expects `date/time`; anything else is rejected.
    pub fn from_base_id(mode: GroupMode, base: &str) -> Option<Self> {
        match mode {
            GroupMode::Slug => {
                if base.is_empty() || base.contains('/') {
                    None
                } else {
                    Some(Self::Slug(base.to_string()))
                }
            }
            GroupMode::Timestamp => {
                let (date, time) = base.split_once('/')?;
                if is_date_segment(date) && is_time_segment(time) {
                    Some(Self::Stamp {
                        date: date.to_string(),
                        time: time.to_string(),
                    })
                } else {
                    None
                }
            }
        }
    }

    /// The canonical base identifier (`slug` or `date/time`).
    pub fn base_id(&self) -> String {
        match self {
            Self::Slug(s) => s.clone(),
            Self::Stamp { date, time } => format!("{date}/{time}"),
        }
    }

    /// Path of the post directory relative to the group directory.
    pub fn rel_dir(&self) -> PathBuf {
        match self {
            Self::Slug(s) => PathBuf::from(s),
            Self::Stamp { date, time } => PathBuf::from(date).join(time),
        }
    }
}

// ---------------------------------------------------------------------------
// Path building
// ---------------------------------------------------------------------------

/// Directory name of a version, e.g. `v3`.
pub fn version_dir_name(version: i64) -> String {
    format!("v{version}")
}

/// Parse a `v{N}` directory name. Returns `None` for anything else.
pub fn parse_version_dir(name: &str) -> Option<i64> {
    let digits = name.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = digits.parse().ok()?;
    if n >= 1 {
        Some(n)
    } else {
        None
    }
}

/// File name of a language content file, e.g. `en.md`.
pub fn content_file_name(language: &str) -> String {
    format!("{language}.{CONTENT_EXT}")
}

/// Parse a `{language}.md` file name back into the language code.
pub fn parse_content_file(name: &str) -> Option<String> {
    let stem = name.strip_suffix(&format!(".{CONTENT_EXT}"))?;
    if stem.is_empty() || stem.contains('.') {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Absolute directory of a post.
pub fn post_dir(root: &Path, group_slug: &str, id: &PostId) -> PathBuf {
    root.join(group_slug).join(id.rel_dir())
}

/// Absolute directory of a post version.
pub fn version_dir(root: &Path, group_slug: &str, id: &PostId, version: i64) -> PathBuf {
    post_dir(root, group_slug, id).join(version_dir_name(version))
}

/// Absolute path of a language content file.
///
/// `version = None` addresses the legacy (non-versioned) layout where
/// language files sit directly in the post directory.
pub fn content_path(
    root: &Path,
    group_slug: &str,
    id: &PostId,
    version: Option<i64>,
    language: &str,
) -> PathBuf {
    let dir = match version {
        Some(v) => version_dir(root, group_slug, id, v),
        None => post_dir(root, group_slug, id),
    };
    dir.join(content_file_name(language))
}

// ---------------------------------------------------------------------------
// Identifier parsing
// ---------------------------------------------------------------------------

/// A free-form post identifier decomposed into its parts.
///
/// Missing parts default downstream to "latest version" and "the group's
/// configured language" respectively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedIdentifier {
    /// `slug` or `YYYY-MM-DD/HH:MM`.
    pub base_id: String,
    pub version: Option<i64>,
    pub language: Option<String>,
}

/// Parse a free-form identifier.
///
/// Accepts a plain slug, a `slug/vN/lang.md` suffix form, or a
/// `date/time[/vN/lang.md]` form. Unrecognisable trailing segments degrade
/// gracefully to a plain-slug interpretation of the whole identifier.
pub fn parse_identifier(raw: &str) -> ParsedIdentifier {
    let trimmed = raw.trim_matches('/');
    let plain = ParsedIdentifier {
        base_id: trimmed.to_string(),
        version: None,
        language: None,
    };
    if trimmed.is_empty() {
        return plain;
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    let (base_id, rest): (String, &[&str]) =
        if segments.len() >= 2 && is_date_segment(segments[0]) && is_time_segment(segments[1]) {
            (format!("{}/{}", segments[0], segments[1]), &segments[2..])
        } else {
            (segments[0].to_string(), &segments[1..])
        };

    match rest {
        [] => ParsedIdentifier {
            base_id,
            version: None,
            language: None,
        },
        [v] if parse_version_dir(v).is_some() => ParsedIdentifier {
            base_id,
            version: parse_version_dir(v),
            language: None,
        },
        // A bare language file addresses the legacy layout.
        [f] if parse_content_file(f).is_some() => ParsedIdentifier {
            base_id,
            version: None,
            language: parse_content_file(f),
        },
        [v, f] if parse_version_dir(v).is_some() && parse_content_file(f).is_some() => {
            ParsedIdentifier {
                base_id,
                version: parse_version_dir(v),
                language: parse_content_file(f),
            }
        }
        _ => plain,
    }
}

/// Whether `s` looks like a `YYYY-MM-DD` date segment.
pub fn is_date_segment(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}

/// Whether `s` looks like an `HH:MM` time segment.
pub fn is_time_segment(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 5
        && b[..2].iter().all(u8::is_ascii_digit)
        && b[2] == b':'
        && b[3..5].iter().all(u8::is_ascii_digit)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    // -- path building -------------------------------------------------------

    #[test]
    fn slug_mode_content_path() {
        let id = PostId::Slug("hello-world".into());
        let path = content_path(Path::new("/content"), "blog", &id, Some(1), "en");
        assert_eq!(path, PathBuf::from("/content/blog/hello-world/v1/en.md"));
    }

    #[test]
    fn timestamp_mode_content_path() {
        let id = PostId::Stamp {
            date: "2025-01-15".into(),
            time: "09:30".into(),
        };
        let path = content_path(Path::new("/content"), "news", &id, Some(2), "de");
        assert_eq!(
            path,
            PathBuf::from("/content/news/2025-01-15/09:30/v2/de.md")
        );
    }

    #[test]
    fn legacy_layout_omits_version_segment() {
        let id = PostId::Slug("old-post".into());
        let path = content_path(Path::new("/content"), "blog", &id, None, "en");
        assert_eq!(path, PathBuf::from("/content/blog/old-post/en.md"));
    }

    // -- version / file name parsing -----------------------------------------

    #[test]
    fn version_dir_round_trip() {
        assert_eq!(parse_version_dir(&version_dir_name(7)), Some(7));
    }

    #[test]
    fn version_dir_rejects_garbage() {
        assert_eq!(parse_version_dir("v"), None);
        assert_eq!(parse_version_dir("v0"), None);
        assert_eq!(parse_version_dir("v1x"), None);
        assert_eq!(parse_version_dir("en.md"), None);
    }

    #[test]
    fn content_file_round_trip() {
        assert_eq!(parse_content_file(&content_file_name("en")), Some("en".into()));
        assert_eq!(parse_content_file("notes.txt"), None);
        assert_eq!(parse_content_file(".md"), None);
    }

    // -- PostId --------------------------------------------------------------

    #[test]
    fn post_id_from_base_id_slug_mode() {
        let id = PostId::from_base_id(GroupMode::Slug, "hello").unwrap();
        assert_eq!(id, PostId::Slug("hello".into()));
        assert!(PostId::from_base_id(GroupMode::Slug, "a/b").is_none());
    }

    #[test]
    fn post_id_from_base_id_timestamp_mode() {
        let id = PostId::from_base_id(GroupMode::Timestamp, "2025-01-15/09:30").unwrap();
        assert_eq!(id.base_id(), "2025-01-15/09:30");
        assert!(PostId::from_base_id(GroupMode::Timestamp, "hello").is_none());
    }

    // -- parse_identifier ----------------------------------------------------

    #[test]
    fn parse_plain_slug() {
        let parsed = parse_identifier("hello-world");
        assert_eq!(parsed.base_id, "hello-world");
        assert_eq!(parsed.version, None);
        assert_eq!(parsed.language, None);
    }

    #[test]
    fn parse_slug_with_version_and_language() {
        let parsed = parse_identifier("hello-world/v3/de.md");
        assert_eq!(parsed.base_id, "hello-world");
        assert_eq!(parsed.version, Some(3));
        assert_eq!(parsed.language.as_deref(), Some("de"));
    }

    #[test]
    fn parse_slug_with_version_only() {
        let parsed = parse_identifier("hello-world/v2");
        assert_eq!(parsed.version, Some(2));
        assert_eq!(parsed.language, None);
    }

    #[test]
    fn parse_timestamp_forms() {
        let parsed = parse_identifier("2025-01-15/09:30");
        assert_eq!(parsed.base_id, "2025-01-15/09:30");
        assert_eq!(parsed.version, None);

        let parsed = parse_identifier("2025-01-15/09:30/v1/en.md");
        assert_eq!(parsed.base_id, "2025-01-15/09:30");
        assert_eq!(parsed.version, Some(1));
        assert_eq!(parsed.language.as_deref(), Some("en"));
    }

    #[test]
    fn parse_legacy_language_file_without_version() {
        let parsed = parse_identifier("hello-world/en.md");
        assert_eq!(parsed.base_id, "hello-world");
        assert_eq!(parsed.version, None);
        assert_eq!(parsed.language.as_deref(), Some("en"));
    }

    #[test]
    fn unparseable_suffix_degrades_to_plain_slug() {
        let parsed = parse_identifier("hello/world/extra/bits");
        assert_eq!(parsed.base_id, "hello/world/extra/bits");
        assert_eq!(parsed.version, None);
        assert_eq!(parsed.language, None);
    }

    #[test]
    fn surrounding_slashes_are_trimmed() {
        let parsed = parse_identifier("/hello-world/");
        assert_eq!(parsed.base_id, "hello-world");
    }
}
