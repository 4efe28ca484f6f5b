//! The content codec: frontmatter parse/serialize.
//!
//! A content file is a `---`-delimited block of `key: value` lines followed
//! by a blank line and a free-text body. Only known keys are read; unknown
//! keys are ignored for forward compatibility, and absent keys default so
//! that files written by older revisions of the store still parse.
//!
//! Serialization is deterministic: the required fields (`slug`, `status`,
//! `published_at`) are always written first, optional fields are omitted
//! when null/empty, and the derived title is never written back.

use chrono::SecondsFormat;

use crate::types::{ContentStatus, Timestamp};

/// The frontmatter block delimiter line.
pub const DELIMITER: &str = "---";

// ---------------------------------------------------------------------------
// FrontMatter
// ---------------------------------------------------------------------------

/// The known frontmatter fields of a content file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// The owning post's slug, embedded in every file so a file is
    /// self-describing after a tree relocation.
    pub slug: String,
    pub status: ContentStatus,
    pub published_at: Option<Timestamp>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
    pub created_by: Option<String>,
    pub created_by_email: Option<String>,
    pub updated_by: Option<String>,
    pub updated_by_email: Option<String>,
    /// Content-level custom URL slug, overriding the post slug for lookups.
    pub custom_slug: Option<String>,
    pub description: Option<String>,
    /// Prior URL slugs kept for redirect resolution.
    pub previous_slugs: Vec<String>,
    /// Version bookkeeping: the version number this file belongs to.
    pub version: Option<i64>,
    /// Version bookkeeping: which version this one was branched from.
    pub created_from_version: Option<i64>,
    /// Whether non-live versions of this content may be served externally.
    pub allow_external_versions: bool,
}

/// A parsed content file: frontmatter plus free-text body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentFile {
    pub front: FrontMatter,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a content file.
///
/// A missing or malformed frontmatter block yields default frontmatter with
/// the whole text as body; a parse never fails.
pub fn parse(text: &str) -> ContentFile {
    let mut lines = text.lines();
    match lines.next() {
        Some(first) if first.trim_end() == DELIMITER => {}
        _ => {
            return ContentFile {
                front: FrontMatter::default(),
                body: text.to_string(),
            }
        }
    }

    let mut front = FrontMatter::default();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == DELIMITER {
            closed = true;
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        apply_field(&mut front, key.trim(), value.trim());
    }
    if !closed {
        // Unterminated block: treat the whole text as body.
        return ContentFile {
            front: FrontMatter::default(),
            body: text.to_string(),
        };
    }

    let rest: Vec<&str> = lines.collect();
    // Skip the single blank separator line after the closing delimiter.
    let body_lines = match rest.first() {
        Some(l) if l.trim().is_empty() => &rest[1..],
        _ => &rest[..],
    };
    ContentFile {
        front,
        body: body_lines.join("\n"),
    }
}

fn apply_field(front: &mut FrontMatter, key: &str, value: &str) {
    match key {
        "slug" => front.slug = value.to_string(),
        "status" => {
            // Unknown values keep the draft default.
            if let Some(status) = ContentStatus::from_str(value) {
                front.status = status;
            }
        }
        "published_at" => front.published_at = parse_timestamp(value),
        "created_at" => front.created_at = parse_timestamp(value),
        "updated_at" => front.updated_at = parse_timestamp(value),
        "created_by" => front.created_by = non_empty(value),
        "created_by_email" => front.created_by_email = non_empty(value),
        "updated_by" => front.updated_by = non_empty(value),
        "updated_by_email" => front.updated_by_email = non_empty(value),
        "custom_slug" => front.custom_slug = non_empty(value),
        "description" => front.description = non_empty(value),
        "previous_slugs" => {
            front.previous_slugs = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        "version" => front.version = value.parse().ok(),
        "created_from_version" => front.created_from_version = value.parse().ok(),
        "allow_external_versions" => front.allow_external_versions = value == "true",
        // Unknown keys are ignored on read.
        _ => {}
    }
}

fn parse_timestamp(value: &str) -> Option<Timestamp> {
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&chrono::Utc))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize a content file back to its on-disk text form.
pub fn serialize(file: &ContentFile) -> String {
    let front = &file.front;
    let mut out = String::new();
    out.push_str(DELIMITER);
    out.push('\n');

    // Required fields, always first.
    push_field(&mut out, "slug", &front.slug);
    push_field(&mut out, "status", front.status.as_str());
    match &front.published_at {
        Some(ts) => push_field(&mut out, "published_at", &format_timestamp(ts)),
        None => out.push_str("published_at:\n"),
    }

    push_optional_timestamp(&mut out, "created_at", &front.created_at);
    push_optional_timestamp(&mut out, "updated_at", &front.updated_at);
    push_optional(&mut out, "created_by", &front.created_by);
    push_optional(&mut out, "created_by_email", &front.created_by_email);
    push_optional(&mut out, "updated_by", &front.updated_by);
    push_optional(&mut out, "updated_by_email", &front.updated_by_email);
    push_optional(&mut out, "custom_slug", &front.custom_slug);
    push_optional(&mut out, "description", &front.description);
    if !front.previous_slugs.is_empty() {
        push_field(&mut out, "previous_slugs", &front.previous_slugs.join(","));
    }
    if let Some(v) = front.version {
        push_field(&mut out, "version", &v.to_string());
    }
    if let Some(v) = front.created_from_version {
        push_field(&mut out, "created_from_version", &v.to_string());
    }
    if front.allow_external_versions {
        push_field(&mut out, "allow_external_versions", "true");
    }

    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(&file.body);
    out
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn push_optional(out: &mut String, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        if !v.is_empty() {
            push_field(out, key, v);
        }
    }
}

fn push_optional_timestamp(out: &mut String, key: &str, value: &Option<Timestamp>) {
    if let Some(ts) = value {
        push_field(out, key, &format_timestamp(ts));
    }
}

/// RFC 3339 with second precision, `Z` suffix.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_text() -> &'static str {
        "---\nslug: x\nstatus: draft\npublished_at: 2025-01-01T00:00:00Z\n---\n\n# Hello\nBody text"
    }

    // -- parse ---------------------------------------------------------------

    #[test]
    fn parse_basic_file() {
        let file = parse(sample_text());
        assert_eq!(file.front.slug, "x");
        assert_eq!(file.front.status, ContentStatus::Draft);
        assert_eq!(
            file.front.published_at,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(file.body, "# Hello\nBody text");
    }

    #[test]
    fn parse_without_frontmatter_keeps_body() {
        let file = parse("just a body\nwith lines");
        assert_eq!(file.front, FrontMatter::default());
        assert_eq!(file.body, "just a body\nwith lines");
    }

    #[test]
    fn parse_unterminated_block_is_body() {
        let file = parse("---\nslug: x\nno closing delimiter");
        assert_eq!(file.front, FrontMatter::default());
        assert!(file.body.starts_with("---"));
    }

    #[test]
    fn unknown_keys_ignored() {
        let file = parse("---\nslug: x\nstatus: draft\npublished_at:\nwhatever: 42\n---\n\nbody");
        assert_eq!(file.front.slug, "x");
        assert_eq!(file.body, "body");
    }

    #[test]
    fn absent_fields_take_defaults() {
        let file = parse("---\nslug: x\n---\n\nbody");
        assert_eq!(file.front.status, ContentStatus::Draft);
        assert_eq!(file.front.published_at, None);
        assert!(!file.front.allow_external_versions);
        assert!(file.front.previous_slugs.is_empty());
    }

    #[test]
    fn unknown_status_defaults_to_draft() {
        let file = parse("---\nslug: x\nstatus: live\n---\n\nbody");
        assert_eq!(file.front.status, ContentStatus::Draft);
    }

    #[test]
    fn previous_slugs_split_and_trimmed() {
        let file = parse("---\nslug: x\nprevious_slugs: old-slug, older-slug\n---\n\n");
        assert_eq!(file.front.previous_slugs, vec!["old-slug", "older-slug"]);
    }

    #[test]
    fn bool_flag_parsed() {
        let file = parse("---\nslug: x\nallow_external_versions: true\n---\n\n");
        assert!(file.front.allow_external_versions);
    }

    // -- serialize -----------------------------------------------------------

    #[test]
    fn serialize_writes_required_fields_first() {
        let file = ContentFile {
            front: FrontMatter {
                slug: "x".into(),
                ..Default::default()
            },
            body: "body".into(),
        };
        let text = serialize(&file);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "---");
        assert_eq!(lines[1], "slug: x");
        assert_eq!(lines[2], "status: draft");
        assert!(lines[3].starts_with("published_at:"));
    }

    #[test]
    fn serialize_omits_empty_optionals() {
        let file = ContentFile {
            front: FrontMatter {
                slug: "x".into(),
                ..Default::default()
            },
            body: String::new(),
        };
        let text = serialize(&file);
        assert!(!text.contains("custom_slug"));
        assert!(!text.contains("previous_slugs"));
        assert!(!text.contains("allow_external_versions"));
    }

    // -- round trip ----------------------------------------------------------

    #[test]
    fn round_trip_preserves_known_fields() {
        let original = ContentFile {
            front: FrontMatter {
                slug: "hello-world".into(),
                status: ContentStatus::Published,
                published_at: Some(Utc.with_ymd_and_hms(2025, 3, 4, 12, 30, 0).unwrap()),
                created_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()),
                updated_at: Some(Utc.with_ymd_and_hms(2025, 3, 4, 12, 30, 0).unwrap()),
                created_by: Some("u1".into()),
                created_by_email: Some("a@example.com".into()),
                updated_by: Some("u2".into()),
                updated_by_email: Some("b@example.com".into()),
                custom_slug: Some("hello".into()),
                description: Some("An intro post".into()),
                previous_slugs: vec!["hi-world".into()],
                version: Some(2),
                created_from_version: Some(1),
                allow_external_versions: true,
            },
            body: "# Hello\n\nBody text".into(),
        };
        let reparsed = parse(&serialize(&original));
        assert_eq!(reparsed, original);
    }

    #[test]
    fn round_trip_of_parsed_text_is_stable() {
        let first = parse(sample_text());
        let second = parse(&serialize(&first));
        assert_eq!(first, second);
    }
}
