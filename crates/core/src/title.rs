//! Title extraction from body text.
//!
//! Bodies may embed capitalized custom-markup blocks (`<Hero>...</Hero>`)
//! whose interior must not be mistaken for a title. Extraction runs a small
//! depth-counter automaton over lines rather than a general markup parser:
//! the scope is deliberately limited to recognising capitalized tags so
//! their interior can be excluded from title candidates.

use regex::Regex;

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// How many candidate lines are considered before giving up on the scan.
pub const CANDIDATE_WINDOW: usize = 15;

/// Maximum excerpt length in characters.
pub const EXCERPT_MAX_CHARS: usize = 200;

/// Title used when nothing in the body yields one.
pub const UNTITLED: &str = "Untitled";

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Extract a display title from a body.
///
/// 1. Scan lines with a nesting-depth counter; lines inside capitalized
///    custom-markup blocks are not candidates.
/// 2. Among the first [`CANDIDATE_WINDOW`] candidates, prefer the first
///    `# ` heading (marker stripped); otherwise take the first candidate
///    truncated to [`TITLE_MAX_CHARS`].
/// 3. Fall back to known markup patterns (`Headline` inner text, a `Hero`
///    `title=` attribute, `Title` inner text) over the whole text.
/// 4. Failing all of the above, return [`UNTITLED`].
pub fn extract_title(body: &str) -> String {
    let candidates = collect_candidates(body);

    for line in &candidates {
        let t = line.trim();
        if t.starts_with("# ") && t.len() > 2 {
            let title = t[2..].trim();
            if !title.is_empty() {
                return title.to_string();
            }
        }
    }

    if let Some(first) = candidates.first() {
        let t = first.trim();
        if !t.is_empty() {
            return truncate_chars(t, TITLE_MAX_CHARS);
        }
    }

    if let Some(title) = fallback_markup_title(body) {
        return title;
    }

    UNTITLED.to_string()
}

/// Derive a short plain-text excerpt from a body for listing projections.
///
/// Markup tags are stripped, whitespace collapsed, and the result capped at
/// [`EXCERPT_MAX_CHARS`] characters.
pub fn excerpt(body: &str) -> String {
    truncate_chars(&sanitize(body), EXCERPT_MAX_CHARS)
}

// ---------------------------------------------------------------------------
// Line automaton
// ---------------------------------------------------------------------------

/// Collect the first [`CANDIDATE_WINDOW`] candidate lines.
///
/// Tag lines adjust the depth counter and are never candidates themselves.
/// Leading blank lines are dropped; later blank lines consume a candidate
/// slot once a non-blank candidate has been seen.
fn collect_candidates(body: &str) -> Vec<String> {
    let mut depth: u32 = 0;
    let mut seen_non_blank = false;
    let mut candidates = Vec::new();

    for line in body.lines() {
        if candidates.len() >= CANDIDATE_WINDOW {
            break;
        }
        let t = line.trim();
        if is_closing_tag(t) {
            depth = depth.saturating_sub(1);
            continue;
        }
        if is_opening_tag(t) {
            if !t.ends_with("/>") {
                depth += 1;
            }
            continue;
        }
        if depth > 0 {
            continue;
        }
        if t.is_empty() {
            if seen_non_blank {
                candidates.push(String::new());
            }
            continue;
        }
        seen_non_blank = true;
        candidates.push(line.to_string());
    }
    candidates
}

/// A line opening a capitalized custom tag, e.g. `<Hero title="...">`.
fn is_opening_tag(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// A line closing a capitalized custom tag, e.g. `</Hero>`.
fn is_closing_tag(trimmed: &str) -> bool {
    let mut chars = trimmed.chars();
    chars.next() == Some('<')
        && chars.next() == Some('/')
        && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

// ---------------------------------------------------------------------------
// Markup fallbacks
// ---------------------------------------------------------------------------

/// Search the whole text for known markup title patterns, in priority order.
fn fallback_markup_title(text: &str) -> Option<String> {
    let patterns = [
        r"(?s)<Headline[^>]*>(.*?)</Headline>",
        r#"<Hero[^>]*?\btitle="([^"]*)""#,
        r"(?s)<Title[^>]*>(.*?)</Title>",
    ];
    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(text) {
            let inner = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let clean = truncate_chars(&sanitize(inner), TITLE_MAX_CHARS);
            if !clean.is_empty() {
                return Some(clean);
            }
        }
    }
    None
}

/// Strip nested tags and collapse whitespace.
fn sanitize(s: &str) -> String {
    let no_tags = match Regex::new(r"<[^>]+>") {
        Ok(re) => re.replace_all(s, " ").into_owned(),
        Err(_) => s.to_string(),
    };
    no_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_wins() {
        assert_eq!(extract_title("# Hello\nBody text"), "Hello");
    }

    #[test]
    fn heading_after_plain_lines_still_wins() {
        let body = "intro line\n\n# The Real Title\nmore";
        assert_eq!(extract_title(body), "The Real Title");
    }

    #[test]
    fn first_candidate_when_no_heading() {
        assert_eq!(extract_title("Just a plain first line\nsecond"), "Just a plain first line");
    }

    #[test]
    fn first_candidate_truncated_to_limit() {
        let long = "x".repeat(150);
        let title = extract_title(&long);
        assert_eq!(title.chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn leading_blank_lines_dropped() {
        assert_eq!(extract_title("\n\n\n# Hello\n"), "Hello");
    }

    #[test]
    fn lines_inside_tag_block_excluded() {
        let body = "<Hero>\n# Inside the hero\n</Hero>\n# Outside\n";
        assert_eq!(extract_title(body), "Outside");
    }

    #[test]
    fn nested_blocks_tracked() {
        let body = "<Outer>\n<Inner>\n# Deep\n</Inner>\n# Still inside\n</Outer>\n# Free\n";
        assert_eq!(extract_title(body), "Free");
    }

    #[test]
    fn self_closing_tag_does_not_open_block() {
        let body = "<Divider />\n# Hello\n";
        assert_eq!(extract_title(body), "Hello");
    }

    #[test]
    fn lowercase_html_does_not_open_a_block() {
        let body = "<p>\n# Hello\n</p>\n";
        assert_eq!(extract_title(body), "Hello");
    }

    #[test]
    fn unbalanced_closing_tag_floors_at_zero() {
        let body = "</Stray>\n# Hello\n";
        assert_eq!(extract_title(body), "Hello");
    }

    #[test]
    fn heading_beyond_window_ignored() {
        let mut body = String::new();
        for i in 0..CANDIDATE_WINDOW {
            body.push_str(&format!("line {i}\n"));
        }
        body.push_str("# Too Late\n");
        assert_eq!(extract_title(&body), "line 0");
    }

    // -- fallbacks -----------------------------------------------------------

    #[test]
    fn headline_tag_fallback() {
        let body = "<Headline>\nBig <em>News</em> Today\n</Headline>\n";
        assert_eq!(extract_title(body), "Big News Today");
    }

    #[test]
    fn hero_title_attribute_fallback() {
        let body = "<Hero title=\"Welcome Home\" image=\"x.png\">\n</Hero>\n";
        assert_eq!(extract_title(body), "Welcome Home");
    }

    #[test]
    fn title_tag_fallback() {
        let body = "<Title>\nThe  Spaced   Title\n</Title>\n";
        assert_eq!(extract_title(body), "The Spaced Title");
    }

    #[test]
    fn headline_preferred_over_title_tag() {
        let body = "<Title>\nsecondary\n</Title>\n<Headline>\nprimary\n</Headline>\n";
        assert_eq!(extract_title(body), "primary");
    }

    #[test]
    fn empty_body_is_untitled() {
        assert_eq!(extract_title(""), UNTITLED);
        assert_eq!(extract_title("\n\n"), UNTITLED);
    }

    #[test]
    fn markup_only_body_without_patterns_is_untitled() {
        assert_eq!(extract_title("<Hero>\n</Hero>\n"), UNTITLED);
    }

    // -- excerpt -------------------------------------------------------------

    #[test]
    fn excerpt_strips_tags_and_collapses_whitespace() {
        let body = "Some <b>bold</b> text\n\nacross   lines";
        assert_eq!(excerpt(body), "Some bold text across lines");
    }

    #[test]
    fn excerpt_capped() {
        let body = "word ".repeat(100);
        assert!(excerpt(&body).chars().count() <= EXCERPT_MAX_CHARS);
    }
}
