//! Metadata attached to a test definition by decorators or comments.
//!
//! Two notations are recognised, per field:
//!
//! ```text
//! @pytest.mark.owner("alice")        # @owner: alice
//! @pytest.mark.priority("P0")        # @priority: p0
//! @pytest.mark.description("login")  # @description: login
//! ```
//!
//! Only the `window` characters immediately before the `def` are inspected.
//! The decorator form wins over the comment form; within one form the marker
//! closest to the definition wins.

use std::sync::LazyLock;

use caseflow_core::types::Priority;
use regex::Regex;

static DECORATOR_OWNER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@pytest\.mark\.owner\(\s*['"](.+?)['"]\s*\)"#).expect("valid regex")
});

static DECORATOR_PRIORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@pytest\.mark\.priority\(\s*['"](.+?)['"]\s*\)"#).expect("valid regex")
});

static DECORATOR_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@pytest\.mark\.description\(\s*['"](.+?)['"]\s*\)"#).expect("valid regex")
});

static COMMENT_OWNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[ \t]*@owner:[ \t]*(\S+)").expect("valid regex"));

static COMMENT_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)#[ \t]*@priority:[ \t]*(P[0-3])\b").expect("valid regex"));

static COMMENT_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[ \t]*@description:[ \t]*(.+)").expect("valid regex"));

/// Metadata resolved for one test definition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaseMetadata {
    pub owner: Option<String>,
    pub priority: Priority,
    pub description: Option<String>,
}

/// Resolve metadata for the definition starting at byte `def_offset` in `text`.
///
/// Never fails; absent markers produce the defaults (no owner, `P1`, no
/// description).
pub fn extract_metadata(text: &str, def_offset: usize, window: usize) -> CaseMetadata {
    let before = lookback_window(text, def_offset, window);

    let owner = nearest(&DECORATOR_OWNER, before).or_else(|| nearest(&COMMENT_OWNER, before));

    let priority = nearest(&DECORATOR_PRIORITY, before)
        .and_then(|raw| match raw.parse::<Priority>() {
            Ok(p) => Some(p),
            Err(_) => {
                tracing::debug!(value = %raw, "ignoring unrecognised priority decorator");
                None
            }
        })
        .or_else(|| nearest(&COMMENT_PRIORITY, before).and_then(|raw| raw.parse().ok()))
        .unwrap_or_default();

    let description = nearest(&DECORATOR_DESCRIPTION, before).or_else(|| {
        nearest(&COMMENT_DESCRIPTION, before)
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
    });

    CaseMetadata {
        owner,
        priority,
        description,
    }
}

/// The last `window` characters of `text` before `offset`.
///
/// `offset` is clamped to the text and moved back onto a char boundary.
pub fn lookback_window(text: &str, offset: usize, window: usize) -> &str {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = &text[..end];
    let start = head
        .char_indices()
        .rev()
        .take(window)
        .last()
        .map_or(end, |(i, _)| i);
    &head[start..]
}

fn nearest(re: &Regex, haystack: &str) -> Option<String> {
    re.captures_iter(haystack)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_for(src: &str, window: usize) -> CaseMetadata {
        let offset = src.find("def ").expect("fixture has a def");
        extract_metadata(src, offset, window)
    }

    #[test]
    fn defaults_when_nothing_marked() {
        let m = meta_for("import pytest\n\ndef test_plain():\n    pass\n", 500);
        assert_eq!(m, CaseMetadata::default());
        assert_eq!(m.priority, Priority::P1);
    }

    #[test]
    fn decorator_form() {
        let src = r#"
@pytest.mark.owner('alice')
@pytest.mark.priority("p0")
@pytest.mark.description("logs in with a valid password")
def test_login():
    pass
"#;
        let m = meta_for(src, 500);
        assert_eq!(m.owner.as_deref(), Some("alice"));
        assert_eq!(m.priority, Priority::P0);
        assert_eq!(m.description.as_deref(), Some("logs in with a valid password"));
    }

    #[test]
    fn comment_form() {
        let src = "# @owner: bob\n# @priority: p2\n# @description:   checkout flow  \ndef test_checkout():\n    pass\n";
        let m = meta_for(src, 500);
        assert_eq!(m.owner.as_deref(), Some("bob"));
        assert_eq!(m.priority, Priority::P2);
        assert_eq!(m.description.as_deref(), Some("checkout flow"));
    }

    #[test]
    fn decorator_wins_over_comment_per_field() {
        let src = r#"
# @owner: from-comment
# @priority: P3
# @description: from comment
@pytest.mark.owner("from-decorator")
@pytest.mark.priority("P1")
def test_mixed():
    pass
"#;
        let m = meta_for(src, 500);
        assert_eq!(m.owner.as_deref(), Some("from-decorator"));
        // an explicit P1 decorator is still a decorator
        assert_eq!(m.priority, Priority::P1);
        // no description decorator, so the comment is consulted
        assert_eq!(m.description.as_deref(), Some("from comment"));
    }

    #[test]
    fn invalid_decorator_priority_falls_back_to_comment() {
        let src = "# @priority: p3\n@pytest.mark.priority('urgent')\ndef test_x():\n    pass\n";
        assert_eq!(meta_for(src, 500).priority, Priority::P3);
    }

    #[test]
    fn markers_outside_window_are_ignored() {
        let filler = "x = 1\n".repeat(100);
        let src = format!("# @owner: far-away\n# @priority: P0\n{filler}def test_far():\n    pass\n");
        let m = meta_for(&src, 500);
        assert_eq!(m.owner, None);
        assert_eq!(m.priority, Priority::P1);

        // a wider window reaches it
        let m = meta_for(&src, 2_000);
        assert_eq!(m.owner.as_deref(), Some("far-away"));
        assert_eq!(m.priority, Priority::P0);
    }

    #[test]
    fn closest_marker_wins_within_window() {
        let src = "# @owner: previous\ndef test_a():\n    pass\n\n# @owner: current\ndef test_b():\n    pass\n";
        let offset = src.find("def test_b").expect("def");
        let m = extract_metadata(src, offset, 500);
        assert_eq!(m.owner.as_deref(), Some("current"));
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        let src = "# @description: 登录用例\ndef test_login():\n    pass\n";
        let offset = src.find("def").expect("def");
        let m = extract_metadata(src, offset, 500);
        assert_eq!(m.description.as_deref(), Some("登录用例"));

        // offset inside a multi-byte char must not panic
        let w = lookback_window(src, 18, 4);
        assert!(w.chars().count() <= 4);
    }

    #[test]
    fn empty_comment_owner_does_not_read_next_line() {
        let m = meta_for("# @owner:\n# TODO: assign\ndef test_x():\n    pass\n", 500);
        assert_eq!(m.owner, None);
    }

    #[test]
    fn empty_comment_priority_does_not_read_next_line() {
        let m = meta_for("# @priority:\n# p0 is for smoke tests\ndef test_x():\n    pass\n", 500);
        assert_eq!(m.priority, Priority::P1);
    }

    #[test]
    fn out_of_range_comment_priority_is_ignored() {
        let m = meta_for("# @priority: P10\ndef test_x():\n    pass\n", 500);
        assert_eq!(m.priority, Priority::P1);

        let m = meta_for("# @priority: p2 \ndef test_x():\n    pass\n", 500);
        assert_eq!(m.priority, Priority::P2);
    }

    #[test]
    fn zero_window_sees_nothing() {
        let src = "@pytest.mark.owner('alice')\ndef test_a():\n    pass\n";
        let offset = src.find("def").expect("def");
        assert_eq!(extract_metadata(src, offset, 0), CaseMetadata::default());
        assert_eq!(lookback_window(src, offset, 0), "");
    }
}
