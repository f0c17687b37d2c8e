//! Arbiter synthesis parsing

use super::fence::strip_fenced_block;
use super::text::split_after_marker;
use crate::deliberation::variant::Variant;

pub const CODE_MARKER: &str = "FINAL CODE";
pub const TESTS_MARKER: &str = "FINAL TESTS";
pub const ANSWER_MARKER: &str = "FINAL ANSWER";

/// Sections of an arbiter response, fence-stripped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisSections {
    pub content: String,
    pub tests: String,
}

/// Split an arbiter response into its final sections.
///
/// Code: text after `FINAL CODE:` up to `FINAL TESTS:` is the code, the rest
/// the tests. Without the tests marker everything after the code marker is
/// code. Without the code marker, text before `FINAL TESTS:` is code; with
/// neither marker the whole response is code.
///
/// Council: text after `FINAL ANSWER:`, or the whole response.
pub fn parse_synthesis(text: &str, variant: Variant) -> SynthesisSections {
    match variant {
        Variant::Code => parse_code(text),
        Variant::Council => SynthesisSections {
            content: strip_fenced_block(
                split_after_marker(text, ANSWER_MARKER, false)
                    .map(|(_, after)| after)
                    .unwrap_or(text),
            ),
            tests: String::new(),
        },
    }
}

fn parse_code(text: &str) -> SynthesisSections {
    let (code, tests) = match split_after_marker(text, CODE_MARKER, false) {
        Some((_, rest)) => match split_after_marker(rest, TESTS_MARKER, false) {
            Some((code, tests)) => (code, tests),
            None => (rest, ""),
        },
        None => match split_after_marker(text, TESTS_MARKER, false) {
            Some((code, tests)) => (code, tests),
            None => (text, ""),
        },
    };
    SynthesisSections {
        content: strip_fenced_block(trim_marker_residue(code)),
        tests: strip_fenced_block(tests),
    }
}

/// Drop bold/heading markup left in front of a following marker
fn trim_marker_residue(s: &str) -> &str {
    s.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '#' | '_'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_markers() {
        let text = "Here is the result.\n\n\
                    FINAL CODE:\n```python\ndef add(a, b):\n    return a + b\n```\n\n\
                    FINAL TESTS:\n```python\nassert add(1, 2) == 3\n```";
        let sections = parse_synthesis(text, Variant::Code);
        assert_eq!(sections.content, "def add(a, b):\n    return a + b");
        assert_eq!(sections.tests, "assert add(1, 2) == 3");
    }

    #[test]
    fn test_markdown_markers() {
        let text = "**FINAL CODE:**\nfn f() {}\n\n## FINAL TESTS:\n#[test] fn t() {}";
        let sections = parse_synthesis(text, Variant::Code);
        assert_eq!(sections.content, "fn f() {}");
        assert_eq!(sections.tests, "#[test] fn t() {}");
    }

    #[test]
    fn test_missing_tests_marker() {
        let sections = parse_synthesis("FINAL CODE:\nx = 1", Variant::Code);
        assert_eq!(sections.content, "x = 1");
        assert_eq!(sections.tests, "");
    }

    #[test]
    fn test_missing_code_marker() {
        let sections = parse_synthesis("x = 1\nFINAL TESTS:\nassert x == 1", Variant::Code);
        assert_eq!(sections.content, "x = 1");
        assert_eq!(sections.tests, "assert x == 1");
    }

    #[test]
    fn test_no_markers() {
        let sections = parse_synthesis("```\nx = 1\n```", Variant::Code);
        assert_eq!(sections.content, "x = 1");
        assert!(sections.tests.is_empty());
    }

    #[test]
    fn test_council_answer() {
        let sections = parse_synthesis(
            "The council agrees.\n\nFINAL ANSWER: Rust is memory safe.",
            Variant::Council,
        );
        assert_eq!(sections.content, "Rust is memory safe.");

        let whole = parse_synthesis("Just an answer.", Variant::Council);
        assert_eq!(whole.content, "Just an answer.");
    }
}
