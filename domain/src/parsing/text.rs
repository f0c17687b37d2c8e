//! Case-insensitive text helpers shared by the parsers

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`
pub(crate) fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .find(&needle.to_ascii_lowercase())
}

/// Byte offset of the last ASCII case-insensitive occurrence of `needle`
pub(crate) fn rfind_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .to_ascii_lowercase()
        .rfind(&needle.to_ascii_lowercase())
}

pub(crate) fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

/// Strip markdown decoration in front of a header: whitespace, `#`, `*`,
/// `-`, `>` and list numbering such as `1.` or `2)`.
pub(crate) fn strip_line_decoration(line: &str) -> &str {
    let line = line.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '#' | '*' | '-' | '>' | '_')
    });
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let after = &line[digits..];
        if let Some(rest) = after.strip_prefix('.').or_else(|| after.strip_prefix(')')) {
            return rest.trim_start_matches(|c: char| c.is_whitespace() || c == '*' || c == '_');
        }
    }
    line
}

/// Skip the decoration between a header and its body (`**:`, `:`, `*`)
pub(crate) fn strip_header_tail(s: &str) -> &str {
    let s = s.trim_start_matches(|c: char| c == '*' || c == '_' || c == ' ' || c == '\t');
    let s = s.strip_prefix(':').unwrap_or(s);
    s.trim_start_matches(|c: char| c == '*' || c == '_')
}

/// Locate `marker` (case-insensitive) and return the text after it with the
/// header tail removed. Uses the last occurrence when `last` is set.
pub(crate) fn split_after_marker<'a>(
    text: &'a str,
    marker: &str,
    last: bool,
) -> Option<(&'a str, &'a str)> {
    let start = if last {
        rfind_ignore_case(text, marker)?
    } else {
        find_ignore_case(text, marker)?
    };
    let before = &text[..start];
    let after = strip_header_tail(&text[start + marker.len()..]);
    Some((before, after))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ignore_case() {
        assert_eq!(find_ignore_case("abc Final Ranking:", "FINAL RANKING"), Some(4));
        assert_eq!(find_ignore_case("nothing", "FINAL"), None);
    }

    #[test]
    fn test_strip_line_decoration() {
        assert_eq!(strip_line_decoration("  - **Bugs**: none"), "Bugs**: none");
        assert_eq!(strip_line_decoration("### Code Submission A"), "Code Submission A");
        assert_eq!(strip_line_decoration("2. Response B"), "Response B");
        assert_eq!(strip_line_decoration("3) **Response C**"), "Response C**");
        assert_eq!(strip_line_decoration("42 is the answer"), "42 is the answer");
    }

    #[test]
    fn test_split_after_marker() {
        let (before, after) =
            split_after_marker("x\n**FINAL CODE:**\nfn main() {}", "FINAL CODE", false).unwrap();
        assert_eq!(before, "x\n**");
        assert_eq!(after.trim(), "fn main() {}");
    }
}
