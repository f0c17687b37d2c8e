//! String utilities for the domain layer.

/// Single-line preview of model output for log lines.
///
/// Collapses whitespace runs (including newlines) into single spaces and
/// cuts at `max_chars` characters, appending `...` when cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_collapses_whitespace() {
        assert_eq!(preview("fn main() {\n    run();\n}", 80), "fn main() { run(); }");
    }

    #[test]
    fn test_preview_cuts_long_text() {
        assert_eq!(preview("hello wonderful world", 9), "hello won...");
    }

    #[test]
    fn test_preview_multibyte() {
        assert_eq!(preview("日本語テスト", 3), "日本語...");
        assert_eq!(preview("日本語", 3), "日本語");
    }
}
