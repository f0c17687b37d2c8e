/// Remove one fenced-block wrapper around a model response.
///
/// The wrapper is stripped only when the first line opens a fence (optionally
/// with a language tag) and the last line closes it. The result is trimmed
/// either way.
pub fn strip_fenced_block(text: &str) -> String {
    let trimmed = text.trim();
    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() >= 2
        && lines[0].trim_start().starts_with("```")
        && lines[lines.len() - 1].trim() == "```"
    {
        return lines[1..lines.len() - 1].join("\n").trim().to_string();
    }
    trimmed.to_string()
}
