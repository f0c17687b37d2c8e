//! Reviewer response parsing
//!
//! Expected shape (headers case-insensitive, markdown decoration tolerated):
//!
//! ```text
//! Code Submission A:
//! - Bugs: ...
//! - Style: ...
//! - Performance: ...
//! - Security: ...
//! - Best Practices: ...
//! - Overall Score: 7
//!
//! FINAL RANKING:
//! 1. Code Submission B
//! 2. Code Submission A
//! ```

use super::text::{
    find_ignore_case, rfind_ignore_case, strip_header_tail, strip_line_decoration,
    strip_prefix_ignore_case,
};
use crate::deliberation::entities::{CritiqueCategory, RankingList, StructuredCritique};
use crate::deliberation::label::{Label, LabelMap};
use std::collections::BTreeMap;

pub const RANKING_MARKER: &str = "FINAL RANKING";
pub const SCORE_HEADER: &str = "Overall Score";

/// Structure recovered from one reviewer response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReview {
    /// Critiques in label order; labels the reviewer skipped are absent
    pub critiques: Vec<StructuredCritique>,
    pub ranking: RankingList,
}

/// Parse a reviewer response against the labels of the current round.
///
/// `noun` is the submission noun used in the prompt (`Code Submission`,
/// `Response`).
pub fn parse_review(text: &str, labels: &LabelMap, noun: &str) -> ParsedReview {
    let (body, ranking_section) = match rfind_ignore_case(text, RANKING_MARKER) {
        Some(pos) => (
            text[..pos]
                .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '#' | '_')),
            Some(strip_header_tail(&text[pos + RANKING_MARKER.len()..])),
        ),
        None => (text, None),
    };

    let sections = split_sections(body, labels, noun);
    let critiques = labels
        .labels()
        .into_iter()
        .filter_map(|label| {
            let raw = sections.get(&label)?;
            Some(parse_critique(label, raw))
        })
        .collect();

    let ranking = ranking_section
        .map(|section| parse_ranking(section, labels, noun))
        .unwrap_or_default();

    ParsedReview { critiques, ranking }
}

/// Label named by a header line such as `**Code Submission B:**`
fn header_label(line: &str, labels: &LabelMap, noun: &str) -> Option<Label> {
    let rest = strip_prefix_ignore_case(strip_line_decoration(line), noun)?;
    let rest = rest.trim_start_matches(|c: char| c == ' ' || c == '\t');
    find_label(labels, leading_alpha(rest))
}

fn leading_alpha(s: &str) -> &str {
    let end = s
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(s.len());
    &s[..end]
}

fn find_label(labels: &LabelMap, name: &str) -> Option<Label> {
    labels
        .entries()
        .iter()
        .find(|e| e.label.as_str() == name)
        .map(|e| e.label.clone())
}

/// Split the critique body into per-label sections. A section runs from its
/// header line to the next header line or the end of the body; only the
/// first section for a label is kept.
fn flush_section(current: Option<(Label, Vec<&str>)>, sections: &mut BTreeMap<Label, String>) {
    if let Some((label, lines)) = current {
        sections
            .entry(label)
            .or_insert_with(|| lines.join("\n").trim().to_string());
    }
}

fn split_sections(body: &str, labels: &LabelMap, noun: &str) -> BTreeMap<Label, String> {
    let mut sections: BTreeMap<Label, String> = BTreeMap::new();
    let mut current: Option<(Label, Vec<&str>)> = None;

    for line in body.lines() {
        if let Some(label) = header_label(line, labels, noun) {
            flush_section(current.take(), &mut sections);
            // Remainder of the header line after the label belongs to the section
            let decorated = strip_line_decoration(line);
            let after_noun = &decorated[noun.len()..];
            let after_label = after_noun
                .trim_start_matches(|c: char| c == ' ' || c == '\t')
                .get(label.as_str().len()..)
                .unwrap_or("");
            let tail = strip_header_tail(after_label);
            let mut lines = Vec::new();
            if !tail.trim().is_empty() {
                lines.push(tail);
            }
            current = Some((label, lines));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    flush_section(current, &mut sections);
    sections
}

enum Header {
    Category(CritiqueCategory),
    Score,
}

/// Known header at the start of a line, with the text following its colon
fn line_header(line: &str) -> Option<(Header, &str)> {
    let stripped = strip_line_decoration(line);
    let candidates = CritiqueCategory::ALL
        .iter()
        .map(|c| (Header::Category(*c), c.header()))
        .chain(std::iter::once((Header::Score, SCORE_HEADER)));

    for (header, name) in candidates {
        if let Some(rest) = strip_prefix_ignore_case(stripped, name) {
            let tail = rest.trim_start_matches(|c: char| c == '*' || c == '_' || c == ' ');
            if let Some(body) = tail.strip_prefix(':') {
                let body = body.trim_start_matches(|c: char| c == '*' || c == '_');
                return Some((header, body));
            }
        }
    }
    None
}

fn parse_score(text: &str) -> Option<u8> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let value: u32 = digits.parse().ok()?;
    Some(value.clamp(1, 10) as u8)
}

fn close_category(
    open: Option<(CritiqueCategory, Vec<&str>)>,
    categories: &mut BTreeMap<CritiqueCategory, String>,
) {
    if let Some((category, lines)) = open {
        let text = lines.join("\n").trim().to_string();
        categories.entry(category).or_insert(text);
    }
}

fn parse_critique(label: Label, raw: &str) -> StructuredCritique {
    let mut categories: BTreeMap<CritiqueCategory, String> = BTreeMap::new();
    let mut score = None;
    let mut open: Option<(CritiqueCategory, Vec<&str>)> = None;

    for line in raw.lines() {
        match line_header(line) {
            Some((Header::Category(category), body)) => {
                close_category(open.take(), &mut categories);
                open = Some((category, vec![body]));
            }
            Some((Header::Score, body)) => {
                close_category(open.take(), &mut categories);
                if score.is_none() {
                    score = parse_score(body);
                }
            }
            None => {
                if let Some((_, lines)) = open.as_mut() {
                    lines.push(line);
                }
            }
        }
    }
    close_category(open, &mut categories);

    StructuredCritique {
        label,
        categories,
        score,
        raw: raw.to_string(),
    }
}

/// Ordered labels after the ranking marker.
///
/// Numbered entries are preferred; without them every label mention is
/// taken in order. Unknown labels and repeats are dropped.
fn parse_ranking(section: &str, labels: &LabelMap, noun: &str) -> RankingList {
    let mut ranked: Vec<Label> = Vec::new();
    let push = |label: Label, ranked: &mut Vec<Label>| {
        if !ranked.contains(&label) {
            ranked.push(label);
        }
    };

    let mut numbered = false;
    for line in section.lines() {
        let trimmed = line.trim_start_matches(|c: char| c.is_whitespace() || c == '*' || c == '-');
        let has_number = trimmed.starts_with(|c: char| c.is_ascii_digit())
            && trimmed
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .starts_with(['.', ')']);
        if !has_number {
            continue;
        }
        numbered = true;
        let entry = strip_line_decoration(trimmed);
        let candidate = match strip_prefix_ignore_case(entry, noun) {
            Some(rest) => leading_alpha(rest.trim_start()),
            None => match mentions(entry, labels, noun).into_iter().next() {
                Some(label) => {
                    push(label, &mut ranked);
                    continue;
                }
                None => leading_alpha(entry),
            },
        };
        if let Some(label) = find_label(labels, candidate) {
            push(label, &mut ranked);
        }
    }

    if !numbered {
        for label in mentions(section, labels, noun) {
            push(label, &mut ranked);
        }
    }

    RankingList(ranked)
}

/// Every `<noun> <label>` mention in order of appearance
fn mentions(text: &str, labels: &LabelMap, noun: &str) -> Vec<Label> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(pos) = find_ignore_case(rest, noun) {
        let after = &rest[pos + noun.len()..];
        let token = leading_alpha(after.trim_start_matches([' ', '\t']));
        if let Some(label) = find_label(labels, token) {
            found.push(label);
        }
        rest = after;
    }
    found
}
