//! Structured response parsing
//!
//! Models answer in free text following a fixed textual contract. The
//! functions here recover as much structure as the text allows and never
//! fail: missing sections yield empty or partial results.

mod fence;
mod review;
mod synthesis;
mod text;

pub use fence::strip_fenced_block;
pub use review::{ParsedReview, RANKING_MARKER, SCORE_HEADER, parse_review};
pub use synthesis::{
    ANSWER_MARKER, CODE_MARKER, SynthesisSections, TESTS_MARKER, parse_synthesis,
};
