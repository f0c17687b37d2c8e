//! Run transcripts
//!
//! [`JsonlRunLogger`] appends every deliberation event to a JSONL file and
//! implements the [`RunLogger`](council_application::RunLogger) port.

mod transcript;

pub use transcript::JsonlRunLogger;
