//! Result and cluster formatting

pub mod console;
pub mod formatter;
