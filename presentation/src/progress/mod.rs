//! Progress display during a deliberation

pub mod reporter;
