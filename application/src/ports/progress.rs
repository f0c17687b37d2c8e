//! Progress notification port
//!
//! Defines the interface for reporting progress during a deliberation.

use council_domain::{ModelId, Stage};

/// Callback for progress updates during a deliberation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain log lines, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called when a stage starts
    fn on_stage_start(&self, stage: &Stage, total_tasks: usize);

    /// Called when one model finishes within a stage
    fn on_task_complete(&self, stage: &Stage, model: &ModelId, success: bool);

    /// Called when a stage completes
    fn on_stage_complete(&self, stage: &Stage);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_stage_start(&self, _stage: &Stage, _total_tasks: usize) {}
    fn on_task_complete(&self, _stage: &Stage, _model: &ModelId, _success: bool) {}
    fn on_stage_complete(&self, _stage: &Stage) {}
}
