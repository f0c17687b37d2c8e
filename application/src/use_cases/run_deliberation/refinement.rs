//! Refinement stage: each submission is revised by its own author.

use super::types::{DeliberationInput, RunError};
use super::{RunDeliberationUseCase, member_messages};
use crate::ports::council_gateway::{CouncilGateway, QueryRequest, QueryResult};
use crate::ports::progress::ProgressNotifier;
use crate::ports::run_logger::RunEvent;
use council_domain::{
    IterationSnapshot, PromptTemplate, Stage, Submission, collect_feedback, strip_fenced_block,
};
use serde_json::json;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

impl<G: CouncilGateway + 'static> RunDeliberationUseCase<G> {
    /// Refine every submission of a reviewed snapshot.
    ///
    /// Each prompt carries the critiques addressed to that submission's own
    /// label and is pinned to the node that produced it. A failed refinement
    /// carries the content forward unchanged. Output order matches input
    /// order.
    pub(super) async fn refine(
        &self,
        input: &DeliberationInput,
        snapshot: &IterationSnapshot,
        iteration: u32,
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<Submission>, RunError> {
        let stage = Stage::Refinement(iteration);
        info!("Stage: {}", stage);
        progress.on_stage_start(&stage, snapshot.submissions.len());

        let mut join_set = JoinSet::new();

        for (index, submission) in snapshot.submissions.iter().enumerate() {
            let feedback = snapshot
                .labels
                .label_at(index)
                .map(|label| collect_feedback(&snapshot.reviews, label, self.config.max_critiques))
                .unwrap_or_default();
            let prompt = PromptTemplate::refinement(
                input.variant,
                input.text(),
                &submission.content,
                &feedback,
                iteration,
            );
            let messages = member_messages(input.variant, prompt);
            let request = QueryRequest::on_node(submission.model.clone(), submission.node.clone());
            let gateway = Arc::clone(&self.gateway);

            join_set.spawn(async move {
                let result = gateway.query_one(&request, &messages).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<QueryResult>> = vec![None; snapshot.submissions.len()];
        let collected = self
            .cancellable(async {
                while let Some(joined) = join_set.join_next().await {
                    match joined {
                        Ok((index, result)) => {
                            if let Some(slot) = results.get_mut(index) {
                                *slot = result;
                            }
                        }
                        Err(e) => {
                            warn!("Task join error: {}", e);
                        }
                    }
                }
            })
            .await;
        collected?;

        let refined: Vec<Submission> = snapshot
            .submissions
            .iter()
            .zip(results)
            .map(|(submission, result)| match result {
                Some(result) => {
                    progress.on_task_complete(&stage, &submission.model, true);
                    submission.refined(result.node, strip_fenced_block(&result.content))
                }
                None => {
                    warn!(
                        model = %submission.model,
                        node = %submission.node,
                        "Refinement failed, carrying submission forward"
                    );
                    progress.on_task_complete(&stage, &submission.model, false);
                    submission.carried_forward()
                }
            })
            .collect();

        progress.on_stage_complete(&stage);
        self.logger.log(RunEvent::new(
            "refinement",
            json!({ "iteration": iteration, "submissions": refined }),
        ));
        Ok(refined)
    }
}
