//! Generation stage: every council member answers the prompt.

use super::types::{DeliberationInput, RunError};
use super::{RunDeliberationUseCase, member_messages};
use crate::ports::council_gateway::{CouncilGateway, QueryRequest};
use crate::ports::progress::ProgressNotifier;
use crate::ports::run_logger::RunEvent;
use council_domain::{ModelId, PromptTemplate, Stage, Submission, strip_fenced_block};
use serde_json::json;
use tracing::info;

impl<G: CouncilGateway + 'static> RunDeliberationUseCase<G> {
    /// Fan out the generation prompt; survivors become iteration-0 submissions
    /// in council order.
    pub(super) async fn generate(
        &self,
        input: &DeliberationInput,
        council: &[ModelId],
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<Submission>, RunError> {
        let prompt = PromptTemplate::generation(input.variant, input.text(), input.stack());
        let messages = member_messages(input.variant, prompt);
        let requests = council.iter().cloned().map(QueryRequest::routed).collect();

        let results = self
            .fan_out(Stage::Generation, requests, &messages, progress)
            .await?;

        let submissions: Vec<Submission> = results
            .into_iter()
            .filter_map(|(model, result)| {
                let result = result?;
                Some(Submission::initial(
                    model,
                    result.node,
                    strip_fenced_block(&result.content),
                ))
            })
            .collect();

        info!(
            "{} of {} council members produced a submission",
            submissions.len(),
            council.len()
        );
        self.logger.log(RunEvent::new(
            "generation",
            json!({ "submissions": submissions }),
        ));
        Ok(submissions)
    }
}
