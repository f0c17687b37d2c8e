//! Test generation and arbiter synthesis.

use super::types::{DeliberationInput, RunError};
use super::{RunDeliberationUseCase, member_messages};
use crate::ports::council_gateway::{CouncilGateway, QueryRequest};
use crate::ports::progress::ProgressNotifier;
use crate::ports::run_logger::RunEvent;
use council_domain::{
    ChatMessage, FinalArtifact, ModelId, PromptTemplate, Stage, Submission, TestSubmission,
    parse_synthesis, strip_fenced_block,
};
use serde_json::json;
use tracing::{info, warn};

impl<G: CouncilGateway + 'static> RunDeliberationUseCase<G> {
    /// Every council member writes tests for the first surviving submission
    pub(super) async fn generate_tests(
        &self,
        input: &DeliberationInput,
        council: &[ModelId],
        submissions: &[Submission],
        progress: &dyn ProgressNotifier,
    ) -> Result<Vec<TestSubmission>, RunError> {
        let Some(leading) = submissions.first() else {
            return Ok(Vec::new());
        };

        let prompt = PromptTemplate::tests(input.text(), &leading.content, input.stack());
        let messages = member_messages(input.variant, prompt);
        let requests = council.iter().cloned().map(QueryRequest::routed).collect();

        let results = self
            .fan_out(Stage::TestGeneration, requests, &messages, progress)
            .await?;

        let tests: Vec<TestSubmission> = results
            .into_iter()
            .filter_map(|(model, result)| {
                let result = result?;
                Some(TestSubmission {
                    model,
                    node: result.node,
                    content: strip_fenced_block(&result.content),
                })
            })
            .collect();

        self.logger
            .log(RunEvent::new("tests", json!({ "tests": tests })));
        Ok(tests)
    }

    /// Ask the arbiter for the final artifact.
    ///
    /// Falls back to the first submission and the first test set when the
    /// arbiter is unavailable or its answer has no usable content.
    pub(super) async fn synthesize(
        &self,
        input: &DeliberationInput,
        submissions: &[Submission],
        tests: &[TestSubmission],
        progress: &dyn ProgressNotifier,
    ) -> Result<FinalArtifact, RunError> {
        let stage = Stage::Synthesis;
        info!("Stage: {}", stage);
        progress.on_stage_start(&stage, 1);

        let submission_pairs: Vec<(&ModelId, &str)> = submissions
            .iter()
            .map(|s| (&s.model, s.content.as_str()))
            .collect();
        let test_pairs: Vec<(&ModelId, &str)> =
            tests.iter().map(|t| (&t.model, t.content.as_str())).collect();

        let prompt =
            PromptTemplate::synthesis(input.variant, input.text(), &submission_pairs, &test_pairs);
        let messages = vec![
            ChatMessage::system(PromptTemplate::arbiter_system(input.variant)),
            ChatMessage::user(prompt),
        ];

        let route = self.gateway.arbiter();
        let response = self
            .cancellable(self.gateway.query_arbiter(&messages))
            .await?;

        let parsed = response.and_then(|result| {
            let sections = parse_synthesis(&result.content, input.variant);
            if sections.content.is_empty() {
                warn!(arbiter = %result.model, "Arbiter answer had no content");
                return None;
            }
            let artifact = FinalArtifact {
                content: sections.content,
                tests: sections.tests,
                arbiter: Some(result.model.clone()),
                node: Some(result.node),
                fallback: false,
            };
            Some((result.model, artifact))
        });

        let artifact = match parsed {
            Some((model, artifact)) => {
                progress.on_task_complete(&stage, &model, true);
                artifact
            }
            None => {
                warn!("Arbiter unavailable, falling back to the first submission");
                let arbiter = route.map(|r| r.model);
                if let Some(model) = &arbiter {
                    progress.on_task_complete(&stage, model, false);
                }
                FinalArtifact {
                    content: submissions
                        .first()
                        .map(|s| s.content.clone())
                        .unwrap_or_default(),
                    tests: tests.first().map(|t| t.content.clone()).unwrap_or_default(),
                    arbiter,
                    node: None,
                    fallback: true,
                }
            }
        };

        progress.on_stage_complete(&stage);
        self.logger
            .log(RunEvent::new("synthesis", json!({ "artifact": artifact })));
        Ok(artifact)
    }
}
