//! RunDeliberation use case
//!
//! Drives the deliberation state machine:
//!
//! ```text
//! Init → Generated → (Reviewed → Refined)* → FinalReviewed → Synthesized → Done
//!   └──→ AllFailed
//! ```
//!
//! Each stage fans out through the [`CouncilGateway`]; individual model
//! failures shrink the stage's output but never abort the run.

mod generation;
mod refinement;
mod review;
mod synthesis;
mod types;

pub use types::{DeliberationInput, RunError};

use crate::config::PipelineConfig;
use crate::ports::council_gateway::{CouncilGateway, FanOutResults, QueryRequest};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::run_logger::{NoRunLogger, RunEvent, RunLogger};
use chrono::Utc;
use council_domain::{
    ChatMessage, DeliberationResult, IterationSnapshot, ModelId, PipelineState, PromptTemplate,
    RunMetadata, RunStatus, Stage, StateTracker, Variant,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Use case for running one deliberation
pub struct RunDeliberationUseCase<G: CouncilGateway + 'static> {
    pub(super) gateway: Arc<G>,
    pub(super) config: PipelineConfig,
    pub(super) cancellation_token: Option<CancellationToken>,
    pub(super) logger: Arc<dyn RunLogger>,
}

impl<G: CouncilGateway + 'static> Clone for RunDeliberationUseCase<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            config: self.config.clone(),
            cancellation_token: self.cancellation_token.clone(),
            logger: self.logger.clone(),
        }
    }
}

impl<G: CouncilGateway + 'static> RunDeliberationUseCase<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            config: PipelineConfig::default(),
            cancellation_token: None,
            logger: Arc::new(NoRunLogger),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Record every stage output to a run transcript
    pub fn with_logger(mut self, logger: Arc<dyn RunLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: DeliberationInput) -> Result<DeliberationResult, RunError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: DeliberationInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<DeliberationResult, RunError> {
        let started_at = Utc::now();
        let variant = input.variant;
        let bound = variant.iteration_bound(
            input.max_iterations,
            self.config.default_iterations(variant),
        );
        let council: Vec<ModelId> = self
            .gateway
            .council()
            .into_iter()
            .map(|member| member.model)
            .collect();
        let mut tracker = StateTracker::new();

        info!(
            variant = %variant,
            council = council.len(),
            max_iterations = bound,
            "Starting deliberation"
        );
        self.logger.log(RunEvent::new(
            "run_start",
            json!({
                "variant": variant,
                "prompt": input.text(),
                "language": input.language,
                "framework": input.framework,
                "max_iterations": bound,
                "council": council,
            }),
        ));

        self.check_cancelled()?;
        let submissions = self.generate(&input, &council, progress).await?;

        let metadata = |tracker: &StateTracker, total_iterations: usize| RunMetadata {
            variant,
            language: input.language.clone(),
            framework: input.framework.clone(),
            max_iterations: bound,
            total_iterations,
            council: council.clone(),
            states: tracker.history().to_vec(),
            started_at,
            finished_at: Utc::now(),
        };

        if submissions.is_empty() {
            tracker.advance(PipelineState::AllFailed)?;
            warn!("All council members failed during generation");
            let error = "All models failed to generate a response".to_string();
            self.logger
                .log(RunEvent::new("run_failed", json!({ "error": error })));
            return Ok(DeliberationResult {
                prompt: input.text().to_string(),
                status: RunStatus::AllFailed,
                error: Some(error),
                iterations: Vec::new(),
                tests: Vec::new(),
                artifact: None,
                metadata: metadata(&tracker, 0),
            });
        }
        tracker.advance(PipelineState::Generated)?;

        let mut iterations = Vec::new();
        let mut current = IterationSnapshot::new(0, submissions);

        for round in 0..bound {
            self.check_cancelled()?;
            self.review(&input, &council, &mut current, Stage::Review(round), progress)
                .await?;
            tracker.advance(PipelineState::Reviewed)?;

            self.check_cancelled()?;
            let refined = self.refine(&input, &current, round + 1, progress).await?;
            tracker.advance(PipelineState::Refined)?;

            iterations.push(std::mem::replace(
                &mut current,
                IterationSnapshot::new(round + 1, refined),
            ));
        }

        self.check_cancelled()?;
        self.review(&input, &council, &mut current, Stage::FinalReview, progress)
            .await?;
        tracker.advance(PipelineState::FinalReviewed)?;
        iterations.push(current);

        let final_submissions = iterations
            .last()
            .map(|snapshot| snapshot.submissions.clone())
            .unwrap_or_default();

        self.check_cancelled()?;
        let tests = if variant.generates_tests() {
            self.generate_tests(&input, &council, &final_submissions, progress)
                .await?
        } else {
            Vec::new()
        };

        self.check_cancelled()?;
        let artifact = self
            .synthesize(&input, &final_submissions, &tests, progress)
            .await?;
        tracker.advance(PipelineState::Synthesized)?;
        tracker.advance(PipelineState::Done)?;

        info!(
            iterations = iterations.len(),
            fallback = artifact.fallback,
            "Deliberation complete"
        );
        self.logger.log(RunEvent::new(
            "run_complete",
            json!({
                "iterations": iterations.len(),
                "fallback": artifact.fallback,
                "arbiter": artifact.arbiter,
            }),
        ));

        let metadata = metadata(&tracker, iterations.len());
        Ok(DeliberationResult {
            prompt: input.text().to_string(),
            status: RunStatus::Done,
            error: None,
            iterations,
            tests,
            artifact: Some(artifact),
            metadata,
        })
    }

    /// Return `Err(RunError::Cancelled)` if cancellation was requested
    pub(super) fn check_cancelled(&self) -> Result<(), RunError> {
        if let Some(token) = &self.cancellation_token
            && token.is_cancelled()
        {
            return Err(RunError::Cancelled);
        }
        Ok(())
    }

    /// Race `fut` against the cancellation token
    pub(super) async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, RunError> {
        match &self.cancellation_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(RunError::Cancelled),
                output = fut => Ok(output),
            },
            None => Ok(fut.await),
        }
    }

    /// Send the same prompt to every model and report per-model progress
    pub(super) async fn fan_out(
        &self,
        stage: Stage,
        requests: Vec<QueryRequest>,
        messages: &[ChatMessage],
        progress: &dyn ProgressNotifier,
    ) -> Result<FanOutResults, RunError> {
        info!("Stage: {}", stage);
        progress.on_stage_start(&stage, requests.len());
        let results = self
            .cancellable(self.gateway.query_many_parallel(requests, messages))
            .await?;
        for (model, result) in &results {
            if result.is_none() {
                warn!(model = %model, stage = stage.as_str(), "No response");
            }
            progress.on_task_complete(&stage, model, result.is_some());
        }
        progress.on_stage_complete(&stage);
        Ok(results)
    }
}

/// System + user message pair for a council member
pub(super) fn member_messages(variant: Variant, prompt: String) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(PromptTemplate::member_system(variant)),
        ChatMessage::user(prompt),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::council_gateway::QueryResult;
    use async_trait::async_trait;
    use council_domain::{ArbiterRoute, CouncilMember, Label, Prompt};
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&QueryRequest, &str) -> Option<String> + Send + Sync>;

    /// Scripted gateway: answers come from a closure over the request and
    /// the user prompt; every call is recorded.
    struct MockGateway {
        council: Vec<CouncilMember>,
        arbiter: Option<ArbiterRoute>,
        responder: Responder,
        arbiter_answer: Option<String>,
        calls: Mutex<Vec<(QueryRequest, String)>>,
        arbiter_calls: Mutex<usize>,
    }

    impl MockGateway {
        fn new(models: &[&str], responder: Responder) -> Self {
            let council = models
                .iter()
                .enumerate()
                .map(|(i, m)| CouncilMember {
                    model: ModelId::from(*m),
                    node: format!("node-{}", i),
                })
                .collect::<Vec<_>>();
            let arbiter = council.first().map(|m| ArbiterRoute {
                node: m.node.clone(),
                model: m.model.clone(),
            });
            Self {
                council,
                arbiter,
                responder,
                arbiter_answer: None,
                calls: Mutex::new(Vec::new()),
                arbiter_calls: Mutex::new(0),
            }
        }

        fn with_arbiter_answer(mut self, answer: &str) -> Self {
            self.arbiter_answer = Some(answer.to_string());
            self
        }

        fn calls_matching(&self, needle: &str) -> Vec<(QueryRequest, String)> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, prompt)| prompt.contains(needle))
                .cloned()
                .collect()
        }

        fn node_of(&self, model: &ModelId) -> String {
            self.council
                .iter()
                .find(|m| &m.model == model)
                .map(|m| m.node.clone())
                .unwrap_or_else(|| "unknown".to_string())
        }
    }

    fn user_prompt(messages: &[ChatMessage]) -> String {
        messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    #[async_trait]
    impl CouncilGateway for MockGateway {
        fn council(&self) -> Vec<CouncilMember> {
            self.council.clone()
        }

        fn arbiter(&self) -> Option<ArbiterRoute> {
            self.arbiter.clone()
        }

        async fn query_one(
            &self,
            request: &QueryRequest,
            messages: &[ChatMessage],
        ) -> Option<QueryResult> {
            let prompt = user_prompt(messages);
            self.calls
                .lock()
                .unwrap()
                .push((request.clone(), prompt.clone()));
            let content = (self.responder)(request, &prompt)?;
            let node = match &request.target {
                crate::ports::council_gateway::Target::Node(name) => name.clone(),
                _ => self.node_of(&request.model),
            };
            Some(QueryResult {
                content,
                node,
                model: request.model.clone(),
            })
        }

        async fn query_many_parallel(
            &self,
            requests: Vec<QueryRequest>,
            messages: &[ChatMessage],
        ) -> FanOutResults {
            let mut results = Vec::new();
            for request in requests {
                let result = self.query_one(&request, messages).await;
                results.push((request.model, result));
            }
            results
        }

        async fn query_arbiter(&self, _messages: &[ChatMessage]) -> Option<QueryResult> {
            *self.arbiter_calls.lock().unwrap() += 1;
            let route = self.arbiter.as_ref()?;
            let content = self.arbiter_answer.clone()?;
            Some(QueryResult {
                content,
                node: route.node.clone(),
                model: route.model.clone(),
            })
        }
    }

    const GENERATION: &str = "Generate clean, well-structured code";
    const REVIEW: &str = "Then provide a ranking";
    const REFINEMENT: &str = "Review Feedback (Iteration";
    const TESTS: &str = "You are a test engineer";

    /// Every stage answers; code is tagged with model and a refinement counter
    fn happy_responder() -> Responder {
        Box::new(|request: &QueryRequest, prompt: &str| {
            let model = request.model.as_str();
            if prompt.contains(REFINEMENT) {
                Some(format!("```python\n# refined by {}\n```", model))
            } else if prompt.contains(REVIEW) {
                Some(
                    "Code Submission A:\n- Bugs: none\n- Overall Score: 9\n\
                     Code Submission B:\n- Bugs: off by one\n- Overall Score: 5\n\
                     Code Submission C:\n- Style: messy\n- Overall Score: 3\n\
                     FINAL RANKING:\n\
                     1. Code Submission A\n2. Code Submission B\n3. Code Submission C"
                        .to_string(),
                )
            } else if prompt.contains(TESTS) {
                Some(format!("```\ndef test_{}(): pass\n```", model.replace(':', "_")))
            } else if prompt.contains(GENERATION) {
                Some(format!("```python\ndef solve(): return '{}'\n```", model))
            } else {
                None
            }
        })
    }

    fn code_input() -> DeliberationInput {
        DeliberationInput::code(Prompt::new("Write solve()").unwrap()).with_language("Python")
    }

    #[tokio::test]
    async fn test_scenario_three_models_two_iterations() {
        let gateway = Arc::new(
            MockGateway::new(&["qwen3:4b", "gemma3:4b", "llama3.2"], happy_responder())
                .with_arbiter_answer(
                    "FINAL CODE:\n```\ndef solve(): return 1\n```\nFINAL TESTS:\ndef test(): pass",
                ),
        );
        let use_case = RunDeliberationUseCase::new(gateway.clone());

        let result = use_case
            .execute(code_input().with_max_iterations(2))
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.iterations.len(), 3);

        let generated = &result.iterations[0];
        assert_eq!(generated.submissions.len(), 3);
        assert_eq!(
            generated.submissions[0].content,
            "def solve(): return 'qwen3:4b'"
        );
        let labels: Vec<_> = generated.labels.labels();
        assert_eq!(
            labels,
            vec![Label::from_index(0), Label::from_index(1), Label::from_index(2)]
        );

        for (index, snapshot) in result.iterations.iter().enumerate() {
            assert_eq!(snapshot.iteration, index as u32);
            for submission in &snapshot.submissions {
                assert_eq!(submission.iteration, index as u32);
            }
            assert_eq!(snapshot.reviews.len(), 3);
        }

        // Identity survives refinement
        for (before, after) in result.iterations[0]
            .submissions
            .iter()
            .zip(&result.iterations[1].submissions)
        {
            assert_eq!(before.model, after.model);
            assert_eq!(before.node, after.node);
            assert_eq!(after.content, format!("# refined by {}", after.model));
        }

        let artifact = result.artifact.unwrap();
        assert!(!artifact.fallback);
        assert_eq!(artifact.content, "def solve(): return 1");
        assert_eq!(artifact.tests, "def test(): pass");
        assert_eq!(result.tests.len(), 3);
        assert_eq!(result.metadata.total_iterations, 3);
        assert_eq!(
            result.metadata.states.last().copied(),
            Some(PipelineState::Done)
        );
    }

    #[tokio::test]
    async fn test_scenario_all_models_fail_generation() {
        let gateway = Arc::new(
            MockGateway::new(&["a", "b", "c"], Box::new(|_: &QueryRequest, _: &str| None))
                .with_arbiter_answer("unused"),
        );
        let use_case = RunDeliberationUseCase::new(gateway.clone());

        let result = use_case.execute(code_input()).await.unwrap();

        assert_eq!(result.status, RunStatus::AllFailed);
        assert!(result.error.is_some());
        assert!(result.iterations.is_empty());
        assert!(result.artifact.is_none());
        assert_eq!(*gateway.arbiter_calls.lock().unwrap(), 0);
        assert_eq!(
            result.metadata.states,
            vec![PipelineState::Init, PipelineState::AllFailed]
        );
    }

    #[tokio::test]
    async fn test_scenario_arbiter_failure_falls_back() {
        // No arbiter answer configured: dispatch fails
        let gateway = Arc::new(MockGateway::new(&["a", "b"], happy_responder()));
        let use_case = RunDeliberationUseCase::new(gateway.clone());

        let result = use_case
            .execute(code_input().with_max_iterations(1))
            .await
            .unwrap();

        let artifact = result.artifact.clone().unwrap();
        assert!(artifact.fallback);
        assert_eq!(artifact.content, result.final_submissions()[0].content);
        assert_eq!(artifact.tests, result.tests[0].content);
        assert_eq!(artifact.tests, "def test_a(): pass");
        assert_eq!(artifact.node, None);
        assert!(result.is_success());
    }

    #[tokio::test]
    async fn test_refinement_uses_own_label_and_pins_node() {
        let gateway = Arc::new(
            MockGateway::new(&["m0", "m1", "m2"], happy_responder())
                .with_arbiter_answer("FINAL CODE:\nx"),
        );
        let use_case = RunDeliberationUseCase::new(gateway.clone());
        use_case
            .execute(code_input().with_max_iterations(1))
            .await
            .unwrap();

        let refinements = gateway.calls_matching(REFINEMENT);
        assert_eq!(refinements.len(), 3);
        for (request, prompt) in refinements {
            let own = match request.model.as_str() {
                "m0" => "- Bugs: none",
                "m1" => "- Bugs: off by one",
                _ => "- Style: messy",
            };
            assert!(prompt.contains(own), "{} got {}", request.model, prompt);
            assert_eq!(prompt.matches("Reviewer:").count(), 3);
            let expected = format!("node-{}", &request.model.as_str()[1..]);
            assert_eq!(
                request.target,
                crate::ports::council_gateway::Target::Node(expected)
            );
        }
    }

    #[tokio::test]
    async fn test_failed_refinement_carries_forward() {
        let responder: Responder = Box::new(|request: &QueryRequest, prompt: &str| {
            if prompt.contains(REFINEMENT) && request.model.as_str() == "b" {
                return None;
            }
            (happy_responder())(request, prompt)
        });
        let gateway = Arc::new(
            MockGateway::new(&["a", "b"], responder).with_arbiter_answer("FINAL CODE:\nx"),
        );
        let result = RunDeliberationUseCase::new(gateway)
            .execute(code_input().with_max_iterations(1))
            .await
            .unwrap();

        let before = &result.iterations[0].submissions[1];
        let after = &result.iterations[1].submissions[1];
        assert_eq!(after.content, before.content);
        assert_eq!(after.iteration, before.iteration + 1);
        assert!(after.carried_forward);
        assert!(!result.iterations[1].submissions[0].carried_forward);
    }

    #[tokio::test]
    async fn test_council_variant_skips_refinement_and_tests() {
        let responder: Responder = Box::new(|_: &QueryRequest, prompt: &str| {
            if prompt.contains(REVIEW) {
                Some(
                    "Response A:\n- Bugs: none\n- Overall Score: 8\nFINAL RANKING:\n1. Response A"
                        .to_string(),
                )
            } else {
                Some("Rust is a systems language.".to_string())
            }
        });
        let gateway = Arc::new(
            MockGateway::new(&["a", "b"], responder)
                .with_arbiter_answer("Summary first.\nFINAL ANSWER:\nRust is memory safe."),
        );
        let result = RunDeliberationUseCase::new(gateway.clone())
            .execute(DeliberationInput::council(Prompt::new("What is Rust?").unwrap()))
            .await
            .unwrap();

        assert_eq!(result.iterations.len(), 1);
        assert!(result.tests.is_empty());
        assert!(gateway.calls_matching(REFINEMENT).is_empty());
        assert!(gateway.calls_matching(TESTS).is_empty());
        assert_eq!(result.artifact.unwrap().content, "Rust is memory safe.");
        assert_eq!(
            result.metadata.states,
            vec![
                PipelineState::Init,
                PipelineState::Generated,
                PipelineState::FinalReviewed,
                PipelineState::Synthesized,
                PipelineState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_partial_generation_failure_keeps_survivors() {
        let responder: Responder = Box::new(|request: &QueryRequest, prompt: &str| {
            if prompt.contains(GENERATION) && request.model.as_str() == "b" {
                return None;
            }
            (happy_responder())(request, prompt)
        });
        let gateway = Arc::new(
            MockGateway::new(&["a", "b", "c"], responder).with_arbiter_answer("FINAL CODE:\nx"),
        );
        let result = RunDeliberationUseCase::new(gateway)
            .execute(code_input().with_max_iterations(1))
            .await
            .unwrap();

        let models: Vec<_> = result.iterations[0]
            .submissions
            .iter()
            .map(|s| s.model.as_str().to_string())
            .collect();
        assert_eq!(models, vec!["a", "c"]);
        assert_eq!(result.iterations[0].labels.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let gateway = Arc::new(MockGateway::new(&["a"], happy_responder()));
        let token = CancellationToken::new();
        token.cancel();
        let err = RunDeliberationUseCase::new(gateway.clone())
            .with_cancellation(token)
            .execute(code_input())
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(gateway.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_ranking_recorded() {
        let gateway = Arc::new(
            MockGateway::new(&["x", "y", "z"], happy_responder())
                .with_arbiter_answer("FINAL CODE:\nx"),
        );
        let result = RunDeliberationUseCase::new(gateway)
            .execute(code_input().with_max_iterations(1))
            .await
            .unwrap();

        let ranking = &result.iterations[0].aggregate_ranking;
        assert_eq!(ranking[0].model, ModelId::from("x"));
        assert!(ranking[0].score > ranking[2].score);
    }
}
