//! Review stage: anonymized cross-review of the current submissions.

use super::types::{DeliberationInput, RunError};
use super::{RunDeliberationUseCase, member_messages};
use crate::ports::council_gateway::{CouncilGateway, QueryRequest};
use crate::ports::progress::ProgressNotifier;
use crate::ports::run_logger::RunEvent;
use council_domain::{
    IterationSnapshot, Label, LabelMap, ModelId, PromptTemplate, ReviewerReport, Stage,
    aggregate_rankings, parse_review,
};
use serde_json::json;
use tracing::debug;

impl<G: CouncilGateway + 'static> RunDeliberationUseCase<G> {
    /// Label the snapshot's submissions, collect every reviewer's parsed
    /// report and the aggregate ranking into the snapshot.
    pub(super) async fn review(
        &self,
        input: &DeliberationInput,
        council: &[ModelId],
        snapshot: &mut IterationSnapshot,
        stage: Stage,
        progress: &dyn ProgressNotifier,
    ) -> Result<(), RunError> {
        let labels = LabelMap::assign(snapshot.submissions.iter().map(|s| &s.model));
        let labeled: Vec<(Label, &str)> = labels
            .labels()
            .into_iter()
            .zip(snapshot.submissions.iter().map(|s| s.content.as_str()))
            .collect();

        let prompt = PromptTemplate::review(input.variant, input.text(), &labeled);
        let messages = member_messages(input.variant, prompt);
        let requests = council.iter().cloned().map(QueryRequest::routed).collect();

        let results = self.fan_out(stage, requests, &messages, progress).await?;

        let noun = input.variant.submission_noun();
        let reviews: Vec<ReviewerReport> = results
            .into_iter()
            .filter_map(|(reviewer, result)| {
                let result = result?;
                let parsed = parse_review(&result.content, &labels, noun);
                debug!(
                    reviewer = %reviewer,
                    critiques = parsed.critiques.len(),
                    ranked = parsed.ranking.labels().len(),
                    "Parsed review"
                );
                Some(ReviewerReport {
                    reviewer,
                    node: result.node,
                    raw_text: result.content,
                    critiques: parsed.critiques,
                    ranking: parsed.ranking,
                })
            })
            .collect();

        let aggregate = aggregate_rankings(&reviews, &labels);

        self.logger.log(RunEvent::new(
            "review",
            json!({
                "stage": stage,
                "iteration": snapshot.iteration,
                "labels": labels,
                "reviews": reviews,
                "aggregate_ranking": aggregate,
            }),
        ));

        snapshot.labels = labels;
        snapshot.reviews = reviews;
        snapshot.aggregate_ranking = aggregate;
        Ok(())
    }
}
