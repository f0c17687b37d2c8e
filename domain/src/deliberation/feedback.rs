//! Critique selection for refinement prompts

use super::entities::{CritiqueCategory, ReviewerReport};
use super::label::Label;
use crate::core::model::ModelId;
use serde::{Deserialize, Serialize};

/// Default number of critiques passed to one refinement prompt
pub const DEFAULT_MAX_CRITIQUES: usize = 3;

/// One reviewer's feedback on one submission, ready for a refinement prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementFeedback {
    pub reviewer: ModelId,
    pub score: Option<u8>,
    /// Categories in refinement priority order; empty categories omitted
    pub points: Vec<(CritiqueCategory, String)>,
}

/// Collect up to `limit` critiques addressed to `label`.
///
/// Reviewers are taken in report order; a reviewer whose critique of the
/// label has neither category text nor a score contributes nothing.
pub fn collect_feedback(
    reports: &[ReviewerReport],
    label: &Label,
    limit: usize,
) -> Vec<RefinementFeedback> {
    reports
        .iter()
        .filter_map(|report| {
            let critique = report.critique_for(label)?;
            let points: Vec<(CritiqueCategory, String)> = CritiqueCategory::REFINEMENT_PRIORITY
                .iter()
                .filter_map(|category| {
                    critique
                        .categories
                        .get(category)
                        .filter(|text| !text.trim().is_empty())
                        .map(|text| (*category, text.clone()))
                })
                .collect();
            if points.is_empty() && critique.score.is_none() {
                return None;
            }
            Some(RefinementFeedback {
                reviewer: report.reviewer.clone(),
                score: critique.score,
                points,
            })
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliberation::entities::{RankingList, StructuredCritique};
    use std::collections::BTreeMap;

    fn critique(
        label: &Label,
        entries: &[(CritiqueCategory, &str)],
        score: Option<u8>,
    ) -> StructuredCritique {
        StructuredCritique {
            label: label.clone(),
            categories: entries
                .iter()
                .map(|(c, t)| (*c, t.to_string()))
                .collect::<BTreeMap<_, _>>(),
            score,
            raw: String::new(),
        }
    }

    fn report(reviewer: &str, critiques: Vec<StructuredCritique>) -> ReviewerReport {
        ReviewerReport {
            reviewer: ModelId::from(reviewer),
            node: "n".to_string(),
            raw_text: String::new(),
            critiques,
            ranking: RankingList::default(),
        }
    }

    #[test]
    fn test_only_critiques_for_requested_label() {
        let a = Label::from_index(0);
        let b = Label::from_index(1);
        let reports = vec![report(
            "r1",
            vec![
                critique(&a, &[(CritiqueCategory::Bugs, "off by one")], Some(6)),
                critique(&b, &[(CritiqueCategory::Style, "naming")], Some(8)),
            ],
        )];

        let feedback = collect_feedback(&reports, &b, 3);
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].score, Some(8));
        assert_eq!(
            feedback[0].points,
            vec![(CritiqueCategory::Style, "naming".to_string())]
        );
    }

    #[test]
    fn test_limit_and_priority_order() {
        let a = Label::from_index(0);
        let entries = [
            (CritiqueCategory::BestPractices, "split module"),
            (CritiqueCategory::Performance, "avoid clone"),
            (CritiqueCategory::Security, "validate input"),
            (CritiqueCategory::Bugs, "panics on empty"),
        ];
        let reports: Vec<_> = (0..5)
            .map(|i| report(&format!("r{}", i), vec![critique(&a, &entries, Some(5))]))
            .collect();

        let feedback = collect_feedback(&reports, &a, 3);
        assert_eq!(feedback.len(), 3);
        assert_eq!(feedback[0].reviewer, ModelId::from("r0"));
        let order: Vec<_> = feedback[0].points.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            order,
            vec![
                CritiqueCategory::Bugs,
                CritiqueCategory::Security,
                CritiqueCategory::Performance,
                CritiqueCategory::BestPractices,
            ]
        );
    }

    #[test]
    fn test_empty_critique_skipped() {
        let a = Label::from_index(0);
        let reports = vec![
            report("r1", vec![critique(&a, &[(CritiqueCategory::Bugs, "  ")], None)]),
            report("r2", vec![critique(&a, &[], Some(9))]),
        ];
        let feedback = collect_feedback(&reports, &a, 3);
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].reviewer, ModelId::from("r2"));
    }
}
