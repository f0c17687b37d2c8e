//! Prompt templates for the deliberation stages

use crate::core::model::ModelId;
use crate::deliberation::entities::CritiqueCategory;
use crate::deliberation::feedback::RefinementFeedback;
use crate::deliberation::label::Label;
use crate::deliberation::variant::Variant;
use crate::parsing::{ANSWER_MARKER, CODE_MARKER, RANKING_MARKER, SCORE_HEADER, TESTS_MARKER};

/// Optional language and framework of a code run
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetStack<'a> {
    pub language: Option<&'a str>,
    pub framework: Option<&'a str>,
}

impl TargetStack<'_> {
    fn preamble(&self) -> String {
        let mut out = String::new();
        if let Some(language) = self.language {
            out.push_str(&format!("Programming Language: {}\n", language));
        }
        if let Some(framework) = self.framework {
            out.push_str(&format!("Framework/Library: {}\n", framework));
        }
        out
    }
}

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt shared by every council member call
    pub fn member_system(variant: Variant) -> &'static str {
        match variant {
            Variant::Council => {
                r#"You are a knowledgeable expert participating in a council of models.
Be accurate, concise and well-reasoned. Support your points with examples where appropriate."#
            }
            Variant::Code => {
                r#"You are an expert software developer participating in a code council.
You write production-ready code and give precise, actionable review feedback."#
            }
        }
    }

    /// System prompt for the arbiter
    pub fn arbiter_system(variant: Variant) -> &'static str {
        match variant {
            Variant::Council => {
                r#"You are the arbiter of the council. You synthesize several expert answers into one
balanced, accurate final answer."#
            }
            Variant::Code => {
                r#"You are the arbiter of the code council. You combine the strongest parts of several
submissions into production-ready code and a comprehensive test suite."#
            }
        }
    }

    /// Initial generation prompt
    pub fn generation(variant: Variant, prompt: &str, stack: TargetStack<'_>) -> String {
        match variant {
            Variant::Council => format!(
                r#"Please answer the following question:

{}

Provide a clear, well-structured response."#,
                prompt
            ),
            Variant::Code => format!(
                r#"Generate clean, well-structured code based on the following specification.

{}
Specification:
{}

Requirements:
- Write production-ready code
- Include proper error handling
- Add comments where appropriate
- Follow best practices for the language
- Make the code maintainable and readable

Provide ONLY the code without any explanations or markdown formatting. Start directly with the code."#,
                stack.preamble(),
                prompt
            ),
        }
    }

    /// Anonymized peer review prompt over the labeled submissions of one round
    pub fn review(variant: Variant, prompt: &str, submissions: &[(Label, &str)]) -> String {
        let noun = variant.submission_noun();
        let mut out = match variant {
            Variant::Council => format!(
                "You are reviewing answers from other experts to the following question.\n\n\
                 Original question:\n{}\n\nResponses:\n",
                prompt
            ),
            Variant::Code => format!(
                "You are a senior code reviewer. Review the following code submissions against \
                 the original specification.\n\nOriginal Specification:\n{}\n\n\
                 Code Submissions:\n",
                prompt
            ),
        };

        for (label, content) in submissions {
            match variant {
                Variant::Council => out.push_str(&format!("\n{} {}:\n{}\n", noun, label, content)),
                Variant::Code => {
                    out.push_str(&format!("\n{} {}:\n```\n{}\n```\n", noun, label, content))
                }
            }
        }

        out.push_str(&format!(
            "\nFor each {}, provide structured feedback in the following categories:\n\n",
            noun.to_lowercase()
        ));
        for (i, category) in CritiqueCategory::ALL.iter().enumerate() {
            out.push_str(&format!(
                "{}. **{}**: {}\n",
                i + 1,
                category.header(),
                Self::category_guidance(variant, *category)
            ));
        }

        out.push_str("\nFormat your response as follows for EACH submission:\n\n");
        out.push_str(&format!("{} X:\n", noun));
        for category in CritiqueCategory::ALL {
            let header = category.header();
            out.push_str(&format!("- {}: [{} feedback]\n", header, header.to_lowercase()));
        }
        out.push_str(&format!("- {}: [1-10 rating]\n", SCORE_HEADER));

        out.push_str(&format!(
            "\nThen provide a ranking at the end, best first:\n\n{}:\n",
            RANKING_MARKER
        ));
        let shown = submissions.len().clamp(1, 3);
        for i in 0..shown {
            out.push_str(&format!("{}. {} {}\n", i + 1, noun, ["X", "Y", "Z"][i]));
        }
        out
    }

    fn category_guidance(variant: Variant, category: CritiqueCategory) -> &'static str {
        match (variant, category) {
            (Variant::Code, CritiqueCategory::Bugs) => {
                "Actual errors, logic issues, or potential runtime problems"
            }
            (Variant::Code, CritiqueCategory::Style) => {
                "Code formatting, naming conventions, consistency"
            }
            (Variant::Code, CritiqueCategory::Performance) => {
                "Optimization opportunities, efficiency concerns"
            }
            (Variant::Code, CritiqueCategory::Security) => {
                "Vulnerabilities, unsafe practices, security risks"
            }
            (Variant::Code, CritiqueCategory::BestPractices) => {
                "Design patterns, maintainability, code organization"
            }
            (Variant::Council, CritiqueCategory::Bugs) => "Factual errors and incorrect claims",
            (Variant::Council, CritiqueCategory::Style) => "Clarity and organization",
            (Variant::Council, CritiqueCategory::Performance) => {
                "Completeness and depth of the answer"
            }
            (Variant::Council, CritiqueCategory::Security) => {
                "Risky or misleading advice, missing caveats"
            }
            (Variant::Council, CritiqueCategory::BestPractices) => "Practical usefulness",
        }
    }

    /// Refinement prompt for one submission and the critiques addressed to it
    pub fn refinement(
        variant: Variant,
        prompt: &str,
        content: &str,
        feedback: &[RefinementFeedback],
        iteration: u32,
    ) -> String {
        let feedback_text = feedback
            .iter()
            .map(|fb| {
                let score = fb
                    .score
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "n/a".to_string());
                let points = fb
                    .points
                    .iter()
                    .map(|(category, text)| format!("- {}: {}", category.header(), text))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("Reviewer: {}\nScore: {}\nFeedback:\n{}", fb.reviewer, score, points)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let feedback_text = if feedback_text.is_empty() {
            "(no reviewer feedback was recovered)".to_string()
        } else {
            feedback_text
        };

        match variant {
            Variant::Code => format!(
                r#"You are refining code based on peer review feedback.

Original Specification:
{}

Original Code:
```
{}
```

Review Feedback (Iteration {}):
{}

Refine the code to address the feedback while maintaining the original functionality. Prioritize:
1. Fixing bugs and errors
2. Improving code style and readability
3. Addressing security concerns
4. Optimizing performance where appropriate
5. Following best practices

Provide ONLY the refined code without explanations or markdown formatting."#,
                prompt, content, iteration, feedback_text
            ),
            Variant::Council => format!(
                r#"You are improving your answer based on peer review feedback.

Original question:
{}

Your previous answer:
{}

Review Feedback (Iteration {}):
{}

Revise your answer to fix factual errors first, then improve clarity, caveats, completeness and usefulness.
Provide ONLY the revised answer."#,
                prompt, content, iteration, feedback_text
            ),
        }
    }

    /// Test generation prompt against one piece of code
    pub fn tests(prompt: &str, code: &str, stack: TargetStack<'_>) -> String {
        let language = stack
            .language
            .map(|l| format!("Programming Language: {}\n", l))
            .unwrap_or_default();
        format!(
            r#"You are a test engineer. Generate comprehensive unit tests for the following code.

{}
Original Specification:
{}

Code to Test:
```
{}
```

Requirements:
- Write comprehensive unit tests
- Cover edge cases and error scenarios
- Use appropriate testing framework for the language
- Include both positive and negative test cases
- Make tests clear and maintainable

Provide ONLY the test code without explanations or markdown formatting."#,
            language, prompt, code
        )
    }

    /// Arbiter synthesis prompt
    pub fn synthesis(
        variant: Variant,
        prompt: &str,
        submissions: &[(&ModelId, &str)],
        tests: &[(&ModelId, &str)],
    ) -> String {
        match variant {
            Variant::Council => {
                let mut out = format!("Original question:\n{}\n\nExpert answers:\n", prompt);
                for (model, content) in submissions {
                    out.push_str(&format!("\n--- Answer from {} ---\n{}\n", model, content));
                }
                out.push_str(&format!(
                    r#"
Synthesize the strongest elements of these answers into one final answer.
Resolve disagreements in favour of the best supported position.

Provide your response in the following format:

{}:
[the final answer]"#,
                    ANSWER_MARKER
                ));
                out
            }
            Variant::Code => {
                let mut out = format!("Original Specification:\n{}\n\nCode Submissions:\n", prompt);
                for (model, content) in submissions {
                    out.push_str(&format!("\nCode from {}:\n```\n{}\n```\n", model, content));
                }
                if !tests.is_empty() {
                    out.push_str("\nTest Submissions:\n");
                    for (model, content) in tests {
                        out.push_str(&format!("\nTests from {}:\n```\n{}\n```\n", model, content));
                    }
                }
                out.push_str(&format!(
                    r#"
Your task:
1. Synthesize the best code by combining the strongest aspects of each submission
2. Integrate the best test cases into a comprehensive test suite
3. Ensure the final code is production-ready, well-tested, and follows best practices

Provide your response in the following format:

{}:
[the synthesized code]

{}:
[the synthesized test suite]

Do not include markdown code blocks, just the code directly."#,
                    CODE_MARKER, TESTS_MARKER
                ));
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliberation::label::LabelMap;
    use crate::parsing::parse_review;

    #[test]
    fn test_generation_includes_stack() {
        let stack = TargetStack {
            language: Some("Python"),
            framework: Some("FastAPI"),
        };
        let prompt = PromptTemplate::generation(Variant::Code, "Add two numbers", stack);
        assert!(prompt.contains("Programming Language: Python"));
        assert!(prompt.contains("Framework/Library: FastAPI"));
        assert!(prompt.contains("Add two numbers"));

        let open =
            PromptTemplate::generation(Variant::Council, "What is Rust?", TargetStack::default());
        assert!(open.contains("What is Rust?"));
        assert!(!open.contains("Programming Language"));
    }

    #[test]
    fn test_review_prompt_lists_labels_and_contract() {
        let a = Label::from_index(0);
        let b = Label::from_index(1);
        let prompt = PromptTemplate::review(
            Variant::Code,
            "spec",
            &[(a, "def f(): pass"), (b, "def g(): pass")],
        );
        assert!(prompt.contains("Code Submission A:"));
        assert!(prompt.contains("Code Submission B:"));
        assert!(prompt.contains("- Best Practices:"));
        assert!(prompt.contains("- Overall Score:"));
        assert!(prompt.contains("FINAL RANKING:"));
    }

    #[test]
    fn test_review_prompt_format_block_is_not_parsed_as_critique() {
        let a = Label::from_index(0);
        let prompt = PromptTemplate::review(Variant::Council, "q", &[(a, "answer")]);
        let labels = LabelMap::assign(&[ModelId::from("m")]);
        // The placeholder label `X` is not part of the round
        let parsed = parse_review(&prompt, &labels, Variant::Council.submission_noun());
        assert!(parsed.ranking.is_empty());
    }

    #[test]
    fn test_refinement_prompt_contains_feedback() {
        let feedback = vec![RefinementFeedback {
            reviewer: ModelId::from("gemma3:4b"),
            score: Some(6),
            points: vec![(CritiqueCategory::Bugs, "fails on empty input".to_string())],
        }];
        let prompt =
            PromptTemplate::refinement(Variant::Code, "spec", "def f(): pass", &feedback, 1);
        assert!(prompt.contains("Reviewer: gemma3:4b"));
        assert!(prompt.contains("Score: 6"));
        assert!(prompt.contains("- Bugs: fails on empty input"));
        assert!(prompt.contains("Iteration 1"));
    }

    #[test]
    fn test_synthesis_prompt_markers() {
        let model = ModelId::from("qwen3:4b");
        let code = PromptTemplate::synthesis(
            Variant::Code,
            "spec",
            &[(&model, "x = 1")],
            &[(&model, "assert x == 1")],
        );
        assert!(code.contains("FINAL CODE:"));
        assert!(code.contains("FINAL TESTS:"));
        assert!(code.contains("Tests from qwen3:4b"));

        let open = PromptTemplate::synthesis(Variant::Council, "q", &[(&model, "a")], &[]);
        assert!(open.contains("FINAL ANSWER:"));
        assert!(!open.contains("FINAL CODE:"));
    }
}
