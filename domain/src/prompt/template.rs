//! Prompt templates for the council rounds

use crate::council::label::Label;
use crate::council::parsing::RANKING_HEADER;

/// Templates for generating prompts for each round
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for round 1
    pub fn initial_system() -> &'static str {
        r#"You are a knowledgeable expert sitting on a council of independent experts.
Your task is to provide a thoughtful, well-reasoned response to the question.
Be concise but comprehensive. Support your points with reasoning and examples where appropriate.
Focus on accuracy and clarity."#
    }

    /// User prompt for round 1
    pub fn initial_query(question: &str) -> String {
        format!(
            r#"Please answer the following question:

{}

Provide a clear, well-structured response."#,
            question
        )
    }

    /// System prompt for round 2
    pub fn review_system() -> &'static str {
        r#"You are a critical reviewer evaluating anonymized responses from other experts.
Your task is to objectively assess the accuracy and insight of each response.
Be fair but thorough in your evaluation. Identify both strengths and weaknesses.
Always finish with the exact SCORES and FINAL RANKING sections you are asked for."#
    }

    /// User prompt for round 2.
    ///
    /// `responses` holds only the labels this reviewer may see, in label
    /// order. The reviewer's own response is never among them.
    pub fn review_prompt(question: &str, responses: &[(Label, &str)]) -> String {
        if responses.is_empty() {
            return format!(
                r#"You were asked to evaluate other responses to the following question:

Question: {}

No other responses were received, so there is nothing to evaluate.
Reply with an empty section:

{}
"#,
                question, RANKING_HEADER
            );
        }

        let labels: Vec<String> = responses.iter().map(|(l, _)| l.to_string()).collect();

        let mut prompt = format!(
            r#"You are evaluating different responses to the following question:

Question: {}

Here are the responses from different experts (anonymized):
"#,
            question
        );

        for (label, content) in responses {
            prompt.push_str(&format!("\n{}:\n{}\n", label, content));
        }

        prompt.push_str(&format!(
            "\nThere are exactly {} responses: {}\n",
            labels.len(),
            labels.join(", ")
        ));

        prompt.push_str(
            r#"
Your task:
1. Evaluate each response individually: what it does well and what it does poorly.
2. Score each response for accuracy (0-10) and insight (0-10). The total is accuracy + insight.
3. Rank the responses from best to worst by total. Break ties by accuracy, then insight.

IMPORTANT: end your answer with these two sections, formatted EXACTLY as follows:
- A line "SCORES:" followed by one line per response:
  <label> | accuracy=<0-10> | insight=<0-10> | total=<sum>
- A line "FINAL RANKING:" followed by a numbered list, best first, with ONLY the label on each line
- Do NOT invent additional responses. Only score and rank the responses listed above.

Example of the two final sections:

SCORES:
"#,
        );

        for (label, _) in responses {
            prompt.push_str(&format!("{} | accuracy=8 | insight=7 | total=15\n", label));
        }
        prompt.push_str("\nFINAL RANKING:\n");
        for (i, label) in labels.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, label));
        }

        prompt.push_str("\nNow provide your evaluation, scores and ranking:");
        prompt
    }

    /// User prompt for conversation title generation
    pub fn title_prompt(question: &str) -> String {
        format!(
            r#"Generate a very short title (3-5 words maximum) that summarizes the following question.
The title should be concise and descriptive. Do not use quotes or punctuation in the title.

Question: {}

Title:"#,
            question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::council::parsing::SCORES_HEADER;

    #[test]
    fn test_initial_query_format() {
        let question = "What is Rust?";
        let prompt = PromptTemplate::initial_query(question);
        assert!(prompt.contains(question));
    }

    #[test]
    fn test_review_prompt_lists_only_given_labels() {
        let responses = vec![
            (Label::from_index(0), "Rust is a systems programming language."),
            (Label::from_index(2), "Rust focuses on safety and performance."),
        ];
        let prompt = PromptTemplate::review_prompt("What is Rust?", &responses);
        assert!(prompt.contains("Response A:\nRust is a systems"));
        assert!(prompt.contains("Response C:\nRust focuses"));
        assert!(!prompt.contains("Response B"));
        assert!(prompt.contains("exactly 2 responses: Response A, Response C"));
        assert!(prompt.contains(SCORES_HEADER));
        assert!(prompt.contains(RANKING_HEADER));
    }

    #[test]
    fn test_review_prompt_with_nothing_to_review() {
        let prompt = PromptTemplate::review_prompt("What is Rust?", &[]);
        assert!(prompt.contains("nothing to evaluate"));
        assert!(prompt.contains(RANKING_HEADER));
        assert!(!prompt.contains("Response A"));
    }

    #[test]
    fn test_title_prompt_format() {
        let prompt = PromptTemplate::title_prompt("How do lifetimes work?");
        assert!(prompt.contains("How do lifetimes work?"));
        assert!(prompt.ends_with("Title:"));
    }
}
