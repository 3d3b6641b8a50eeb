use serde::{Deserialize, Serialize};

/// Source of wrong-answer suggestions for cloze options.
pub trait DistractorGenerator: Send + Sync {
    /// One list of distractors per entry of `correct_answers`, in the same order.
    fn suggest(&self, text: &str, correct_answers: &[String]) -> Vec<Vec<String>>;
}

/// Deterministic suggestions used when no external generator is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackDistractors;

impl DistractorGenerator for FallbackDistractors {
    fn suggest(&self, _text: &str, correct_answers: &[String]) -> Vec<Vec<String>> {
        correct_answers
            .iter()
            .map(|answer| {
                let mut truncated = answer.clone();
                truncated.pop();
                vec![format!("{answer}s"), truncated, "incorrect".to_string()]
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistractorRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub correct_answers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistractorSuggestions {
    pub distractors: Vec<Vec<String>>,
}
