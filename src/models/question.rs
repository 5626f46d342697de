use serde::{Deserialize, Serialize};

/// One interview question with its model answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswerPair {
    pub question: String,
    pub answer: String,
}

impl QuestionAnswerPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Pairs from a single generation attempt, in model order.
pub type QuestionSet = Vec<QuestionAnswerPair>;
