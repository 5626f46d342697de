use crate::dto::interview_dto::JobSpec;
use crate::error::GenerationError;
use crate::models::question::{QuestionAnswerPair, QuestionSet};
use crate::services::invoker::ResilientInvoker;
use crate::services::response_parser::parse_question_set;
use std::time::Duration;

pub const DEFAULT_PRIMARY_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_QUESTION_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuestions {
    pub questions: QuestionSet,
    /// Set when the questions are the offline fallback; carries the reason.
    pub warning: Option<String>,
}

impl GeneratedQuestions {
    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GenerationTimeouts {
    pub primary: Duration,
    pub retry: Duration,
}

impl Default for GenerationTimeouts {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_TIMEOUT,
            retry: DEFAULT_RETRY_TIMEOUT,
        }
    }
}

pub struct QuestionGenerator {
    invoker: ResilientInvoker,
    timeouts: GenerationTimeouts,
    question_count: usize,
}

impl QuestionGenerator {
    pub fn new(invoker: ResilientInvoker, timeouts: GenerationTimeouts, question_count: usize) -> Self {
        Self {
            invoker,
            timeouts,
            question_count: question_count.max(1),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.invoker.has_credential()
    }

    /// Always yields a usable question set unless no credential is configured.
    ///
    /// A timed-out first sweep is retried once with the longer bound; any other failure, or a
    /// failed retry, falls back to questions derived from `job` alone.
    pub async fn generate_questions(&self, job: &JobSpec) -> Result<GeneratedQuestions, GenerationError> {
        if !self.invoker.has_credential() {
            return Err(GenerationError::MissingCredential);
        }

        let prompt = build_prompt(job, self.question_count);

        let outcome = match self.attempt(&prompt, self.timeouts.primary).await {
            Err(e) if e.is_timeout() => {
                tracing::warn!(error = %e, "Question generation timed out, retrying with a longer timeout");
                self.attempt(&prompt, self.timeouts.retry).await
            }
            other => other,
        };

        match outcome {
            Ok(questions) => Ok(GeneratedQuestions {
                questions,
                warning: None,
            }),
            Err(e) => {
                let warning = format!("AI generation failed, using standard questions instead: {}", e);
                tracing::warn!(error = %e, role = %job.role_or_default(), "Falling back to offline questions");
                Ok(GeneratedQuestions {
                    questions: fallback_questions(job),
                    warning: Some(warning),
                })
            }
        }
    }

    async fn attempt(&self, prompt: &str, bound: Duration) -> Result<QuestionSet, GenerationError> {
        let output = tokio::time::timeout(bound, self.invoker.invoke(prompt))
            .await
            .map_err(|_| GenerationError::Timeout(bound))??;
        let questions = parse_question_set(&output.text)?;
        tracing::info!(model = %output.model, count = questions.len(), "Generated interview questions");
        Ok(questions)
    }
}

pub fn build_prompt(job: &JobSpec, question_count: usize) -> String {
    let stack = job.tech_stack_items();
    let stack = if stack.is_empty() {
        "not specified".to_string()
    } else {
        stack.join(", ")
    };

    format!(
        "Job position: {role}\n\
         Job description: {description}\n\
         Years of experience: {years}\n\
         Tech stack: {stack}\n\n\
         Based on this information, write {count} interview questions with model answers. \
         Respond with a JSON array only, where each element is an object with exactly two \
         string fields: \"question\" and \"answer\". Do not add any text outside the array.",
        role = job.role.trim(),
        description = job.description.trim(),
        years = job.experience_years,
        stack = stack,
        count = question_count,
    )
}

/// Offline question set derived from `job` alone. Same input, same output.
pub fn fallback_questions(job: &JobSpec) -> QuestionSet {
    let role = job.role_or_default();
    let stack = job.tech_stack_items();
    let primary_tech = stack.first().copied().unwrap_or("your main technology");
    let stack_list = if stack.is_empty() {
        "the tools you use most".to_string()
    } else {
        stack.join(", ")
    };
    let seniority = match job.experience_years {
        0..=1 => "early in your career",
        2..=4 => "as a mid-level engineer",
        _ => "as a senior engineer",
    };

    vec![
        QuestionAnswerPair::new(
            format!("Tell me about yourself and why you are interested in the {} position.", role),
            format!(
                "Give a short summary of your background, highlight the experience most relevant to {}, \
                 and connect your motivation to what this team is building.",
                role
            ),
        ),
        QuestionAnswerPair::new(
            format!("Describe a project where you used {} in production. What was your role?", stack_list),
            "Pick one concrete project. Explain the problem, the design choices you made, what you \
             personally owned, and a measurable outcome."
                .to_string(),
        ),
        QuestionAnswerPair::new(
            format!("What are the main trade-offs to keep in mind when building with {}?", primary_tech),
            format!(
                "Discuss strengths and weaknesses of {} such as performance, maintainability and \
                 ecosystem maturity, and give an example where a trade-off affected a decision.",
                primary_tech
            ),
        ),
        QuestionAnswerPair::new(
            format!(
                "With {} year(s) of experience, how do you approach a task you have never done before?",
                job.experience_years
            ),
            format!(
                "Show how you break the problem down, research options, ask for help at the right time, \
                 and validate the result, with an example from your time {}.",
                seniority
            ),
        ),
        QuestionAnswerPair::new(
            format!("Tell me about a difficult bug or incident you handled in a previous {} role.", role),
            "Use the situation, task, action, result structure: how you found the root cause, how you \
             fixed it, and what you changed to prevent it from happening again."
                .to_string(),
        ),
    ]
}
