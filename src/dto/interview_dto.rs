use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{Error, Result};
use crate::models::interview::MockInterview;
use crate::models::question::{QuestionAnswerPair, QuestionSet};

/// Job description the candidate wants to practise for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct JobSpec {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub role: String,
    #[validate(length(min = 1, max = 5000), custom(function = "not_blank"))]
    pub description: String,
    #[validate(range(max = 60))]
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

impl JobSpec {
    pub fn role_or_default(&self) -> &str {
        non_blank(&self.role).unwrap_or("software engineer")
    }

    /// Trimmed, non-empty stack entries in input order.
    pub fn tech_stack_items(&self) -> Vec<&str> {
        self.tech_stack
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    match non_blank(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("blank")),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInterviewPayload {
    #[serde(flatten)]
    #[validate(nested)]
    pub job: JobSpec,
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedQuestionsResponse {
    pub questions: QuestionSet,
    pub degraded: bool,
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InterviewResponse {
    pub id: Uuid,
    pub job_role: String,
    pub job_description: String,
    pub experience_years: i32,
    pub tech_stack: Vec<String>,
    pub questions: Vec<QuestionAnswerPair>,
    pub degraded: bool,
    pub warning: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InterviewResponse {
    /// Fails when the stored `questions` column no longer decodes as a question set.
    pub fn from_record(record: MockInterview, warning: Option<String>) -> Result<Self> {
        let questions: QuestionSet = serde_json::from_value(record.questions).map_err(|e| {
            tracing::warn!(interview_id = %record.id, error = %e, "Stored questions are unreadable");
            Error::Internal(format!("Interview {} has unreadable questions", record.id))
        })?;
        Ok(Self {
            id: record.id,
            job_role: record.job_role,
            job_description: record.job_description,
            experience_years: record.experience_years,
            tech_stack: record.tech_stack,
            questions,
            degraded: record.degraded,
            warning,
            created_by: record.created_by,
            created_at: record.created_at,
        })
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct InterviewListQuery {
    pub created_by: Option<String>,
    pub limit: Option<i64>,
}
