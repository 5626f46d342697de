use crate::dto::interview_dto::JobSpec;
use crate::error::{Error, Result};
use crate::models::interview::MockInterview;
use crate::models::question::QuestionSet;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const INTERVIEW_COLUMNS: &str = "id, job_role, job_description, experience_years, tech_stack, \
     questions, degraded, created_by, created_at";

#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
    write_timeout: Duration,
}

impl InterviewService {
    pub fn new(pool: PgPool, write_timeout: Duration) -> Self {
        Self { pool, write_timeout }
    }

    /// Stores a generated set; id and `created_at` are assigned by the database.
    pub async fn create(
        &self,
        job: &JobSpec,
        questions: &QuestionSet,
        degraded: bool,
        created_by: Option<&str>,
    ) -> Result<MockInterview> {
        let questions = serde_json::to_value(questions)?;
        let experience_years = i32::try_from(job.experience_years)
            .map_err(|_| Error::BadRequest("experience_years is out of range".to_string()))?;
        let tech_stack: Vec<String> = job
            .tech_stack_items()
            .into_iter()
            .map(str::to_string)
            .collect();

        let sql = format!(
            r#"
            INSERT INTO mock_interviews
                (job_role, job_description, experience_years, tech_stack, questions, degraded, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INTERVIEW_COLUMNS
        );
        let insert = sqlx::query_as::<_, MockInterview>(&sql)
            .bind(job.role.trim())
            .bind(job.description.trim())
            .bind(experience_years)
            .bind(tech_stack)
            .bind(questions)
            .bind(degraded)
            .bind(created_by)
            .fetch_one(&self.pool);

        match tokio::time::timeout(self.write_timeout, insert).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::error!(timeout_secs = self.write_timeout.as_secs(), "Saving mock interview timed out");
                Err(Error::Internal("Saving the interview timed out".to_string()))
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<MockInterview> {
        let sql = format!("SELECT {} FROM mock_interviews WHERE id = $1", INTERVIEW_COLUMNS);
        let interview = sqlx::query_as::<_, MockInterview>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(interview)
    }

    /// Newest first, optionally limited to one author.
    pub async fn list(&self, created_by: Option<&str>, limit: i64) -> Result<Vec<MockInterview>> {
        let sql = format!(
            r#"
            SELECT {} FROM mock_interviews
            WHERE ($1::text IS NULL OR created_by = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
            INTERVIEW_COLUMNS
        );
        let interviews = sqlx::query_as::<_, MockInterview>(&sql)
            .bind(created_by)
            .bind(limit.clamp(1, 100))
            .fetch_all(&self.pool)
            .await?;
        Ok(interviews)
    }
}
