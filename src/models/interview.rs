use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MockInterview {
    pub id: Uuid,
    pub job_role: String,
    pub job_description: String,
    pub experience_years: i32,
    pub tech_stack: Vec<String>,
    pub questions: JsonValue,
    pub degraded: bool,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}
