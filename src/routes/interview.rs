use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::interview_dto::{
        CreateInterviewPayload, GeneratedQuestionsResponse, InterviewListQuery, InterviewResponse,
        JobSpec,
    },
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/interviews/generate",
    request_body = JobSpec,
    responses(
        (status = 200, description = "Questions generated, possibly from the offline fallback", body = Json<GeneratedQuestionsResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 503, description = "AI credential not configured")
    )
)]
#[axum::debug_handler]
pub async fn generate_questions(
    State(state): State<AppState>,
    Json(payload): Json<JobSpec>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let generated = state.question_generator.generate_questions(&payload).await?;
    Ok(Json(GeneratedQuestionsResponse {
        degraded: generated.is_degraded(),
        questions: generated.questions,
        warning: generated.warning,
    }))
}

#[utoipa::path(
    post,
    path = "/api/interviews",
    request_body = CreateInterviewPayload,
    responses(
        (status = 201, description = "Interview generated and stored", body = Json<InterviewResponse>),
        (status = 400, description = "Invalid payload"),
        (status = 503, description = "AI credential not configured")
    )
)]
#[axum::debug_handler]
pub async fn create_interview(
    State(state): State<AppState>,
    Json(payload): Json<CreateInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let generated = state
        .question_generator
        .generate_questions(&payload.job)
        .await?;

    let record = state
        .interview_service
        .create(
            &payload.job,
            &generated.questions,
            generated.is_degraded(),
            payload.created_by.as_deref(),
        )
        .await?;
    tracing::info!(interview_id = %record.id, degraded = record.degraded, "Mock interview stored");

    Ok((
        StatusCode::CREATED,
        Json(InterviewResponse::from_record(record, generated.warning)?),
    ))
}

#[utoipa::path(
    get,
    path = "/api/interviews/{id}",
    params(
        ("id" = Uuid, Path, description = "Interview ID")
    ),
    responses(
        (status = 200, description = "Stored interview", body = Json<InterviewResponse>),
        (status = 404, description = "Interview not found")
    )
)]
pub async fn get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let record = state.interview_service.get(id).await?;
    Ok(Json(InterviewResponse::from_record(record, None)?))
}

#[utoipa::path(
    get,
    path = "/api/interviews",
    params(
        ("created_by" = Option<String>, Query, description = "Only interviews created by this user"),
        ("limit" = Option<i64>, Query, description = "Maximum number of interviews, 1 to 100 (default 20)")
    ),
    responses(
        (status = 200, description = "Most recent interviews first", body = Json<Vec<InterviewResponse>>),
        (status = 500, description = "Stored interview could not be read")
    )
)]
pub async fn list_interviews(
    State(state): State<AppState>,
    Query(query): Query<InterviewListQuery>,
) -> Result<impl IntoResponse> {
    let records = state
        .interview_service
        .list(query.created_by.as_deref(), query.limit.unwrap_or(20))
        .await?;
    let items = records
        .into_iter()
        .map(|record| InterviewResponse::from_record(record, None))
        .collect::<Result<Vec<_>>>()?;
    Ok(Json(items))
}
