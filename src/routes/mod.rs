pub mod health;
pub mod interview;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/interviews/generate", post(interview::generate_questions))
        .route(
            "/api/interviews",
            get(interview::list_interviews).post(interview::create_interview),
        )
        .route("/api/interviews/:id", get(interview::get_interview))
}
