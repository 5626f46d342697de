pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::Config;
use crate::services::{
    gemini_client::{GeminiClient, GenerativeBackend},
    interview_service::InterviewService,
    invoker::ResilientInvoker,
    model_catalog::ModelCatalog,
    question_service::{GenerationTimeouts, QuestionGenerator},
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub question_generator: Arc<QuestionGenerator>,
    pub interview_service: InterviewService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, crate::config::get_config())
    }

    pub fn with_config(pool: PgPool, config: &Config) -> Self {
        // Per-request bounds come from the generator's timeouts; this only caps stuck sockets.
        let http_client = Client::builder()
            .timeout(config.retry_timeout() + config.primary_timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        let backend: Arc<dyn GenerativeBackend> = Arc::new(GeminiClient::new(
            config.gemini_api_key.clone(),
            config.gemini_api_base_url.clone(),
            http_client,
        ));
        let catalog = ModelCatalog::new(backend.clone(), config.gemini_model.as_deref());
        let question_generator = QuestionGenerator::new(
            ResilientInvoker::new(backend, catalog),
            GenerationTimeouts {
                primary: config.primary_timeout(),
                retry: config.retry_timeout(),
            },
            config.question_count,
        );
        let interview_service = InterviewService::new(pool, config.storage_timeout());

        Self {
            question_generator: Arc::new(question_generator),
            interview_service,
        }
    }
}
