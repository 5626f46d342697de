pub mod gemini_client;
pub mod interview_service;
pub mod invoker;
pub mod model_catalog;
pub mod question_service;
pub mod response_parser;
