use crate::error::GenerationError;
use crate::services::gemini_client::GenerativeBackend;
use crate::services::model_catalog::ModelCatalog;
use std::sync::Arc;

/// Raw text returned by the first model that answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationOutput {
    pub model: String,
    pub text: String,
}

/// Sweeps the catalog's candidates in priority order until one model answers.
pub struct ResilientInvoker {
    backend: Arc<dyn GenerativeBackend>,
    catalog: ModelCatalog,
}

impl ResilientInvoker {
    pub fn new(backend: Arc<dyn GenerativeBackend>, catalog: ModelCatalog) -> Self {
        Self { backend, catalog }
    }

    pub fn has_credential(&self) -> bool {
        self.backend.has_credential()
    }

    pub async fn invoke(&self, prompt: &str) -> Result<InvocationOutput, GenerationError> {
        if !self.backend.has_credential() {
            return Err(GenerationError::MissingCredential);
        }

        let candidates = self.catalog.candidates().await;
        if candidates.is_empty() {
            return Err(GenerationError::NoCandidates);
        }

        let mut last_error = None;
        for model in candidates {
            match self.backend.generate_content(model, prompt).await {
                Ok(text) => {
                    tracing::info!(model = %model, "Generation succeeded");
                    return Ok(InvocationOutput {
                        model: model.clone(),
                        text,
                    });
                }
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "Generation failed, trying next model");
                    last_error = Some(e);
                }
            }
        }

        Err(GenerationError::AllCandidatesFailed {
            attempted: candidates.to_vec(),
            last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::gemini_client::MockGenerativeBackend;
    use mockall::{predicate::*, Sequence};

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn invoker(backend: MockGenerativeBackend, candidates: Vec<String>) -> ResilientInvoker {
        let backend: Arc<dyn GenerativeBackend> = Arc::new(backend);
        let catalog = ModelCatalog::with_preferred(backend.clone(), candidates);
        ResilientInvoker::new(backend, catalog)
    }

    fn credentialed_backend() -> MockGenerativeBackend {
        let mut backend = MockGenerativeBackend::new();
        backend.expect_has_credential().return_const(true);
        backend
            .expect_list_generation_models()
            .returning(|| Ok(Vec::new()));
        backend
    }

    #[tokio::test]
    async fn missing_credential_fails_without_network() {
        let mut backend = MockGenerativeBackend::new();
        backend.expect_has_credential().return_const(false);
        backend.expect_list_generation_models().never();
        backend.expect_generate_content().never();

        let err = invoker(backend, models(&["a"])).invoke("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredential));
    }

    #[tokio::test]
    async fn empty_catalog_fails_with_no_candidates() {
        let mut backend = credentialed_backend();
        backend.expect_generate_content().never();

        let err = invoker(backend, vec![]).invoke("prompt").await.unwrap_err();
        assert!(matches!(err, GenerationError::NoCandidates));
    }

    #[tokio::test]
    async fn stops_at_first_success() {
        let mut backend = credentialed_backend();
        let mut seq = Sequence::new();
        backend
            .expect_generate_content()
            .with(eq("m1"), eq("prompt"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|m, _| Err(GenerationError::invocation(m, "quota exceeded")));
        backend
            .expect_generate_content()
            .with(eq("m2"), eq("prompt"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|m, _| Err(GenerationError::invocation(m, "not found")));
        backend
            .expect_generate_content()
            .with(eq("m3"), eq("prompt"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("[]".to_string()));
        backend
            .expect_generate_content()
            .with(eq("m4"), always())
            .never();

        let output = invoker(backend, models(&["m1", "m2", "m3", "m4"]))
            .invoke("prompt")
            .await
            .unwrap();

        assert_eq!(
            output,
            InvocationOutput {
                model: "m3".into(),
                text: "[]".into()
            }
        );
    }

    #[tokio::test]
    async fn exhausting_the_list_reports_every_attempt_and_last_error() {
        let mut backend = credentialed_backend();
        backend
            .expect_generate_content()
            .times(2)
            .returning(|m, _| Err(GenerationError::invocation(m, format!("{} overloaded", m))));

        let err = invoker(backend, models(&["m1", "m2"]))
            .invoke("prompt")
            .await
            .unwrap_err();

        match &err {
            GenerationError::AllCandidatesFailed {
                attempted,
                last_error,
            } => {
                assert_eq!(attempted, &models(&["m1", "m2"]));
                assert!(last_error.contains("m2 overloaded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("m1, m2"));
    }
}
