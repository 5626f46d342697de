use crate::services::gemini_client::{strip_namespace, GenerativeBackend};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Hand-picked models tried after the configured one, spanning several tiers.
pub const FALLBACK_MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.0-flash",
    "gemini-2.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-2.0-flash-lite",
];

const FLASH_FAMILY: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"];
const PRO_FAMILY: &[&str] = &["gemini-2.5-pro", "gemini-1.5-pro"];

/// Expands a configured model name. Nicknames map to their family, most capable first;
/// anything else is taken literally.
pub fn resolve_configured_model(configured: Option<&str>) -> Vec<String> {
    let Some(name) = configured.map(str::trim).filter(|n| !n.is_empty()) else {
        return Vec::new();
    };

    let family = match name.to_lowercase().as_str() {
        "flash" | "gemini flash" => Some(FLASH_FAMILY),
        "pro" | "gemini pro" => Some(PRO_FAMILY),
        _ => None,
    };

    match family {
        Some(models) => models.iter().map(|m| m.to_string()).collect(),
        None => vec![name.to_string()],
    }
}

/// Strips the provider namespace and drops blanks and repeats, keeping first occurrences.
pub fn normalize_candidates<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter_map(|name| {
            let normalized = strip_namespace(name.as_ref());
            (!normalized.is_empty()).then(|| normalized.to_string())
        })
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Ordered candidate models, resolved on first use and kept for the life of the process.
pub struct ModelCatalog {
    backend: Arc<dyn GenerativeBackend>,
    preferred: Vec<String>,
    resolved: OnceCell<Vec<String>>,
}

impl ModelCatalog {
    pub fn new(backend: Arc<dyn GenerativeBackend>, configured_model: Option<&str>) -> Self {
        let mut preferred = resolve_configured_model(configured_model);
        preferred.extend(FALLBACK_MODELS.iter().map(|m| m.to_string()));
        Self::with_preferred(backend, preferred)
    }

    pub fn with_preferred(backend: Arc<dyn GenerativeBackend>, preferred: Vec<String>) -> Self {
        Self {
            backend,
            preferred,
            resolved: OnceCell::new(),
        }
    }

    /// Concurrent first callers await the same resolution.
    pub async fn candidates(&self) -> &[String] {
        self.resolved.get_or_init(|| self.resolve()).await
    }

    async fn resolve(&self) -> Vec<String> {
        let live = match self.backend.list_generation_models().await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(error = %e, "Model discovery failed, using static model list");
                Vec::new()
            }
        };

        let candidates = normalize_candidates(self.preferred.iter().chain(live.iter()));
        tracing::info!(
            count = candidates.len(),
            discovered = live.len(),
            "Resolved candidate models"
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::services::gemini_client::MockGenerativeBackend;

    fn backend_listing(models: Vec<&'static str>) -> Arc<dyn GenerativeBackend> {
        let mut backend = MockGenerativeBackend::new();
        backend
            .expect_list_generation_models()
            .times(1)
            .returning(move || Ok(models.iter().map(|m| m.to_string()).collect()));
        Arc::new(backend)
    }

    #[test]
    fn nickname_resolves_to_family_regardless_of_case_and_spacing() {
        let expected = resolve_configured_model(Some("flash"));
        assert_eq!(expected, vec!["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"]);
        for alias in ["FLASH", "  Flash ", "Gemini Flash", "gemini flash\t"] {
            assert_eq!(resolve_configured_model(Some(alias)), expected, "alias {:?}", alias);
        }
    }

    #[test]
    fn other_names_resolve_to_themselves() {
        assert_eq!(
            resolve_configured_model(Some(" gemini-2.5-flash-lite ")),
            vec!["gemini-2.5-flash-lite"]
        );
        assert_eq!(resolve_configured_model(Some("flashy")), vec!["flashy"]);
        assert!(resolve_configured_model(Some("   ")).is_empty());
        assert!(resolve_configured_model(None).is_empty());
    }

    #[test]
    fn normalization_strips_namespace_and_deduplicates() {
        let names = normalize_candidates([
            "gemini-2.5-flash",
            "models/gemini-2.5-flash",
            "",
            "models/gemini-1.5-pro",
            "gemini-1.5-pro",
        ]);
        assert_eq!(names, vec!["gemini-2.5-flash", "gemini-1.5-pro"]);
    }

    #[tokio::test]
    async fn static_entries_keep_priority_over_live_ones() {
        let backend = backend_listing(vec!["gemini-exp-1206", "gemini-2.5-pro", "gemini-3-preview"]);
        let catalog = ModelCatalog::with_preferred(
            backend,
            vec!["gemini-2.5-pro".into(), "gemini-1.5-flash".into()],
        );

        assert_eq!(
            catalog.candidates().await,
            ["gemini-2.5-pro", "gemini-1.5-flash", "gemini-exp-1206", "gemini-3-preview"]
        );
    }

    #[tokio::test]
    async fn repeated_calls_do_not_rediscover() {
        let backend = backend_listing(vec!["gemini-2.5-flash"]);
        let catalog = ModelCatalog::new(backend, Some("pro"));

        let first = catalog.candidates().await.to_vec();
        let second = catalog.candidates().await.to_vec();

        assert_eq!(first, second);
        assert_eq!(first[0], "gemini-2.5-pro");
        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), first.len());
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_discovery() {
        let backend = backend_listing(vec!["gemini-2.5-flash"]);
        let catalog = ModelCatalog::new(backend, None);

        let (a, b) = tokio::join!(catalog.candidates(), catalog.candidates());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn discovery_failure_degrades_to_static_list() {
        let mut backend = MockGenerativeBackend::new();
        backend
            .expect_list_generation_models()
            .times(1)
            .returning(|| Err(GenerationError::invocation("model discovery", "status 403")));
        let catalog = ModelCatalog::new(Arc::new(backend), None);

        let expected: Vec<String> = FALLBACK_MODELS.iter().map(|m| m.to_string()).collect();
        assert_eq!(catalog.candidates().await, expected.as_slice());
    }

    #[tokio::test]
    async fn empty_sources_yield_empty_catalog() {
        let backend = backend_listing(vec![]);
        let catalog = ModelCatalog::with_preferred(backend, vec![]);
        assert!(catalog.candidates().await.is_empty());
    }
}
