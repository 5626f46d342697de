use crate::error::GenerationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const MODEL_NAMESPACE: &str = "models/";
const GENERATE_METHOD: &str = "generateContent";

/// Remote generation provider as seen by the question generator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    fn has_credential(&self) -> bool;

    /// Model names usable for `generateContent`, as reported by the provider.
    async fn list_generation_models(&self) -> Result<Vec<String>, GenerationError>;

    /// Returns the text payload produced by `model` for `prompt`.
    async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: &'static str,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "application/json",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: &'static str,
    pub threshold: &'static str,
}

pub fn default_safety_settings() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: "BLOCK_MEDIUM_AND_ABOVE",
    })
    .collect()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: &'a GenerationConfig,
    safety_settings: &'a [SafetySetting],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Option<Vec<ResponseCandidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl ResponseCandidate {
    fn into_text(self) -> Option<String> {
        self.content?
            .parts
            .unwrap_or_default()
            .into_iter()
            .find_map(|part| part.text.filter(|t| !t.trim().is_empty()))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelListResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

/// Keeps descriptors that support `generateContent` and strips the `models/` namespace.
pub fn generation_model_names(descriptors: Vec<ModelDescriptor>) -> Vec<String> {
    descriptors
        .into_iter()
        .filter(|d| d.supported_generation_methods.iter().any(|m| m == GENERATE_METHOD))
        .map(|d| strip_namespace(&d.name).to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

pub fn strip_namespace(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix(MODEL_NAMESPACE).unwrap_or(name)
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            generation_config: GenerationConfig::default(),
            safety_settings: default_safety_settings(),
        }
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn list_generation_models(&self) -> Result<Vec<String>, GenerationError> {
        let api_key = self.api_key()?;
        let url = format!("{}/models", self.base_url);
        let mut descriptors = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(&url)
                .header("x-goog-api-key", api_key)
                .query(&[("pageSize", "1000")]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }

            let res = request
                .send()
                .await
                .map_err(|e| GenerationError::invocation("model discovery", e.to_string()))?;
            if !res.status().is_success() {
                let status = res.status();
                return Err(GenerationError::invocation(
                    "model discovery",
                    format!("status {}", status.as_u16()),
                ));
            }

            let page: ModelListResponse = res
                .json()
                .await
                .map_err(|e| GenerationError::invocation("model discovery", e.to_string()))?;
            descriptors.extend(page.models);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(generation_model_names(descriptors))
    }

    async fn generate_content(&self, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;
        let payload = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: &self.generation_config,
            safety_settings: &self.safety_settings,
        };

        let res = self
            .client
            .post(format!("{}/models/{}:{}", self.base_url, model, GENERATE_METHOD))
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GenerationError::invocation(model, e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(GenerationError::invocation(
                model,
                format!("Gemini API Error {}: {}", status, text),
            ));
        }

        let body: GenerateResponse = res
            .json()
            .await
            .map_err(|e| GenerationError::invocation(model, e.to_string()))?;

        let block_reason = body.prompt_feedback.and_then(|f| f.block_reason);
        body.candidates
            .unwrap_or_default()
            .into_iter()
            .find_map(ResponseCandidate::into_text)
            .ok_or_else(|| match block_reason {
                Some(reason) => GenerationError::invocation(model, format!("prompt blocked: {}", reason)),
                None => GenerationError::invocation(model, "empty response"),
            })
    }
}
