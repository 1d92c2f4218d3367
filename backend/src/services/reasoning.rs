//! Reasoning service adapter.
//!
//! The planner only needs one call shape: content plus steering instruction
//! in, text out. Any failure collapses into a [`ServiceFailure`] whose
//! [`FailureKind`] is the only provider detail that leaks through. No retries
//! happen at this layer.

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::ServiceConfig;
use crate::error::{ErrorContext, PlannerError, PlannerResult};

/// One generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningRequest {
    pub model: String,
    pub content: String,
    pub instruction: String,
    pub temperature: f32,
    pub structured_output: bool,
}

/// Raw text answer. Not guaranteed to be JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningReply {
    pub text: String,
}

/// Failure category exposed by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Transport error, non-success status, or empty answer.
    Unavailable,
    /// The call exceeded its time budget.
    Timeout,
    /// Quota or rate limit hit.
    RateLimited,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Unavailable => "service unavailable",
            FailureKind::Timeout => "service timed out",
            FailureKind::RateLimited => "quota or rate limit exceeded",
        };
        f.write_str(s)
    }
}

/// Opaque adapter failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ServiceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceFailure {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::RateLimited,
            message: message.into(),
        }
    }
}

impl From<ServiceFailure> for PlannerError {
    fn from(failure: ServiceFailure) -> Self {
        PlannerError::ServiceUnavailable {
            context: ErrorContext::new("generate").with_details(failure.kind.to_string()),
            message: failure.message,
        }
    }
}

/// External generative service. Implementations are created once at process
/// start and shared read-only across requests.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Run one generation call.
    async fn generate(&self, request: &ReasoningRequest) -> Result<ReasoningReply, ServiceFailure>;

    /// Provider name for logs and health output.
    fn provider(&self) -> &str;
}

/// Model advertised by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Full resource name, e.g. `models/gemini-flash-latest`.
    pub name: String,
    /// Identifier to put in configuration, e.g. `gemini-flash-latest`.
    pub id: String,
}

// =============================================================================
// Gemini wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: WireContent,
    contents: Vec<WireContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<WireContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelListResponse {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

fn text_part(text: &str) -> WirePart {
    WirePart {
        text: Some(text.to_string()),
    }
}

fn build_request_body(request: &ReasoningRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        system_instruction: WireContent {
            role: None,
            parts: vec![text_part(&request.instruction)],
        },
        contents: vec![WireContent {
            role: Some("user".to_string()),
            parts: vec![text_part(&request.content)],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            response_mime_type: request.structured_output.then_some("application/json"),
        },
    }
}

fn extract_reply_text(response: GenerateContentResponse) -> Result<String, ServiceFailure> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ServiceFailure::unavailable("response contained no candidate text"));
    }
    Ok(text)
}

fn classify_status(status: u16, body: &str) -> ServiceFailure {
    let snippet: String = body.chars().take(200).collect();
    if status == 429 || body.contains("RESOURCE_EXHAUSTED") {
        ServiceFailure::rate_limited(format!("HTTP {}: {}", status, snippet))
    } else {
        ServiceFailure::unavailable(format!("HTTP {}: {}", status, snippet))
    }
}

fn classify_transport(err: &reqwest::Error) -> ServiceFailure {
    if err.is_timeout() {
        ServiceFailure::timeout(format!("request timed out: {}", err))
    } else {
        ServiceFailure::unavailable(format!("HTTP request failed: {}", err))
    }
}

fn generation_models(list: ModelListResponse) -> Vec<ModelInfo> {
    list.models
        .into_iter()
        .filter(|m| m.supported_generation_methods.iter().any(|g| g == "generateContent"))
        .map(|m| {
            let id = m.name.rsplit('/').next().unwrap_or(&m.name).to_string();
            ModelInfo { name: m.name, id }
        })
        .collect()
}

// =============================================================================
// Gemini adapter
// =============================================================================

/// Google Gemini `generateContent` adapter.
pub struct GeminiReasoningService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiReasoningService {
    /// Build the adapter from service configuration. Fails when no API key is
    /// available.
    pub fn new(config: &ServiceConfig) -> PlannerResult<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            PlannerError::configuration_with_context(
                format!("API key not set (expected in {})", config.api_key_env),
                ErrorContext::new("init_reasoning_service").with_field("api_key"),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlannerError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Models that support `generateContent`.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ServiceFailure> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("pageSize", "1000")])
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            return Err(classify_status(status.as_u16(), &body));
        }

        let list: ModelListResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceFailure::unavailable(format!("Failed to parse model list: {}", e)))?;
        Ok(generation_models(list))
    }
}

#[async_trait]
impl ReasoningService for GeminiReasoningService {
    async fn generate(&self, request: &ReasoningRequest) -> Result<ReasoningReply, ServiceFailure> {
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        let body = build_request_body(request);

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        let status = response.status();
        let raw_body = response.text().await.map_err(|e| classify_transport(&e))?;
        if !status.is_success() {
            let failure = classify_status(status.as_u16(), &raw_body);
            warn!("{} returned {}: {}", request.model, status, failure);
            return Err(failure);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&raw_body)
            .map_err(|e| ServiceFailure::unavailable(format!("Failed to parse response envelope: {}", e)))?;
        let text = extract_reply_text(parsed)?;

        debug!(
            "{} answered in {} ms ({} chars)",
            request.model,
            start.elapsed().as_millis(),
            text.len()
        );
        Ok(ReasoningReply { text })
    }

    fn provider(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(structured: bool) -> ReasoningRequest {
        ReasoningRequest {
            model: "gemini-flash-latest".into(),
            content: "brief".into(),
            instruction: "rules".into(),
            temperature: 0.2,
            structured_output: structured,
        }
    }

    #[test]
    fn test_request_body_shape() {
        let json = serde_json::to_value(build_request_body(&request(true))).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "rules");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "brief");
        assert!((json["generationConfig"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert_eq!(json["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_unstructured_request_omits_mime_type() {
        let json = serde_json::to_value(build_request_body(&request(false))).unwrap();
        assert!(json["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_extract_reply_joins_parts() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"{\"targets\":"},{"text":"[]}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_reply_text(response).unwrap(), "{\"targets\":[]}");
    }

    #[test]
    fn test_extract_reply_without_candidates() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{"promptFeedback":{}}"#).unwrap();
        let failure = extract_reply_text(response).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unavailable);
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(429, "").kind, FailureKind::RateLimited);
        assert_eq!(
            classify_status(400, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#).kind,
            FailureKind::RateLimited
        );
        assert_eq!(classify_status(503, "overloaded").kind, FailureKind::Unavailable);
        assert!(classify_status(500, "boom").message.contains("HTTP 500"));
    }

    #[test]
    fn test_generation_models_filter() {
        let list: ModelListResponse = serde_json::from_str(
            r#"{"models":[
                {"name":"models/gemini-flash-latest","supportedGenerationMethods":["generateContent","countTokens"]},
                {"name":"models/text-embedding-004","supportedGenerationMethods":["embedContent"]},
                {"name":"models/gemini-2.0-flash","supportedGenerationMethods":["generateContent"]}
            ]}"#,
        )
        .unwrap();
        let models = generation_models(list);
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].id, "gemini-flash-latest");
        assert_eq!(models[0].name, "models/gemini-flash-latest");
        assert_eq!(models[1].id, "gemini-2.0-flash");
    }

    #[test]
    fn test_failure_into_planner_error() {
        let err: PlannerError = ServiceFailure::rate_limited("quota").into();
        assert!(matches!(err, PlannerError::ServiceUnavailable { .. }));
        assert_eq!(err.message(), "quota");
        assert_eq!(
            err.context().details.as_deref(),
            Some("quota or rate limit exceeded")
        );
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = ServiceConfig {
            api_key: None,
            ..ServiceConfig::default()
        };
        let err = GeminiReasoningService::new(&config).err().unwrap();
        assert!(matches!(err, PlannerError::Configuration { .. }));

        let config = ServiceConfig {
            api_key: Some("test-key".into()),
            ..ServiceConfig::default()
        };
        let service = GeminiReasoningService::new(&config).unwrap();
        assert_eq!(service.provider(), "gemini");
    }
}
