//! Gemini `generateContent` client.
//!
//! Implements both provider contracts over the same REST endpoint:
//!
//! 1. **Identify** — one `generateContent` call carrying the annotated JPEG
//!    as `inlineData` plus the language-specific instruction.
//! 2. **Chat** — a session object that replays its accumulated turn history
//!    on every call, with the binding `systemInstruction` attached. The
//!    dialogue state lives on the service side; the handle here is opaque.
//!
//! Every request carries a bounded timeout. The upstream design awaited
//! indefinitely; expiry here surfaces as a service error.

use super::{ChatSession, ReasoningProvider};
use crate::capture::CapturedImage;
use crate::error::{PointLensError, Result};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

// ── Constants ────────────────────────────────────────────────────

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for both identification and chat.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ── Wire types ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl Content {
    fn user_text(text: &str) -> Self {
        Self {
            role: Some("user".into()),
            parts: vec![Part {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }
    }

    fn model_text(text: &str) -> Self {
        Self {
            role: Some("model".into()),
            parts: vec![Part {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }
    }

    fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Some(text.to_string()),
                inline_data: None,
            }],
        }
    }
}

// ── Provider ─────────────────────────────────────────────────────

/// Gemini-backed [`ReasoningProvider`].
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// Construct a provider, failing fast when credentials are absent.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PointLensError::Config(
                "reasoning-service API key is not set".into(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (tests point this at a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// One `generateContent` round-trip; joins all text parts of the first
    /// candidate. Returns an empty string when the service produced none.
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let resp = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| PointLensError::Service(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(200).collect();
            return Err(PointLensError::Service(format!("HTTP {status}: {detail}")));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| PointLensError::Service(format!("malformed response: {e}")))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl ReasoningProvider for GeminiProvider {
    async fn identify(&self, image: &CapturedImage, instruction: &str) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&image.data);
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: image.mime_type.to_string(),
                            data: encoded,
                        }),
                    },
                    Part {
                        text: Some(instruction.to_string()),
                        inline_data: None,
                    },
                ],
            }],
            system_instruction: None,
        };

        tracing::debug!(bytes = image.data.len(), model = %self.model, "dispatching identification");
        self.generate(&request).await
    }

    async fn create_session(&self, system_instruction: &str) -> Result<Arc<dyn ChatSession>> {
        Ok(Arc::new(GeminiChatSession {
            client: self.client.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            timeout: self.timeout,
            id: Uuid::new_v4().to_string(),
            system: Content::system(system_instruction),
            history: Mutex::new(Vec::new()),
        }))
    }
}

// ── Chat session ─────────────────────────────────────────────────

/// One multi-turn Gemini dialogue. Turn history is replayed per request;
/// a failed send leaves the history exactly as the service last saw it.
struct GeminiChatSession {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    id: String,
    system: Content,
    history: Mutex<Vec<Content>>,
}

impl GeminiChatSession {
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ChatSession for GeminiChatSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn send(&self, text: &str) -> Result<String> {
        let mut history = self.history.lock().await;
        history.push(Content::user_text(text));

        let request = GenerateRequest {
            contents: history.clone(),
            system_instruction: Some(self.system.clone()),
        };

        let outcome = async {
            let resp = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .timeout(self.timeout)
                .json(&request)
                .send()
                .await
                .map_err(|e| PointLensError::Chat(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                let detail: String = body.chars().take(200).collect();
                return Err(PointLensError::Chat(format!("HTTP {status}: {detail}")));
            }

            let parsed: GenerateResponse = resp
                .json()
                .await
                .map_err(|e| PointLensError::Chat(format!("malformed response: {e}")))?;

            let reply = parsed
                .candidates
                .first()
                .and_then(|c| c.content.as_ref())
                .map(|c| {
                    c.parts
                        .iter()
                        .filter_map(|p| p.text.as_deref())
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default()
                .trim()
                .to_string();

            if reply.is_empty() {
                return Err(PointLensError::Chat("empty reply".into()));
            }
            Ok(reply)
        }
        .await;

        match outcome {
            Ok(reply) => {
                history.push(Content::model_text(&reply));
                Ok(reply)
            }
            Err(e) => {
                // Roll the unacknowledged user turn back out.
                history.pop();
                Err(e)
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
