//! Completion gateway for OpenAI-compatible APIs.
//!
//! Talks directly to any `/chat/completions` endpoint via `reqwest`.
//! Covers: DeepSeek, OpenAI, OpenRouter, Groq and custom endpoints.

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, error};

use maildraft_core::config::CompletionConfig;
use maildraft_core::types::{ChatCompletionRequest, ChatCompletionResponse};

use crate::prompt::build_messages;
use crate::registry::{find_by_name, provider_names, ProviderSpec};
use crate::traits::{CompletionGateway, GenerationError};

// ─────────────────────────────────────────────
// HttpCompletionGateway
// ─────────────────────────────────────────────

/// A completion gateway that talks to any OpenAI-compatible HTTP API.
pub struct HttpCompletionGateway {
    /// HTTP client (connection-pooled, per-request timeout applied).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.deepseek.com"`).
    api_base: String,
    /// API key.
    api_key: String,
    /// Model sent with every request.
    model: String,
    max_tokens: u32,
    temperature: f64,
    /// Header carrying the raw key, or `None` for bearer auth.
    auth_header: Option<HeaderName>,
    system_prompt: Option<String>,
    spec: &'static ProviderSpec,
}

impl std::fmt::Debug for HttpCompletionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCompletionGateway")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("provider", &self.spec.display_name)
            .finish()
    }
}

impl HttpCompletionGateway {
    /// Create a gateway from the `completion` config section.
    ///
    /// Resolution order for the API base and model: config > provider default.
    /// The `custom` provider has no defaults, so both must be configured.
    pub fn new(config: &CompletionConfig) -> Result<Self, GenerationError> {
        let spec = find_by_name(&config.provider).ok_or_else(|| {
            GenerationError::Client(format!(
                "unknown provider '{}' (supported: {})",
                config.provider,
                provider_names().join(", ")
            ))
        })?;

        let api_base = config
            .api_base
            .clone()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| spec.default_api_base.map(String::from))
            .ok_or_else(|| {
                GenerationError::Client(format!(
                    "provider '{}' needs completion.apiBase",
                    spec.name
                ))
            })?;

        let model = config
            .model
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| spec.default_model.to_string());
        if model.is_empty() {
            return Err(GenerationError::Client(format!(
                "provider '{}' needs completion.model",
                spec.name
            )));
        }

        let auth_header = config
            .auth_header
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .map(|name| {
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                    GenerationError::Client(format!("invalid auth header '{name}': {e}"))
                })
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Client(format!("failed to build HTTP client: {e}")))?;

        Ok(HttpCompletionGateway {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            auth_header,
            system_prompt: config.system_prompt.clone(),
            spec,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, GenerationError> {
        match &self.auth_header {
            None => Ok(request.bearer_auth(&self.api_key)),
            Some(name) => {
                let value = HeaderValue::from_str(&self.api_key)
                    .map_err(|e| GenerationError::Client(format!("API key is not a valid header value: {e}")))?;
                Ok(request.header(name.clone(), value))
            }
        }
    }
}

#[async_trait]
impl CompletionGateway for HttpCompletionGateway {
    async fn generate(
        &self,
        body: &str,
        subject: &str,
        sender: &str,
    ) -> Result<String, GenerationError> {
        let messages = build_messages(self.system_prompt.as_deref(), body, subject, sender);

        debug!(
            provider = self.spec.display_name,
            model = %self.model,
            body_chars = body.chars().count(),
            "Requesting reply"
        );

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let url = self.completions_url();
        let request = self.authorize(self.client.post(&url))?.json(&request_body);

        let response = request.send().await.map_err(|e| {
            error!(provider = self.spec.display_name, error = %e, "HTTP request failed");
            GenerationError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(
                provider = self.spec.display_name,
                status = %status,
                body = %error_text,
                "API error"
            );
            return Err(match status.as_u16() {
                401 | 403 => GenerationError::Auth {
                    status: status.as_u16(),
                },
                code => GenerationError::Status {
                    status: code,
                    body: error_text,
                },
            });
        }

        let chat_resp = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(
                provider = self.spec.display_name,
                error = %e,
                "Failed to parse completion response"
            );
            GenerationError::MalformedResponse(e.to_string())
        })?;

        if chat_resp.choices.is_empty() {
            return Err(GenerationError::MalformedResponse(
                "response has no choices".to_string(),
            ));
        }

        let reply = chat_resp
            .first_content()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyReply)?;

        debug!(
            provider = self.spec.display_name,
            reply_chars = reply.chars().count(),
            total_tokens = chat_resp.usage.as_ref().map_or(0, |u| u.total_tokens),
            finish_reason = chat_resp
                .choices
                .first()
                .and_then(|c| c.finish_reason.as_deref())
                .unwrap_or("?"),
            "Reply received"
        );

        Ok(reply.to_string())
    }

    fn display_name(&self) -> &str {
        self.spec.display_name
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
