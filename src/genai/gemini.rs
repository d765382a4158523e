//! Gemini `generateContent` over REST.

use super::{GenerateAsync, GenerateRequest, Generated, Part};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument};

/// Public Gemini API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used for page generation.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-1.5-flash";
/// Model used for image editing.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Gemini returned no candidates")]
    NoCandidates,

    #[error("Gemini inline data is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Client for one Gemini model.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn call(&self, request: &GenerateRequest) -> Result<Generated, GeminiError> {
        let t0 = Instant::now();
        let body = WireRequest::from(request);
        let resp = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let wire: WireResponse = resp.json().await?;
        let generated = wire.into_generated()?;
        debug!(
            parts = generated.parts.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Gemini call finished"
        );
        Ok(generated)
    }
}

impl GenerateAsync for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<Generated, Box<dyn Error>> {
        Ok(self.call(request).await?)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireBlob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
struct WireCandidate {
    content: Option<WireContent>,
}

impl From<&GenerateRequest> for WireRequest {
    fn from(request: &GenerateRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => WirePart {
                    text: Some(text.clone()),
                    ..Default::default()
                },
                Part::Image { mime_type, data } => WirePart {
                    inline_data: Some(WireBlob {
                        mime_type: mime_type.clone(),
                        data: STANDARD.encode(data),
                    }),
                    ..Default::default()
                },
            })
            .collect();

        WireRequest {
            contents: vec![WireContent {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: request.want_images.then(|| WireGenerationConfig {
                response_modalities: vec!["TEXT", "IMAGE"],
            }),
        }
    }
}

impl WireResponse {
    fn into_generated(self) -> Result<Generated, GeminiError> {
        let content = self
            .candidates
            .into_iter()
            .find_map(|candidate| candidate.content)
            .ok_or(GeminiError::NoCandidates)?;

        let mut parts = Vec::with_capacity(content.parts.len());
        for part in content.parts {
            if let Some(blob) = part.inline_data {
                parts.push(Part::Image {
                    data: STANDARD.decode(blob.data.trim())?,
                    mime_type: blob.mime_type,
                });
            }
            if let Some(text) = part.text {
                parts.push(Part::Text(text));
            }
        }
        Ok(Generated { parts })
    }
}
