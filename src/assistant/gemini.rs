//! Google Gemini client
//!
//! Minimal `generateContent` client over the v1beta REST API.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{AssistantError, TextGenerator};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const API_KEY_HEADER: &str = "x-goog-api-key";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Client
// ============================================================================

/// Blocking Gemini client
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: API_BASE_URL.to_string(),
            client,
            temperature: 0.7,
            max_output_tokens: 2048,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Point the client at another endpoint, such as a local stub
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Endpoint URL; the key travels in a header, never in the URL
    fn build_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_request(&self, system: Option<&str>, prompt: &str) -> GeminiRequest {
        let text_content = |role: Option<&str>, text: &str| GeminiContent {
            role: role.map(str::to_string),
            parts: vec![ContentPart {
                text: Some(text.to_string()),
            }],
        };

        GeminiRequest {
            contents: vec![text_content(Some("user"), prompt)],
            system_instruction: system.map(|s| text_content(None, s)),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                max_output_tokens: Some(self.max_output_tokens),
                candidate_count: Some(1),
            }),
        }
    }

    /// Text of the first candidate
    fn extract_content(response: &GeminiResponse) -> Result<String, AssistantError> {
        let candidate = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .ok_or(AssistantError::EmptyResponse)?;

        if let Some(ref reason) = candidate.finish_reason {
            tracing::debug!(finish_reason = %reason, "Gemini candidate finished");
        }

        let text: String = candidate
            .content
            .as_ref()
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AssistantError::EmptyResponse);
        }
        Ok(text)
    }

    fn map_api_error(status: u16, response_text: &str) -> AssistantError {
        let message = serde_json::from_str::<GeminiResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.to_string(), |e| e.message);
        AssistantError::Api { status, message }
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, system: Option<&str>, prompt: &str) -> Result<String, AssistantError> {
        let request = self.build_request(system, prompt);

        tracing::debug!(model = %self.model, "Sending request to Gemini API");
        let response = self
            .client
            .post(self.build_url())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()?;

        let status = response.status();
        let response_text = response.text()?;

        if !status.is_success() {
            tracing::error!(status = %status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| AssistantError::Parse(format!("Gemini response: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(AssistantError::Api {
                status: status.as_u16(),
                message: error.message,
            });
        }

        Self::extract_content(&parsed)
    }
}

// Keep the key out of logs
impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let client = GeminiClient::new("key", "gemini-1.5-flash").unwrap();
        let request = client.build_request(Some("be brief"), "hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "be brief");
        assert!(json["system_instruction"].get("role").is_none());
        assert_eq!(json["generation_config"]["candidate_count"], 1);
        assert!(client
            .build_url()
            .ends_with("/models/gemini-1.5-flash:generateContent"));
    }

    #[test]
    fn test_extract_content_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi "},{"text":"there"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(GeminiClient::extract_content(&response).unwrap(), "Hi there");

        let empty: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(matches!(
            GeminiClient::extract_content(&empty),
            Err(AssistantError::EmptyResponse)
        ));
    }

    #[test]
    fn test_api_error_message() {
        let err = GeminiClient::map_api_error(400, r#"{"error":{"message":"API key not valid"}}"#);
        assert_eq!(err.to_string(), "Gemini API error (400): API key not valid");

        let err = GeminiClient::map_api_error(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Gemini API error (502): Bad Gateway");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = GeminiClient::new("secret-key", "m").unwrap();
        assert!(!format!("{:?}", client).contains("secret-key"));
    }

    #[test]
    fn test_transport_error_hides_key() {
        let key = "SECRET-KEY-123";
        let client = GeminiClient::new(key, "gemini-1.5-flash")
            .unwrap()
            .with_base_url("http://127.0.0.1:9/v1beta");
        assert!(!client.build_url().contains(key));

        let err = client.generate(None, "hi").unwrap_err();
        assert!(matches!(err, AssistantError::Http(_)));
        let shown = err.to_string();
        assert!(!shown.contains(key), "{}", shown);
        assert!(!format!("{:?}", err).contains(key));
    }
}
