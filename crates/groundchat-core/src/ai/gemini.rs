use std::sync::Arc;

use async_stream::stream;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Connector, ModelBackend, ModelResponse, QueryConfig, SseDecoder, TextStream};
use crate::config::{Settings, DEFAULT_BASE_URL};
use crate::error::ChatError;

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    search_entry_point: Option<SearchEntryPoint>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntryPoint {
    rendered_content: Option<String>,
}

impl GenerateResponse {
    /// Concatenated answer text of the first candidate, skipping thought parts.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn search_entry_point(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .and_then(|g| g.search_entry_point.as_ref())
            .and_then(|s| s.rendered_content.clone())
    }
}

fn parse_chunk(event: &str) -> Result<String, ChatError> {
    let parsed: GenerateResponse = serde_json::from_str(event)?;
    Ok(parsed.text())
}

/// REST client for the Gemini `generateContent` family of endpoints.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    fn build_request(prompt: &str, config: &QueryConfig) -> GenerateRequest {
        let tools = if config.web_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: config.system_instruction.clone(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: config.temperature.value(),
            },
            tools,
        }
    }

    async fn post(&self, url: &str, request: &GenerateRequest) -> Result<reqwest::Response, ChatError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api { status, body });
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl ModelBackend for GeminiClient {
    async fn generate(&self, prompt: &str, config: &QueryConfig) -> Result<ModelResponse, ChatError> {
        let url = self.endpoint(&config.model_id, "generateContent");
        let request = Self::build_request(prompt, config);
        tracing::debug!(model = %config.model_id, web_search = config.web_search, "generateContent");

        let response = self.post(&url, &request).await?;
        let body = response.text().await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)?;

        Ok(ModelResponse {
            text: parsed.text(),
            search_entry_point: parsed.search_entry_point(),
        })
    }

    async fn generate_stream(&self, prompt: &str, config: &QueryConfig) -> Result<TextStream, ChatError> {
        let url = format!("{}?alt=sse", self.endpoint(&config.model_id, "streamGenerateContent"));
        let request = Self::build_request(prompt, config);
        tracing::debug!(model = %config.model_id, web_search = config.web_search, "streamGenerateContent");

        let response = self.post(&url, &request).await?;
        let mut body = response.bytes_stream();

        let stream = stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(ChatError::from(e));
                        return;
                    }
                };
                for event in decoder.push(&chunk) {
                    yield parse_chunk(&event);
                }
            }
            for event in decoder.finish() {
                yield parse_chunk(&event);
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Creates a [`GeminiClient`] per request from the resolved settings.
#[derive(Debug, Clone)]
pub struct GeminiConnector {
    api_key: Option<String>,
    base_url: String,
}

impl GeminiConnector {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.api_key.clone(), settings.base_url.clone())
    }
}

impl Connector for GeminiConnector {
    fn connect(&self) -> Result<Arc<dyn ModelBackend>, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ChatError::MissingApiKey)?;
        Ok(Arc::new(GeminiClient::new(api_key).with_base_url(self.base_url.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Temperature;
    use serde_json::json;

    fn config(web_search: bool) -> QueryConfig {
        QueryConfig {
            model_id: "gemini-2.5-flash".to_string(),
            temperature: Temperature::new(0.3).unwrap(),
            system_instruction: "Be brief.".to_string(),
            web_search,
        }
    }

    #[test]
    fn test_request_body_without_search() {
        let body = serde_json::to_value(GeminiClient::build_request("hi", &config(false))).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "systemInstruction": {"parts": [{"text": "Be brief."}]},
                "generationConfig": {"temperature": 0.3f32},
            })
        );
    }

    #[test]
    fn test_request_body_with_search_tool() {
        let body = serde_json::to_value(GeminiClient::build_request("hi", &config(true))).unwrap();
        assert_eq!(body["tools"], json!([{"googleSearch": {}}]));
    }

    #[test]
    fn test_response_text_and_grounding() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "planning", "thought": true},
                    {"text": "Paris "},
                    {"text": "is the capital."}
                ]},
                "groundingMetadata": {
                    "searchEntryPoint": {"renderedContent": "<div>chips</div>"}
                }
            }]
        }))
        .unwrap();
        assert_eq!(parsed.text(), "Paris is the capital.");
        assert_eq!(parsed.search_entry_point().as_deref(), Some("<div>chips</div>"));
    }

    #[test]
    fn test_response_without_candidates() {
        let parsed: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        assert_eq!(parsed.text(), "");
        assert!(parsed.search_entry_point().is_none());
    }

    #[test]
    fn test_connector_requires_key() {
        let err = GeminiConnector::new(None, DEFAULT_BASE_URL).connect().err().unwrap();
        assert!(matches!(err, ChatError::MissingApiKey));

        let err = GeminiConnector::new(Some(String::new()), DEFAULT_BASE_URL)
            .connect()
            .err()
            .unwrap();
        assert!(err.is_configuration());

        assert!(GeminiConnector::new(Some("k".to_string()), DEFAULT_BASE_URL)
            .connect()
            .is_ok());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = GeminiClient::new("k").with_base_url("http://localhost:9/");
        assert_eq!(
            client.endpoint("gemini-2.5-pro", "generateContent"),
            "http://localhost:9/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }
}
