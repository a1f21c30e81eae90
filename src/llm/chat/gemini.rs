use async_trait::async_trait;
use log::{ debug, info };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };

use super::{ error_from_response, http_stream_generate, ChatClient, ChatError, FragmentStream };
use crate::llm::LlmConfig;
use crate::models::content::{ GenerationRequest, ModelMessage, Part };

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [ModelMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
}

// Role is implied by the field.
#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: &'a [Part],
}

#[derive(Deserialize, Debug, Default)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize, Debug)]
struct GoogleCandidate {
    #[serde(default)]
    content: Option<GoogleContent>,
}

#[derive(Deserialize, Debug)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize, Debug)]
struct GooglePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: Option<bool>,
}

impl GoogleResponse {
    /// Text of the first candidate, thought parts excluded.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts
            .iter()
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

fn parse_gemini_event(payload: &str) -> Result<Option<String>, ChatError> {
    serde_json
        ::from_str::<GoogleResponse>(payload)
        .map(|chunk| chunk.text())
        .map_err(|e| ChatError::Decode(e.to_string()))
}

pub struct GeminiChatClient {
    http: HttpClient,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiChatClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            http: HttpClient::new(),
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.api_key.clone(), config.model.clone(), config.base_url.clone())
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    fn post(&self, url: &str, request: &GenerationRequest) -> reqwest::RequestBuilder {
        let payload = GenerateContentRequest {
            contents: &request.contents,
            system_instruction: request.system_instruction
                .as_ref()
                .map(|m| SystemInstruction { parts: &m.parts }),
        };
        self.http.post(url).header(API_KEY_HEADER, &self.api_key).json(&payload)
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<String>, ChatError> {
        let url = self.endpoint("generateContent");
        info!(
            "GeminiChatClient::generate() → model={} contents={}",
            self.model,
            request.contents.len()
        );

        let resp = self
            .post(&url, request)
            .send().await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }

        let body = resp.text().await.map_err(|e| ChatError::Network(e.to_string()))?;
        let data: GoogleResponse = serde_json
            ::from_str(&body)
            .map_err(|e| ChatError::Decode(e.to_string()))?;
        Ok(data.text())
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<FragmentStream, ChatError> {
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        info!(
            "GeminiChatClient::generate_stream() → model={} contents={}",
            self.model,
            request.contents.len()
        );
        debug!("Streaming from URL: {}", url);

        http_stream_generate(self.post(&url, request), parse_gemini_event).await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
