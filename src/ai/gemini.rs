//! Gemini `generateContent` backend.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserialize;

use super::{
    GeneratedListing, GenerationError, ImageInput, ListingGenerator, build_prompt, parse_generated,
};
use crate::config::GeminiConfig;

pub struct GeminiGenerator {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(transcription: &str, images: &[ImageInput]) -> serde_json::Value {
        let mut parts = vec![serde_json::json!({ "text": build_prompt(transcription) })];
        for image in images {
            parts.push(serde_json::json!({
                "inline_data": {
                    "mime_type": &image.content_type,
                    "data": STANDARD.encode(&image.bytes),
                }
            }));
        }

        serde_json::json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "responseMimeType": "application/json" }
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[async_trait]
impl ListingGenerator for GeminiGenerator {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(
        &self,
        transcription: &str,
        images: &[ImageInput],
    ) -> Result<GeneratedListing, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| GenerationError::NotConfigured("GEMINI_API_KEY is not set".into()))?;

        tracing::debug!(
            model = %self.config.model,
            images = images.len(),
            "requesting listing generation"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&Self::request_body(transcription, images))
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;
        let text = payload.text().ok_or(GenerationError::EmptyResponse)?;

        parse_generated(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> GeminiConfig {
        GeminiConfig {
            api_key: api_key.map(str::to_string),
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/".into(),
        }
    }

    #[test]
    fn endpoint_joins_model_path() {
        let generator = GeminiGenerator::new(config(Some("k")));
        assert_eq!(
            generator.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_inlines_images_after_prompt() {
        let images = vec![ImageInput {
            filename: "vase.jpg".into(),
            content_type: "image/jpeg".into(),
            bytes: vec![1, 2, 3],
        }];
        let body = GeminiGenerator::request_body("clay vase", &images);
        let parts = body["contents"][0]["parts"].as_array().expect("parts");
        assert_eq!(parts.len(), 2);
        assert!(parts[0]["text"].as_str().unwrap_or_default().contains("clay vase"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "AQID");
    }

    #[test]
    fn response_text_joins_parts() {
        let payload: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "{\"title\":" }, { "text": "\"Vase\"}" }]
                }
            }]
        }))
        .expect("payload");
        assert_eq!(payload.text().as_deref(), Some("{\"title\":\"Vase\"}"));

        let empty: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({ "candidates": [] })).expect("payload");
        assert!(empty.text().is_none());
    }

    #[tokio::test]
    async fn missing_key_is_reported_before_any_request() {
        let generator = GeminiGenerator::new(config(None));
        let err = generator.generate("anything", &[]).await.unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured(_)));
    }
}
