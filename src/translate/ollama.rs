use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::Translator;
use crate::config::TranslateConfig;
use crate::error::{Result, VidscribeError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub response: String,
    pub done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub text: String,
}

/// Translator backed by an Ollama endpoint.
///
/// Holds only an HTTP client and configuration; no cross-call state. Each
/// call is bounded by the configured request timeout and retried a small,
/// configured number of times before the error propagates to the caller.
pub struct OllamaTranslator {
    client: Client,
    config: TranslateConfig,
}

impl OllamaTranslator {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                VidscribeError::Translation(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    async fn request_translation(&self, text: &str, target_language: &str) -> Result<String> {
        let request = TranslationRequest {
            model: self.config.model.clone(),
            prompt: build_translation_prompt(text, target_language),
            stream: false,
            format: "json".to_string(),
        };

        let url = format!("{}/api/generate", self.config.endpoint);
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| VidscribeError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VidscribeError::Translation(format!(
                "Translation API error {}: {}",
                status, error_text
            )));
        }

        let translation_response: TranslationResponse = response
            .json()
            .await
            .map_err(|e| VidscribeError::Translation(format!("Failed to parse response: {}", e)))?;

        let raw_response = translation_response.response.trim().to_string();
        if raw_response.is_empty() {
            return Err(VidscribeError::Translation(
                "Empty translation received".to_string(),
            ));
        }

        if let Ok(result) = serde_json::from_str::<TranslationResult>(&raw_response) {
            return Ok(result.text.trim().to_string());
        }

        // Model occasionally answers with bare text instead of the
        // requested JSON envelope.
        Ok(clean_translation_response(&raw_response))
    }
}

#[async_trait]
impl Translator for OllamaTranslator {
    async fn translate_one(&self, text: &str, target_language: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.request_translation(text, target_language).await {
                Ok(translation) => return Ok(translation),
                Err(e) => {
                    warn!(
                        "Translation attempt {}/{} failed: {}",
                        attempt + 1,
                        self.config.max_retries + 1,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            VidscribeError::Translation("Translation failed with no attempts".to_string())
        }))
    }
}

fn build_translation_prompt(text: &str, target_language: &str) -> String {
    let language_name = language_code_to_name(target_language);

    format!(
        "You are a professional translator.\n\
         \n\
         CRITICAL: You must translate the text to {} ONLY. Do not translate to any other language.\n\
         The target language is: {} (language code: {})\n\
         \n\
         Return ONLY the translation in JSON format as {{\"text\":\"your {} translation here\"}}.\n\
         Do not include any explanations, alternatives, or text in other languages.\n\
         \n\
         Text to translate: \"{}\"\n",
        language_name, language_name, target_language, language_name, text
    )
}

fn clean_translation_response(response: &str) -> String {
    response
        .trim()
        .trim_start_matches('"')
        .trim_end_matches('"')
        .trim()
        .to_string()
}

fn language_code_to_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "fr" => "French",
        "de" => "German",
        "es" => "Spanish",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ru" => "Russian",
        "ar" => "Arabic",
        "hi" => "Hindi",
        "nl" => "Dutch",
        "pl" => "Polish",
        "tr" => "Turkish",
        _ => code,
    }
}
