use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{Language, TranslationError, Translator};

/// Client for a LibreTranslate-compatible `/translate` endpoint.
#[derive(Debug, Clone)]
pub struct LibreTranslateClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranslateResponse {
    translated_text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl LibreTranslateClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TranslationError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TranslationError::Request(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint_for(base_url),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Translator for LibreTranslateClient {
    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        if source == target {
            return Err(TranslationError::UnsupportedPair {
                from: source.code(),
                to: target.code(),
            });
        }

        let payload = TranslateRequest {
            q: text,
            source: source.code(),
            target: target.code(),
            format: "text",
            api_key: self.api_key.as_deref(),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .map_err(|err| TranslationError::Request(err.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let raw = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&raw)
                .map(|body| body.error)
                .unwrap_or(raw);
            return Err(TranslationError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranslateResponse = response
            .json()
            .map_err(|err| TranslationError::InvalidResponse(err.to_string()))?;
        Ok(body.translated_text)
    }
}

fn endpoint_for(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/translate") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/translate")
    }
}
