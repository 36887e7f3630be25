//! Client for a hosted text recognition service.
//!
//! Speaks the `images:annotate` JSON protocol: one base64-encoded image per
//! request with `DOCUMENT_TEXT_DETECTION`, answered by a full text annotation or
//! a per-image error status.

use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::TextRecognizer;

const FEATURE_TYPE: &str = "DOCUMENT_TEXT_DETECTION";

/// Blocking client for the remote OCR service.
pub struct RemoteOcrClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    requests: Vec<ImageRequest<'a>>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    full_text_annotation: Option<TextAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl Status {
    fn into_error(self) -> OcrError {
        OcrError::Service(format!("{} (code {})", self.message, self.code))
    }
}

impl RemoteOcrClient {
    /// Create a client for `endpoint` authenticated with `api_key`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, OcrError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| OcrError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    /// Create a client from configuration, reading the API key from the environment.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| OcrError::MissingCredentials(config.api_key_env.clone()))?;

        info!(endpoint = %config.endpoint, "Using remote OCR service");

        Self::new(
            config.endpoint.clone(),
            api_key,
            config.timeout_secs.map(Duration::from_secs),
        )
    }
}

impl TextRecognizer for RemoteOcrClient {
    fn name(&self) -> &str {
        "remote"
    }

    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let start = Instant::now();

        let request = AnnotateRequest {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: BASE64_STANDARD.encode(image),
                },
                features: vec![Feature { kind: FEATURE_TYPE }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        debug!(
            "OCR service answered {} ({} bytes) in {}ms",
            status,
            body.len(),
            start.elapsed().as_millis()
        );

        match decode_response(&body) {
            Ok(_) if !status.is_success() => Err(OcrError::Service(format!("HTTP {}", status))),
            Err(OcrError::InvalidResponse(_)) if !status.is_success() => {
                Err(OcrError::Service(format!("HTTP {}", status)))
            }
            other => other,
        }
    }
}

/// Pull the recognized text, or the reported error, out of a response body.
fn decode_response(body: &str) -> Result<String, OcrError> {
    let response: AnnotateResponse =
        serde_json::from_str(body).map_err(|e| OcrError::InvalidResponse(e.to_string()))?;

    if let Some(status) = response.error {
        return Err(status.into_error());
    }

    let first = response
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| OcrError::InvalidResponse("no responses in body".to_string()))?;

    if let Some(status) = first.error.filter(|s| !s.message.is_empty()) {
        return Err(status.into_error());
    }

    Ok(first
        .full_text_annotation
        .map(|a| a.text)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text() {
        let body = r#"{"responses":[{"fullTextAnnotation":{"text":"ACME HARDWARE\nTotal: $12.34\n"}}]}"#;
        assert_eq!(
            decode_response(body).unwrap(),
            "ACME HARDWARE\nTotal: $12.34\n"
        );
    }

    #[test]
    fn test_decode_blank_image() {
        assert_eq!(decode_response(r#"{"responses":[{}]}"#).unwrap(), "");
    }

    #[test]
    fn test_decode_image_error() {
        let body = r#"{"responses":[{"error":{"code":3,"message":"Bad image data."}}]}"#;
        match decode_response(body) {
            Err(OcrError::Service(msg)) => assert_eq!(msg, "Bad image data. (code 3)"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_decode_request_error() {
        let body = r#"{"error":{"code":403,"message":"API key not valid."}}"#;
        assert!(matches!(decode_response(body), Err(OcrError::Service(_))));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(
            decode_response("<html>"),
            Err(OcrError::InvalidResponse(_))
        ));
        assert!(matches!(
            decode_response(r#"{"responses":[]}"#),
            Err(OcrError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let config = OcrConfig {
            api_key_env: "RCPT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            RemoteOcrClient::from_config(&config),
            Err(OcrError::MissingCredentials(name)) if name == "RCPT_TEST_KEY_THAT_IS_NEVER_SET"
        ));
    }
}
