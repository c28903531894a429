//! Client for the external OCR service.
//!
//! Prescription images are uploaded elsewhere; this service receives an
//! image URL and returns the recognized text. Extraction treats that
//! text as untrusted input, so no cleanup happens here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR service rejected the request ({status}): {detail}")]
    Service { status: u16, detail: String },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OcrRequest<'a> {
    image_url: &'a str,
}

#[derive(Deserialize)]
struct OcrResponse {
    text: String,
}

pub struct OcrClient {
    client: reqwest::Client,
    base_url: String,
}

impl OcrClient {
    pub fn new(base_url: String) -> Self {
        Self { client: reqwest::Client::new(), base_url }
    }

    /// Run OCR on an uploaded prescription image. Returns the raw
    /// recognized text, which may be empty for a blank or unreadable
    /// image.
    pub async fn recognize(&self, image_url: &str) -> Result<String, OcrError> {
        let url = format!("{}/ocr", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&OcrRequest { image_url })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(OcrError::Service { status: status.as_u16(), detail });
        }

        let body: OcrResponse = response.json().await?;
        Ok(body.text)
    }
}
