//! Document scan: reads a visitor's name and CPF from a photographed ID.
//!
//! The recognition itself happens elsewhere. [`OcrClient`] posts the image
//! to a configured OCR endpoint; anything implementing [`DocumentScanner`]
//! can stand in for it. A scan only ever fills in the entry draft and is
//! never required to submit one.

use std::future::Future;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::EntryDraft;

/// Instruction sent along with the image.
pub const SCAN_PROMPT: &str =
    "Extraia o NOME COMPLETO e o CPF deste documento. Retorne apenas JSON.";

/// Fields recognised on a document. Either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub cpf: Option<String>,
}

impl ScanResult {
    /// Copies recognised fields into the draft: the name upper-cased, the
    /// CPF masked. Missing or blank fields leave the draft as it was.
    pub fn apply_to(&self, draft: &mut EntryDraft) {
        if let Some(name) = self.full_name.as_deref().filter(|n| !n.trim().is_empty()) {
            draft.full_name = name.trim().to_uppercase();
        }
        if let Some(cpf) = self.cpf.as_deref().filter(|c| !c.trim().is_empty()) {
            draft.set_cpf(cpf);
        }
    }
}

/// Anything that can read a document image.
pub trait DocumentScanner {
    fn scan(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> impl Future<Output = Result<ScanResult, ScanError>> + Send;
}

/// Scanner backed by an HTTP OCR endpoint.
///
/// Sends `{"mimeType", "data", "prompt"}` with the image base64-encoded and
/// expects `{"fullName", "cpf"}` back.
#[derive(Debug, Clone)]
pub struct OcrClient {
    endpoint: String,
    http: reqwest::Client,
}

impl OcrClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DocumentScanner for OcrClient {
    fn scan(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> impl Future<Output = Result<ScanResult, ScanError>> + Send {
        let body = json!({
            "mimeType": mime_type,
            "data": STANDARD.encode(image),
            "prompt": SCAN_PROMPT,
        });
        let request = self.http.post(&self.endpoint).json(&body);

        async move {
            let response = request
                .send()
                .await
                .map_err(|e| ScanError::ConnectionError(e.to_string()))?;

            if !response.status().is_success() {
                return Err(ScanError::HttpStatus(response.status().as_u16()));
            }

            response
                .json::<ScanResult>()
                .await
                .map_err(|e| ScanError::InvalidResponse(e.to_string()))
        }
    }
}

/// Scans a document into the draft. Failures are logged and leave the draft
/// untouched; returns whether the scan succeeded.
pub async fn scan_into_draft<S: DocumentScanner>(
    scanner: &S,
    image: &[u8],
    mime_type: &str,
    draft: &mut EntryDraft,
) -> bool {
    match scanner.scan(image, mime_type).await {
        Ok(result) => {
            result.apply_to(draft);
            true
        }
        Err(e) => {
            tracing::warn!("Document scan failed: {}", e);
            false
        }
    }
}

/// Guesses the image MIME type from a file extension. Defaults to JPEG.
pub fn mime_for_extension(extension: Option<&str>) -> &'static str {
    match extension.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

/// Errors that can occur while scanning a document.
#[derive(Debug)]
pub enum ScanError {
    ConnectionError(String),
    HttpStatus(u16),
    InvalidResponse(String),
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::ConnectionError(e) => write!(f, "Connection error: {}", e),
            ScanError::HttpStatus(status) => write!(f, "OCR endpoint returned status {}", status),
            ScanError::InvalidResponse(e) => write!(f, "Invalid OCR response: {}", e),
        }
    }
}

impl std::error::Error for ScanError {}
