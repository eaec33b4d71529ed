//! HTTP client for the photo storage and recognition endpoints.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use std::time::Duration;

use super::types::{RecognitionResponse, RecognizeRequest, SavePhotoRequest, SavePhotoResponse};
use crate::render::FrameSample;

pub const SAVE_PHOTO_PATH: &str = "/salvar_foto";
pub const RECOGNIZE_PATH: &str = "/reconhecer_foto";

/// The backend collaborator. Implemented over HTTP in production and by
/// recording fakes in tests.
pub trait PhotoBackend: Send + Sync {
    /// Stores one enrollment photo for `student_name`.
    fn save_photo(&self, sample: &FrameSample, student_name: &str) -> Result<SavePhotoResponse>;

    /// Asks the backend who is in front of the camera.
    fn recognize(&self, sample: &FrameSample) -> Result<RecognitionResponse>;
}

/// JSON-over-HTTP backend.
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a client for `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl PhotoBackend for HttpBackend {
    fn save_photo(&self, sample: &FrameSample, student_name: &str) -> Result<SavePhotoResponse> {
        let url = self.endpoint(SAVE_PHOTO_PATH);
        let body: serde_json::Value = self
            .client
            .post(&url)
            .json(&SavePhotoRequest {
                imagem: sample.data_url(),
                nome: student_name,
            })
            .send()
            .with_context(|| format!("Failed to send photo to {}", url))?
            .error_for_status()
            .context("Photo storage returned an error status")?
            .json()
            .context("Photo storage returned invalid JSON")?;

        crate::log(&format!("Photo saved: {}", body));

        // Any JSON shape is acceptable here
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    fn recognize(&self, sample: &FrameSample) -> Result<RecognitionResponse> {
        let url = self.endpoint(RECOGNIZE_PATH);
        self.client
            .post(&url)
            .json(&RecognizeRequest {
                imagem: sample.data_url(),
            })
            .send()
            .with_context(|| format!("Failed to send frame to {}", url))?
            .error_for_status()
            .context("Recognizer returned an error status")?
            .json()
            .context("Recognizer returned an unexpected body")
    }
}
