//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all MAITRI endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// GET /
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    // ========================================================================
    // Detection Endpoints
    // ========================================================================

    pub fn capture_form(frame: &[u8], voice: &[u8], user_id: Option<&str>) -> Form {
        let mut form = Form::new()
            .part("frame", Part::bytes(frame.to_vec()).file_name("frame.jpg"))
            .part("voice", Part::bytes(voice.to_vec()).file_name("voice.wav"));
        if let Some(user_id) = user_id {
            form = form.text("user_id", user_id.to_string());
        }
        form
    }

    /// POST /analyze
    pub async fn analyze(&self, frame: &[u8], voice: &[u8], user_id: Option<&str>) -> Response {
        self.analyze_form(Self::capture_form(frame, voice, user_id))
            .await
    }

    /// POST /analyze with a hand-built form
    pub async fn analyze_form(&self, form: Form) -> Response {
        self.client
            .post(format!("{}/analyze", self.base_url))
            .multipart(form)
            .send()
            .await
            .expect("Analyze request failed")
    }

    /// POST /predict
    pub async fn predict(&self, frame: &[u8], voice: &[u8]) -> Response {
        self.client
            .post(format!("{}/predict", self.base_url))
            .multipart(Self::capture_form(frame, voice, None))
            .send()
            .await
            .expect("Predict request failed")
    }

    // ========================================================================
    // Chat
    // ========================================================================

    /// POST /chat
    pub async fn chat(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Chat request failed")
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// POST /save
    pub async fn save(&self, body: Value) -> Response {
        self.client
            .post(format!("{}/save", self.base_url))
            .json(&body)
            .send()
            .await
            .expect("Save request failed")
    }

    /// GET /history/{user_id}
    pub async fn history(&self, user_id: &str, limit: Option<usize>) -> Response {
        let mut request = self
            .client
            .get(format!("{}/history/{}", self.base_url, user_id));
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        request.send().await.expect("History request failed")
    }
}
