//! Stateless HTTP request builder and response parser for the medication API.
//!
//! # Design
//! `MedTrackClient` holds only a base URL and the default headers, and carries
//! no mutable state between calls. Each operation has a `build_*` method that
//! produces an `HttpRequest`; responses go through the shared [`parse`]
//! function, typed by the caller. The host executes the HTTP round-trip,
//! keeping this crate deterministic and free of I/O.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{PartialIntake, PartialMedication, PartialStage, PartialSymptom};

const JSON: &str = "application/json";

/// Synchronous, stateless request builder for the medication API.
#[derive(Debug, Clone)]
pub struct MedTrackClient {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl MedTrackClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: vec![
                ("content-type".to_string(), JSON.to_string()),
                ("accept".to_string(), JSON.to_string()),
            ],
        }
    }

    /// Build from a config, merging its extra headers over the defaults.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut client = Self::new(&config.base_url);
        client.headers = merge_headers(&client.headers, &config.headers);
        client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Compose a request against `endpoint` with the default headers.
    pub fn request(&self, method: HttpMethod, endpoint: &str, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{endpoint}", self.base_url),
            headers: self.headers.clone(),
            body,
        }
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        input: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(self.request(method, endpoint, Some(body)))
    }

    // Symptoms

    pub fn build_list_symptoms(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/symptoms", None)
    }

    pub fn build_get_symptom(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/symptoms/{id}"), None)
    }

    pub fn build_create_symptom(&self, input: &PartialSymptom) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/symptoms", input)
    }

    pub fn build_update_symptom(&self, id: i64, input: &PartialSymptom) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/symptoms/{id}"), input)
    }

    pub fn build_delete_symptom(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/symptoms/{id}"), None)
    }

    // Stages

    pub fn build_create_stage(&self, input: &PartialStage) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/stages", input)
    }

    pub fn build_update_stage(&self, id: i64, input: &PartialStage) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/stages/{id}"), input)
    }

    pub fn build_delete_stage(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/stages/{id}"), None)
    }

    // Medications. The backend spells this resource with a capital M.

    pub fn build_list_medications_by_stage(&self, stage_id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/Medication/stage/{stage_id}"), None)
    }

    pub fn build_get_medication(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/Medication/{id}"), None)
    }

    pub fn build_create_medication(&self, input: &PartialMedication) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/Medication", input)
    }

    pub fn build_update_medication(
        &self,
        id: i64,
        input: &PartialMedication,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/Medication/{id}"), input)
    }

    pub fn build_delete_medication(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/Medication/{id}"), None)
    }

    // Intakes

    pub fn build_create_intake(&self, input: &PartialIntake) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/intakes", input)
    }

    pub fn build_update_intake(&self, id: i64, input: &PartialIntake) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/intakes/{id}"), input)
    }

    pub fn build_delete_intake(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/intakes/{id}"), None)
    }
}

/// Overlay `extra` on `defaults`; a header in `extra` replaces a default with
/// the same case-insensitive name.
pub fn merge_headers(
    defaults: &[(String, String)],
    extra: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = defaults
        .iter()
        .filter(|(name, _)| !extra.iter().any(|(k, _)| k.eq_ignore_ascii_case(name)))
        .cloned()
        .collect();
    merged.extend(extra.iter().cloned());
    merged
}

/// Map a non-success status to `ApiError::HttpStatus`.
///
/// The error body is the response text, or the status line when it is empty.
pub fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let body = if response.body.trim().is_empty() {
        status_line(response.status)
    } else {
        response.body.clone()
    };
    Err(ApiError::HttpStatus {
        status: response.status,
        body,
    })
}

/// Check the status, then deserialize the body into `T`.
///
/// A success response without a JSON content type, or with an empty body, is
/// treated as `{}`.
pub fn parse<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    let result = if !response.is_json() || response.body.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Object(serde_json::Map::new()))
    } else {
        serde_json::from_str(&response.body)
    };
    result.map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn status_line(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("status {status}"))
}
