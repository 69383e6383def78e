//! Async executor for the medication API.
//!
//! # Design
//! `ApiClient` pairs the sans-IO `MedTrackClient` with a `reqwest` client.
//! Each operation builds its request in core, runs it through
//! [`ApiClient::execute`] (retry wrapping timeout), and parses the typed
//! result in core. The struct is immutable after construction and cheap to
//! clone; clones share one connection pool.

use std::time::Duration;

use medtrack_core::{
    parse, ApiError, ClientConfig, Empty, HttpMethod, HttpRequest, HttpResponse, Intake,
    MedTrackClient, Medication, PartialIntake, PartialMedication, PartialStage, PartialSymptom,
    RetryPolicy, Stage, Symptom,
};
use serde::de::DeserializeOwned;

use crate::retry::{retry, with_timeout};

#[derive(Debug, Clone)]
pub struct ApiClient {
    core: MedTrackClient,
    http: reqwest::Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            core: MedTrackClient::from_config(config),
            http,
            timeout: config.timeout,
            retry: config.retry,
        })
    }

    /// The request builder this client executes against.
    pub fn core(&self) -> &MedTrackClient {
        &self.core
    }

    /// Execute `request` under the retry and timeout policies and parse the
    /// response into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: &HttpRequest) -> Result<T, ApiError> {
        tracing::debug!(
            method = %request.method,
            url = %request.path,
            body = ?request.body,
            "api request"
        );
        let result = retry(&self.retry, |attempt| self.attempt::<T>(request, attempt)).await;
        if let Err(err) = &result {
            tracing::error!(method = %request.method, url = %request.path, error = %err, "api request failed");
        }
        result
    }

    async fn attempt<T: DeserializeOwned>(&self, request: &HttpRequest, attempt: u32) -> Result<T, ApiError> {
        let response = with_timeout(self.timeout, self.send(request)).await?;
        tracing::debug!(
            attempt,
            status = response.status,
            body = %response.body,
            "api response"
        );
        parse(&response)
    }

    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self.http.request(method, &request.path);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response.text().await.map_err(transport_error)?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    // Symptoms

    pub async fn list_symptoms(&self) -> Result<Vec<Symptom>, ApiError> {
        self.execute(&self.core.build_list_symptoms()).await
    }

    pub async fn get_symptom(&self, id: i64) -> Result<Symptom, ApiError> {
        self.execute(&self.core.build_get_symptom(id)).await
    }

    pub async fn create_symptom(&self, input: &PartialSymptom) -> Result<Symptom, ApiError> {
        self.execute(&self.core.build_create_symptom(input)?).await
    }

    pub async fn update_symptom(&self, id: i64, input: &PartialSymptom) -> Result<Symptom, ApiError> {
        self.execute(&self.core.build_update_symptom(id, input)?).await
    }

    pub async fn delete_symptom(&self, id: i64) -> Result<Empty, ApiError> {
        self.execute(&self.core.build_delete_symptom(id)).await
    }

    // Stages

    pub async fn create_stage(&self, input: &PartialStage) -> Result<Stage, ApiError> {
        self.execute(&self.core.build_create_stage(input)?).await
    }

    pub async fn update_stage(&self, id: i64, input: &PartialStage) -> Result<Stage, ApiError> {
        self.execute(&self.core.build_update_stage(id, input)?).await
    }

    pub async fn delete_stage(&self, id: i64) -> Result<Empty, ApiError> {
        self.execute(&self.core.build_delete_stage(id)).await
    }

    // Medications

    pub async fn list_medications_by_stage(&self, stage_id: i64) -> Result<Vec<Medication>, ApiError> {
        self.execute(&self.core.build_list_medications_by_stage(stage_id))
            .await
    }

    pub async fn get_medication(&self, id: i64) -> Result<Medication, ApiError> {
        self.execute(&self.core.build_get_medication(id)).await
    }

    pub async fn create_medication(&self, input: &PartialMedication) -> Result<Medication, ApiError> {
        self.execute(&self.core.build_create_medication(input)?).await
    }

    pub async fn update_medication(
        &self,
        id: i64,
        input: &PartialMedication,
    ) -> Result<Medication, ApiError> {
        self.execute(&self.core.build_update_medication(id, input)?)
            .await
    }

    pub async fn delete_medication(&self, id: i64) -> Result<Empty, ApiError> {
        self.execute(&self.core.build_delete_medication(id)).await
    }

    // Intakes

    pub async fn create_intake(&self, input: &PartialIntake) -> Result<Intake, ApiError> {
        self.execute(&self.core.build_create_intake(input)?).await
    }

    pub async fn update_intake(&self, id: i64, input: &PartialIntake) -> Result<Intake, ApiError> {
        self.execute(&self.core.build_update_intake(id, input)?).await
    }

    pub async fn delete_intake(&self, id: i64) -> Result<Empty, ApiError> {
        self.execute(&self.core.build_delete_intake(id)).await
    }

    /// Lightweight read of `/symptoms`. Any failure reports `false`.
    pub async fn health_check(&self) -> bool {
        match self.list_symptoms().await {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(error = %err, "health check failed");
                false
            }
        }
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else if err.is_connect() {
        ApiError::Connectivity
    } else {
        ApiError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_is_built_from_config() {
        let config = ClientConfig::new("http://localhost:5000/api/")
            .with_timeout(Duration::from_millis(100));
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.core().base_url(), "http://localhost:5000/api");
        assert_eq!(client.timeout, Duration::from_millis(100));
        assert_eq!(client.retry, RetryPolicy::default());
    }

    #[test]
    fn client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<ApiClient>();
    }
}
