//! Async client for the medication-tracking API.
//!
//! # Overview
//! Executes the requests built by `medtrack-core` over `reqwest`, under a
//! per-attempt timeout wrapped by a fixed-delay retry loop. Every operation
//! returns a typed result or a tagged [`ApiError`].
//!
//! ```no_run
//! use medtrack_client::{ApiClient, ClientConfig, Environment, Platform};
//!
//! # async fn demo() -> Result<(), medtrack_client::ApiError> {
//! let config = ClientConfig::for_environment(Environment::Development(Platform::Ios));
//! let client = ApiClient::new(&config)?;
//! for symptom in client.list_symptoms().await? {
//!     println!("{} ({} stages)", symptom.name, symptom.stages.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod retry;

pub use client::ApiClient;
pub use medtrack_core::{
    ApiError, ClientConfig, ConfigError, Empty, Environment, ErrorKind, Intake, Medication,
    PartialIntake, PartialMedication, PartialStage, PartialSymptom, Platform, RetryPolicy,
    RetryScope, Stage, Symptom,
};
