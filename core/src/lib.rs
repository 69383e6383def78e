//! Sans-IO client core for the medication-tracking API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The async executor in
//! `medtrack-client` performs the round-trip and applies timeout and retry.
//!
//! # Design
//! - `MedTrackClient` is stateless: base URL plus default headers.
//! - One `build_*` method per backend operation; a single generic [`parse`]
//!   handles status codes, bodiless responses and deserialization.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;
pub mod validation;

pub use client::{check_status, merge_headers, parse, MedTrackClient};
pub use config::{ClientConfig, ConfigError, Environment, Platform, RetryPolicy, RetryScope};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{
    Empty, Intake, Medication, PartialIntake, PartialMedication, PartialStage, PartialSymptom,
    Stage, Symptom,
};
pub use validation::{validate_new_symptom, ValidationError};
