//! End-to-end tests of `ApiClient` against the mock server over real HTTP.

use std::time::Duration;

use medtrack_client::{
    ApiClient, ApiError, ClientConfig, Empty, ErrorKind, PartialIntake, PartialMedication,
    PartialStage, PartialSymptom, RetryPolicy, RetryScope,
};
use mock_server::{app_with_faults, Faults, HitCounter};

async fn spawn(faults: Faults) -> (String, HitCounter) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (router, counter) = app_with_faults(faults);
    tokio::spawn(mock_server::serve(listener, router));
    (format!("http://{addr}"), counter)
}

fn config(base_url: &str, scope: RetryScope) -> ClientConfig {
    ClientConfig::new(base_url)
        .with_timeout(Duration::from_secs(2))
        .with_retry(RetryPolicy {
            max_retries: 2,
            delay: Duration::from_millis(10),
            scope,
        })
}

async fn client(faults: Faults) -> (ApiClient, HitCounter) {
    let (url, counter) = spawn(faults).await;
    (ApiClient::new(&config(&url, RetryScope::AllFailures)).unwrap(), counter)
}

fn migraine() -> PartialSymptom {
    serde_json::from_value(serde_json::json!({
        "name": "Migraine",
        "isActive": true,
        "stages": [{"name": "Severe", "medication": [
            {"name": "Ibuprofen", "quantityMg": 400, "intervalHours": 8, "totalDays": 5}
        ]}]
    }))
    .unwrap()
}

#[tokio::test]
async fn create_symptom_returns_server_record() {
    let (client, _) = client(Faults::default()).await;

    let created = client.create_symptom(&migraine()).await.unwrap();
    assert!(created.id > 0);
    assert_eq!(created.name, "Migraine");
    assert!(created.is_active);
    let stage = &created.stages[0];
    assert_eq!(stage.name, "Severe");
    assert_eq!(stage.symptom_id, created.id);
    let med = &stage.medication[0];
    assert_eq!(
        (med.name.as_str(), med.quantity_mg, med.interval_hours, med.total_days),
        ("Ibuprofen", 400.0, 8.0, 5.0)
    );

    let fetched = client.get_symptom(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn full_lifecycle() {
    let (client, _) = client(Faults::default()).await;

    assert!(client.list_symptoms().await.unwrap().is_empty());
    let symptom = client.create_symptom(&migraine()).await.unwrap();

    // toggle inactive using the fetched record as the update payload
    let mut update = PartialSymptom::from(&symptom);
    update.is_active = Some(false);
    let toggled = client.update_symptom(symptom.id, &update).await.unwrap();
    assert!(!toggled.is_active);

    let stage = client
        .create_stage(&PartialStage {
            name: "Mild".to_string(),
            symptom_id: Some(symptom.id),
            ..Default::default()
        })
        .await
        .unwrap();
    let stage = client
        .update_stage(
            stage.id,
            &PartialStage {
                name: "Moderate".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(stage.name, "Moderate");

    let med = client
        .create_medication(&PartialMedication {
            name: "Paracetamol".to_string(),
            quantity_mg: Some(500.0),
            interval_hours: Some(6.0),
            total_days: Some(3.0),
            stage_id: Some(stage.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(med.stage.as_deref(), Some("Moderate"));

    let listed = client.list_medications_by_stage(stage.id).await.unwrap();
    assert_eq!(listed, vec![med.clone()]);

    let mut edit = PartialMedication::from(&med);
    edit.quantity_mg = Some(1000.0);
    let med = client.update_medication(med.id, &edit).await.unwrap();
    assert_eq!(med.quantity_mg, 1000.0);

    let intake = client
        .create_intake(&PartialIntake {
            medication_id: Some(med.id),
            scheduled_time: Some("2024-05-01T08:00:00".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(intake.medication_id, med.id);
    let intake = client
        .update_intake(
            intake.id,
            &PartialIntake {
                actual_time: Some("2024-05-01T08:10:00".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(intake.actual_time.as_deref(), Some("2024-05-01T08:10:00"));

    let fetched = client.get_medication(med.id).await.unwrap();
    assert_eq!(fetched.intakes.as_ref().map(Vec::len), Some(1));

    assert_eq!(client.delete_intake(intake.id).await.unwrap(), Empty {});
    assert_eq!(client.delete_medication(med.id).await.unwrap(), Empty {});
    assert_eq!(client.delete_stage(stage.id).await.unwrap(), Empty {});
    assert_eq!(client.delete_symptom(symptom.id).await.unwrap(), Empty {});
    assert!(client.list_symptoms().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_resolves_to_empty_object() {
    let (client, _) = client(Faults::default()).await;
    let symptom = client.create_symptom(&migraine()).await.unwrap();
    let med_id = symptom.stages[0].medication[0].id;

    let result = client.delete_medication(med_id).await.unwrap();
    assert_eq!(serde_json::to_string(&result).unwrap(), "{}");
}

#[tokio::test]
async fn not_found_carries_status_and_body() {
    let (client, counter) = client(Faults::default()).await;

    let err = client.get_symptom(999).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HttpStatus);
    assert!(err.is_not_found());
    let msg = err.to_string();
    assert!(msg.contains("404"), "{msg}");
    assert!(msg.contains("Symptom not found"), "{msg}");
    // every failure is retried by default
    assert_eq!(counter.hits(), 3);
}

#[tokio::test]
async fn transport_only_scope_does_not_retry_http_errors() {
    let (url, counter) = spawn(Faults::default()).await;
    let client = ApiClient::new(&config(&url, RetryScope::TransportOnly)).unwrap();

    let err = client.get_medication(12).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(counter.hits(), 1);
}

#[tokio::test]
async fn transient_failures_within_budget_succeed() {
    let (client, counter) = client(Faults {
        fail_first: 2,
        ..Default::default()
    })
    .await;

    let symptoms = client.list_symptoms().await.unwrap();
    assert!(symptoms.is_empty());
    assert_eq!(counter.hits(), 3);
}

#[tokio::test]
async fn failures_beyond_budget_surface_last_error() {
    let (client, counter) = client(Faults {
        fail_first: 10,
        ..Default::default()
    })
    .await;

    let err = client.list_symptoms().await.unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus { status: 503, .. }));
    assert_eq!(counter.hits(), 3);
}

#[tokio::test]
async fn slow_server_times_out_with_timeout_error() {
    let (url, _) = spawn(Faults {
        delay: Some(Duration::from_millis(500)),
        delay_first: u32::MAX,
        ..Default::default()
    })
    .await;
    let config = config(&url, RetryScope::AllFailures).with_timeout(Duration::from_millis(50));
    let client = ApiClient::new(&config).unwrap();

    let err = client.list_symptoms().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(err.to_string(), "request timed out, try again");
}

#[tokio::test]
async fn slow_first_attempt_recovers_on_retry() {
    let (url, _) = spawn(Faults {
        delay: Some(Duration::from_millis(500)),
        delay_first: 1,
        ..Default::default()
    })
    .await;
    let config = config(&url, RetryScope::AllFailures).with_timeout(Duration::from_millis(100));
    let client = ApiClient::new(&config).unwrap();

    assert!(client.list_symptoms().await.is_ok());
}

#[tokio::test]
async fn unreachable_host_is_connectivity_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ApiClient::new(&config(&format!("http://{addr}"), RetryScope::AllFailures)).unwrap();
    let err = client.list_symptoms().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connectivity);
    assert_eq!(
        err.to_string(),
        "unable to connect to server, check your connection"
    );
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn health_check_reports_availability() {
    let (client, _) = client(Faults::default()).await;
    assert!(client.health_check().await);

    let (client, _) = client_failing().await;
    assert!(!client.health_check().await);
}

async fn client_failing() -> (ApiClient, HitCounter) {
    client(Faults {
        fail_first: u32::MAX,
        ..Default::default()
    })
    .await
}
