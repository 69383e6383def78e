//! In-memory stand-in for the medication-tracking backend.
//!
//! Serves every route the client calls. Records live in flat tables and are
//! assembled into nested, denormalized shapes on read. [`Faults`] lets tests
//! fail or delay the first requests to exercise retry and timeout handling.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub stages: Vec<Stage>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: i64,
    pub name: String,
    pub symptom_id: i64,
    pub symptom: Option<String>,
    pub medication: Vec<Medication>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub interval_hours: f64,
    pub total_days: f64,
    pub quantity_mg: f64,
    pub treatment_id: Option<i64>,
    pub stage_id: i64,
    pub stage: Option<String>,
    pub intakes: Option<Vec<Intake>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Intake {
    pub id: i64,
    pub medication_id: i64,
    pub scheduled_time: String,
    pub actual_time: Option<String>,
    pub medication: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomInput {
    pub name: String,
    pub is_active: Option<bool>,
    pub stages: Option<Vec<StageInput>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInput {
    pub name: String,
    pub symptom_id: Option<i64>,
    pub medication: Option<Vec<MedicationInput>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationInput {
    pub name: String,
    pub interval_hours: Option<f64>,
    pub total_days: Option<f64>,
    pub quantity_mg: Option<f64>,
    pub treatment_id: Option<i64>,
    pub stage_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeInput {
    pub medication_id: Option<i64>,
    pub scheduled_time: Option<String>,
    pub actual_time: Option<String>,
}

#[derive(Clone, Debug)]
struct SymptomRow {
    name: String,
    is_active: bool,
}

#[derive(Clone, Debug)]
struct StageRow {
    name: String,
    symptom_id: i64,
}

#[derive(Clone, Debug)]
struct MedicationRow {
    name: String,
    interval_hours: f64,
    total_days: f64,
    quantity_mg: f64,
    treatment_id: Option<i64>,
    stage_id: i64,
}

#[derive(Clone, Debug)]
struct IntakeRow {
    medication_id: i64,
    scheduled_time: String,
    actual_time: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    next_id: i64,
    symptoms: BTreeMap<i64, SymptomRow>,
    stages: BTreeMap<i64, StageRow>,
    medications: BTreeMap<i64, MedicationRow>,
    intakes: BTreeMap<i64, IntakeRow>,
}

impl Store {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn insert_stage(&mut self, symptom_id: i64, input: StageInput) -> i64 {
        let id = self.allocate();
        self.stages.insert(
            id,
            StageRow {
                name: input.name,
                symptom_id,
            },
        );
        for med in input.medication.unwrap_or_default() {
            self.insert_medication(id, med);
        }
        id
    }

    fn insert_medication(&mut self, stage_id: i64, input: MedicationInput) -> i64 {
        let id = self.allocate();
        self.medications.insert(
            id,
            MedicationRow {
                name: input.name,
                interval_hours: input.interval_hours.unwrap_or(0.0),
                total_days: input.total_days.unwrap_or(0.0),
                quantity_mg: input.quantity_mg.unwrap_or(0.0),
                treatment_id: input.treatment_id,
                stage_id,
            },
        );
        id
    }

    fn intake(&self, id: i64) -> Option<Intake> {
        let row = self.intakes.get(&id)?;
        Some(Intake {
            id,
            medication_id: row.medication_id,
            scheduled_time: row.scheduled_time.clone(),
            actual_time: row.actual_time.clone(),
            medication: self.medications.get(&row.medication_id).map(|m| m.name.clone()),
        })
    }

    fn medication(&self, id: i64) -> Option<Medication> {
        let row = self.medications.get(&id)?;
        let intakes: Vec<Intake> = self
            .intakes
            .iter()
            .filter(|(_, i)| i.medication_id == id)
            .filter_map(|(intake_id, _)| self.intake(*intake_id))
            .collect();
        Some(Medication {
            id,
            name: row.name.clone(),
            interval_hours: row.interval_hours,
            total_days: row.total_days,
            quantity_mg: row.quantity_mg,
            treatment_id: row.treatment_id,
            stage_id: row.stage_id,
            stage: self.stages.get(&row.stage_id).map(|s| s.name.clone()),
            intakes: (!intakes.is_empty()).then_some(intakes),
        })
    }

    fn stage(&self, id: i64) -> Option<Stage> {
        let row = self.stages.get(&id)?;
        Some(Stage {
            id,
            name: row.name.clone(),
            symptom_id: row.symptom_id,
            symptom: self.symptoms.get(&row.symptom_id).map(|s| s.name.clone()),
            medication: self.medications_for_stage(id),
        })
    }

    fn medications_for_stage(&self, stage_id: i64) -> Vec<Medication> {
        self.medications
            .iter()
            .filter(|(_, m)| m.stage_id == stage_id)
            .filter_map(|(id, _)| self.medication(*id))
            .collect()
    }

    fn symptom(&self, id: i64) -> Option<Symptom> {
        let row = self.symptoms.get(&id)?;
        Some(Symptom {
            id,
            name: row.name.clone(),
            is_active: row.is_active,
            stages: self
                .stages
                .iter()
                .filter(|(_, s)| s.symptom_id == id)
                .filter_map(|(stage_id, _)| self.stage(*stage_id))
                .collect(),
        })
    }

    fn remove_medication(&mut self, id: i64) -> bool {
        self.intakes.retain(|_, i| i.medication_id != id);
        self.medications.remove(&id).is_some()
    }

    fn remove_stage(&mut self, id: i64) -> bool {
        let meds: Vec<i64> = self
            .medications
            .iter()
            .filter(|(_, m)| m.stage_id == id)
            .map(|(mid, _)| *mid)
            .collect();
        for mid in meds {
            self.remove_medication(mid);
        }
        self.stages.remove(&id).is_some()
    }

    fn remove_symptom(&mut self, id: i64) -> bool {
        let stages: Vec<i64> = self
            .stages
            .iter()
            .filter(|(_, s)| s.symptom_id == id)
            .map(|(sid, _)| *sid)
            .collect();
        for sid in stages {
            self.remove_stage(sid);
        }
        self.symptoms.remove(&id).is_some()
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult<T> = Result<T, (StatusCode, String)>;

fn not_found(entity: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("{entity} not found"))
}

fn bad_request(msg: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

/// Failure injection for the first requests the server receives.
#[derive(Clone, Debug, Default)]
pub struct Faults {
    /// Answer the first `fail_first` requests with `503`.
    pub fail_first: u32,
    /// Sleep this long before handling each of the first `delay_first` requests.
    pub delay: Option<Duration>,
    pub delay_first: u32,
}

/// Counts requests that reached the server.
#[derive(Clone, Debug, Default)]
pub struct HitCounter {
    hits: Arc<AtomicU32>,
}

impl HitCounter {
    pub fn hits(&self) -> u32 {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct FaultControl {
    faults: Faults,
    counter: HitCounter,
}

pub fn app() -> Router {
    app_with_faults(Faults::default()).0
}

pub fn app_with_faults(faults: Faults) -> (Router, HitCounter) {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    let counter = HitCounter::default();
    let control = FaultControl {
        faults,
        counter: counter.clone(),
    };
    let router = Router::new()
        .route("/symptoms", get(list_symptoms).post(create_symptom))
        .route(
            "/symptoms/{id}",
            get(get_symptom).put(update_symptom).delete(delete_symptom),
        )
        .route("/stages", post(create_stage))
        .route("/stages/{id}", put(update_stage).delete(delete_stage))
        .route("/Medication", post(create_medication))
        .route("/Medication/stage/{stage_id}", get(list_medications_by_stage))
        .route(
            "/Medication/{id}",
            get(get_medication).put(update_medication).delete(delete_medication),
        )
        .route("/intakes", post(create_intake))
        .route("/intakes/{id}", put(update_intake).delete(delete_intake))
        .with_state(db)
        .layer(middleware::from_fn_with_state(control, inject_faults));
    (router, counter)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

async fn inject_faults(State(control): State<FaultControl>, request: Request, next: Next) -> Response {
    let hit = control.counter.hits.fetch_add(1, Ordering::SeqCst) + 1;
    if let Some(delay) = control.faults.delay {
        if hit <= control.faults.delay_first {
            tokio::time::sleep(delay).await;
        }
    }
    if hit <= control.faults.fail_first {
        tracing::debug!(hit, "injecting failure");
        return (StatusCode::SERVICE_UNAVAILABLE, "temporarily unavailable").into_response();
    }
    next.run(request).await
}

// Symptoms

async fn list_symptoms(State(db): State<Db>) -> Json<Vec<Symptom>> {
    let store = db.read().await;
    Json(
        store
            .symptoms
            .keys()
            .filter_map(|id| store.symptom(*id))
            .collect(),
    )
}

async fn get_symptom(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Symptom>> {
    db.read()
        .await
        .symptom(id)
        .map(Json)
        .ok_or_else(|| not_found("Symptom"))
}

async fn create_symptom(
    State(db): State<Db>,
    Json(input): Json<SymptomInput>,
) -> ApiResult<(StatusCode, Json<Symptom>)> {
    let mut store = db.write().await;
    let id = store.allocate();
    store.symptoms.insert(
        id,
        SymptomRow {
            name: input.name,
            is_active: input.is_active.unwrap_or(true),
        },
    );
    for stage in input.stages.unwrap_or_default() {
        store.insert_stage(id, stage);
    }
    tracing::debug!(id, "created symptom");
    let symptom = store.symptom(id).ok_or_else(|| not_found("Symptom"))?;
    Ok((StatusCode::CREATED, Json(symptom)))
}

/// Updates the symptom's own fields; nested stages are managed through `/stages`.
async fn update_symptom(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<SymptomInput>,
) -> ApiResult<Json<Symptom>> {
    let mut store = db.write().await;
    let row = store.symptoms.get_mut(&id).ok_or_else(|| not_found("Symptom"))?;
    row.name = input.name;
    if let Some(active) = input.is_active {
        row.is_active = active;
    }
    store.symptom(id).map(Json).ok_or_else(|| not_found("Symptom"))
}

async fn delete_symptom(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if db.write().await.remove_symptom(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Symptom"))
    }
}

// Stages

async fn create_stage(
    State(db): State<Db>,
    Json(input): Json<StageInput>,
) -> ApiResult<(StatusCode, Json<Stage>)> {
    let mut store = db.write().await;
    let symptom_id = input.symptom_id.ok_or_else(|| bad_request("symptomId is required"))?;
    if !store.symptoms.contains_key(&symptom_id) {
        return Err(not_found("Symptom"));
    }
    let id = store.insert_stage(symptom_id, input);
    let stage = store.stage(id).ok_or_else(|| not_found("Stage"))?;
    Ok((StatusCode::CREATED, Json(stage)))
}

async fn update_stage(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<StageInput>,
) -> ApiResult<Json<Stage>> {
    let mut store = db.write().await;
    let row = store.stages.get_mut(&id).ok_or_else(|| not_found("Stage"))?;
    row.name = input.name;
    store.stage(id).map(Json).ok_or_else(|| not_found("Stage"))
}

async fn delete_stage(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if db.write().await.remove_stage(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Stage"))
    }
}

// Medications

async fn list_medications_by_stage(
    State(db): State<Db>,
    Path(stage_id): Path<i64>,
) -> Json<Vec<Medication>> {
    Json(db.read().await.medications_for_stage(stage_id))
}

async fn get_medication(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<Json<Medication>> {
    db.read()
        .await
        .medication(id)
        .map(Json)
        .ok_or_else(|| not_found("Medication"))
}

async fn create_medication(
    State(db): State<Db>,
    Json(input): Json<MedicationInput>,
) -> ApiResult<(StatusCode, Json<Medication>)> {
    let mut store = db.write().await;
    let stage_id = input.stage_id.ok_or_else(|| bad_request("stageId is required"))?;
    if !store.stages.contains_key(&stage_id) {
        return Err(not_found("Stage"));
    }
    let id = store.insert_medication(stage_id, input);
    let med = store.medication(id).ok_or_else(|| not_found("Medication"))?;
    Ok((StatusCode::CREATED, Json(med)))
}

async fn update_medication(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<MedicationInput>,
) -> ApiResult<Json<Medication>> {
    let mut store = db.write().await;
    let row = store.medications.get_mut(&id).ok_or_else(|| not_found("Medication"))?;
    row.name = input.name;
    if let Some(v) = input.interval_hours {
        row.interval_hours = v;
    }
    if let Some(v) = input.total_days {
        row.total_days = v;
    }
    if let Some(v) = input.quantity_mg {
        row.quantity_mg = v;
    }
    if input.treatment_id.is_some() {
        row.treatment_id = input.treatment_id;
    }
    store.medication(id).map(Json).ok_or_else(|| not_found("Medication"))
}

async fn delete_medication(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if db.write().await.remove_medication(id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Medication"))
    }
}

// Intakes

async fn create_intake(
    State(db): State<Db>,
    Json(input): Json<IntakeInput>,
) -> ApiResult<(StatusCode, Json<Intake>)> {
    let mut store = db.write().await;
    let medication_id = input
        .medication_id
        .ok_or_else(|| bad_request("medicationId is required"))?;
    let scheduled_time = input
        .scheduled_time
        .ok_or_else(|| bad_request("scheduledTime is required"))?;
    if !store.medications.contains_key(&medication_id) {
        return Err(not_found("Medication"));
    }
    let id = store.allocate();
    store.intakes.insert(
        id,
        IntakeRow {
            medication_id,
            scheduled_time,
            actual_time: input.actual_time,
        },
    );
    let intake = store.intake(id).ok_or_else(|| not_found("Intake"))?;
    Ok((StatusCode::CREATED, Json(intake)))
}

async fn update_intake(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Json(input): Json<IntakeInput>,
) -> ApiResult<Json<Intake>> {
    let mut store = db.write().await;
    let row = store.intakes.get_mut(&id).ok_or_else(|| not_found("Intake"))?;
    if let Some(t) = input.scheduled_time {
        row.scheduled_time = t;
    }
    if input.actual_time.is_some() {
        row.actual_time = input.actual_time;
    }
    store.intake(id).map(Json).ok_or_else(|| not_found("Intake"))
}

async fn delete_intake(State(db): State<Db>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    if db.write().await.intakes.remove(&id).is_some() {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Intake"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (Store, i64) {
        let mut store = Store::default();
        let id = store.allocate();
        store.symptoms.insert(
            id,
            SymptomRow {
                name: "Migraine".to_string(),
                is_active: true,
            },
        );
        let input: StageInput = serde_json::from_str(
            r#"{"name":"Severe","medication":[{"name":"Ibuprofen","quantityMg":400,"intervalHours":8,"totalDays":5}]}"#,
        )
        .unwrap();
        store.insert_stage(id, input);
        (store, id)
    }

    #[test]
    fn symptom_serializes_camel_case() {
        let (store, id) = seeded();
        let json = serde_json::to_value(store.symptom(id).unwrap()).unwrap();
        assert_eq!(json["isActive"], true);
        assert_eq!(json["stages"][0]["symptom"], "Migraine");
        assert_eq!(json["stages"][0]["medication"][0]["stage"], "Severe");
        assert_eq!(json["stages"][0]["medication"][0]["quantityMg"], 400.0);
        assert!(json["stages"][0]["medication"][0]["intakes"].is_null());
    }

    #[test]
    fn ids_are_unique_across_tables() {
        let (store, id) = seeded();
        let symptom = store.symptom(id).unwrap();
        let stage = &symptom.stages[0];
        assert_ne!(stage.id, id);
        assert_ne!(stage.medication[0].id, stage.id);
    }

    #[test]
    fn removing_symptom_cascades() {
        let (mut store, id) = seeded();
        assert!(store.remove_symptom(id));
        assert!(store.stages.is_empty());
        assert!(store.medications.is_empty());
        assert!(!store.remove_symptom(id));
    }

    #[test]
    fn symptom_input_requires_name() {
        let result: Result<SymptomInput, _> = serde_json::from_str(r#"{"isActive":true}"#);
        assert!(result.is_err());
    }
}
