//! Domain DTOs for the medication-tracking API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift between the two crates. Wire names are
//! camelCase. The `Partial*` payloads omit absent fields entirely so the
//! request body is exactly what the caller populated.

use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};

/// A tracked health condition with its severity stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Symptom {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// A severity phase of a symptom, grouping the medications for that phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: i64,
    pub name: String,
    pub symptom_id: i64,
    /// Name of the owning symptom, denormalized by the server.
    #[serde(default)]
    pub symptom: Option<String>,
    #[serde(default)]
    pub medication: Vec<Medication>,
}

/// A dosing regimen scoped to one stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub interval_hours: f64,
    pub total_days: f64,
    pub quantity_mg: f64,
    #[serde(default)]
    pub treatment_id: Option<i64>,
    pub stage_id: i64,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub intakes: Option<Vec<Intake>>,
}

/// A single scheduled or administered dose.
///
/// Times are kept as the server's strings; the client never interprets them.
/// Either may be null on records the backend has not scheduled yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Intake {
    pub id: i64,
    pub medication_id: i64,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    #[serde(default)]
    pub actual_time: Option<String>,
    #[serde(default)]
    pub medication: Option<String>,
}

/// Request payload for creating or updating a symptom.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartialSymptom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<PartialStage>>,
}

/// Request payload for creating or updating a stage. `symptom_id` scopes a
/// new stage to its symptom.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartialStage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptom_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication: Option<Vec<PartialMedication>>,
}

/// Request payload for creating or updating a medication.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PartialMedication {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_days: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_mg: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_id: Option<i64>,
}

/// Request payload for logging or amending an intake.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PartialIntake {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_time: Option<String>,
}

/// Result of a call whose response has no JSON payload (e.g. a delete).
///
/// Serializes as `{}` and deserializes from any JSON value.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct Empty {}

impl<'de> Deserialize<'de> for Empty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Empty {})
    }
}

impl From<&Medication> for PartialMedication {
    fn from(m: &Medication) -> Self {
        Self {
            id: Some(m.id),
            name: m.name.clone(),
            interval_hours: Some(m.interval_hours),
            total_days: Some(m.total_days),
            quantity_mg: Some(m.quantity_mg),
            treatment_id: m.treatment_id,
            stage_id: Some(m.stage_id),
        }
    }
}

impl From<&Stage> for PartialStage {
    fn from(s: &Stage) -> Self {
        Self {
            id: Some(s.id),
            name: s.name.clone(),
            symptom_id: Some(s.symptom_id),
            medication: Some(s.medication.iter().map(PartialMedication::from).collect()),
        }
    }
}

impl From<&Symptom> for PartialSymptom {
    fn from(s: &Symptom) -> Self {
        Self {
            id: Some(s.id),
            name: s.name.clone(),
            is_active: Some(s.is_active),
            stages: Some(s.stages.iter().map(PartialStage::from).collect()),
        }
    }
}

impl From<&Intake> for PartialIntake {
    fn from(i: &Intake) -> Self {
        Self {
            id: Some(i.id),
            medication_id: Some(i.medication_id),
            scheduled_time: i.scheduled_time.clone(),
            actual_time: i.actual_time.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn symptom_uses_camel_case_on_the_wire() {
        let raw = json!({
            "id": 1,
            "name": "Migraine",
            "isActive": true,
            "stages": [{
                "id": 2,
                "name": "Severe",
                "symptomId": 1,
                "symptom": "Migraine",
                "medication": [{
                    "id": 3,
                    "name": "Ibuprofen",
                    "intervalHours": 8,
                    "totalDays": 5,
                    "quantityMg": 400,
                    "treatmentId": null,
                    "stageId": 2,
                    "stage": "Severe",
                    "intakes": null
                }]
            }]
        });
        let symptom: Symptom = serde_json::from_value(raw).unwrap();
        assert!(symptom.is_active);
        assert_eq!(symptom.stages[0].symptom_id, 1);
        let med = &symptom.stages[0].medication[0];
        assert_eq!(med.quantity_mg, 400.0);
        assert_eq!(med.treatment_id, None);
        assert_eq!(med.intakes, None);
    }

    #[test]
    fn medication_accepts_fractional_dosing() {
        let med: Medication = serde_json::from_str(
            r#"{"id":4,"name":"Colchicine","intervalHours":12,"totalDays":1.5,"quantityMg":2.5,"stageId":2}"#,
        )
        .unwrap();
        assert_eq!(med.quantity_mg, 2.5);
        assert_eq!(med.total_days, 1.5);
        assert_eq!(med.interval_hours, 12.0);
    }

    #[test]
    fn intake_tolerates_unscheduled_dose() {
        let intake: Intake = serde_json::from_str(
            r#"{"id":9,"medicationId":4,"scheduledTime":null,"actualTime":"2024-05-01T08:05:00"}"#,
        )
        .unwrap();
        assert_eq!(intake.scheduled_time, None);
        assert_eq!(PartialIntake::from(&intake).scheduled_time, None);

        let intake: Intake = serde_json::from_str(r#"{"id":9,"medicationId":4}"#).unwrap();
        assert_eq!(intake.scheduled_time, None);
    }

    #[test]
    fn stage_tolerates_missing_denormalized_fields() {
        let stage: Stage =
            serde_json::from_str(r#"{"id":5,"name":"Mild","symptomId":1}"#).unwrap();
        assert_eq!(stage.symptom, None);
        assert!(stage.medication.is_empty());
    }

    #[test]
    fn partial_symptom_omits_absent_fields() {
        let input = PartialSymptom {
            name: "Migraine".to_string(),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&input).unwrap(), json!({"name": "Migraine"}));
    }

    #[test]
    fn partial_medication_serializes_present_fields_only() {
        let input = PartialMedication {
            name: "Ibuprofen".to_string(),
            quantity_mg: Some(400.0),
            interval_hours: Some(8.0),
            total_days: Some(5.0),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            json!({"name": "Ibuprofen", "quantityMg": 400.0, "intervalHours": 8.0, "totalDays": 5.0})
        );
    }

    #[test]
    fn empty_serializes_as_object() {
        assert_eq!(serde_json::to_string(&Empty {}).unwrap(), "{}");
    }

    #[test]
    fn empty_accepts_any_json() {
        assert_eq!(serde_json::from_str::<Empty>("{}").unwrap(), Empty {});
        assert_eq!(serde_json::from_str::<Empty>(r#"{"id":4}"#).unwrap(), Empty {});
        assert_eq!(serde_json::from_str::<Empty>("[1,2]").unwrap(), Empty {});
    }

    #[test]
    fn symptom_converts_to_partial_for_updates() {
        let symptom = Symptom {
            id: 7,
            name: "Nausea".to_string(),
            is_active: false,
            stages: vec![Stage {
                id: 8,
                name: "Early".to_string(),
                symptom_id: 7,
                symptom: Some("Nausea".to_string()),
                medication: Vec::new(),
            }],
        };
        let partial = PartialSymptom::from(&symptom);
        assert_eq!(partial.id, Some(7));
        assert_eq!(partial.is_active, Some(false));
        let stages = partial.stages.unwrap();
        assert_eq!(stages[0].symptom_id, Some(7));
        assert_eq!(stages[0].medication, Some(Vec::new()));
    }
}
