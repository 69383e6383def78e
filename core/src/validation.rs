//! Presence and range checks for new symptom payloads.
//!
//! The client never runs these implicitly; callers validate form input before
//! handing the payload to `create_symptom`.

use thiserror::Error;

use crate::types::{PartialMedication, PartialSymptom};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symptom name is required")]
    MissingSymptomName,
    #[error("symptom needs at least one stage")]
    NoStages,
    #[error("stage {index} needs a name")]
    MissingStageName { index: usize },
    #[error("stage {stage:?} needs at least one medication")]
    NoMedication { stage: String },
    #[error("a medication in stage {stage:?} needs a name")]
    MissingMedicationName { stage: String },
    #[error("{medication:?}: {field} must be positive")]
    NotPositive {
        medication: String,
        field: &'static str,
    },
}

/// Check that a symptom about to be created has at least one stage, every
/// stage has at least one medication, and every medication has a name and
/// positive dosage, interval and duration.
pub fn validate_new_symptom(symptom: &PartialSymptom) -> Result<(), ValidationError> {
    if symptom.name.trim().is_empty() {
        return Err(ValidationError::MissingSymptomName);
    }
    let stages = match symptom.stages.as_deref() {
        Some(stages) if !stages.is_empty() => stages,
        _ => return Err(ValidationError::NoStages),
    };
    for (index, stage) in stages.iter().enumerate() {
        if stage.name.trim().is_empty() {
            return Err(ValidationError::MissingStageName { index });
        }
        let meds = match stage.medication.as_deref() {
            Some(meds) if !meds.is_empty() => meds,
            _ => {
                return Err(ValidationError::NoMedication {
                    stage: stage.name.clone(),
                })
            }
        };
        for med in meds {
            validate_medication(&stage.name, med)?;
        }
    }
    Ok(())
}

fn validate_medication(stage: &str, med: &PartialMedication) -> Result<(), ValidationError> {
    if med.name.trim().is_empty() {
        return Err(ValidationError::MissingMedicationName {
            stage: stage.to_string(),
        });
    }
    let fields = [
        ("quantityMg", med.quantity_mg),
        ("intervalHours", med.interval_hours),
        ("totalDays", med.total_days),
    ];
    for (field, value) in fields {
        match value {
            Some(v) if v > 0.0 => {}
            _ => {
                return Err(ValidationError::NotPositive {
                    medication: med.name.clone(),
                    field,
                })
            }
        }
    }
    Ok(())
}
