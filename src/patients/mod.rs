//! Patient records and the admission workflow
//!
//! Records themselves are owned by a `PatientRepository`. The realtime core
//! only scores vitals at admission and announces changes to viewers.

pub mod ordering;
pub mod repository;
pub mod service;

pub use ordering::PatientBoard;
pub use repository::{InMemoryPatientRepository, PatientRepository};
pub use service::PatientService;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::EcgSample;
use crate::triage::{TriageScore, VitalsSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatientError {
    #[error("patient not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientStatus {
    #[default]
    Active,
    Discharged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "patientId")]
    pub id: String,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub chief_complaint: String,
    pub admission_timestamp: DateTime<Utc>,
    pub status: PatientStatus,
    pub initial_vitals: VitalsSnapshot,
    pub triage_score: TriageScore,
    pub ecg_recording: Vec<EcgSample>,
    pub notes: Vec<Note>,
}

/// Admission request as submitted at reception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub chief_complaint: String,
    #[serde(default)]
    pub initial_vitals: Option<VitalsSnapshot>,
    #[serde(default)]
    pub ecg_recording: Vec<EcgSample>,
}

impl NewPatient {
    pub fn validate(&self) -> Result<(), PatientError> {
        let required = [
            ("name", &self.name),
            ("gender", &self.gender),
            ("chiefComplaint", &self.chief_complaint),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(PatientError::Validation(format!("{} is required", field)));
            }
        }

        Ok(())
    }
}
