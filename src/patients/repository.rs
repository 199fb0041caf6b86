//! Patient storage
//!
//! `PatientRepository` is the seam to whatever store holds patient records.
//! `InMemoryPatientRepository` keeps everything in process memory and is
//! what the binary runs with.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use super::{NewPatient, Note, Patient, PatientError, PatientStatus};
use crate::triage::TriageScore;

/// First identifier handed out is `P-1001`.
const SEQUENCE_START: u64 = 1000;

pub trait PatientRepository: Send + Sync {
    /// Persist a new admission and allocate its identifier.
    fn create(&self, patient: NewPatient, triage_score: TriageScore) -> Patient;

    /// Patients not yet discharged, most urgent first.
    fn find_active(&self) -> Vec<Patient>;

    /// Discharged patients, most recent admission first.
    fn find_archived(&self) -> Vec<Patient>;

    fn update_status(&self, id: &str, status: PatientStatus) -> Result<Patient, PatientError>;

    fn append_note(&self, id: &str, text: &str) -> Result<Patient, PatientError>;

    fn mark_discharged(&self, id: &str) -> Result<Patient, PatientError>;
}

#[derive(Debug)]
pub struct InMemoryPatientRepository {
    // Admission order
    patients: RwLock<Vec<Patient>>,
    sequence: AtomicU64,
}

impl Default for InMemoryPatientRepository {
    fn default() -> Self {
        InMemoryPatientRepository {
            patients: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(SEQUENCE_START),
        }
    }
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Patient>> {
        self.patients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Patient>> {
        self.patients.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> String {
        format!("P-{}", self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn modify<F>(&self, id: &str, change: F) -> Result<Patient, PatientError>
    where
        F: FnOnce(&mut Patient),
    {
        let mut patients = self.write();
        let patient = patients
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PatientError::NotFound(id.to_string()))?;

        change(patient);
        Ok(patient.clone())
    }
}

impl PatientRepository for InMemoryPatientRepository {
    fn create(&self, patient: NewPatient, triage_score: TriageScore) -> Patient {
        let record = Patient {
            id: self.next_id(),
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            chief_complaint: patient.chief_complaint,
            admission_timestamp: Utc::now(),
            status: PatientStatus::Active,
            initial_vitals: patient.initial_vitals.unwrap_or_default(),
            triage_score,
            ecg_recording: patient.ecg_recording,
            notes: Vec::new(),
        };

        self.write().push(record.clone());
        record
    }

    fn find_active(&self) -> Vec<Patient> {
        let mut active: Vec<Patient> = self
            .read()
            .iter()
            .filter(|p| p.status != PatientStatus::Discharged)
            .cloned()
            .collect();

        active.sort_by(|a, b| b.triage_score.cmp(&a.triage_score));
        active
    }

    fn find_archived(&self) -> Vec<Patient> {
        let mut archived: Vec<Patient> = self
            .read()
            .iter()
            .filter(|p| p.status == PatientStatus::Discharged)
            .cloned()
            .collect();

        archived.sort_by(|a, b| b.admission_timestamp.cmp(&a.admission_timestamp));
        archived
    }

    fn update_status(&self, id: &str, status: PatientStatus) -> Result<Patient, PatientError> {
        self.modify(id, |p| p.status = status)
    }

    fn append_note(&self, id: &str, text: &str) -> Result<Patient, PatientError> {
        self.modify(id, |p| {
            p.notes.push(Note {
                text: text.to_string(),
                timestamp: Utc::now(),
            })
        })
    }

    fn mark_discharged(&self, id: &str) -> Result<Patient, PatientError> {
        self.modify(id, |p| p.status = PatientStatus::Discharged)
    }
}
