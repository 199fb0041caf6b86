//! Viewer-side priority list
//!
//! Each viewer keeps its own copy of the active patients and folds the
//! broadcast lifecycle events into it. Because every viewer applies the same
//! events with the same stable sort, all lists converge on one order without
//! further coordination.

use super::Patient;
use crate::realtime::OutboundEvent;

#[derive(Debug, Clone, Default)]
pub struct PatientBoard {
    patients: Vec<Patient>,
}

impl PatientBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an initial fetch of the active list.
    pub fn from_active(patients: Vec<Patient>) -> Self {
        let mut board = PatientBoard { patients };
        board.resort();
        board
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn ids(&self) -> Vec<&str> {
        self.patients.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn admit(&mut self, patient: Patient) {
        self.patients.push(patient);
        self.resort();
    }

    /// Replace by identifier. A patient this board has never seen is not
    /// added.
    pub fn update(&mut self, patient: Patient) {
        if let Some(existing) = self.patients.iter_mut().find(|p| p.id == patient.id) {
            *existing = patient;
        }
        self.resort();
    }

    pub fn discharge(&mut self, patient_id: &str) {
        self.patients.retain(|p| p.id != patient_id);
    }

    /// Fold one broadcast event. Events unrelated to the list are ignored.
    pub fn apply(&mut self, event: &OutboundEvent) {
        match event {
            OutboundEvent::NewPatientAdmitted(patient) => self.admit(patient.clone()),
            OutboundEvent::PatientUpdated(patient) => self.update(patient.clone()),
            OutboundEvent::PatientDischarged { patient_id } => self.discharge(patient_id),
            OutboundEvent::LiveVitalsForAdmission(_) | OutboundEvent::EcgRecordingComplete(_) => {}
        }
    }

    // Ties keep their previous relative order
    fn resort(&mut self) {
        self.patients.sort_by(|a, b| b.triage_score.cmp(&a.triage_score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::PatientStatus;
    use crate::triage::VitalsSnapshot;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn patient(id: &str, triage_score: u32) -> Patient {
        Patient {
            id: id.to_string(),
            name: id.to_lowercase(),
            age: 30,
            gender: "F".to_string(),
            chief_complaint: "Fall".to_string(),
            admission_timestamp: Utc::now(),
            status: PatientStatus::Active,
            initial_vitals: VitalsSnapshot::default(),
            triage_score,
            ecg_recording: vec![],
            notes: vec![],
        }
    }

    #[test]
    fn test_update_reorders_stably() {
        let mut board = PatientBoard::new();
        board.apply(&OutboundEvent::NewPatientAdmitted(patient("P1", 5)));
        board.apply(&OutboundEvent::NewPatientAdmitted(patient("P2", 20)));
        assert_eq!(board.ids(), vec!["P2", "P1"]);

        board.apply(&OutboundEvent::PatientUpdated(patient("P1", 25)));
        assert_eq!(board.ids(), vec!["P1", "P2"]);
    }

    #[test]
    fn test_ties_keep_previous_order() {
        let mut board = PatientBoard::new();
        board.admit(patient("A", 10));
        board.admit(patient("B", 10));
        board.admit(patient("C", 15));
        assert_eq!(board.ids(), vec!["C", "A", "B"]);

        // C drops to the shared score but keeps its place ahead of A and B
        board.update(patient("C", 10));
        assert_eq!(board.ids(), vec!["C", "A", "B"]);

        board.update(patient("B", 12));
        assert_eq!(board.ids(), vec!["B", "C", "A"]);
    }

    #[test]
    fn test_discharge_removes_without_reordering() {
        let mut board = PatientBoard::from_active(vec![patient("A", 1), patient("B", 9), patient("C", 5)]);
        assert_eq!(board.ids(), vec!["B", "C", "A"]);

        board.apply(&OutboundEvent::PatientDischarged {
            patient_id: "C".to_string(),
        });
        assert_eq!(board.ids(), vec!["B", "A"]);
    }

    #[test]
    fn test_update_for_unknown_patient_is_ignored() {
        let mut board = PatientBoard::new();
        board.admit(patient("A", 3));
        board.update(patient("Z", 99));
        assert_eq!(board.ids(), vec!["A"]);
    }

    #[test]
    fn test_telemetry_events_leave_board_alone() {
        let mut board = PatientBoard::new();
        board.admit(patient("A", 3));
        board.apply(&OutboundEvent::EcgRecordingComplete(vec![1, 2]));
        assert_eq!(board.patients().len(), 1);
    }
}
