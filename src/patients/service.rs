use std::sync::Arc;

use super::{NewPatient, Patient, PatientError, PatientRepository, PatientStatus};
use crate::realtime::RealtimeCoordinator;
use crate::triage;

/// Admission and bedside-update workflow.
///
/// Every mutation is persisted first and only then announced to viewers.
#[derive(Clone)]
pub struct PatientService {
    repository: Arc<dyn PatientRepository>,
    coordinator: RealtimeCoordinator,
}

impl PatientService {
    pub fn new(repository: Arc<dyn PatientRepository>, coordinator: RealtimeCoordinator) -> Self {
        PatientService {
            repository,
            coordinator,
        }
    }

    pub fn admit(&self, admission: NewPatient) -> Result<Patient, PatientError> {
        admission.validate()?;

        let score = triage::score(admission.initial_vitals.as_ref());
        let patient = self.repository.create(admission, score);
        tracing::info!(patient = %patient.id, triage_score = score, "patient admitted");

        self.coordinator.on_patient_admitted(&patient);
        Ok(patient)
    }

    pub fn active(&self) -> Vec<Patient> {
        self.repository.find_active()
    }

    pub fn archived(&self) -> Vec<Patient> {
        self.repository.find_archived()
    }

    pub fn update_status(&self, id: &str, status: PatientStatus) -> Result<Patient, PatientError> {
        let patient = self.repository.update_status(id, status)?;
        self.coordinator.on_patient_updated(&patient);
        Ok(patient)
    }

    pub fn add_note(&self, id: &str, text: &str) -> Result<Patient, PatientError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PatientError::Validation("note text is required".to_string()));
        }

        let patient = self.repository.append_note(id, text)?;
        self.coordinator.on_patient_updated(&patient);
        Ok(patient)
    }

    pub fn discharge(&self, id: &str) -> Result<Patient, PatientError> {
        let patient = self.repository.mark_discharged(id)?;
        tracing::info!(patient = %patient.id, "patient discharged");

        self.coordinator.on_patient_discharged(&patient.id);
        Ok(patient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patients::InMemoryPatientRepository;
    use crate::realtime::OutboundEvent;
    use crate::triage::VitalsSnapshot;
    use std::time::Duration;

    fn service() -> (PatientService, RealtimeCoordinator) {
        let coordinator = RealtimeCoordinator::new(Duration::from_secs(10));
        let repository = Arc::new(InMemoryPatientRepository::new());
        (PatientService::new(repository, coordinator.clone()), coordinator)
    }

    fn admission(vitals: VitalsSnapshot) -> NewPatient {
        NewPatient {
            name: "Ben Okafor".to_string(),
            age: 67,
            gender: "M".to_string(),
            chief_complaint: "Shortness of breath".to_string(),
            initial_vitals: Some(vitals),
            ecg_recording: vec![500, 502],
        }
    }

    #[tokio::test]
    async fn test_admit_scores_and_broadcasts() {
        let (service, coordinator) = service();
        let (_, mut rx) = coordinator.connect();

        let patient = service.admit(admission(VitalsSnapshot::new(45.0, 90.0, 37.0))).unwrap();
        assert_eq!(patient.triage_score, 25);
        assert_eq!(patient.ecg_recording, vec![500, 502]);

        let event = rx.recv().await.unwrap();
        assert_eq!(*event, OutboundEvent::NewPatientAdmitted(patient));
    }

    #[tokio::test]
    async fn test_invalid_admission_is_not_broadcast() {
        let (service, coordinator) = service();
        let (_, mut rx) = coordinator.connect();

        let mut bad = admission(VitalsSnapshot::default());
        bad.name.clear();

        assert!(matches!(service.admit(bad), Err(PatientError::Validation(_))));
        assert!(service.active().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_note_and_discharge_events() {
        let (service, coordinator) = service();
        let patient = service.admit(admission(VitalsSnapshot::default())).unwrap();
        let (_, mut rx) = coordinator.connect();

        let noted = service.add_note(&patient.id, " Started O2 ").unwrap();
        assert_eq!(noted.notes[0].text, "Started O2");
        assert_eq!(*rx.recv().await.unwrap(), OutboundEvent::PatientUpdated(noted));

        service.discharge(&patient.id).unwrap();
        assert_eq!(
            *rx.recv().await.unwrap(),
            OutboundEvent::PatientDischarged {
                patient_id: patient.id.clone()
            }
        );
        assert_eq!(service.archived().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_note_rejected() {
        let (service, _) = service();
        let patient = service.admit(admission(VitalsSnapshot::default())).unwrap();

        assert!(matches!(
            service.add_note(&patient.id, "   "),
            Err(PatientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_patient_is_not_broadcast() {
        let (service, coordinator) = service();
        let (_, mut rx) = coordinator.connect();

        assert_eq!(
            service.discharge("P-4242"),
            Err(PatientError::NotFound("P-4242".to_string()))
        );
        assert!(rx.try_recv().is_err());
    }
}
