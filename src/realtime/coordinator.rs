use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::events::{ClientMessage, OutboundEvent};
use super::hub::{ClientId, EventReceiver, Hub, DEFAULT_QUEUE_CAPACITY};
use crate::patients::Patient;
use crate::recording::{RecordingHandle, SessionStatus};
use crate::telemetry::{parse_line, ParseError, Reading};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("recording session task is no longer running")]
    SessionClosed,
}

/// Single entry point for everything clients send, and the only writer of
/// the recording session.
///
/// Cheap to clone; clones share the same hub and session.
#[derive(Debug, Clone)]
pub struct RealtimeCoordinator {
    hub: Arc<Hub>,
    recording: RecordingHandle,
}

impl RealtimeCoordinator {
    /// Must be called from within a tokio runtime.
    pub fn new(recording_duration: Duration) -> Self {
        Self::with_queue_capacity(recording_duration, DEFAULT_QUEUE_CAPACITY)
    }

    /// As [`RealtimeCoordinator::new`], with each client allowed to fall
    /// `queue_capacity` events behind before it is disconnected.
    pub fn with_queue_capacity(recording_duration: Duration, queue_capacity: usize) -> Self {
        let hub = Arc::new(Hub::with_capacity(queue_capacity));
        let recording = RecordingHandle::spawn(recording_duration, Arc::clone(&hub));
        RealtimeCoordinator { hub, recording }
    }

    /// Register a new viewer. Events for it arrive on the returned receiver.
    pub fn connect(&self) -> (ClientId, EventReceiver) {
        let id = ClientId::next();
        let rx = self.hub.register(id);
        tracing::info!(client = %id, "client connected");
        (id, rx)
    }

    pub fn viewers(&self) -> usize {
        self.hub.len()
    }

    pub fn on_message(&self, client: ClientId, message: ClientMessage) -> Result<(), CoordinatorError> {
        match message {
            ClientMessage::StartEcgRecording => self.on_start_recording(client),
            ClientMessage::VitalsData(line) => self.on_line(client, &line),
        }
    }

    /// Route one raw telemetry line. Vitals go to every viewer; ECG samples
    /// go to the recording, which drops them unless a capture is running.
    pub fn on_line(&self, client: ClientId, raw: &str) -> Result<(), CoordinatorError> {
        match parse_line(raw) {
            Ok(Reading::Vitals(vitals)) => {
                self.hub.broadcast(OutboundEvent::LiveVitalsForAdmission(vitals));
                Ok(())
            }
            Ok(Reading::Ecg(sample)) => self.recording.feed(sample),
            Err(err @ ParseError::MalformedEcg(_)) => {
                tracing::warn!(client = %client, error = %err, "discarding telemetry line");
                Ok(())
            }
            Err(ParseError::UnknownPrefix) => {
                tracing::debug!(client = %client, line = raw, "ignoring unrecognised line");
                Ok(())
            }
        }
    }

    pub fn on_start_recording(&self, client: ClientId) -> Result<(), CoordinatorError> {
        self.recording.start(client)
    }

    /// Forget the client. If it owns the running capture, that capture is
    /// cancelled.
    pub fn on_disconnect(&self, client: ClientId) -> Result<(), CoordinatorError> {
        self.hub.remove(client);
        tracing::info!(client = %client, "client disconnected");
        self.recording.cancel(client)
    }

    pub fn on_patient_admitted(&self, patient: &Patient) {
        self.hub.broadcast(OutboundEvent::NewPatientAdmitted(patient.clone()));
    }

    pub fn on_patient_updated(&self, patient: &Patient) {
        self.hub.broadcast(OutboundEvent::PatientUpdated(patient.clone()));
    }

    pub fn on_patient_discharged(&self, patient_id: &str) {
        self.hub.broadcast(OutboundEvent::PatientDischarged {
            patient_id: patient_id.to_string(),
        });
    }

    pub async fn recording_status(&self) -> Result<SessionStatus, CoordinatorError> {
        self.recording.status().await
    }
}
