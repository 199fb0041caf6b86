//! Wire messages exchanged with connected clients
//!
//! Both directions use the same envelope, `{"event": "<name>", "data": ...}`.

use serde::{Deserialize, Serialize};

use crate::patients::Patient;
use crate::telemetry::{EcgSample, VitalsSample};

/// Events published by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum OutboundEvent {
    /// Every decoded vitals line, to all viewers.
    LiveVitalsForAdmission(VitalsSample),
    /// The finished capture, to the session owner only.
    EcgRecordingComplete(Vec<EcgSample>),
    NewPatientAdmitted(Patient),
    PatientUpdated(Patient),
    PatientDischarged {
        #[serde(rename = "patientId")]
        patient_id: String,
    },
}

impl OutboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::LiveVitalsForAdmission(_) => "live-vitals-for-admission",
            OutboundEvent::EcgRecordingComplete(_) => "ecg-recording-complete",
            OutboundEvent::NewPatientAdmitted(_) => "new-patient-admitted",
            OutboundEvent::PatientUpdated(_) => "patient-updated",
            OutboundEvent::PatientDischarged { .. } => "patient-discharged",
        }
    }
}

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    StartEcgRecording,
    /// One raw telemetry line forwarded by a sensor bridge.
    VitalsData(String),
}

impl ClientMessage {
    /// Decode a text frame. Anything that is not an envelope is taken to be
    /// a raw telemetry line.
    pub fn from_text(text: &str) -> ClientMessage {
        serde_json::from_str(text).unwrap_or_else(|_| ClientMessage::VitalsData(text.to_string()))
    }
}
