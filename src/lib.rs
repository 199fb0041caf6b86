//! Vitalis: real-time bedside telemetry and triage
//!
//! Ingests sensor lines, scores patients at admission, runs the single
//! ECG capture session and keeps every connected viewer's patient list in
//! step. The `bridge` module backs the `reader` binary that feeds sensor
//! lines to the server.

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod logging;
pub mod patients;
pub mod realtime;
pub mod recording;
pub mod telemetry;
pub mod triage;

pub use error::VitalisError;
pub use patients::{InMemoryPatientRepository, Patient, PatientBoard, PatientRepository, PatientService};
pub use realtime::{ClientId, OutboundEvent, RealtimeCoordinator};
pub use telemetry::{parse_line, Reading, VitalsSample};
pub use triage::{score, VitalsSnapshot};
