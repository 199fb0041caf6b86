//! ECG capture sessions
//!
//! At most one capture runs at a time, process-wide. It buffers samples for
//! a fixed window, then hands the buffer to the client that asked for it.
//! If that client disconnects first the capture is thrown away.

mod actor;
mod session;

pub use actor::{RecordingHandle, SessionStatus};
pub use session::{CompletedRecording, EcgRecordingSession, SessionToken, Started};

use std::time::Duration;

pub const DEFAULT_RECORDING_DURATION: Duration = Duration::from_secs(10);
