use std::time::Duration;

use tokio::time::Instant;

use crate::realtime::ClientId;
use crate::telemetry::EcgSample;

/// Identity of one recording. Tokens only ever increase, so a timer armed
/// for an earlier recording can never match a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

/// A recording that ran to its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRecording {
    pub token: SessionToken,
    pub owner: ClientId,
    pub samples: Vec<EcgSample>,
}

/// Returned by a successful start: what the caller must arm a timer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    pub token: SessionToken,
    pub deadline: Instant,
}

#[derive(Debug)]
enum State {
    Idle,
    Recording {
        token: SessionToken,
        owner: ClientId,
        deadline: Instant,
        buffer: Vec<EcgSample>,
    },
}

/// The single-flight ECG capture state machine.
///
/// `Idle -> Recording` on start, back to `Idle` on complete or cancel.
/// Calls that do not apply in the current state are no-ops.
#[derive(Debug)]
pub struct EcgRecordingSession {
    state: State,
    last_token: u64,
    duration: Duration,
}

impl EcgRecordingSession {
    pub fn new(duration: Duration) -> Self {
        EcgRecordingSession {
            state: State::Idle,
            last_token: 0,
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.state, State::Recording { .. })
    }

    pub fn owner(&self) -> Option<ClientId> {
        match &self.state {
            State::Recording { owner, .. } => Some(*owner),
            State::Idle => None,
        }
    }

    pub fn token(&self) -> Option<SessionToken> {
        match &self.state {
            State::Recording { token, .. } => Some(*token),
            State::Idle => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Recording { deadline, .. } => Some(*deadline),
            State::Idle => None,
        }
    }

    pub fn buffered(&self) -> usize {
        match &self.state {
            State::Recording { buffer, .. } => buffer.len(),
            State::Idle => 0,
        }
    }

    /// Begin recording for `requester`. Ignored while a recording is in
    /// flight: the running one is neither restarted nor extended.
    pub fn start(&mut self, requester: ClientId, now: Instant) -> Option<Started> {
        if self.is_recording() {
            return None;
        }

        self.last_token += 1;
        let token = SessionToken(self.last_token);
        let deadline = now + self.duration;

        self.state = State::Recording {
            token,
            owner: requester,
            deadline,
            buffer: Vec::new(),
        };

        Some(Started { token, deadline })
    }

    /// Append a sample in arrival order. Returns false while idle.
    pub fn feed(&mut self, sample: EcgSample) -> bool {
        match &mut self.state {
            State::Recording { buffer, .. } => {
                buffer.push(sample);
                true
            }
            State::Idle => false,
        }
    }

    /// Deadline reached for `token`. Yields the buffer only if that exact
    /// recording is still running.
    pub fn complete(&mut self, token: SessionToken) -> Option<CompletedRecording> {
        if self.token() != Some(token) {
            return None;
        }

        match std::mem::replace(&mut self.state, State::Idle) {
            State::Recording { token, owner, buffer, .. } => Some(CompletedRecording {
                token,
                owner,
                samples: buffer,
            }),
            State::Idle => None,
        }
    }

    /// Abandon the running recording if `requester` owns it. The buffer is
    /// discarded. Returns the token of the cancelled recording.
    pub fn cancel(&mut self, requester: ClientId) -> Option<SessionToken> {
        if self.owner() != Some(requester) {
            return None;
        }

        let token = self.token();
        self.state = State::Idle;
        token
    }
}
