use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::session::{EcgRecordingSession, SessionToken};
use crate::realtime::{ClientId, CoordinatorError, Hub, OutboundEvent};
use crate::telemetry::EcgSample;

#[derive(Debug)]
enum SessionCommand {
    Start(ClientId),
    Feed(EcgSample),
    Cancel(ClientId),
    Expire(SessionToken),
    Inspect(oneshot::Sender<SessionStatus>),
}

/// Point-in-time view of the recording, for diagnostics and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Recording {
        owner: ClientId,
        samples: usize,
        remaining: Duration,
    },
}

/// Cloneable front door to the recording task. All commands are queued
/// onto one channel and applied in order by a single task, which is the
/// only code that touches the session or its timer.
#[derive(Debug, Clone)]
pub struct RecordingHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl RecordingHandle {
    /// Spawn the recording task on the current tokio runtime.
    pub fn spawn(duration: Duration, hub: Arc<Hub>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = RecordingActor {
            session: EcgRecordingSession::new(duration),
            hub,
            commands: tx.downgrade(),
            timer: None,
        };
        tokio::spawn(actor.run(rx));

        RecordingHandle { commands: tx }
    }

    fn send(&self, command: SessionCommand) -> Result<(), CoordinatorError> {
        self.commands
            .send(command)
            .map_err(|_| CoordinatorError::SessionClosed)
    }

    pub fn start(&self, requester: ClientId) -> Result<(), CoordinatorError> {
        self.send(SessionCommand::Start(requester))
    }

    pub fn feed(&self, sample: EcgSample) -> Result<(), CoordinatorError> {
        self.send(SessionCommand::Feed(sample))
    }

    pub fn cancel(&self, requester: ClientId) -> Result<(), CoordinatorError> {
        self.send(SessionCommand::Cancel(requester))
    }

    pub async fn status(&self) -> Result<SessionStatus, CoordinatorError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Inspect(tx))?;
        rx.await.map_err(|_| CoordinatorError::SessionClosed)
    }
}

struct RecordingActor {
    session: EcgRecordingSession,
    hub: Arc<Hub>,
    // Weak so the task ends once every handle is dropped
    commands: mpsc::WeakUnboundedSender<SessionCommand>,
    timer: Option<JoinHandle<()>>,
}

impl RecordingActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SessionCommand>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }

        self.disarm();
        tracing::debug!("recording task stopped");
    }

    fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start(requester) => self.start(requester),
            SessionCommand::Feed(sample) => {
                self.session.feed(sample);
            }
            SessionCommand::Cancel(requester) => self.cancel(requester),
            SessionCommand::Expire(token) => self.expire(token),
            SessionCommand::Inspect(reply) => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn start(&mut self, requester: ClientId) {
        let Some(started) = self.session.start(requester, Instant::now()) else {
            tracing::debug!(
                client = %requester,
                owner = ?self.session.owner(),
                "recording already in progress, ignoring start"
            );
            return;
        };

        tracing::info!(
            client = %requester,
            duration_secs = self.session.duration().as_secs_f64(),
            "recording ECG"
        );

        let Some(commands) = self.commands.upgrade() else {
            return;
        };
        self.disarm();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(started.deadline).await;
            let _ = commands.send(SessionCommand::Expire(started.token));
        }));
    }

    fn cancel(&mut self, requester: ClientId) {
        if self.session.cancel(requester).is_some() {
            self.disarm();
            tracing::info!(client = %requester, "recording cancelled, owner disconnected");
        }
    }

    fn expire(&mut self, token: SessionToken) {
        let Some(done) = self.session.complete(token) else {
            tracing::debug!(?token, "stale recording deadline, ignoring");
            return;
        };
        self.timer = None;

        let captured = done.samples.len();
        if self.hub.send_to(done.owner, OutboundEvent::EcgRecordingComplete(done.samples)) {
            tracing::info!(client = %done.owner, captured, "finished ECG recording");
        } else {
            tracing::warn!(client = %done.owner, captured, "recording owner unreachable, capture dropped");
        }
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn status(&self) -> SessionStatus {
        match (self.session.owner(), self.session.deadline()) {
            (Some(owner), Some(deadline)) => SessionStatus::Recording {
                owner,
                samples: self.session.buffered(),
                remaining: deadline.saturating_duration_since(Instant::now()),
            },
            _ => SessionStatus::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_delivers_to_owner_only() {
        let hub = Arc::new(Hub::new());
        let owner = ClientId::next();
        let viewer = ClientId::next();
        let mut owner_rx = hub.register(owner);
        let mut viewer_rx = hub.register(viewer);

        let recording = RecordingHandle::spawn(Duration::from_secs(10), Arc::clone(&hub));
        recording.start(owner).unwrap();
        for sample in [3, 1, 2] {
            recording.feed(sample).unwrap();
        }

        let event = owner_rx.recv().await.unwrap();
        assert_eq!(*event, OutboundEvent::EcgRecordingComplete(vec![3, 1, 2]));
        assert!(viewer_rx.try_recv().is_err());
        assert_eq!(recording.status().await.unwrap(), SessionStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_running_recording() {
        let hub = Arc::new(Hub::new());
        let owner = ClientId::next();
        let _rx = hub.register(owner);

        let recording = RecordingHandle::spawn(Duration::from_secs(10), hub);
        recording.start(owner).unwrap();
        recording.feed(9).unwrap();

        assert_eq!(
            recording.status().await.unwrap(),
            SessionStatus::Recording {
                owner,
                samples: 1,
                remaining: Duration::from_secs(10),
            }
        );
    }
}
