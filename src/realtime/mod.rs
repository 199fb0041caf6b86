//! Real-time fan-out and session coordination
//!
//! - **`hub`**: bounded per-client delivery queues; broadcast and addressed
//!   sends.
//! - **`events`**: the JSON envelopes exchanged with clients.
//! - **`coordinator`**: routes telemetry lines and session commands, and
//!   publishes patient lifecycle events.

pub mod coordinator;
pub mod events;
pub mod hub;

pub use coordinator::{CoordinatorError, RealtimeCoordinator};
pub use events::{ClientMessage, OutboundEvent};
pub use hub::{ClientId, EventReceiver, Hub, DEFAULT_QUEUE_CAPACITY};
