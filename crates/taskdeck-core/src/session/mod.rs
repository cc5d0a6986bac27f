//! Session domain: typed stream events, the event reducer, timeline
//! reconciliation, the busy ledger and the stream driver.

pub mod busy;
pub mod client;
pub mod events;
pub mod state;
pub mod timeline;
pub mod updates;

pub use busy::BusyLedger;
pub use client::SessionClient;
pub use events::{ChatEvent, DoneSummary, ExecutionEvent, PauseReason};
pub use state::{SessionEffect, SessionState, StreamKind};
pub use timeline::{EXECUTION_STARTED_MARKER, TimelineEntry};
pub use updates::{SessionUpdate, update_channel};
