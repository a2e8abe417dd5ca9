//! # mesahub-notify
//!
//! The event notification orchestrator. Detects state transitions in
//! cached domain snapshots, runs temporal checks against the store's
//! windowed queries, derives deduplicated notifications through the
//! taxonomy registry, and delivers them over a hybrid push/poll channel
//! with a read/unread lifecycle and priority-based interrupts.
//!
//! Everything here is best-effort and single-process: failures are logged
//! and retried on the next tick, never escalated to the host application.

pub mod delivery;
pub mod differ;
pub mod emitter;
pub mod engine;
pub mod taxonomy;
pub mod temporal;

pub use delivery::{Inbox, InboxPhase, InboxState};
pub use emitter::{EmitError, Emitter};
pub use engine::NotifierEngine;
pub use taxonomy::TypeCatalog;
pub use temporal::TemporalScheduler;
