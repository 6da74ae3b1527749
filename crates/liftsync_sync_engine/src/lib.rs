//! # LiftSync Sync Engine
//!
//! Offline-durable delivery of finished workouts.
//!
//! This crate provides:
//! - The outbox: a persisted FIFO of pending saves
//! - Dead letters for jobs that exhausted their retry budget
//! - Failure classification (authentication, network, server)
//! - The drain loop and the submit path
//! - Draft persistence for a paused session
//! - A backend abstraction with an HTTP binding and a mock
//!
//! ## Delivery model
//!
//! ```text
//! finish ──submit──▶ save ──ok──▶ secondary calls ──▶ drain
//!                     │
//!                     └─fail / no identity──▶ outbox ──drain──▶ save
//! ```
//!
//! ## Key Invariants
//!
//! - A job keeps its idempotency key for its whole life
//! - Jobs are delivered strictly FIFO; a halted drain leaves order intact
//! - A failed job is never discarded silently: it stays queued or moves to
//!   dead letters
//! - At most one drain runs at a time
//! - Jobs enqueued while a drain runs are preserved

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod classify;
mod config;
mod draft;
mod engine;
mod error;
mod http;
mod identity;
mod job;
mod outbox;
mod telemetry;
mod week;

pub use backend::{BackendError, MockBackend, WorkoutBackend};
pub use classify::FailureClass;
pub use config::SyncConfig;
pub use draft::DraftStore;
pub use engine::{DrainSummary, SubmitOutcome, SyncEngine, SyncStats};
pub use error::{SyncError, SyncResult};
pub use http::{HttpBackend, HttpClient};
pub use identity::{Identity, IdentityProvider, StaticIdentity};
pub use job::PendingJob;
pub use outbox::Outbox;
pub use telemetry::{FailureReport, MemoryTelemetry, TelemetrySink, TracingTelemetry};
pub use week::week_start;
