//! # LiftSync Testkit
//!
//! Test utilities for LiftSync.
//!
//! This crate provides:
//! - Workout fixtures (plain, superset, drop-set and cardio templates)
//! - Helpers that log whole sessions
//! - Sync engine fixtures over memory or file stores
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use liftsync_testkit::prelude::*;
//!
//! #[test]
//! fn offline_submit_is_queued() {
//!     let engine = TestEngine::signed_out();
//!     let snapshot = logged_session(push_day()).finish();
//!     engine.submit(snapshot, 600, fixed_time(), None).unwrap();
//!     assert_eq!(engine.outbox().len().unwrap(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
