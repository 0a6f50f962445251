//! Loftwatch Domain Layer
//!
//! Core value types shared by every Loftwatch crate. Like the rest of the
//! domain layer it has no external dependencies: parsing, transport and
//! document access live in the infrastructure crates.
//!
//! ## Key Concepts
//!
//! - **MonitorTarget**: The single URL a running instance watches
//! - **ExtractedSnapshot**: Raw field text read from one document snapshot
//! - **NormalizedReport**: Typed payload derived from a snapshot
//! - **DeltaReport**: Incremental update for a watched field
//! - **WatchedFieldState**: Last-seen text of an observed field
//! - **SessionLifecycle**: Stages of one watcher session

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field_state;
pub mod lifecycle;
pub mod report;
pub mod snapshot;
pub mod target;

// Re-exports for convenience
pub use field_state::WatchedFieldState;
pub use lifecycle::{LifecycleError, SessionLifecycle};
pub use report::{DeltaReport, NormalizedReport};
pub use snapshot::ExtractedSnapshot;
pub use target::MonitorTarget;
