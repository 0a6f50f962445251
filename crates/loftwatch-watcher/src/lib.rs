//! Loftwatch Watcher
//!
//! Watches a live event page and reports its arrivals counter to the
//! collector whenever it changes.
//!
//! # Architecture
//!
//! ```text
//! WatcherWorker ── opens ──▶ DocumentProvider (one per session)
//!      │
//!      └─ runs ──▶ WatcherSession
//!                    Initializing ─▶ Ready ─▶ Observing ─▶ Restarting ─▶ Terminated
//!                        │              │          │
//!                    readiness      extract    ChangeDetector
//!                      wait        + report    + DeltaReport
//!                                      │          │
//!                                      └──▶ ReportDispatcher ──▶ EventReporter
//! ```
//!
//! A session lasts at most its budget (five minutes by default) and is then
//! torn down and replaced. Readiness timeouts and a missing arrivals counter
//! end the session early; both lead to a restart.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod detector;
pub mod dispatcher;
mod error;
pub mod metrics;
pub mod readiness;
pub mod session;
pub mod worker;

pub use cli::Cli;
pub use config::{ConfigError, Profile, WatcherConfig};
pub use detector::ChangeDetector;
pub use dispatcher::{OutboundReport, ReportDispatcher};
pub use error::WatcherError;
pub use metrics::WatcherMetrics;
pub use readiness::{wait_until_ready, ReadinessPredicate};
pub use session::{SessionContext, SessionOutcome, WatcherSession, BASKET_TIME_HEADER};
pub use worker::WatcherWorker;
