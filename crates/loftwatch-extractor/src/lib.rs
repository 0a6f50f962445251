//! Loftwatch Extractor
//!
//! Reads the catalogued fields of an event page and normalizes them into the
//! report sent to the collector.
//!
//! # Architecture
//!
//! ```text
//! DocumentView → Extractor → ExtractedSnapshot → normalize_snapshot → NormalizedReport
//! ```
//!
//! Extraction never fails: a field whose label or value node is missing is
//! simply `None`. Normalization never fails either: a value that cannot be
//! parsed is logged and reported as absent.
//!
//! # Example Usage
//!
//! ```
//! use loftwatch_document::DocumentView;
//! use loftwatch_domain::MonitorTarget;
//! use loftwatch_extractor::{normalize_snapshot, Extractor};
//!
//! let doc = DocumentView::parse_html(r#"
//!     <div class="v-list-item">
//!       <i class="fas fa-route"></i>
//!       <div class="v-list-item__subtitle TextLeft-Gray-85">412 km</div>
//!     </div>
//!     <span class="TextLeft-Gray-70">Arrivals</span>
//!     <span class="ParagraphLeft-Gray-100-Bold">40/85</span>
//! "#);
//!
//! let extractor = Extractor::default();
//! let snapshot = extractor.extract_record(&doc);
//! let target = MonitorTarget::new("https://live.example.org/event/1").unwrap();
//! let report = normalize_snapshot(&target, &snapshot);
//!
//! assert_eq!(report.distance_km, Some(412));
//! assert_eq!(report.total_count.as_deref(), Some("85"));
//! ```

#![warn(missing_docs)]

mod error;
mod config;
mod normalizer;
mod extractor;

#[cfg(test)]
mod tests;

pub use error::{ExtractorError, ParseError};
pub use config::ExtractorConfig;
pub use normalizer::{
    normalize_snapshot, parse_date_time, parse_date_time_to_utc, parse_distance, split_count,
    LocalDateTime, COUNT_SEPARATOR, OUTPUT_FORMAT,
};
pub use extractor::Extractor;
