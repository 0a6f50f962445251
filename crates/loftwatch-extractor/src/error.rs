//! Error types for the Extractor

use thiserror::Error;

/// Errors raised while normalizing extracted text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Text does not match `DD.MM.YYYY HH:mm:ss (GMT±H[:MM])`
    #[error("Unrecognized date/time format: {0}")]
    UnrecognizedFormat(String),

    /// Text matches the pattern but is not a real calendar date/time
    #[error("Invalid date/time: {0}")]
    InvalidDateTime(String),

    /// Counter text has no separator
    #[error("Missing separator '{separator}' in: {raw}")]
    MissingSeparator {
        /// Text that was split
        raw: String,
        /// Expected separator
        separator: char,
    },
}

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// A mandatory field was not found in the document
    #[error("Mandatory field missing: {0}")]
    FieldMissing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
