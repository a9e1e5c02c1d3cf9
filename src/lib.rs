//! # Phiscrub
//!
//! De-identification of free-form clinical text.
//!
//! Phiscrub scans a document for protected health information (PHI) such as
//! SSNs, phone numbers, emails, dates, credit card numbers, ZIP codes, and a
//! known patient's name, and returns the text with each instance replaced by a
//! fixed placeholder together with an auditable record of what was found and
//! where.
//!
//! ## Features
//!
//! - Fixed-precedence built-in detectors with caller-supplied custom patterns
//! - Patient name resolution where full-name matches take precedence over
//!   first- and last-name matches
//! - Every reported span is a character range of the original input, no
//!   matter how many substitutions of differing lengths were made
//! - Pure, synchronous, and stateless: safe to share across threads
//!
//! ## Example
//!
//! ```rust
//! use phiscrub::{EntityType, PatientIdentity, PhiRedactor, PolicyOverrides};
//!
//! let redactor = PhiRedactor::new();
//! let patient = PatientIdentity::new("John", "Smith")?;
//! let text = "John Smith, SSN 123-45-6789";
//!
//! let result = redactor.redact(text, Some(&patient), Some(&PolicyOverrides::new()))?;
//!
//! assert_eq!(result.redacted_text, "[REDACTED-NAME], SSN [REDACTED-SSN]");
//! assert_eq!(result.events[1].entity_type, EntityType::Ssn);
//! assert_eq!(result.events[1].span.slice(text), Some("123-45-6789"));
//! # Ok::<(), phiscrub::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod observability;
pub mod redaction;

// Re-exports for convenience
pub use config::PhiscrubConfig;
pub use redaction::{
    CustomPattern, EntityType, NameResolver, PatientIdentity, PatternError, PhiRedactor,
    PolicyOverrides, RedactionEvent, RedactionPolicy, RedactionResult, Scanner, Span,
};

/// Error type for phiscrub operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Blank patient names passed to `PatientIdentity::new` |
/// | `OperationFailed` | Config or log file I/O fails, logging initialized twice |
/// | `Pattern` | A caller-supplied custom pattern does not compile |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - The config file cannot be read or parsed
    /// - The log file cannot be opened
    /// - Logging has already been initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A custom pattern was rejected during policy resolution.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// Result type alias for phiscrub operations.
pub type Result<T> = std::result::Result<T, Error>;
