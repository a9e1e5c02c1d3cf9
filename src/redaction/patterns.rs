//! Built-in PHI patterns.
// Allow expect() on static regex patterns - these are guaranteed to compile
#![allow(clippy::expect_used)]
//!
//! The registry is a read-only table built once per process. Patterns are
//! matched case-sensitively and anchored on word boundaries so a digit run
//! embedded in a longer number is not split.

use super::types::EntityType;
use regex::Regex;
use std::sync::LazyLock;

/// Placeholder for Social Security numbers.
pub const SSN_TAG: &str = "[REDACTED-SSN]";
/// Placeholder for credit card numbers.
pub const CREDIT_CARD_TAG: &str = "[REDACTED-CC]";
/// Placeholder for phone numbers.
pub const PHONE_TAG: &str = "[REDACTED-PHONE]";
/// Placeholder for email addresses.
pub const EMAIL_TAG: &str = "[REDACTED-EMAIL]";
/// Placeholder for dates.
pub const DATE_TAG: &str = "[REDACTED-DATE]";
/// Placeholder for ZIP codes.
pub const ZIP_TAG: &str = "[REDACTED-ZIP]";
/// Placeholder for every form of the patient's name.
pub const NAME_TAG: &str = "[REDACTED-NAME]";

static SSN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("static regex: SSN pattern"));

static CREDIT_CARD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b")
        .expect("static regex: credit card pattern")
});

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b").expect("static regex: phone pattern")
});

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b")
        .expect("static regex: email pattern")
});

static DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}/\d{1,2}/(?:\d{4}|\d{2})\b").expect("static regex: date pattern")
});

static ZIP_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").expect("static regex: ZIP code pattern"));

/// A built-in detector: entity type, matcher, and placeholder.
#[derive(Debug)]
pub struct BuiltinPattern {
    /// Entity type reported for matches.
    pub entity_type: EntityType,
    /// Placeholder substituted for matches.
    pub tag: &'static str,
    regex: &'static LazyLock<Regex>,
}

impl BuiltinPattern {
    /// The compiled matcher.
    #[must_use]
    pub fn regex(&self) -> &'static Regex {
        self.regex
    }
}

/// Built-in patterns in precedence order.
///
/// A detector earlier in this table claims contested text before any later
/// one sees it.
pub static BUILTIN_PATTERNS: [BuiltinPattern; 6] = [
    BuiltinPattern {
        entity_type: EntityType::Ssn,
        tag: SSN_TAG,
        regex: &SSN_REGEX,
    },
    BuiltinPattern {
        entity_type: EntityType::CreditCard,
        tag: CREDIT_CARD_TAG,
        regex: &CREDIT_CARD_REGEX,
    },
    BuiltinPattern {
        entity_type: EntityType::Phone,
        tag: PHONE_TAG,
        regex: &PHONE_REGEX,
    },
    BuiltinPattern {
        entity_type: EntityType::Email,
        tag: EMAIL_TAG,
        regex: &EMAIL_REGEX,
    },
    BuiltinPattern {
        entity_type: EntityType::Date,
        tag: DATE_TAG,
        regex: &DATE_REGEX,
    },
    BuiltinPattern {
        entity_type: EntityType::ZipCode,
        tag: ZIP_TAG,
        regex: &ZIP_REGEX,
    },
];

/// Looks up the built-in pattern for an entity type.
#[must_use]
pub fn builtin(entity_type: EntityType) -> Option<&'static BuiltinPattern> {
    BUILTIN_PATTERNS
        .iter()
        .find(|p| p.entity_type == entity_type)
}

/// Forces compilation of every built-in pattern.
///
/// Called when a redactor is constructed so a broken table fails at startup
/// instead of on the first request.
pub fn warm_up() {
    for pattern in &BUILTIN_PATTERNS {
        LazyLock::force(pattern.regex);
    }
}
