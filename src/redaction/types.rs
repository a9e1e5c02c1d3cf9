//! Redaction data model.
//!
//! Every value here is created fresh per call. Spans always refer to the text
//! passed to the top-level call, never to an intermediate partially-redacted
//! string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Category of protected health information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// US Social Security number.
    Ssn,
    /// Credit card number.
    CreditCard,
    /// Telephone number.
    Phone,
    /// Email address.
    Email,
    /// Calendar date.
    Date,
    /// US ZIP or ZIP+4 code.
    ZipCode,
    /// The patient's full name.
    PatientName,
    /// The patient's first name on its own.
    PatientFirstName,
    /// The patient's last name on its own.
    PatientLastName,
    /// A caller-supplied custom pattern.
    Custom,
}

impl EntityType {
    /// Returns the wire name of the entity type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ssn => "SSN",
            Self::CreditCard => "CREDIT_CARD",
            Self::Phone => "PHONE",
            Self::Email => "EMAIL",
            Self::Date => "DATE",
            Self::ZipCode => "ZIP_CODE",
            Self::PatientName => "PATIENT_NAME",
            Self::PatientFirstName => "PATIENT_FIRST_NAME",
            Self::PatientLastName => "PATIENT_LAST_NAME",
            Self::Custom => "CUSTOM",
        }
    }

    /// Returns true for the entity types produced by the name resolver.
    #[must_use]
    pub const fn is_patient_name(&self) -> bool {
        matches!(
            self,
            Self::PatientName | Self::PatientFirstName | Self::PatientLastName
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Half-open range `[start, end)` into the original input text.
///
/// Offsets count Unicode scalar values (`char`s), not bytes, so a caller in
/// any language that indexes strings by character reads the same substring.
/// Use [`Span::byte_range`] or [`Span::slice`] to index a Rust `&str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start, in characters.
    pub start: usize,
    /// Exclusive end, in characters, always greater than `start`.
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        debug_assert!(end > start);
        Self { start, end }
    }

    /// Length of the span in characters.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Spans are never empty; provided for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `other` lies fully inside this span.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the two spans share at least one offset.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Reads the span off `text`, or `None` if it does not fit.
    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.byte_range(text)?)
    }

    /// Converts the character offsets into a byte range of `text`.
    ///
    /// Returns `None` if the span is inverted or runs past the end of `text`.
    #[must_use]
    pub fn byte_range(&self, text: &str) -> Option<Range<usize>> {
        let len = self.end.checked_sub(self.start)?;
        let mut boundaries = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()));
        let start = boundaries.nth(self.start)?;
        let end = match len {
            0 => start,
            n => boundaries.nth(n - 1)?,
        };
        Some(start..end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// One detected and replaced PHI instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedactionEvent {
    /// Category of the detected entity.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// The original matched substring.
    pub value: String,
    /// Location of `value` in the original input text.
    pub span: Span,
}

impl RedactionEvent {
    /// Creates a new redaction event.
    #[must_use]
    pub fn new(entity_type: EntityType, value: impl Into<String>, span: Span) -> Self {
        Self {
            entity_type,
            value: value.into(),
            span,
        }
    }
}

/// Output of a redaction call.
///
/// Events are ordered by detector execution (name resolution, then built-in
/// patterns in precedence order, then custom patterns in caller order), and
/// left to right within one detector. They are not sorted by span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactionResult {
    /// Text with every detected entity replaced by its placeholder.
    pub redacted_text: String,
    /// Audit trail of what was replaced and where.
    pub events: Vec<RedactionEvent>,
}

impl RedactionResult {
    /// Result for input that needed no work.
    #[must_use]
    pub fn unchanged(text: impl Into<String>) -> Self {
        Self {
            redacted_text: text.into(),
            events: Vec::new(),
        }
    }

    /// Returns true if nothing was detected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns true if at least one entity was replaced.
    #[must_use]
    pub fn was_redacted(&self) -> bool {
        !self.events.is_empty()
    }

    /// Number of redaction events.
    #[must_use]
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Number of events per entity type.
    #[must_use]
    pub fn counts_by_type(&self) -> BTreeMap<EntityType, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.entity_type).or_insert(0) += 1;
        }
        counts
    }

    /// Iterates over the events of one entity type.
    pub fn events_of(&self, entity_type: EntityType) -> impl Iterator<Item = &RedactionEvent> {
        self.events
            .iter()
            .filter(move |e| e.entity_type == entity_type)
    }
}

/// The patient whose name should be redacted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIdentity {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl PatientIdentity {
    /// Creates a patient identity, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if either name is blank.
    pub fn new(first_name: &str, last_name: &str) -> crate::Result<Self> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "patient first and last name must be non-empty".to_string(),
            ));
        }
        Ok(Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })
    }

    /// Returns true if either name is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.first_name.trim().is_empty() || self.last_name.trim().is_empty()
    }

    /// Returns `"first last"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
