//! Patient name resolution.
//!
//! Runs ahead of the pattern scanner in three case-insensitive passes:
//!
//! 1. The full name (`first + " " + last`) as a literal phrase, with no word
//!    boundaries. Names glued to neighbouring text are still caught, at the
//!    cost of the occasional false positive inside a longer token.
//! 2. The first name as a whole word.
//! 3. The last name as a whole word.
//!
//! A first- or last-name match inside a span already recorded as
//! `PATIENT_NAME` is suppressed, so a full-name hit never also yields
//! part-name events.

use super::patterns::NAME_TAG;
use super::types::{EntityType, PatientIdentity, RedactionEvent, RedactionResult};
use super::workspace::Workspace;
use regex::{Regex, RegexBuilder};

/// Detects a known patient's name.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl NameResolver {
    /// Creates a new name resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Redacts the patient's full, first, and last name.
    ///
    /// Returns the text unchanged with no events when `identity` is absent or
    /// blank, or `text` is empty. Event spans always point into `text`.
    #[must_use]
    pub fn redact_patient_names(
        &self,
        text: &str,
        identity: Option<&PatientIdentity>,
    ) -> RedactionResult {
        let Some(identity) = identity.filter(|id| !id.is_blank()) else {
            return RedactionResult::unchanged(text);
        };
        if text.is_empty() {
            return RedactionResult::default();
        }

        let mut workspace = Workspace::new(text);
        let events = self.resolve(&mut workspace, identity);

        RedactionResult {
            redacted_text: workspace.into_text(),
            events,
        }
    }

    /// Runs the three name passes against an existing workspace.
    pub(crate) fn resolve(
        &self,
        workspace: &mut Workspace<'_>,
        identity: &PatientIdentity,
    ) -> Vec<RedactionEvent> {
        let first = identity.first_name.trim();
        let last = identity.last_name.trim();
        let full = format!("{first} {last}");

        let mut events = match name_regex(&full, false) {
            Some(regex) => workspace.redact_matches(&regex, NAME_TAG, EntityType::PatientName),
            None => Vec::new(),
        };

        // A part-name hit inside a full-name match would touch its placeholder,
        // which the workspace already discards.
        for (part, entity_type) in [
            (first, EntityType::PatientFirstName),
            (last, EntityType::PatientLastName),
        ] {
            if let Some(regex) = name_regex(part, true) {
                events.extend(workspace.redact_matches(&regex, NAME_TAG, entity_type));
            }
        }

        if !events.is_empty() {
            tracing::debug!(count = events.len(), "patient name matched");
        }
        events
    }
}

/// Builds a case-insensitive literal matcher for a name.
///
/// The name is escaped, so building cannot fail for any input; the `Option`
/// only guards against the regex size limit on absurdly long names.
fn name_regex(name: &str, whole_word: bool) -> Option<Regex> {
    let escaped = regex::escape(name);
    let pattern = if whole_word {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| tracing::warn!(error = %e, "patient name matcher could not be built"))
        .ok()
}
