//! Pattern scanner.
//!
//! Runs every enabled detector over the text in precedence order: the
//! built-ins (SSN, credit card, phone, email, date, ZIP code), then custom
//! patterns in the order the caller gave them. Each detector is a single
//! left-to-right scan of the text as it stands at that point, so whichever
//! detector runs first claims a contested span.

use super::policy::RedactionPolicy;
use super::types::{EntityType, RedactionEvent, RedactionResult};
use super::workspace::Workspace;

/// Applies built-in and custom patterns to text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scanner;

impl Scanner {
    /// Creates a new scanner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Redacts every pattern the policy enables.
    ///
    /// Empty text returns an empty result without running any detector.
    /// Event spans always point into `text`.
    #[must_use]
    pub fn redact_text(&self, text: &str, policy: &RedactionPolicy) -> RedactionResult {
        if text.is_empty() {
            return RedactionResult::default();
        }

        let mut workspace = Workspace::new(text);
        let events = self.scan(&mut workspace, policy);

        RedactionResult {
            redacted_text: workspace.into_text(),
            events,
        }
    }

    /// Runs the detectors against an existing workspace.
    pub(crate) fn scan(
        &self,
        workspace: &mut Workspace<'_>,
        policy: &RedactionPolicy,
    ) -> Vec<RedactionEvent> {
        let mut events = Vec::new();

        for pattern in policy.active_builtins() {
            let found = workspace.redact_matches(pattern.regex(), pattern.tag, pattern.entity_type);
            if !found.is_empty() {
                tracing::debug!(
                    entity_type = %pattern.entity_type,
                    count = found.len(),
                    "built-in pattern matched"
                );
            }
            events.extend(found);
        }

        for (index, pattern) in policy.custom_patterns.iter().enumerate() {
            let found = workspace.redact_matches(&pattern.regex, &pattern.tag, EntityType::Custom);
            if !found.is_empty() {
                tracing::debug!(index, count = found.len(), "custom pattern matched");
            }
            events.extend(found);
        }

        events
    }
}
