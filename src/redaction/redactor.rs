//! Comprehensive redaction.
//!
//! [`PhiRedactor`] is the entry point most callers want: it resolves the
//! caller's policy, runs the name resolver, then the pattern scanner, and
//! returns one merged result whose spans all point into the input text.

use super::names::NameResolver;
use super::patterns;
use super::policy::{PatternError, PolicyOverrides, RedactionPolicy};
use super::scanner::Scanner;
use super::types::{EntityType, PatientIdentity, RedactionResult};
use super::workspace::Workspace;
use std::collections::BTreeMap;

/// Redacts protected health information from free-form clinical text.
///
/// Construct once and share by reference; every call is independent and the
/// redactor holds no per-call state.
#[derive(Debug, Clone, Default)]
pub struct PhiRedactor {
    scanner: Scanner,
    names: NameResolver,
    audit: bool,
}

impl PhiRedactor {
    /// Creates a new redactor, compiling the built-in patterns up front.
    #[must_use]
    pub fn new() -> Self {
        patterns::warm_up();
        Self::default()
    }

    /// Enables or disables the audit log record emitted per redacting call.
    #[must_use]
    pub const fn with_audit(mut self, enabled: bool) -> Self {
        self.audit = enabled;
        self
    }

    /// Returns whether audit records are emitted.
    #[must_use]
    pub const fn audit_enabled(&self) -> bool {
        self.audit
    }

    /// Resolves `overrides` and redacts names, then patterns.
    ///
    /// Events are name events followed by pattern events.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if a custom pattern in `overrides` does not
    /// compile. No text is scanned in that case.
    pub fn redact(
        &self,
        text: &str,
        identity: Option<&PatientIdentity>,
        overrides: Option<&PolicyOverrides>,
    ) -> Result<RedactionResult, PatternError> {
        let policy = match overrides {
            Some(overrides) => RedactionPolicy::resolve(overrides)?,
            None => RedactionPolicy::default(),
        };
        Ok(self.redact_with_policy(text, identity, &policy))
    }

    /// Redacts names, then patterns, under an already resolved policy.
    #[must_use]
    pub fn redact_with_policy(
        &self,
        text: &str,
        identity: Option<&PatientIdentity>,
        policy: &RedactionPolicy,
    ) -> RedactionResult {
        if text.is_empty() {
            return RedactionResult::default();
        }

        let mut workspace = Workspace::new(text);
        let mut events = Vec::new();

        if policy.redact_names {
            if let Some(identity) = identity.filter(|id| !id.is_blank()) {
                events = self.names.resolve(&mut workspace, identity);
            }
        }
        events.extend(self.scanner.scan(&mut workspace, policy));

        let result = RedactionResult {
            redacted_text: workspace.into_text(),
            events,
        };

        tracing::debug!(
            text_len = text.len(),
            events = result.count(),
            "redaction complete"
        );
        self.audit_if_any(&result);
        result
    }

    /// Redacts built-in and custom patterns only.
    #[must_use]
    pub fn redact_text(&self, text: &str, policy: &RedactionPolicy) -> RedactionResult {
        let result = self.scanner.redact_text(text, policy);
        self.audit_if_any(&result);
        result
    }

    /// Redacts the patient's name only.
    #[must_use]
    pub fn redact_patient_names(
        &self,
        text: &str,
        identity: Option<&PatientIdentity>,
    ) -> RedactionResult {
        let result = self.names.redact_patient_names(text, identity);
        self.audit_if_any(&result);
        result
    }

    /// Checks if the text contains anything the policy would redact.
    #[must_use]
    pub fn needs_redaction(
        &self,
        text: &str,
        identity: Option<&PatientIdentity>,
        policy: &RedactionPolicy,
    ) -> bool {
        self.quiet()
            .redact_with_policy(text, identity, policy)
            .was_redacted()
    }

    /// Returns how many entities of each type the policy would redact.
    #[must_use]
    pub fn detected_types(
        &self,
        text: &str,
        identity: Option<&PatientIdentity>,
        policy: &RedactionPolicy,
    ) -> BTreeMap<EntityType, usize> {
        self.quiet()
            .redact_with_policy(text, identity, policy)
            .counts_by_type()
    }

    /// Copy of this redactor that never writes audit records.
    const fn quiet(&self) -> Self {
        Self {
            scanner: self.scanner,
            names: self.names,
            audit: false,
        }
    }

    /// Emits an audit record for a call that redacted anything.
    ///
    /// Only types and counts are recorded; matched values never leave the
    /// result.
    fn audit_if_any(&self, result: &RedactionResult) {
        if !self.audit || result.is_empty() {
            return;
        }
        let counts: BTreeMap<&'static str, usize> = result
            .counts_by_type()
            .into_iter()
            .map(|(entity_type, count)| (entity_type.as_str(), count))
            .collect();
        let counts = serde_json::to_string(&counts).unwrap_or_default();
        tracing::info!(
            target: "phiscrub::audit",
            action = "phi_redacted",
            total = result.count(),
            counts = %counts,
            "phi redacted"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::SharedWriter;
    use crate::redaction::policy::CustomPattern;

    fn identity() -> PatientIdentity {
        PatientIdentity::new("John", "Smith").unwrap()
    }

    #[test]
    fn test_names_then_patterns() {
        let text = "John Smith, SSN 123-45-6789, call John at 555-123-4567.";
        let id = identity();
        let result = PhiRedactor::new().redact(text, Some(&id), None).unwrap();

        let types: Vec<EntityType> = result.events.iter().map(|e| e.entity_type).collect();
        assert_eq!(
            types,
            vec![
                EntityType::PatientName,
                EntityType::PatientFirstName,
                EntityType::Ssn,
                EntityType::Phone,
            ]
        );
        assert_eq!(
            result.redacted_text,
            "[REDACTED-NAME], SSN [REDACTED-SSN], call [REDACTED-NAME] at [REDACTED-PHONE]."
        );
        for event in &result.events {
            assert_eq!(event.span.slice(text), Some(event.value.as_str()));
        }
    }

    #[test]
    fn test_names_disabled_by_policy() {
        let text = "John Smith 123-45-6789";
        let id = identity();
        let overrides = PolicyOverrides::new().with_names(false);
        let result = PhiRedactor::new()
            .redact(text, Some(&id), Some(&overrides))
            .unwrap();

        assert_eq!(result.redacted_text, "John Smith [REDACTED-SSN]");
        assert_eq!(result.count(), 1);
    }

    #[test]
    fn test_empty_text() {
        let id = identity();
        let result = PhiRedactor::new().redact("", Some(&id), None).unwrap();
        assert_eq!(result, RedactionResult::default());
    }

    #[test]
    fn test_bad_custom_pattern_produces_no_output() {
        let overrides =
            PolicyOverrides::new().with_custom_pattern(CustomPattern::new("[a-", "[X]"));
        let err = PhiRedactor::new()
            .redact("SSN 123-45-6789", None, Some(&overrides))
            .unwrap_err();
        assert_eq!(err.pattern, "[a-");
    }

    #[test]
    fn test_needs_redaction_and_detected_types() {
        let redactor = PhiRedactor::new().with_audit(true);
        let policy = RedactionPolicy::default();

        assert!(redactor.needs_redaction("mail a@b.org", None, &policy));
        assert!(!redactor.needs_redaction("nothing here", None, &policy));

        let types = redactor.detected_types("a@b.org c@d.org 123-45-6789", None, &policy);
        assert_eq!(types.get(&EntityType::Email), Some(&2));
        assert_eq!(types.get(&EntityType::Ssn), Some(&1));
        assert!(redactor.audit_enabled());
    }

    /// Runs `f` under a subscriber that captures INFO and above.
    fn captured_logs(f: impl FnOnce()) -> String {
        let sink = SharedWriter::new(Vec::new());
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        sink.contents()
    }

    #[test]
    fn test_audit_record_has_counts_but_no_values() {
        let id = identity();
        let logs = captured_logs(|| {
            let result = PhiRedactor::new()
                .with_audit(true)
                .redact("John Smith, SSN 123-45-6789", Some(&id), None)
                .unwrap();
            assert_eq!(result.count(), 2);
        });

        assert!(logs.contains("phiscrub::audit"));
        assert!(logs.contains("phi_redacted"));
        assert!(logs.contains(r#""SSN":1"#));
        assert!(logs.contains(r#""PATIENT_NAME":1"#));
        assert!(logs.contains("total=2"));
        assert!(!logs.contains("123-45-6789"));
        assert!(!logs.contains("John"));
        assert!(!logs.contains("Smith"));
    }

    #[test]
    fn test_audit_record_from_single_stage_calls() {
        let id = identity();
        let redactor = PhiRedactor::new().with_audit(true);
        let policy = RedactionPolicy::default();

        let logs = captured_logs(|| {
            let _ = redactor.redact_text("call 555-123-4567", &policy);
            let _ = redactor.redact_patient_names("Smith", Some(&id));
        });

        assert_eq!(logs.matches("phi_redacted").count(), 2);
        assert!(logs.contains(r#""PHONE":1"#));
        assert!(logs.contains(r#""PATIENT_LAST_NAME":1"#));
        assert!(!logs.contains("555-123-4567"));
    }

    #[test]
    fn test_no_audit_record_when_disabled_or_quiet() {
        let id = identity();
        let text = "John Smith, SSN 123-45-6789";
        let policy = RedactionPolicy::default();

        let logs = captured_logs(|| {
            let _ = PhiRedactor::new().redact(text, Some(&id), None).unwrap();

            let audited = PhiRedactor::new().with_audit(true);
            assert!(audited.needs_redaction(text, Some(&id), &policy));
            assert_eq!(audited.detected_types(text, Some(&id), &policy).len(), 2);
            let _ = audited.redact("nothing to see", None, None).unwrap();
        });

        assert!(logs.is_empty(), "unexpected log output: {logs}");
    }
}
