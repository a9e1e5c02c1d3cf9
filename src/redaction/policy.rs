//! Redaction policy.
//!
//! Callers supply a [`PolicyOverrides`] with only the fields they care about;
//! [`RedactionPolicy::resolve`] merges it over the documented defaults and
//! compiles any custom patterns.
//!
//! | Field | Default | Controls |
//! |-------|---------|----------|
//! | `redact_names` | `true` | Patient name resolution |
//! | `redact_dates` | `false` | `DATE` |
//! | `redact_phone` | `true` | `PHONE` |
//! | `redact_email` | `true` | `EMAIL` |
//! | `redact_ssn` | `true` | `SSN` |
//! | `redact_address` | `false` | `ZIP_CODE` |
//! | `redact_credit_card` | `true` | `CREDIT_CARD` |
//! | `custom_patterns` | empty | `CUSTOM`, in caller order |

use super::patterns::{BUILTIN_PATTERNS, BuiltinPattern};
use super::types::EntityType;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// A caller-supplied custom pattern that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("invalid custom pattern '{pattern}': {reason}")]
pub struct PatternError {
    /// The offending pattern source.
    pub pattern: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Uncompiled custom pattern, as supplied by a caller or config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    /// Regular expression source.
    pub pattern: String,
    /// Placeholder substituted verbatim for each match.
    pub tag: String,
}

impl CustomPattern {
    /// Creates a new custom pattern.
    #[must_use]
    pub fn new(pattern: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            tag: tag.into(),
        }
    }

    /// Parses `REGEX=TAG`, splitting on the last `=`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if there is no `=` or either side is empty.
    pub fn parse_assignment(spec: &str) -> Result<Self, PatternError> {
        let Some((pattern, tag)) = spec.rsplit_once('=') else {
            return Err(PatternError {
                pattern: spec.to_string(),
                reason: "expected REGEX=TAG".to_string(),
            });
        };
        if pattern.is_empty() || tag.is_empty() {
            return Err(PatternError {
                pattern: spec.to_string(),
                reason: "pattern and tag must both be non-empty".to_string(),
            });
        }
        Ok(Self::new(pattern, tag))
    }

    /// Compiles the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] naming the pattern if it is empty or does not
    /// parse.
    pub fn compile(&self) -> Result<CompiledPattern, PatternError> {
        if self.pattern.is_empty() {
            return Err(PatternError {
                pattern: self.pattern.clone(),
                reason: "pattern is empty".to_string(),
            });
        }
        let regex = Regex::new(&self.pattern).map_err(|e| PatternError {
            pattern: self.pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(CompiledPattern {
            regex,
            tag: self.tag.clone(),
        })
    }
}

/// A custom pattern that compiled successfully.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Compiled matcher.
    pub regex: Regex,
    /// Placeholder substituted for each match.
    pub tag: String,
}

impl CompiledPattern {
    /// The pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Partial policy. `None` fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyOverrides {
    /// Redact the patient's name.
    pub redact_names: Option<bool>,
    /// Redact dates.
    pub redact_dates: Option<bool>,
    /// Redact phone numbers.
    pub redact_phone: Option<bool>,
    /// Redact email addresses.
    pub redact_email: Option<bool>,
    /// Redact Social Security numbers.
    pub redact_ssn: Option<bool>,
    /// Redact address components (ZIP codes).
    pub redact_address: Option<bool>,
    /// Redact credit card numbers.
    pub redact_credit_card: Option<bool>,
    /// Custom patterns, applied after the built-ins in this order.
    pub custom_patterns: Option<Vec<CustomPattern>>,
}

impl PolicyOverrides {
    /// Creates an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers `other` on top of `self`, field by field.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            redact_names: other.redact_names.or(self.redact_names),
            redact_dates: other.redact_dates.or(self.redact_dates),
            redact_phone: other.redact_phone.or(self.redact_phone),
            redact_email: other.redact_email.or(self.redact_email),
            redact_ssn: other.redact_ssn.or(self.redact_ssn),
            redact_address: other.redact_address.or(self.redact_address),
            redact_credit_card: other.redact_credit_card.or(self.redact_credit_card),
            custom_patterns: other.custom_patterns.or(self.custom_patterns),
        }
    }

    /// Sets whether names are redacted.
    #[must_use]
    pub const fn with_names(mut self, enabled: bool) -> Self {
        self.redact_names = Some(enabled);
        self
    }

    /// Sets whether dates are redacted.
    #[must_use]
    pub const fn with_dates(mut self, enabled: bool) -> Self {
        self.redact_dates = Some(enabled);
        self
    }

    /// Sets whether phone numbers are redacted.
    #[must_use]
    pub const fn with_phone(mut self, enabled: bool) -> Self {
        self.redact_phone = Some(enabled);
        self
    }

    /// Sets whether email addresses are redacted.
    #[must_use]
    pub const fn with_email(mut self, enabled: bool) -> Self {
        self.redact_email = Some(enabled);
        self
    }

    /// Sets whether SSNs are redacted.
    #[must_use]
    pub const fn with_ssn(mut self, enabled: bool) -> Self {
        self.redact_ssn = Some(enabled);
        self
    }

    /// Sets whether ZIP codes are redacted.
    #[must_use]
    pub const fn with_address(mut self, enabled: bool) -> Self {
        self.redact_address = Some(enabled);
        self
    }

    /// Sets whether credit card numbers are redacted.
    #[must_use]
    pub const fn with_credit_card(mut self, enabled: bool) -> Self {
        self.redact_credit_card = Some(enabled);
        self
    }

    /// Appends a custom pattern.
    #[must_use]
    pub fn with_custom_pattern(mut self, pattern: CustomPattern) -> Self {
        self.custom_patterns
            .get_or_insert_with(Vec::new)
            .push(pattern);
        self
    }
}

/// Fully resolved policy with compiled custom patterns.
#[derive(Debug, Clone)]
pub struct RedactionPolicy {
    /// Redact the patient's name.
    pub redact_names: bool,
    /// Redact dates.
    pub redact_dates: bool,
    /// Redact phone numbers.
    pub redact_phone: bool,
    /// Redact email addresses.
    pub redact_email: bool,
    /// Redact Social Security numbers.
    pub redact_ssn: bool,
    /// Redact address components (ZIP codes).
    pub redact_address: bool,
    /// Redact credit card numbers.
    pub redact_credit_card: bool,
    /// Compiled custom patterns in caller order.
    pub custom_patterns: Vec<CompiledPattern>,
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            redact_names: true,
            redact_dates: false,
            redact_phone: true,
            redact_email: true,
            redact_ssn: true,
            redact_address: false,
            redact_credit_card: true,
            custom_patterns: Vec::new(),
        }
    }
}

impl RedactionPolicy {
    /// Merges `overrides` over the defaults.
    ///
    /// Every custom pattern is compiled here, before any scanning, so a bad
    /// pattern never yields partially redacted output.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] for the first custom pattern that fails to
    /// compile.
    pub fn resolve(overrides: &PolicyOverrides) -> Result<Self, PatternError> {
        let defaults = Self::default();
        let custom_patterns = overrides
            .custom_patterns
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(CustomPattern::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            redact_names: overrides.redact_names.unwrap_or(defaults.redact_names),
            redact_dates: overrides.redact_dates.unwrap_or(defaults.redact_dates),
            redact_phone: overrides.redact_phone.unwrap_or(defaults.redact_phone),
            redact_email: overrides.redact_email.unwrap_or(defaults.redact_email),
            redact_ssn: overrides.redact_ssn.unwrap_or(defaults.redact_ssn),
            redact_address: overrides.redact_address.unwrap_or(defaults.redact_address),
            redact_credit_card: overrides
                .redact_credit_card
                .unwrap_or(defaults.redact_credit_card),
            custom_patterns,
        })
    }

    /// Returns whether the built-in detector for `entity_type` is enabled.
    #[must_use]
    pub fn is_enabled(&self, entity_type: EntityType) -> bool {
        match entity_type {
            EntityType::Ssn => self.redact_ssn,
            EntityType::CreditCard => self.redact_credit_card,
            EntityType::Phone => self.redact_phone,
            EntityType::Email => self.redact_email,
            EntityType::Date => self.redact_dates,
            EntityType::ZipCode => self.redact_address,
            EntityType::PatientName
            | EntityType::PatientFirstName
            | EntityType::PatientLastName => self.redact_names,
            EntityType::Custom => !self.custom_patterns.is_empty(),
        }
    }

    /// Enabled built-in patterns in precedence order.
    pub fn active_builtins(&self) -> impl Iterator<Item = &'static BuiltinPattern> + '_ {
        BUILTIN_PATTERNS
            .iter()
            .filter(|p| self.is_enabled(p.entity_type))
    }

    /// Converts back into overrides with every field set.
    #[must_use]
    pub fn to_overrides(&self) -> PolicyOverrides {
        PolicyOverrides {
            redact_names: Some(self.redact_names),
            redact_dates: Some(self.redact_dates),
            redact_phone: Some(self.redact_phone),
            redact_email: Some(self.redact_email),
            redact_ssn: Some(self.redact_ssn),
            redact_address: Some(self.redact_address),
            redact_credit_card: Some(self.redact_credit_card),
            custom_patterns: Some(
                self.custom_patterns
                    .iter()
                    .map(|p| CustomPattern::new(p.as_str(), p.tag.clone()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RedactionPolicy::resolve(&PolicyOverrides::new()).unwrap();

        assert!(policy.redact_names);
        assert!(!policy.redact_dates);
        assert!(policy.redact_phone);
        assert!(policy.redact_email);
        assert!(policy.redact_ssn);
        assert!(!policy.redact_address);
        assert!(policy.redact_credit_card);
        assert!(policy.custom_patterns.is_empty());
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let overrides = PolicyOverrides::new().with_dates(true).with_phone(false);
        let policy = RedactionPolicy::resolve(&overrides).unwrap();

        assert!(policy.redact_dates);
        assert!(!policy.redact_phone);
        assert!(policy.redact_email);
        assert!(policy.redact_ssn);
        assert!(!policy.redact_address);
    }

    #[test]
    fn test_active_builtins_follow_flags() {
        let policy = RedactionPolicy::default();
        let active: Vec<EntityType> = policy.active_builtins().map(|p| p.entity_type).collect();
        assert_eq!(
            active,
            vec![
                EntityType::Ssn,
                EntityType::CreditCard,
                EntityType::Phone,
                EntityType::Email
            ]
        );

        let policy =
            RedactionPolicy::resolve(&PolicyOverrides::new().with_address(true).with_dates(true))
                .unwrap();
        assert_eq!(policy.active_builtins().count(), 6);
    }

    #[test]
    fn test_invalid_custom_pattern_names_pattern() {
        let overrides = PolicyOverrides::new()
            .with_custom_pattern(CustomPattern::new(r"MRN\d+", "[REDACTED-MRN]"))
            .with_custom_pattern(CustomPattern::new(r"(unclosed", "[X]"));

        let err = RedactionPolicy::resolve(&overrides).unwrap_err();
        assert_eq!(err.pattern, "(unclosed");
        assert!(err.to_string().starts_with("invalid custom pattern '(unclosed'"));
    }

    #[test]
    fn test_empty_custom_pattern_rejected() {
        let overrides = PolicyOverrides::new().with_custom_pattern(CustomPattern::new("", "[X]"));
        assert!(RedactionPolicy::resolve(&overrides).is_err());
    }

    #[test]
    fn test_merge_is_field_by_field() {
        let base = PolicyOverrides::new().with_dates(true).with_email(false);
        let top = PolicyOverrides::new().with_email(true);
        let merged = base.merge(top);

        assert_eq!(merged.redact_dates, Some(true));
        assert_eq!(merged.redact_email, Some(true));
        assert_eq!(merged.redact_phone, None);
    }

    #[test]
    fn test_parse_assignment() {
        let pattern = CustomPattern::parse_assignment(r"MRN-\d{6}=[REDACTED-MRN]").unwrap();
        assert_eq!(pattern.pattern, r"MRN-\d{6}");
        assert_eq!(pattern.tag, "[REDACTED-MRN]");

        assert!(CustomPattern::parse_assignment("no-separator").is_err());
        assert!(CustomPattern::parse_assignment("=[TAG]").is_err());
    }

    #[test]
    fn test_overrides_deserialize_from_toml() {
        let overrides: PolicyOverrides = toml::from_str(
            r#"
            redact_dates = true

            [[custom_patterns]]
            pattern = 'MRN-\d{6}'
            tag = "[REDACTED-MRN]"
            "#,
        )
        .unwrap();

        assert_eq!(overrides.redact_dates, Some(true));
        assert_eq!(overrides.redact_phone, None);
        assert_eq!(overrides.custom_patterns.map(|p| p.len()), Some(1));
    }

    #[test]
    fn test_to_overrides_round_trips_through_resolve() {
        let overrides = PolicyOverrides::new()
            .with_ssn(false)
            .with_custom_pattern(CustomPattern::new("MRN", "[M]"));
        let policy = RedactionPolicy::resolve(&overrides).unwrap();
        let again = RedactionPolicy::resolve(&policy.to_overrides()).unwrap();

        assert!(!again.redact_ssn);
        assert_eq!(again.custom_patterns.len(), 1);
        assert_eq!(again.custom_patterns[0].tag, "[M]");
    }
}
