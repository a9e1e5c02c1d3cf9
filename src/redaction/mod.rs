//! PHI redaction engine.
//!
//! Pattern registry, policy resolution, scanner, and patient name resolver.
//! Every call is a pure transform: no I/O, no shared mutable state, safe to
//! run concurrently from any number of threads.

mod names;
mod patterns;
mod policy;
mod redactor;
mod scanner;
mod types;
mod workspace;

pub use names::NameResolver;
pub use patterns::{
    BUILTIN_PATTERNS, BuiltinPattern, CREDIT_CARD_TAG, DATE_TAG, EMAIL_TAG, NAME_TAG, PHONE_TAG,
    SSN_TAG, ZIP_TAG, builtin,
};
pub use policy::{CompiledPattern, CustomPattern, PatternError, PolicyOverrides, RedactionPolicy};
pub use redactor::PhiRedactor;
pub use scanner::Scanner;
pub use types::{EntityType, PatientIdentity, RedactionEvent, RedactionResult, Span};
