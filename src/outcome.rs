//! Invocation results: warnings and fatals, accumulated across every field.
//!
//! A run never stops at the first bad field. Each field contributes at most
//! one diagnostic:
//!
//! - a **warning** when its value was found but invalid and a fallback was
//!   applied instead;
//! - a **fatal** when nothing usable was found and the field was reset to its
//!   type's default.

use std::fmt;

use serde::Serialize;

/// Which fallback replaced an invalid value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum FallbackUsed {
    /// The literal `default=` value.
    Default(String),
    /// The sibling field named by `defaultFrom=`.
    DefaultFrom(String),
}

impl fmt::Display for FallbackUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackUsed::Default(value) => write!(f, "default {value:?}"),
            FallbackUsed::DefaultFrom(field) => write!(f, "defaultFrom {field:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Found but invalid; recovered through a fallback.
    InvalidFallback,
    /// No usable value.
    NotSet,
}

/// One invocation-time finding about one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Record field name.
    pub field: String,
    /// External key that was looked up. Empty for constant fields.
    pub key: String,
    /// The rejected raw value, when one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackUsed>,
    /// The parser's complaint about `raw`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Diagnostic {
    pub(crate) fn invalid_fallback(
        field: &str,
        key: &str,
        raw: String,
        reason: String,
        fallback: FallbackUsed,
    ) -> Self {
        Self {
            kind: DiagnosticKind::InvalidFallback,
            field: field.to_string(),
            key: key.to_string(),
            raw: Some(raw),
            fallback: Some(fallback),
            reason: Some(reason),
        }
    }

    pub(crate) fn not_set(field: &str, key: &str, rejected: Option<(String, String)>) -> Self {
        let (raw, reason) = match rejected {
            Some((raw, reason)) => (Some(raw), Some(reason)),
            None => (None, None),
        };
        Self {
            kind: DiagnosticKind::NotSet,
            field: field.to_string(),
            key: key.to_string(),
            raw,
            fallback: None,
            reason,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.fallback) {
            (DiagnosticKind::InvalidFallback, Some(fallback)) => {
                write!(f, "invalid {} (falling back to {fallback})", self.key)?;
            }
            _ => write!(f, "invalid {} (aborting)", self.key)?,
        }
        match &self.reason {
            Some(reason) => write!(f, ": {reason}"),
            None => write!(f, ": is not set"),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Everything one run reported, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub warnings: Vec<Diagnostic>,
    pub fatals: Vec<Diagnostic>,
}

impl Outcome {
    /// No warnings and no fatals.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.fatals.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        !self.fatals.is_empty()
    }

    /// `Ok(warnings)` when nothing was fatal, otherwise the whole outcome as the error.
    pub fn into_result(self) -> Result<Vec<Diagnostic>, Outcome> {
        if self.has_fatal() {
            Err(self)
        } else {
            Ok(self.warnings)
        }
    }

    /// Emit warnings at `WARN` and fatals at `ERROR` through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!(field = %warning.field, key = %warning.key, "{warning}");
        }
        for fatal in &self.fatals {
            tracing::error!(field = %fatal.field, key = %fatal.key, "{fatal}");
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .warnings
            .iter()
            .map(|d| ("warning", d))
            .chain(self.fatals.iter().map(|d| ("error", d)));
        for (i, (level, diagnostic)) in lines.enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{level}: {diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Outcome {}
