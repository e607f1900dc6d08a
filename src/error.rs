//! Error types for the two failure classes that are not ordinary diagnostics.
//!
//! - [`CompileError`] (with [`TagError`]) is returned while building a parser
//!   from a record description. A failed compilation yields no parser at all.
//! - [`InternalDefect`] means the engine or its handler registry is broken,
//!   not that the input is bad. [`CompiledParser::run`](crate::CompiledParser::run)
//!   panics with it; [`try_run`](crate::CompiledParser::try_run) hands it back.
//!
//! Invocation-time warnings and fatals are not errors in this sense; see
//! [`Diagnostic`](crate::Diagnostic).

use thiserror::Error;

/// A malformed field tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("env option is not a key=value pair: {0:?}")]
    NotKeyValue(String),

    #[error("env option {0:?}: unrecognized")]
    Unrecognized(String),

    #[error("env option {0:?}: is set multiple times")]
    Duplicate(String),

    #[error("env option {key:?}: {reason}")]
    Option { key: String, reason: String },
}

/// Schema-construction failure. Always names the offending field.
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum CompileError {
    #[error("field {field:?}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::tag)))]
    Tag {
        field: String,
        #[source]
        source: TagError,
    },

    #[error("field {field:?}: unsupported type {ty}")]
    #[cfg_attr(
        feature = "rich-errors",
        diagnostic(
            code(envfig::unsupported_type),
            help("register a TypeHandler for this type, or declare the field as a nested record")
        )
    )]
    UnsupportedType { field: String, ty: &'static str },

    #[error("field {field:?}: unsupported type {ty}; cannot have tag on nested record")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::tagged_record)))]
    TaggedRecord { field: String, ty: &'static str },

    #[error("field {field:?}: does not have an environment variable name (and const=false)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::unnamed_field)))]
    UnnamedField { field: String },

    #[error("field {field:?}: has an environment variable name (and const=true)")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::named_constant)))]
    NamedConstant { field: String },

    #[error("field {field:?}: type {ty} requires a \"parser\" setting (valid parsers are {valid:?})")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::missing_parser)))]
    MissingParser {
        field: String,
        ty: &'static str,
        valid: Vec<String>,
    },

    #[error("field {field:?}: has both default and defaultFrom")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::default_conflict)))]
    DefaultConflict { field: String },

    #[error("field {field:?}: invalid default {value:?}: {reason}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::invalid_default)))]
    InvalidDefault {
        field: String,
        value: String,
        reason: String,
    },

    #[error("field {field:?}: declared more than once")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::duplicate_field)))]
    DuplicateField { field: String },

    #[error("record type {actual} was described as {described}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::wrong_record)))]
    WrongRecord {
        actual: &'static str,
        described: &'static str,
    },

    #[error("field {field:?}: {source}")]
    #[cfg_attr(feature = "rich-errors", diagnostic(code(envfig::nested)))]
    Nested {
        field: String,
        #[source]
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// The innermost error, following `Nested` wrappers down to the field that
    /// actually failed.
    pub fn root(&self) -> &CompileError {
        match self {
            CompileError::Nested { source, .. } => source.root(),
            other => other,
        }
    }

    /// Dotted path of field names from the compiled record down to the failing field.
    pub fn field_path(&self) -> String {
        match self {
            CompileError::Nested { field, source } => format!("{field}.{}", source.field_path()),
            CompileError::Tag { field, .. }
            | CompileError::UnsupportedType { field, .. }
            | CompileError::TaggedRecord { field, .. }
            | CompileError::UnnamedField { field }
            | CompileError::NamedConstant { field }
            | CompileError::MissingParser { field, .. }
            | CompileError::DefaultConflict { field }
            | CompileError::InvalidDefault { field, .. }
            | CompileError::DuplicateField { field } => field.clone(),
            CompileError::WrongRecord { .. } => String::new(),
        }
    }
}

/// A setter was handed a slot or a value that is not of its handler's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("slot or value is not a {expected}")]
pub struct SlotMismatch {
    pub expected: &'static str,
}

/// The registry or the engine broke its own contract. Never caused by input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalDefect {
    #[error("field {field:?}: {origin} value from parser {parser:?} is not a {expected}")]
    WrongValueType {
        field: String,
        parser: String,
        origin: &'static str,
        expected: &'static str,
    },

    #[error("field {field:?}: default {value:?} was accepted at compile time but now fails: {reason}")]
    DefaultRejected {
        field: String,
        value: String,
        reason: String,
    },

    #[error("field {field:?}: setter rejected value: {source}")]
    SetterRejected {
        field: String,
        #[source]
        source: SlotMismatch,
    },

    #[error("field {field:?}: record instance is not a {record}")]
    SlotUnavailable { field: String, record: &'static str },

    #[error("parser for {expected} was run against a different record type")]
    WrongRecord { expected: &'static str },
}

/// Anything [`EnvfigBuilder::load`](crate::EnvfigBuilder::load) can fail with.
///
/// Fatal diagnostics are not in here: a load that reports fatals still
/// succeeds and hands them back in its [`Outcome`](crate::Outcome).
#[derive(Debug, Error)]
#[cfg_attr(feature = "rich-errors", derive(miette::Diagnostic))]
pub enum EnvfigError {
    #[error(transparent)]
    #[cfg_attr(feature = "rich-errors", diagnostic(transparent))]
    Compile(#[from] CompileError),

    #[error("internal defect: {0}")]
    Defect(#[from] InternalDefect),
}
