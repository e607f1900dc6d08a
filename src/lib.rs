//! Typed startup configuration from environment variables. Describe a record,
//! tag each field, compile once, and populate as many instances as you like.
//!
//! Envfig turns a record description into a reusable parser. Every field
//! carries a small tag naming the variable to read, the parser to apply, and
//! what to fall back to. Everything that can be checked without reading a
//! variable is checked when the parser is compiled; everything else is
//! reported per field when it runs.
//!
//! ```ignore
//! let loaded = Envfig::builder::<Server>().load()?;
//! let server = loaded.value;
//! ```
//!
//! # Describing a record
//!
//! A record implements [`Record`] by listing its fields in declaration
//! order. Each field has a name (used in diagnostics and by `defaultFrom`),
//! a tag, and an accessor:
//!
//! ```ignore
//! #[derive(Default, Clone)]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     public_host: String,
//!     peers: Vec<String>,
//!     tls: Tls,
//! }
//!
//! impl Record for Server {
//!     fn record_type() -> RecordType {
//!         RecordType::builder::<Self>()
//!             .field("Host", "HOST,parser=nonempty-string", |s| &mut s.host)
//!             .field("Port", "PORT,parser=parse-int,default=8080", |s| &mut s.port)
//!             .field("PublicHost", "PUBLIC_HOST,parser=nonempty-string,defaultFrom=Host", |s| &mut s.public_host)
//!             .field("Peers", "PEERS,parser=comma-list,default=a.example,b.example", |s| &mut s.peers)
//!             .record("Tls", "", |s| &mut s.tls)
//!             .build()
//!     }
//! }
//! ```
//!
//! # Tags
//!
//! `NAME[,key=value]*`. The first segment is the variable to look up. The
//! options are:
//!
//! | Option        | Meaning |
//! |---------------|---------|
//! | `parser`      | Which of the type's parsers to use. Required. |
//! | `default`     | Literal fallback, parsed with the same parser at compile time. |
//! | `defaultFrom` | Fallback copied from an earlier field of the same type. |
//! | `const`       | `true` for a field with no variable: it always takes its default. |
//!
//! `default` must come last: everything after `default=` is the value, commas
//! included, so list defaults need no escaping.
//!
//! # Resolution
//!
//! Fields resolve left to right. For each one:
//!
//! 1. Look the variable up once. Found and parsed: done.
//! 2. Otherwise use `default`, then `defaultFrom`. If a value was found but
//!    rejected, this records a **warning**.
//! 3. With no fallback, the field is reset to its type's `Default` and a
//!    **fatal** is recorded.
//!
//! A bad field never stops the run. The [`Outcome`] lists every warning and
//! every fatal in field order, so one startup attempt reports every problem.
//!
//! # Field types
//!
//! Supported types come from a [`Registry`] of [`TypeHandler`]s. The
//! [`Registry::default`] set covers strings, booleans, integers, floats,
//! durations, string lists, and (feature `url`) absolute URLs; see
//! [`defaults`]. Register a handler to support your own types:
//!
//! ```ignore
//! let registry = Registry::default().with(
//!     TypeHandler::of::<IpAddr>()
//!         .parser("ip", |s: &str| s.parse::<IpAddr>())
//!         .build(),
//! );
//! ```
//!
//! A field whose type has a handler is a leaf, even if that type is also a
//! record. A record-typed field without a handler is compiled recursively and
//! must be untagged.
//!
//! # Lookups
//!
//! The parser reads through a [`Lookup`]: the process environment by
//! default, or [`Vars`], a map, or a closure via [`from_fn`]. Tests pass
//! synthetic variables instead of mutating the real environment.
//!
//! # Error handling
//!
//! Three separate channels:
//!
//! - [`CompileError`]: the description is wrong. No parser is produced.
//! - [`Diagnostic`]s in the [`Outcome`]: the environment is wrong.
//! - [`InternalDefect`]: a handler broke its contract, for example a parser
//!   that returns a value of the wrong type. [`CompiledParser::run`] panics
//!   with it; [`CompiledParser::try_run`] returns it.
//!
//! [`EnvfigBuilder::load`] folds the first and last into [`EnvfigError`].
//! With the `rich-errors` feature, compile errors implement
//! `miette::Diagnostic`.

pub mod defaults;
pub mod error;
pub mod tag;

mod builder;
mod compile;
mod handler;
mod lookup;
mod outcome;
mod resolve;
mod schema;

#[cfg(test)]
mod fixtures;

pub use builder::{Envfig, EnvfigBuilder, Loaded};
pub use compile::{CompiledParser, RecordParser, compile, compile_type};
pub use error::{CompileError, EnvfigError, InternalDefect, SlotMismatch, TagError};
pub use handler::{BoxError, RawParser, Registry, TypeHandler, TypeHandlerBuilder};
pub use lookup::{FromFn, Lookup, ProcessEnv, Vars, from_fn};
pub use outcome::{Diagnostic, DiagnosticKind, FallbackUsed, Outcome};
pub use schema::{FieldDescriptor, FieldType, Record, RecordType, RecordTypeBuilder};
