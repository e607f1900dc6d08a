//! Field resolution: the per-field fallback chain, run at invocation time.
//!
//! Operates on an already-compiled field with no I/O of its own; the only
//! outside input is the [`Lookup`]. For a leaf field, in strict order:
//!
//! 1. If the field has a key, look it up once and parse what was found.
//! 2. Found and parsed: use it. Defaults are not consulted.
//! 3. Else a literal `default`: warn if a found value was rejected, then use
//!    the default (already proven to parse at compile time).
//! 4. Else `defaultFrom`: same warning, then copy the sibling's resolved value.
//! 5. Else record a fatal and reset the slot to its type's default.
//!
//! Every value is type-checked against the field before the setter sees it.
//! A mismatch is an [`InternalDefect`], never a diagnostic.

use std::any::Any;
use std::sync::Arc;

use tracing::trace;

use crate::compile::RecordParser;
use crate::error::InternalDefect;
use crate::handler::{RawParser, Setter};
use crate::lookup::Lookup;
use crate::outcome::{Diagnostic, FallbackUsed, Outcome};
use crate::schema::{FieldType, Slot};

/// What a leaf falls back to when the lookup yields nothing usable.
#[derive(Clone)]
pub(crate) enum Fallback {
    Default(String),
    DefaultFrom { field: String, slot: Arc<dyn Slot> },
}

impl Fallback {
    fn used(&self) -> FallbackUsed {
        match self {
            Fallback::Default(value) => FallbackUsed::Default(value.clone()),
            Fallback::DefaultFrom { field, .. } => FallbackUsed::DefaultFrom(field.clone()),
        }
    }
}

/// A compiled leaf field.
pub(crate) struct Leaf {
    pub(crate) field: String,
    pub(crate) ty: FieldType,
    pub(crate) record: &'static str,
    pub(crate) slot: Arc<dyn Slot>,
    /// External key; empty for constant fields.
    pub(crate) key: String,
    pub(crate) parser_name: String,
    pub(crate) parser: RawParser,
    pub(crate) setter: Setter,
    pub(crate) fallback: Option<Fallback>,
}

/// A nested record field, delegating to its own compiled parser.
pub(crate) struct Branch {
    pub(crate) field: String,
    pub(crate) record: &'static str,
    pub(crate) slot: Arc<dyn Slot>,
    pub(crate) parser: RecordParser,
}

#[derive(Clone)]
pub(crate) enum FieldResolver {
    Leaf(Arc<Leaf>),
    Branch(Arc<Branch>),
}

impl FieldResolver {
    pub(crate) fn resolve(
        &self,
        record: &mut dyn Any,
        lookup: &dyn Lookup,
        outcome: &mut Outcome,
    ) -> Result<(), InternalDefect> {
        match self {
            FieldResolver::Leaf(leaf) => leaf.resolve(record, lookup, outcome),
            FieldResolver::Branch(branch) => {
                let nested = branch.slot.get_mut(record).ok_or_else(|| {
                    InternalDefect::SlotUnavailable {
                        field: branch.field.clone(),
                        record: branch.record,
                    }
                })?;
                branch.parser.run(nested, lookup, outcome)
            }
        }
    }

    /// External keys in resolution order, nested records inlined.
    pub(crate) fn collect_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        match self {
            FieldResolver::Leaf(leaf) => {
                if !leaf.key.is_empty() {
                    keys.push(&leaf.key);
                }
            }
            FieldResolver::Branch(branch) => branch.parser.collect_keys(keys),
        }
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Lookup,
    Default,
    DefaultFrom,
}

impl Source {
    fn as_str(self) -> &'static str {
        match self {
            Source::Lookup => "looked-up",
            Source::Default => "default",
            Source::DefaultFrom => "defaultFrom",
        }
    }
}

impl Leaf {
    fn resolve(
        &self,
        record: &mut dyn Any,
        lookup: &dyn Lookup,
        outcome: &mut Outcome,
    ) -> Result<(), InternalDefect> {
        let mut found = None;
        let mut rejected = None;
        if !self.key.is_empty()
            && let Some(raw) = lookup.lookup(&self.key)
        {
            match (self.parser)(&raw) {
                Ok(value) => found = Some(value),
                Err(err) => rejected = Some((raw, err.to_string())),
            }
        }

        let resolved = match (found, &self.fallback) {
            (Some(value), _) => Some((value, Source::Lookup)),
            (None, Some(fallback)) => {
                if let Some((raw, reason)) = rejected {
                    outcome.warnings.push(Diagnostic::invalid_fallback(
                        &self.field,
                        &self.key,
                        raw,
                        reason,
                        fallback.used(),
                    ));
                }
                Some(self.fall_back(fallback, record)?)
            }
            (None, None) => {
                outcome
                    .fatals
                    .push(Diagnostic::not_set(&self.field, &self.key, rejected));
                None
            }
        };

        match resolved {
            Some((value, source)) => {
                self.set(record, value, source)?;
                trace!(field = %self.field, key = %self.key, source = source.as_str(), "resolved");
            }
            None => {
                if !self.slot.reset(record) {
                    return Err(self.slot_unavailable());
                }
                trace!(field = %self.field, key = %self.key, "unset; reset to default");
            }
        }
        Ok(())
    }

    fn fall_back(
        &self,
        fallback: &Fallback,
        record: &mut dyn Any,
    ) -> Result<(Box<dyn Any>, Source), InternalDefect> {
        match fallback {
            Fallback::Default(raw) => {
                let value = (self.parser)(raw).map_err(|err| InternalDefect::DefaultRejected {
                    field: self.field.clone(),
                    value: raw.clone(),
                    reason: err.to_string(),
                })?;
                Ok((value, Source::Default))
            }
            Fallback::DefaultFrom { slot, .. } => {
                // The sibling was declared, and therefore resolved, before this field.
                let value = slot.read(record).ok_or_else(|| self.slot_unavailable())?;
                Ok((value, Source::DefaultFrom))
            }
        }
    }

    fn set(
        &self,
        record: &mut dyn Any,
        value: Box<dyn Any>,
        source: Source,
    ) -> Result<(), InternalDefect> {
        if (*value).type_id() != self.ty.id() {
            return Err(InternalDefect::WrongValueType {
                field: self.field.clone(),
                parser: self.parser_name.clone(),
                origin: source.as_str(),
                expected: self.ty.name(),
            });
        }
        let slot = self
            .slot
            .get_mut(record)
            .ok_or_else(|| self.slot_unavailable())?;
        (self.setter)(slot, value).map_err(|source| InternalDefect::SetterRejected {
            field: self.field.clone(),
            source,
        })
    }

    fn slot_unavailable(&self) -> InternalDefect {
        InternalDefect::SlotUnavailable {
            field: self.field.clone(),
            record: self.record,
        }
    }
}
