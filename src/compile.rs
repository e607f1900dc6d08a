//! Schema compilation: turn a record description into a reusable parser.
//!
//! Runs once per record type, before any lookup happens. Walks the fields in
//! declaration order:
//!
//! 1. A field whose type has a handler in the [`Registry`] is a leaf: its tag
//!    is parsed and validated (see below) and a leaf resolver is built.
//! 2. Otherwise an untagged nested record is compiled recursively and wrapped
//!    in a resolver that runs the sub-parser on the nested slot.
//! 3. Anything else is an unsupported type.
//!
//! Leaf tags accept exactly `const`, `default`, `defaultFrom`, and `parser`.
//! Everything that can be checked without a lookup is checked here: the
//! parser name exists, `default` and `defaultFrom` are not both set, a literal
//! default parses, and `defaultFrom` names an earlier sibling of the same type.
//! A failed compilation returns no parser.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CompileError, InternalDefect};
use crate::handler::{Registry, TypeHandler};
use crate::lookup::Lookup;
use crate::outcome::Outcome;
use crate::resolve::{Branch, Fallback, FieldResolver, Leaf};
use crate::schema::{FieldDescriptor, FieldType, Record, RecordType};
use crate::tag::{self, TagOption, parse_tag};

/// A parser bound to record type `R`.
///
/// Immutable once built. Cloning is cheap, and one parser may run concurrently
/// against distinct instances from any number of threads.
pub struct CompiledParser<R> {
    inner: RecordParser,
    _record: PhantomData<fn(&mut R)>,
}

impl<R> Clone for CompiledParser<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for CompiledParser<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<R: Record> CompiledParser<R> {
    /// Populate `record` from `lookup`, field by field.
    ///
    /// # Panics
    ///
    /// Panics on an [`InternalDefect`]: a handler produced a value of the
    /// wrong type, or a compile-time-validated default stopped parsing. Use
    /// [`try_run`](Self::try_run) to get the defect as a value.
    pub fn run(&self, record: &mut R, lookup: &dyn Lookup) -> Outcome {
        match self.try_run(record, lookup) {
            Ok(outcome) => outcome,
            Err(defect) => panic!("envfig: internal defect: {defect}"),
        }
    }

    /// Like [`run`](Self::run), but returns an internal defect instead of panicking.
    /// Fields after the defective one are left untouched.
    pub fn try_run(&self, record: &mut R, lookup: &dyn Lookup) -> Result<Outcome, InternalDefect> {
        self.inner.try_run(record, lookup)
    }

    /// Populate a fresh `R::default()`.
    pub fn parse(&self, lookup: &dyn Lookup) -> (R, Outcome) {
        let mut record = R::default();
        let outcome = self.run(&mut record, lookup);
        (record, outcome)
    }
}

impl<R> CompiledParser<R> {
    /// External keys this parser reads, in resolution order.
    pub fn keys(&self) -> Vec<&str> {
        self.inner.keys()
    }

    /// The untyped parser underneath.
    pub fn erased(&self) -> &RecordParser {
        &self.inner
    }
}

/// Compile `R`'s description against `registry`.
pub fn compile<R: Record>(registry: &Registry) -> Result<CompiledParser<R>, CompileError> {
    let record = R::record_type();
    let expected = FieldType::of::<R>();
    if record.record() != expected {
        return Err(CompileError::WrongRecord {
            actual: expected.name(),
            described: record.record().name(),
        });
    }
    Ok(CompiledParser {
        inner: compile_type(&record, registry)?,
        _record: PhantomData,
    })
}

/// Compile a record description without naming its Rust type.
///
/// The result runs against `&mut dyn Any` and checks the instance type at
/// every call. Prefer [`compile`] when the record type is known statically.
pub fn compile_type(record: &RecordType, registry: &Registry) -> Result<RecordParser, CompileError> {
    debug!(record = %record.record(), fields = record.fields().len(), "compiling record");
    compile_record(record, registry)
}

/// A compiled parser for one record level, type-erased.
#[derive(Clone)]
pub struct RecordParser {
    ty: FieldType,
    resolvers: Vec<FieldResolver>,
}

impl RecordParser {
    /// The record type this parser populates.
    pub fn record(&self) -> FieldType {
        self.ty
    }

    /// Populate `record`, which must be an instance of [`record`](Self::record).
    pub fn try_run(&self, record: &mut dyn Any, lookup: &dyn Lookup) -> Result<Outcome, InternalDefect> {
        if (*record).type_id() != self.ty.id() {
            return Err(InternalDefect::WrongRecord {
                expected: self.ty.name(),
            });
        }
        let mut outcome = Outcome::default();
        self.run(record, lookup, &mut outcome)?;
        Ok(outcome)
    }

    pub fn keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    pub(crate) fn run(
        &self,
        record: &mut dyn Any,
        lookup: &dyn Lookup,
        outcome: &mut Outcome,
    ) -> Result<(), InternalDefect> {
        for resolver in &self.resolvers {
            resolver.resolve(record, lookup, outcome)?;
        }
        Ok(())
    }

    pub(crate) fn collect_keys<'a>(&'a self, keys: &mut Vec<&'a str>) {
        for resolver in &self.resolvers {
            resolver.collect_keys(keys);
        }
    }
}

impl fmt::Debug for RecordParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordParser")
            .field("record", &self.ty)
            .field("keys", &self.keys())
            .finish()
    }
}

fn compile_record(
    record: &RecordType,
    registry: &Registry,
) -> Result<RecordParser, CompileError> {
    let mut seen: HashMap<&str, &FieldDescriptor> = HashMap::with_capacity(record.fields().len());
    let mut resolvers = Vec::with_capacity(record.fields().len());

    for field in record.fields() {
        if seen.contains_key(field.name()) {
            return Err(CompileError::DuplicateField {
                field: field.name().to_string(),
            });
        }

        let resolver = if let Some(handler) = registry.get(field.field_type()) {
            compile_leaf(record, field, handler, &seen)?
        } else if let Some(nested) = field.nested_type() {
            if !field.tag().is_empty() {
                return Err(CompileError::TaggedRecord {
                    field: field.name().to_string(),
                    ty: field.field_type().name(),
                });
            }
            debug!(field = field.name(), record = %nested.record(), "compiling nested record");
            let parser =
                compile_record(&nested, registry).map_err(|source| CompileError::Nested {
                    field: field.name().to_string(),
                    source: Box::new(source),
                })?;
            FieldResolver::Branch(Arc::new(Branch {
                field: field.name().to_string(),
                record: record.record().name(),
                slot: Arc::clone(&field.slot),
                parser,
            }))
        } else {
            return Err(CompileError::UnsupportedType {
                field: field.name().to_string(),
                ty: field.field_type().name(),
            });
        };

        seen.insert(field.name(), field);
        resolvers.push(resolver);
    }

    Ok(RecordParser {
        ty: record.record(),
        resolvers,
    })
}

fn compile_leaf(
    record: &RecordType,
    field: &FieldDescriptor,
    handler: &TypeHandler,
    seen: &HashMap<&str, &FieldDescriptor>,
) -> Result<FieldResolver, CompileError> {
    let name = field.name();
    let ty = field.field_type();

    let options = [
        TagOption::new(tag::CONST)
            .default("false")
            .validator(|v| tag::parse_bool(v).map(drop)),
        TagOption::new(tag::DEFAULT),
        TagOption::new(tag::DEFAULT_FROM).validator(|v| match seen.get(v) {
            None => Err(format!("referenced field {v:?} does not exist (yet?)")),
            Some(other) if other.field_type() != ty => Err(format!(
                "referenced field {v:?} is of type {}, but we need type {ty}",
                other.field_type()
            )),
            Some(_) => Ok(()),
        }),
        TagOption::new(tag::PARSER).validator(|v| match handler.parser(v) {
            Some(_) => Ok(()),
            None => Err(format!(
                "value {v:?} is not one of {:?}",
                handler.parser_names()
            )),
        }),
    ];

    let parsed = parse_tag(field.tag(), &options).map_err(|source| CompileError::Tag {
        field: name.to_string(),
        source,
    })?;

    match (parsed.name.is_empty(), parsed.is_const()) {
        (true, false) => {
            return Err(CompileError::UnnamedField {
                field: name.to_string(),
            });
        }
        (false, true) => {
            return Err(CompileError::NamedConstant {
                field: name.to_string(),
            });
        }
        _ => {}
    }

    let (parser_name, parser) = parsed
        .option(tag::PARSER)
        .and_then(|p| handler.parser(p).map(|parser| (p, parser)))
        .ok_or_else(|| CompileError::MissingParser {
            field: name.to_string(),
            ty: ty.name(),
            valid: handler.parser_names(),
        })?;

    let fallback = match (parsed.option(tag::DEFAULT), parsed.option(tag::DEFAULT_FROM)) {
        (Some(_), Some(_)) => {
            return Err(CompileError::DefaultConflict {
                field: name.to_string(),
            });
        }
        (Some(default), None) => {
            parser(default).map_err(|err| CompileError::InvalidDefault {
                field: name.to_string(),
                value: default.to_string(),
                reason: err.to_string(),
            })?;
            Some(Fallback::Default(default.to_string()))
        }
        (None, Some(sibling)) => {
            // validated above: present in `seen` with the same type
            let sibling_field = seen[sibling];
            Some(Fallback::DefaultFrom {
                field: sibling.to_string(),
                slot: Arc::clone(&sibling_field.slot),
            })
        }
        (None, None) => None,
    };

    debug!(
        field = name,
        key = %parsed.name,
        parser = parser_name,
        fallback = fallback.as_ref().map(|f| match f {
            Fallback::Default(_) => "default",
            Fallback::DefaultFrom { .. } => "defaultFrom",
        }),
        "compiled field"
    );

    Ok(FieldResolver::Leaf(Arc::new(Leaf {
        field: name.to_string(),
        ty,
        record: record.record().name(),
        slot: Arc::clone(&field.slot),
        key: parsed.name.clone(),
        parser_name: parser_name.to_string(),
        parser: Arc::clone(parser),
        setter: Arc::clone(handler.setter()),
        fallback,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TagError;
    use crate::fixtures::test::*;
    use crate::lookup::Vars;

    fn compile_err<R: Record>() -> CompileError {
        compile::<R>(&Registry::default()).unwrap_err()
    }

    #[test]
    fn compiles_nested_record() {
        let parser = compile::<Nested>(&Registry::default()).unwrap();
        assert_eq!(parser.keys(), vec!["PARENT", "CHILD"]);

        let vars: Vars = [("PARENT", "foo"), ("CHILD", "bar")].into_iter().collect();
        let (config, outcome) = parser.parse(&vars);
        assert!(outcome.is_clean());
        assert_eq!(config.parent, "foo");
        assert_eq!(config.child.thing, "bar");
    }

    #[test]
    fn nested_diagnostics_are_reported_verbatim() {
        let parser = compile::<Nested>(&Registry::default()).unwrap();
        let vars: Vars = [("PARENT", "foo")].into_iter().collect();
        let (_, outcome) = parser.parse(&vars);
        assert_eq!(outcome.fatals.len(), 1);
        assert_eq!(outcome.fatals[0].field, "Thing");
        assert_eq!(outcome.fatals[0].key, "CHILD");
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = compile::<Server>(&Registry::default()).unwrap();
        let b = compile::<Server>(&Registry::default()).unwrap();
        assert_eq!(a.keys(), b.keys());

        let vars: Vars = [("PORT", "x"), ("TIMEOUT", "5")].into_iter().collect();
        assert_eq!(a.parse(&vars).1, b.parse(&vars).1);
    }

    #[test]
    fn unsupported_type_fails() {
        let err = compile_err::<Unsupported>();
        match err {
            CompileError::UnsupportedType { field, ty } => {
                assert_eq!(field, "Ratio");
                assert!(ty.contains("Ratio"));
            }
            other => panic!("Expected UnsupportedType, got: {other:?}"),
        }
    }

    #[test]
    fn tagged_nested_record_fails() {
        assert!(matches!(
            compile_err::<TaggedChild>(),
            CompileError::TaggedRecord { field, .. } if field == "Child"
        ));
    }

    #[test]
    fn nested_errors_carry_path() {
        let err = compile_err::<BrokenParent>();
        assert_eq!(err.field_path(), "Inner.Value");
        assert!(matches!(err.root(), CompileError::MissingParser { .. }));
    }

    #[test]
    fn missing_parser_lists_choices() {
        match compile_err::<NoParser>() {
            CompileError::MissingParser { field, valid, .. } => {
                assert_eq!(field, "Value");
                assert!(valid.contains(&"nonempty-string".to_string()));
                assert!(valid.contains(&"possibly-empty-string".to_string()));
            }
            other => panic!("Expected MissingParser, got: {other:?}"),
        }
    }

    #[test]
    fn unknown_parser_fails_in_tag() {
        match compile_err::<UnknownParser>() {
            CompileError::Tag {
                field,
                source: TagError::Option { key, reason },
            } => {
                assert_eq!(field, "Value");
                assert_eq!(key, "parser");
                assert!(reason.contains("nonempty-string"));
            }
            other => panic!("Expected Tag error, got: {other:?}"),
        }
    }

    #[test]
    fn default_and_default_from_conflict() {
        assert!(matches!(
            compile_err::<BothDefaults>(),
            CompileError::DefaultConflict { field } if field == "Copy"
        ));
    }

    #[test]
    fn invalid_default_fails_eagerly() {
        match compile_err::<BadDefault>() {
            CompileError::InvalidDefault { field, value, .. } => {
                assert_eq!(field, "Port");
                assert_eq!(value, "eighty");
            }
            other => panic!("Expected InvalidDefault, got: {other:?}"),
        }
    }

    #[test]
    fn forward_default_from_fails() {
        match compile_err::<ForwardRef>() {
            CompileError::Tag {
                source: TagError::Option { key, reason },
                ..
            } => {
                assert_eq!(key, "defaultFrom");
                assert!(reason.contains("does not exist"));
            }
            other => panic!("Expected Tag error, got: {other:?}"),
        }
    }

    #[test]
    fn mistyped_default_from_fails() {
        match compile_err::<MistypedRef>() {
            CompileError::Tag {
                source: TagError::Option { key, reason },
                ..
            } => {
                assert_eq!(key, "defaultFrom");
                assert!(reason.contains("u16"));
            }
            other => panic!("Expected Tag error, got: {other:?}"),
        }
    }

    #[test]
    fn unnamed_field_needs_const() {
        assert!(matches!(
            compile_err::<Unnamed>(),
            CompileError::UnnamedField { field } if field == "Value"
        ));
    }

    #[test]
    fn named_constant_fails() {
        assert!(matches!(
            compile_err::<NamedConst>(),
            CompileError::NamedConstant { field } if field == "Value"
        ));
    }

    #[test]
    fn constant_field_uses_default_without_lookup() {
        let parser = compile::<Constant>(&Registry::default()).unwrap();
        assert!(parser.keys().is_empty());
        let vars: Vars = [("", "ignored")].into_iter().collect();
        let (config, outcome) = parser.parse(&vars);
        assert!(outcome.is_clean());
        assert_eq!(config.version, "v1");
    }

    #[test]
    fn duplicate_field_fails() {
        assert!(matches!(
            compile_err::<Duplicated>(),
            CompileError::DuplicateField { field } if field == "Value"
        ));
    }

    #[test]
    fn same_name_in_nested_level_is_fine() {
        assert!(compile::<Shadowed>(&Registry::default()).is_ok());
    }

    #[test]
    fn malformed_tag_fails() {
        assert!(matches!(
            compile_err::<Malformed>(),
            CompileError::Tag {
                source: TagError::NotKeyValue(_),
                ..
            }
        ));
    }

    #[test]
    fn record_must_describe_itself() {
        assert!(matches!(
            compile_err::<Impostor>(),
            CompileError::WrongRecord { .. }
        ));
    }

    #[test]
    fn registry_handler_beats_nested_record() {
        let registry = Registry::default().with(
            TypeHandler::of::<Child>()
                .parser("whole", |s: &str| {
                    Ok::<_, crate::handler::BoxError>(Child {
                        thing: s.to_uppercase(),
                    })
                })
                .build(),
        );
        let parser = compile::<AsLeaf>(&registry).unwrap();
        let vars: Vars = [("CHILD", "bar")].into_iter().collect();
        let (config, outcome) = parser.parse(&vars);
        assert!(outcome.is_clean());
        assert_eq!(config.child.thing, "BAR");
    }

    #[test]
    fn erased_parser_checks_instance_type() {
        let parser = compile_type(&RecordType::of::<WithDefault>(), &Registry::default()).unwrap();
        assert_eq!(parser.record(), FieldType::of::<WithDefault>());
        assert_eq!(parser.keys(), vec!["VALUE"]);

        let mut config = WithDefault::default();
        let outcome = parser.try_run(&mut config, &Vars::new()).unwrap();
        assert!(outcome.is_clean());
        assert_eq!(config.value, "str");

        let mut wrong = SingleString::default();
        assert!(matches!(
            parser.try_run(&mut wrong, &Vars::new()),
            Err(InternalDefect::WrongRecord { .. })
        ));
    }

    #[test]
    fn parser_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledParser<Server>>();
    }

    #[test]
    fn parser_runs_concurrently_on_distinct_instances() {
        let parser = compile::<Server>(&Registry::default()).unwrap();
        std::thread::scope(|scope| {
            for port in ["1000", "2000", "3000"] {
                let parser = &parser;
                scope.spawn(move || {
                    let vars: Vars = [("HOST", "h"), ("PORT", port)].into_iter().collect();
                    let (config, outcome) = parser.parse(&vars);
                    assert!(outcome.is_clean());
                    assert_eq!(config.port.to_string(), port);
                });
            }
        });
    }
}
