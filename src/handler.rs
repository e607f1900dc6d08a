//! Type handlers: the pluggable per-type parser sets.
//!
//! A [`TypeHandler`] owns every named parser for one field type plus the setter
//! that writes a parsed value into a slot. The compiler treats any field whose
//! type has a handler in the [`Registry`] as a leaf; adding a handler is how
//! callers support new field types without touching the engine.
//!
//! Handlers are type-erased so one registry can hold all of them. Parsers built
//! through [`TypeHandlerBuilder::parser`] can only return the handler's type;
//! parsers added with [`raw_parser`](TypeHandlerBuilder::raw_parser) are
//! checked at set time, and a wrong type is an
//! [`InternalDefect`](crate::InternalDefect).

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::SlotMismatch;
use crate::schema::FieldType;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raw string to typed value, boxed.
pub type RawParser = Arc<dyn Fn(&str) -> Result<Box<dyn Any>, BoxError> + Send + Sync>;

/// Writes a parsed value into a field slot.
pub type Setter = Arc<dyn Fn(&mut dyn Any, Box<dyn Any>) -> Result<(), SlotMismatch> + Send + Sync>;

/// Parsers and setter for one field type.
#[derive(Clone)]
pub struct TypeHandler {
    ty: FieldType,
    parsers: BTreeMap<String, RawParser>,
    setter: Setter,
}

impl TypeHandler {
    pub fn of<T: Any>() -> TypeHandlerBuilder<T> {
        TypeHandlerBuilder {
            parsers: BTreeMap::new(),
            setter: None,
            _type: PhantomData,
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.ty
    }

    /// Registered parser names, sorted.
    pub fn parser_names(&self) -> Vec<String> {
        self.parsers.keys().cloned().collect()
    }

    pub fn parser(&self, name: &str) -> Option<&RawParser> {
        self.parsers.get(name)
    }

    pub(crate) fn setter(&self) -> &Setter {
        &self.setter
    }
}

impl fmt::Debug for TypeHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeHandler")
            .field("ty", &self.ty)
            .field("parsers", &self.parser_names())
            .finish()
    }
}

/// Builds a [`TypeHandler`] for `T`.
pub struct TypeHandlerBuilder<T> {
    parsers: BTreeMap<String, RawParser>,
    setter: Option<Setter>,
    _type: PhantomData<fn() -> T>,
}

impl<T: Any> TypeHandlerBuilder<T> {
    /// Add a typed parser. A later parser with the same name replaces the earlier one.
    pub fn parser<F, E>(mut self, name: &str, parse: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let erased: RawParser = Arc::new(move |raw: &str| -> Result<Box<dyn Any>, BoxError> {
            parse(raw)
                .map(|value| Box::new(value) as Box<dyn Any>)
                .map_err(Into::into)
        });
        self.parsers.insert(name.to_string(), erased);
        self
    }

    /// Add an erased parser whose output type is only checked when the value is set.
    pub fn raw_parser<F>(mut self, name: &str, parse: F) -> Self
    where
        F: Fn(&str) -> Result<Box<dyn Any>, BoxError> + Send + Sync + 'static,
    {
        self.parsers.insert(name.to_string(), Arc::new(parse));
        self
    }

    /// Replace the default setter (plain assignment).
    pub fn setter<F>(mut self, set: F) -> Self
    where
        F: Fn(&mut T, T) + Send + Sync + 'static,
    {
        let setter: Setter = Arc::new(move |slot: &mut dyn Any, value: Box<dyn Any>| {
            let (slot, value) = downcast_pair::<T>(slot, value)?;
            set(slot, value);
            Ok(())
        });
        self.setter = Some(setter);
        self
    }

    pub fn build(self) -> TypeHandler {
        TypeHandler {
            ty: FieldType::of::<T>(),
            parsers: self.parsers,
            setter: self.setter.unwrap_or_else(assign::<T>),
        }
    }
}

fn assign<T: Any>() -> Setter {
    Arc::new(|slot: &mut dyn Any, value: Box<dyn Any>| {
        let (slot, value) = downcast_pair::<T>(slot, value)?;
        *slot = value;
        Ok(())
    })
}

fn downcast_pair<T: Any>(
    slot: &mut dyn Any,
    value: Box<dyn Any>,
) -> Result<(&mut T, T), SlotMismatch> {
    let mismatch = || SlotMismatch {
        expected: std::any::type_name::<T>(),
    };
    let slot = slot.downcast_mut::<T>().ok_or_else(mismatch)?;
    let value = value.downcast::<T>().map_err(|_| mismatch())?;
    Ok((slot, *value))
}

/// Type handlers keyed by field type.
///
/// [`Registry::new`] is empty; [`Registry::default`] is the convenience set
/// from [`defaults`](crate::defaults).
#[derive(Clone)]
pub struct Registry {
    handlers: HashMap<TypeId, TypeHandler>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Add a handler, returning the one it replaced for the same type.
    pub fn register(&mut self, handler: TypeHandler) -> Option<TypeHandler> {
        self.handlers.insert(handler.ty.id(), handler)
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, handler: TypeHandler) -> Self {
        self.register(handler);
        self
    }

    pub fn get(&self, ty: FieldType) -> Option<&TypeHandler> {
        self.handlers.get(&ty.id())
    }

    pub fn handles<T: Any>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        crate::defaults::registry()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.handlers.values().map(|h| h.ty.name()).collect();
        types.sort_unstable();
        f.debug_struct("Registry").field("types", &types).finish()
    }
}
