use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::compile::{CompiledParser, compile};
use crate::error::{CompileError, EnvfigError};
use crate::handler::{Registry, TypeHandler};
use crate::lookup::{self, Lookup, ProcessEnv, Vars};
use crate::outcome::{Diagnostic, Outcome};
use crate::schema::Record;

/// Entry point for loading a record from the environment.
pub struct Envfig;

impl Envfig {
    pub fn builder<R: Record>() -> EnvfigBuilder<R> {
        EnvfigBuilder::new()
    }

    /// Load `R` from the process environment with the default registry.
    ///
    /// Shorthand for `Envfig::builder::<R>().load()`.
    pub fn load<R: Record>() -> Result<Loaded<R>, EnvfigError> {
        Self::builder::<R>().load()
    }
}

/// Builder for compiling a record type and populating it in one go.
///
/// Two independent choices:
///
/// - **Types**: [`registry()`](Self::registry) replaces the handler set,
///   [`handler()`](Self::handler) adds or replaces one handler on top of it.
/// - **Source**: [`vars()`](Self::vars), [`lookup()`](Self::lookup), or
///   [`lookup_fn()`](Self::lookup_fn). The process environment when none is set.
pub struct EnvfigBuilder<R> {
    registry: Option<Registry>,
    handlers: Vec<TypeHandler>,
    lookup: Option<Box<dyn Lookup>>,
    log: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> EnvfigBuilder<R> {
    fn new() -> Self {
        Self {
            registry: None,
            handlers: Vec::new(),
            lookup: None,
            log: true,
            _record: PhantomData,
        }
    }

    /// Replace the handler set (default: [`Registry::default`]).
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add a handler on top of the registry, replacing any for the same type.
    pub fn handler(mut self, handler: TypeHandler) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Read from a fixed set of variables instead of the process environment.
    pub fn vars<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.lookup(pairs.into_iter().collect::<Vars>())
    }

    /// Read from any [`Lookup`].
    pub fn lookup(mut self, lookup: impl Lookup + 'static) -> Self {
        self.lookup = Some(Box::new(lookup));
        self
    }

    /// Read through a closure.
    pub fn lookup_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        self.lookup(lookup::from_fn(f))
    }

    /// Emit the outcome through `tracing` after loading (default: `true`).
    pub fn log(mut self, log: bool) -> Self {
        self.log = log;
        self
    }

    /// The effective registry: the chosen base plus any added handlers.
    fn effective_registry(&self) -> Registry {
        let mut registry = self.registry.clone().unwrap_or_default();
        for handler in &self.handlers {
            registry.register(handler.clone());
        }
        registry
    }

    /// Compile without loading, to keep the parser for later runs.
    pub fn compile(&self) -> Result<CompiledParser<R>, CompileError> {
        compile::<R>(&self.effective_registry())
    }

    /// Compile, then populate a fresh `R::default()`.
    ///
    /// Fatals do not make this fail. Check [`Loaded::outcome`] or use
    /// [`Loaded::into_result`].
    pub fn load(self) -> Result<Loaded<R>, EnvfigError> {
        let parser = self.compile()?;
        debug!(keys = ?parser.keys(), "loading record");

        let mut value = R::default();
        let outcome = match &self.lookup {
            Some(lookup) => parser.try_run(&mut value, lookup.as_ref())?,
            None => parser.try_run(&mut value, &ProcessEnv)?,
        };
        if self.log {
            outcome.log();
        }
        Ok(Loaded { value, outcome })
    }
}

impl<R> fmt::Debug for EnvfigBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvfigBuilder")
            .field("registry", &self.registry)
            .field("handlers", &self.handlers)
            .field("custom_lookup", &self.lookup.is_some())
            .field("log", &self.log)
            .finish()
    }
}

/// A populated record and what happened while populating it.
#[derive(Debug, Clone)]
pub struct Loaded<R> {
    pub value: R,
    pub outcome: Outcome,
}

impl<R> Loaded<R> {
    /// The record plus its warnings, or the outcome if anything was fatal.
    pub fn into_result(self) -> Result<(R, Vec<Diagnostic>), Outcome> {
        let value = self.value;
        self.outcome.into_result().map(|warnings| (value, warnings))
    }
}
