//! Key/value sources a compiled parser reads from.
//!
//! The engine only ever asks "is `KEY` set, and to what?". Anything that can
//! answer implements [`Lookup`]: the process environment, a map, a fixed set
//! of synthetic pairs for tests, or a closure. Variable expansion, caching,
//! and precedence between sources are the lookup's business, not the engine's.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// A synchronous key lookup. `None` means "not found"; an empty string is found.
pub trait Lookup {
    fn lookup(&self, key: &str) -> Option<String>;
}

impl<L: Lookup + ?Sized> Lookup for &L {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

impl<L: Lookup + ?Sized> Lookup for Box<L> {
    fn lookup(&self, key: &str) -> Option<String> {
        (**self).lookup(key)
    }
}

impl<S: BuildHasher> Lookup for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl Lookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// The process environment. Variables that are not valid UTF-8 read as unset.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of variables.
///
/// Takes an iterator so tests can pass synthetic data instead of touching the
/// real environment; `Vars::from_iter(std::env::vars())` snapshots it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vars(BTreeMap<String, String>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable, replacing any earlier value.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Vars {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Lookup for Vars {
    fn lookup(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }
}

/// A lookup backed by a closure. See [`from_fn`].
#[derive(Clone, Copy)]
pub struct FromFn<F>(F);

/// Wrap a closure as a [`Lookup`].
///
/// ```ignore
/// let lookup = envfig::from_fn(|key| (key == "PORT").then(|| "8080".to_string()));
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    FromFn(f)
}

impl<F> Lookup for FromFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }
}
