//! Generator factory registry
//!
//! Maps base type keys to factories that build a generator once they are handed
//! generators for their own type parameters. A process-scoped registry is
//! populated with the built-in factories on first use; user factories are added
//! through [`register`] before any checking starts.

use super::builtins;
use super::descriptor::{BaseKey, TypeDesc};
use crate::arbitrary::Arbitrary;
use crate::dynamic::{Describe, Dynamic, Typed};
use crate::generator::Generator;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A resolved type: its concrete descriptor and a generator for it.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub ty: TypeDesc,
    pub generator: Generator<Dynamic>,
}

/// Builds a generator for a base type from generators for its parameters.
pub trait GeneratorFactory: Send + Sync {
    /// Number of type parameters the base type takes.
    fn arity(&self) -> usize;

    /// Build the generator for `ty`, the concrete instantiation being
    /// produced. `args` holds one resolved argument per type parameter.
    fn instantiate(&self, ty: &TypeDesc, args: &[Resolved]) -> Generator<Dynamic>;
}

type BuildFn = dyn Fn(&TypeDesc, &[Resolved]) -> Generator<Dynamic> + Send + Sync;

/// A factory backed by a closure.
pub struct FnFactory {
    arity: usize,
    build: Box<BuildFn>,
}

impl FnFactory {
    pub fn new<F>(arity: usize, build: F) -> Self
    where
        F: Fn(&TypeDesc, &[Resolved]) -> Generator<Dynamic> + Send + Sync + 'static,
    {
        Self {
            arity,
            build: Box::new(build),
        }
    }
}

impl GeneratorFactory for FnFactory {
    fn arity(&self) -> usize {
        self.arity
    }

    fn instantiate(&self, ty: &TypeDesc, args: &[Resolved]) -> Generator<Dynamic> {
        (self.build)(ty, args)
    }
}

/// Base key to factory mapping.
///
/// Keys are kept ordered so that choosing among them with a given source is
/// reproducible.
#[derive(Clone, Default)]
pub struct Registry {
    factories: BTreeMap<BaseKey, Arc<dyn GeneratorFactory>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in factories.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::install(&mut registry);
        registry
    }

    /// Add or replace the factory for `base`.
    pub fn register<F>(&mut self, base: impl Into<String>, factory: F)
    where
        F: GeneratorFactory + 'static,
    {
        let base = BaseKey::new(base);
        log::debug!("registering factory for {} (arity {})", base, factory.arity());
        if self.factories.insert(base.clone(), Arc::new(factory)).is_some() {
            log::debug!("replaced existing factory for {}", base);
        }
    }

    /// Add a closure-backed factory.
    pub fn register_fn<F>(&mut self, base: impl Into<String>, arity: usize, build: F)
    where
        F: Fn(&TypeDesc, &[Resolved]) -> Generator<Dynamic> + Send + Sync + 'static,
    {
        self.register(base, FnFactory::new(arity, build));
    }

    /// Register a non-generic type through its [`Arbitrary`] generator, keyed by
    /// the base of its descriptor.
    pub fn register_arbitrary<T>(&mut self)
    where
        T: Arbitrary + Typed + Describe,
    {
        let ty = T::descriptor();
        let base = ty.base().unwrap_or_else(|| BaseKey::new(ty.to_string()));
        self.register_fn(base.0, 0, |_, _| T::arbitrary().map(|value| value.to_dynamic()));
    }

    pub fn get(&self, base: &BaseKey) -> Option<Arc<dyn GeneratorFactory>> {
        self.factories.get(base).cloned()
    }

    pub fn contains(&self, base: &str) -> bool {
        self.factories.contains_key(&BaseKey::new(base))
    }

    /// Factories that take no type parameters, in key order.
    pub fn non_generic(&self) -> Vec<(BaseKey, Arc<dyn GeneratorFactory>)> {
        self.factories
            .iter()
            .filter(|(_, factory)| factory.arity() == 0)
            .map(|(base, factory)| (base.clone(), Arc::clone(factory)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

static GLOBAL_REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| {
    let registry = Registry::with_builtins();
    log::debug!("initialised global registry with {} factories", registry.len());
    RwLock::new(registry)
});

/// Populate the process-scoped registry with the built-in factories.
///
/// Happens implicitly on first use; call it explicitly to keep the one-time
/// initialisation out of the first check.
pub fn initialize() {
    Lazy::force(&GLOBAL_REGISTRY);
}

/// Add a factory to the process-scoped registry.
///
/// Registration belongs to start-up. Checks work on a snapshot taken when they
/// begin, so a registration made while a check runs only affects later checks.
pub fn register<F>(base: impl Into<String>, factory: F)
where
    F: GeneratorFactory + 'static,
{
    GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(base, factory);
}

/// Add a closure-backed factory to the process-scoped registry.
pub fn register_fn<F>(base: impl Into<String>, arity: usize, build: F)
where
    F: Fn(&TypeDesc, &[Resolved]) -> Generator<Dynamic> + Send + Sync + 'static,
{
    register(base, FnFactory::new(arity, build));
}

/// Register a non-generic type with the process-scoped registry.
pub fn register_arbitrary<T>()
where
    T: Arbitrary + Typed + Describe,
{
    GLOBAL_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register_arbitrary::<T>();
}

/// A snapshot of the process-scoped registry.
pub fn global_registry() -> Registry {
    GLOBAL_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
