//! Batch checking of every property a type exposes
//!
//! Rust has no run-time reflection, so a type describes its checkable surface
//! through a [`TypeHandle`]: a list of [`Operation`]s, each with declared
//! parameter descriptors, a declared return descriptor and an invocation shim
//! over [`Dynamic`] arguments. [`check_type`] picks out the public operations
//! returning `bool` or `Property`, synthesises generators for their parameters
//! and runs each one as a property.

use super::descriptor::TypeDesc;
use super::registry::{global_registry, Registry};
use super::resolver::{resolve, ResolutionContext};
use super::unify::unify;
use crate::config::Config;
use crate::dynamic::{Dynamic, Value};
use crate::engine::{run_with_source, TestResult};
use crate::error::{InvokeError, ResolutionError, ResolutionResult};
use crate::generator::{sequence, Generator};
use crate::property::{for_all, propl, result, CaseResult, Failure, Property};
use crate::random::RandomSource;
use std::fmt;
use std::rc::Rc;

/// What an operation handed back.
pub enum Returned {
    Bool(bool),
    Property(Property),
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Returned::Bool(b) => write!(f, "Bool({})", b),
            Returned::Property(_) => write!(f, "Property"),
        }
    }
}

type Invoke = Rc<dyn Fn(&[Dynamic]) -> Result<Returned, InvokeError>>;

/// A callable member of a type, as seen by the batch checker.
#[derive(Clone)]
pub struct Operation {
    pub name: String,
    pub public: bool,
    /// Declared parameter types; may mention free parameters.
    pub params: Vec<TypeDesc>,
    pub returns: TypeDesc,
    invoke: Invoke,
}

impl Operation {
    /// A public operation. The shim receives one argument per declared
    /// parameter; the count is checked before it is called.
    pub fn new<F>(
        name: impl Into<String>,
        params: Vec<TypeDesc>,
        returns: TypeDesc,
        invoke: F,
    ) -> Self
    where
        F: Fn(&[Dynamic]) -> Result<Returned, InvokeError> + 'static,
    {
        Self {
            name: name.into(),
            public: true,
            params,
            returns,
            invoke: Rc::new(invoke),
        }
    }

    /// A public operation returning `bool`.
    pub fn predicate<F>(name: impl Into<String>, params: Vec<TypeDesc>, check: F) -> Self
    where
        F: Fn(&[Dynamic]) -> Result<bool, InvokeError> + 'static,
    {
        Self::new(name, params, TypeDesc::bool(), move |args| check(args).map(Returned::Bool))
    }

    /// A public operation returning a property.
    pub fn property<F>(name: impl Into<String>, params: Vec<TypeDesc>, build: F) -> Self
    where
        F: Fn(&[Dynamic]) -> Result<Property, InvokeError> + 'static,
    {
        Self::new(name, params, TypeDesc::property(), move |args| {
            build(args).map(Returned::Property)
        })
    }

    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Public and returning exactly `bool` or `Property`.
    pub fn is_checkable(&self) -> bool {
        self.public && (self.returns == TypeDesc::bool() || self.returns == TypeDesc::property())
    }

    pub fn invoke(&self, arguments: &[Dynamic]) -> Result<Returned, InvokeError> {
        if arguments.len() != self.params.len() {
            return Err(InvokeError::ArgumentCount {
                expected: self.params.len(),
                found: arguments.len(),
            });
        }
        (self.invoke)(arguments)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("public", &self.public)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// A type's name and the operations it exposes.
#[derive(Debug, Clone)]
pub struct TypeHandle {
    pub name: String,
    pub operations: Vec<Operation>,
}

impl TypeHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }
}

/// Types that can describe their own checkable surface.
pub trait Checkable {
    fn type_handle() -> TypeHandle;

    /// Run [`check_type`] on this type's handle.
    fn check_all(config: &Config) -> ResolutionResult<Vec<(String, TestResult)>> {
        check_type(&Self::type_handle(), config)
    }
}

/// Check every qualifying operation of `handle` against the process-scoped
/// registry.
pub fn check_type(
    handle: &TypeHandle,
    config: &Config,
) -> ResolutionResult<Vec<(String, TestResult)>> {
    check_type_with(&global_registry(), handle, config, config.source())
}

struct Plan {
    name: String,
    arguments: Generator<Dynamic>,
    operation: Operation,
    source: RandomSource,
}

/// Check every qualifying operation of `handle`, resolving parameter types in
/// `registry` and drawing all randomness from `source`.
///
/// All operations are resolved before the first run starts, so a resolution
/// error aborts the batch without any property having been run.
pub fn check_type_with(
    registry: &Registry,
    handle: &TypeHandle,
    config: &Config,
    source: RandomSource,
) -> ResolutionResult<Vec<(String, TestResult)>> {
    let mut plans = Vec::new();
    let mut source = source;

    for operation in &handle.operations {
        if !operation.is_checkable() {
            log::debug!(
                "{}: skipping {} (public: {}, returns {})",
                handle.name,
                operation.name,
                operation.public,
                operation.returns
            );
            continue;
        }

        let name = format!("{}.{}", handle.name, operation.name);
        let (this, rest) = source.split();
        source = rest;
        let (resolution, run) = this.split();

        let mut ctx = ResolutionContext::new(resolution);
        let mut types = Vec::with_capacity(operation.params.len());
        let mut generators = Vec::with_capacity(operation.params.len());
        for (index, param) in operation.params.iter().enumerate() {
            let resolved =
                resolve(registry, param, &mut ctx).map_err(|e| ResolutionError::Operation {
                    operation: name.clone(),
                    index,
                    source: Box::new(e),
                })?;
            unify(param, &resolved.ty, ctx.bindings_mut());
            types.push(resolved.ty);
            generators.push(resolved.generator);
        }

        let ty = TypeDesc::tuple(types);
        log::debug!("{}: arguments resolved as {}", name, ty);
        let arguments =
            sequence(generators).map(move |values| Dynamic::new(ty.clone(), Value::Tuple(values)));
        plans.push(Plan {
            name,
            arguments,
            operation: operation.clone(),
            source: run,
        });
    }

    let mut results = Vec::with_capacity(plans.len());
    for plan in plans {
        let property = shim(plan.arguments, plan.operation);
        let named = config.clone().with_name(plan.name.clone());
        let result = run_with_source(&named, plan.source, property);
        results.push((plan.name, result));
    }
    Ok(results)
}

/// Property that invokes `operation` on each generated argument tuple.
fn shim(arguments: Generator<Dynamic>, operation: Operation) -> Property {
    for_all(arguments, move |tuple: Dynamic| {
        match tuple.as_slice().and_then(|args| operation.invoke(args)) {
            Ok(Returned::Bool(b)) => propl(move || b),
            Ok(Returned::Property(p)) => p,
            Err(e) => result(CaseResult::failed_with(Failure::new(e.to_string()))),
        }
    })
}
