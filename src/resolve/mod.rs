//! Type-directed generator resolution
//!
//! Given a structural [`TypeDesc`], the resolver assembles a generator from the
//! factories in a [`Registry`], choosing concrete instantiations for free type
//! parameters at random. [`check_type`] uses it to run every property a type
//! exposes without the caller writing any generators.

mod builtins;
mod check;
mod descriptor;
mod registry;
mod resolver;
mod unify;

pub use check::{check_type, check_type_with, Checkable, Operation, Returned, TypeHandle};
pub use descriptor::{
    tuple_base, BaseKey, ParamId, TypeDesc, ARRAY, BOOL, CHAR, FLOAT, FUNCTION, INT, OPTION,
    PROPERTY, STRING, UNIT, VEC,
};
pub use registry::{
    global_registry, initialize, register, register_arbitrary, register_fn, FnFactory,
    GeneratorFactory, Registry, Resolved,
};
pub use resolver::{resolve, Bindings, ResolutionContext};
pub use unify::unify;
