//! Built-in generator factories

use super::descriptor::{
    tuple_base, TypeDesc, ARRAY, BOOL, CHAR, FLOAT, FUNCTION, INT, OPTION, STRING, UNIT, VEC,
};
use super::registry::{Registry, Resolved};
use crate::arbitrary::{boolean, character, float, integer, option, string, unit, vec_of};
use crate::cogen::{function_with, CoArbitrary};
use crate::dynamic::{Dynamic, Value};
use crate::error::InvokeError;
use crate::generator::{sequence, Generator};
use std::rc::Rc;

/// Tag every value of `generator` with the descriptor `ty`.
fn tagged<T, F>(ty: &TypeDesc, generator: Generator<T>, wrap: F) -> Generator<Dynamic>
where
    T: 'static,
    F: Fn(T) -> Value + 'static,
{
    let ty = ty.clone();
    generator.map(move |value| Dynamic::new(ty.clone(), wrap(value)))
}

fn argument_generators(args: &[Resolved]) -> Vec<Generator<Dynamic>> {
    args.iter().map(|arg| arg.generator.clone()).collect()
}

pub(crate) fn install(registry: &mut Registry) {
    registry.register_fn(UNIT, 0, |ty, _| tagged(ty, unit(), |_| Value::Unit));
    registry.register_fn(BOOL, 0, |ty, _| tagged(ty, boolean(), Value::Bool));
    registry.register_fn(INT, 0, |ty, _| tagged(ty, integer(), Value::Int));
    registry.register_fn(FLOAT, 0, |ty, _| tagged(ty, float(), Value::Float));
    registry.register_fn(CHAR, 0, |ty, _| tagged(ty, character(), Value::Char));
    registry.register_fn(STRING, 0, |ty, _| tagged(ty, string(), Value::Str));

    registry.register_fn(OPTION, 1, |ty, args| {
        tagged(ty, option(args[0].generator.clone()), |inner| {
            Value::Option(inner.map(Box::new))
        })
    });
    registry.register_fn(VEC, 1, |ty, args| {
        tagged(ty, vec_of(args[0].generator.clone()), Value::List)
    });
    registry.register_fn(ARRAY, 1, |ty, args| {
        tagged(ty, vec_of(args[0].generator.clone()), Value::List)
    });

    for arity in 2..=4 {
        registry.register_fn(tuple_base(arity), arity, |ty, args| {
            tagged(ty, sequence(argument_generators(args)), Value::Tuple)
        });
    }

    registry.register_fn(FUNCTION, 2, |ty, args| {
        let domain = args[0].ty.clone();
        let functions = function_with(
            |argument: &Dynamic, source| argument.perturb(source),
            args[1].generator.clone(),
        );
        tagged(ty, functions, move |f| {
            let domain = domain.clone();
            Value::Function(Rc::new(move |argument: &Dynamic| {
                if argument.ty() != &domain {
                    return Err(InvokeError::TypeMismatch {
                        expected: domain.to_string(),
                        found: argument.ty().to_string(),
                    });
                }
                Ok(f.call(argument))
            }))
        })
    });
}
