//! Type-directed generator synthesis
//!
//! [`resolve`] walks a descriptor and assembles a generator for it out of
//! registered factories. Free type parameters are instantiated with a randomly
//! chosen non-generic type; the choice is remembered in the
//! [`ResolutionContext`] so that every occurrence of the same parameter within
//! one resolution gets the same concrete type.

use super::descriptor::{ParamId, TypeDesc};
use super::registry::{Registry, Resolved};
use crate::error::{ResolutionError, ResolutionResult};
use crate::random::RandomSource;
use std::collections::BTreeMap;

/// Parameter identity to the concrete descriptor chosen for it.
pub type Bindings = BTreeMap<ParamId, TypeDesc>;

/// Per-resolution state: parameter bindings and the source used to choose
/// instantiations for unbound parameters.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    bindings: Bindings,
    source: RandomSource,
}

impl ResolutionContext {
    pub fn new(source: RandomSource) -> Self {
        Self {
            bindings: Bindings::new(),
            source,
        }
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut Bindings {
        &mut self.bindings
    }

    pub fn binding(&self, id: &ParamId) -> Option<&TypeDesc> {
        self.bindings.get(id)
    }

    fn choose_index(&mut self, len: usize) -> usize {
        let (now, later) = self.source.split();
        self.source = later;
        now.range(0, len as i64 - 1).0 as usize
    }
}

/// Build a generator for `ty` out of the factories in `registry`.
pub fn resolve(
    registry: &Registry,
    ty: &TypeDesc,
    ctx: &mut ResolutionContext,
) -> ResolutionResult<Resolved> {
    match ty {
        TypeDesc::Param(id) => resolve_param(registry, id, ctx),
        TypeDesc::Named { .. } | TypeDesc::Array(_) => resolve_applied(registry, ty, ctx),
    }
}

fn resolve_param(
    registry: &Registry,
    id: &ParamId,
    ctx: &mut ResolutionContext,
) -> ResolutionResult<Resolved> {
    if let Some(bound) = ctx.binding(id).cloned() {
        return resolve(registry, &bound, ctx);
    }

    let candidates = registry.non_generic();
    if candidates.is_empty() {
        return Err(ResolutionError::NoCandidates(id.to_string()));
    }
    let (base, _) = &candidates[ctx.choose_index(candidates.len())];
    let chosen = TypeDesc::Named {
        base: base.clone(),
        args: Vec::new(),
    };
    log::trace!("instantiating type parameter {} as {}", id, chosen);
    ctx.bindings.insert(id.clone(), chosen.clone());
    resolve(registry, &chosen, ctx)
}

fn resolve_applied(
    registry: &Registry,
    ty: &TypeDesc,
    ctx: &mut ResolutionContext,
) -> ResolutionResult<Resolved> {
    let base = ty
        .base()
        .ok_or_else(|| ResolutionError::NoFactory(ty.to_string()))?;
    let factory = registry
        .get(&base)
        .ok_or_else(|| ResolutionError::NoFactory(base.to_string()))?;

    let declared = ty.args();
    if factory.arity() != declared.len() {
        return Err(ResolutionError::Arity {
            base: base.to_string(),
            expected: factory.arity(),
            found: declared.len(),
        });
    }

    let mut resolved = Vec::with_capacity(declared.len());
    for arg in declared {
        resolved.push(resolve(registry, arg, ctx)?);
    }
    let concrete = ty.with_args(resolved.iter().map(|r| r.ty.clone()).collect());
    let generator = factory.instantiate(&concrete, &resolved);
    Ok(Resolved {
        ty: concrete,
        generator,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::Value;

    fn ctx(seed: u64) -> ResolutionContext {
        ResolutionContext::new(RandomSource::from_seed(seed))
    }

    fn sample(resolved: &Resolved, seed: u64) -> crate::dynamic::Dynamic {
        resolved.generator.generate(8, RandomSource::from_seed(seed))
    }

    #[test]
    fn test_resolve_concrete_nested_type() {
        let registry = Registry::with_builtins();
        let ty = TypeDesc::vec(TypeDesc::option(TypeDesc::int()));
        let resolved = resolve(&registry, &ty, &mut ctx(1)).unwrap();
        assert_eq!(resolved.ty, ty);
        for seed in 0..20 {
            let value = sample(&resolved, seed);
            assert_eq!(value.ty(), &ty);
            for item in value.as_slice().unwrap() {
                assert!(matches!(item.value(), Value::Option(_)));
            }
        }
    }

    #[test]
    fn test_unbound_param_is_instantiated_once() {
        let registry = Registry::with_builtins();
        let ty = TypeDesc::tuple(vec![TypeDesc::param("T"), TypeDesc::vec(TypeDesc::param("T"))]);
        let mut context = ctx(2);
        let resolved = resolve(&registry, &ty, &mut context).unwrap();
        let chosen = context.binding(&ParamId("T".into())).unwrap().clone();
        assert!(!chosen.is_generic());
        assert_eq!(resolved.ty, TypeDesc::tuple(vec![chosen.clone(), TypeDesc::vec(chosen)]));
    }

    #[test]
    fn test_distinct_params_keep_distinct_bindings() {
        let registry = Registry::with_builtins();
        let mut context = ctx(3);
        context.bindings_mut().insert(ParamId("A".into()), TypeDesc::int());
        context.bindings_mut().insert(ParamId("B".into()), TypeDesc::string());
        let ty = TypeDesc::tuple(vec![TypeDesc::param("A"), TypeDesc::param("B")]);
        let resolved = resolve(&registry, &ty, &mut context).unwrap();
        assert_eq!(resolved.ty, TypeDesc::tuple(vec![TypeDesc::int(), TypeDesc::string()]));
        assert_eq!(context.bindings().len(), 2);
    }

    #[test]
    fn test_choice_is_reproducible_per_source() {
        let registry = Registry::with_builtins();
        let ty = TypeDesc::param("T");
        let first = resolve(&registry, &ty, &mut ctx(4)).unwrap().ty;
        let again = resolve(&registry, &ty, &mut ctx(4)).unwrap().ty;
        assert_eq!(first, again);
    }

    #[test]
    fn test_every_non_generic_type_gets_picked() {
        let registry = Registry::with_builtins();
        let mut seen = std::collections::BTreeSet::new();
        for seed in 0..200 {
            let resolved = resolve(&registry, &TypeDesc::param("T"), &mut ctx(seed)).unwrap();
            seen.insert(resolved.ty.to_string());
        }
        assert_eq!(seen.len(), registry.non_generic().len());
    }

    #[test]
    fn test_missing_factory_is_an_error() {
        let registry = Registry::with_builtins();
        let ty = TypeDesc::vec(TypeDesc::named("Widget", Vec::new()));
        let err = resolve(&registry, &ty, &mut ctx(5)).unwrap_err();
        assert_eq!(err, ResolutionError::NoFactory("Widget".into()));
    }

    #[test]
    fn test_arity_mismatch_is_an_error() {
        let registry = Registry::with_builtins();
        let ty = TypeDesc::named("Option", vec![TypeDesc::int(), TypeDesc::int()]);
        assert!(matches!(
            resolve(&registry, &ty, &mut ctx(6)),
            Err(ResolutionError::Arity { expected: 1, found: 2, .. })
        ));
    }

    #[test]
    fn test_param_without_candidates() {
        let registry = Registry::new();
        assert_eq!(
            resolve(&registry, &TypeDesc::param("T"), &mut ctx(7)).unwrap_err(),
            ResolutionError::NoCandidates("T".into())
        );
    }

    #[test]
    fn test_resolved_functions_are_callable() {
        let registry = Registry::with_builtins();
        let ty = TypeDesc::function(TypeDesc::int(), TypeDesc::bool());
        let resolved = resolve(&registry, &ty, &mut ctx(8)).unwrap();
        let f = sample(&resolved, 1);
        let arg = crate::dynamic::Dynamic::new(TypeDesc::int(), Value::Int(4));
        assert_eq!(f.apply(&arg).unwrap(), f.apply(&arg).unwrap());
        let wrong = crate::dynamic::Dynamic::new(TypeDesc::bool(), Value::Bool(true));
        assert!(f.apply(&wrong).is_err());
    }

    #[test]
    fn test_arrays_resolve_through_array_factory() {
        let registry = Registry::with_builtins();
        let ty = TypeDesc::array(TypeDesc::char());
        let resolved = resolve(&registry, &ty, &mut ctx(9)).unwrap();
        assert_eq!(sample(&resolved, 2).ty(), &ty);
    }
}
