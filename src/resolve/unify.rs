//! One-way structural matching of declared types against resolved ones

use super::descriptor::TypeDesc;
use super::resolver::Bindings;

/// Record what each free parameter in `pattern` corresponds to in `concrete`.
///
/// Array element types are matched first, then generic arguments pairwise by
/// position. The first binding for a parameter wins; later observations that
/// disagree with it are ignored, as are shape mismatches.
pub fn unify(pattern: &TypeDesc, concrete: &TypeDesc, bindings: &mut Bindings) {
    match (pattern, concrete) {
        (TypeDesc::Param(id), _) => match bindings.get(id) {
            None => {
                bindings.insert(id.clone(), concrete.clone());
            }
            Some(existing) if existing != concrete => {
                log::trace!("keeping {} = {}, ignoring {}", id, existing, concrete);
            }
            Some(_) => {}
        },
        (TypeDesc::Array(element), TypeDesc::Array(observed)) => unify(element, observed, bindings),
        (TypeDesc::Named { args, .. }, TypeDesc::Named { args: observed, .. }) => {
            for (arg, seen) in args.iter().zip(observed) {
                unify(arg, seen, bindings);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::ParamId;

    fn id(name: &str) -> ParamId {
        ParamId(name.to_string())
    }

    #[test]
    fn test_binds_nested_params() {
        let mut bindings = Bindings::new();
        let pair = TypeDesc::tuple(vec![TypeDesc::param("A"), TypeDesc::param("B")]);
        let pattern = TypeDesc::vec(pair);
        let concrete = TypeDesc::vec(TypeDesc::tuple(vec![TypeDesc::int(), TypeDesc::string()]));
        unify(&pattern, &concrete, &mut bindings);
        assert_eq!(bindings.get(&id("A")), Some(&TypeDesc::int()));
        assert_eq!(bindings.get(&id("B")), Some(&TypeDesc::string()));
    }

    #[test]
    fn test_first_binding_wins() {
        let mut bindings = Bindings::new();
        let pattern = TypeDesc::tuple(vec![TypeDesc::param("A"), TypeDesc::param("A")]);
        let concrete = TypeDesc::tuple(vec![TypeDesc::int(), TypeDesc::string()]);
        unify(&pattern, &concrete, &mut bindings);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get(&id("A")), Some(&TypeDesc::int()));
    }

    #[test]
    fn test_existing_binding_is_kept() {
        let mut bindings = Bindings::new();
        bindings.insert(id("T"), TypeDesc::bool());
        unify(&TypeDesc::param("T"), &TypeDesc::char(), &mut bindings);
        assert_eq!(bindings.get(&id("T")), Some(&TypeDesc::bool()));
    }

    #[test]
    fn test_arrays_match_element_types() {
        let mut bindings = Bindings::new();
        unify(
            &TypeDesc::array(TypeDesc::param("E")),
            &TypeDesc::array(TypeDesc::float()),
            &mut bindings,
        );
        assert_eq!(bindings.get(&id("E")), Some(&TypeDesc::float()));
    }

    #[test]
    fn test_shape_mismatch_binds_nothing() {
        let mut bindings = Bindings::new();
        unify(
            &TypeDesc::array(TypeDesc::param("E")),
            &TypeDesc::vec(TypeDesc::float()),
            &mut bindings,
        );
        assert!(bindings.is_empty());
    }
}
