//! Structural type descriptors
//!
//! Rust erases generics at run time, so the resolution engine works on an
//! explicit descriptor tree instead: a type is a free parameter, a named base
//! applied to argument descriptors, or an array of some element type.

use std::fmt;

pub const UNIT: &str = "()";
pub const BOOL: &str = "bool";
pub const INT: &str = "int";
pub const FLOAT: &str = "float";
pub const CHAR: &str = "char";
pub const STRING: &str = "String";
pub const OPTION: &str = "Option";
pub const VEC: &str = "Vec";
pub const ARRAY: &str = "[]";
pub const FUNCTION: &str = "Fn";
pub const PROPERTY: &str = "Property";

/// Identity of a free type parameter, unique within one operation signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub String);

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type with its generic arguments stripped; the registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BaseKey(pub String);

impl BaseKey {
    pub fn new(name: impl Into<String>) -> Self {
        BaseKey(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural description of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// An unbound type parameter.
    Param(ParamId),
    /// A base type applied to zero or more arguments.
    Named { base: BaseKey, args: Vec<TypeDesc> },
    /// An array of elements.
    Array(Box<TypeDesc>),
}

impl TypeDesc {
    pub fn param(name: impl Into<String>) -> Self {
        TypeDesc::Param(ParamId(name.into()))
    }

    pub fn named(base: impl Into<String>, args: Vec<TypeDesc>) -> Self {
        TypeDesc::Named {
            base: BaseKey::new(base),
            args,
        }
    }

    pub fn unit() -> Self {
        Self::named(UNIT, Vec::new())
    }

    pub fn bool() -> Self {
        Self::named(BOOL, Vec::new())
    }

    pub fn int() -> Self {
        Self::named(INT, Vec::new())
    }

    pub fn float() -> Self {
        Self::named(FLOAT, Vec::new())
    }

    pub fn char() -> Self {
        Self::named(CHAR, Vec::new())
    }

    pub fn string() -> Self {
        Self::named(STRING, Vec::new())
    }

    pub fn property() -> Self {
        Self::named(PROPERTY, Vec::new())
    }

    pub fn option(inner: TypeDesc) -> Self {
        Self::named(OPTION, vec![inner])
    }

    pub fn vec(element: TypeDesc) -> Self {
        Self::named(VEC, vec![element])
    }

    pub fn array(element: TypeDesc) -> Self {
        TypeDesc::Array(Box::new(element))
    }

    pub fn function(argument: TypeDesc, result: TypeDesc) -> Self {
        Self::named(FUNCTION, vec![argument, result])
    }

    /// Tuples are keyed by arity: `Tuple2`, `Tuple3`, ...
    pub fn tuple(elements: Vec<TypeDesc>) -> Self {
        Self::named(tuple_base(elements.len()), elements)
    }

    /// The registry key: the generic base for generic types, the type itself
    /// for concrete ones. Free parameters have no base.
    pub fn base(&self) -> Option<BaseKey> {
        match self {
            TypeDesc::Param(_) => None,
            TypeDesc::Named { base, .. } => Some(base.clone()),
            TypeDesc::Array(_) => Some(BaseKey::new(ARRAY)),
        }
    }

    /// Type arguments, in declaration order.
    pub fn args(&self) -> Vec<&TypeDesc> {
        match self {
            TypeDesc::Param(_) => Vec::new(),
            TypeDesc::Named { args, .. } => args.iter().collect(),
            TypeDesc::Array(element) => vec![element.as_ref()],
        }
    }

    /// The same shape with its arguments replaced, in declaration order.
    pub fn with_args(&self, args: Vec<TypeDesc>) -> TypeDesc {
        match self {
            TypeDesc::Param(_) => self.clone(),
            TypeDesc::Named { base, .. } => TypeDesc::Named {
                base: base.clone(),
                args,
            },
            TypeDesc::Array(element) => {
                let element = args.into_iter().next().unwrap_or_else(|| element.as_ref().clone());
                TypeDesc::Array(Box::new(element))
            }
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.args().is_empty()
    }

    /// True when no free parameter occurs anywhere in the tree.
    pub fn is_ground(&self) -> bool {
        match self {
            TypeDesc::Param(_) => false,
            _ => self.args().into_iter().all(TypeDesc::is_ground),
        }
    }

    /// Free parameters in first-occurrence order, without duplicates.
    pub fn free_params(&self) -> Vec<ParamId> {
        let mut found = Vec::new();
        self.collect_params(&mut found);
        found
    }

    fn collect_params(&self, found: &mut Vec<ParamId>) {
        match self {
            TypeDesc::Param(id) => {
                if !found.contains(id) {
                    found.push(id.clone());
                }
            }
            _ => {
                for arg in self.args() {
                    arg.collect_params(found);
                }
            }
        }
    }
}

pub fn tuple_base(arity: usize) -> String {
    format!("Tuple{}", arity)
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Param(id) => write!(f, "{}", id),
            TypeDesc::Array(element) => write!(f, "[{}]", element),
            TypeDesc::Named { base, args } if args.is_empty() => write!(f, "{}", base),
            TypeDesc::Named { base, args } => {
                write!(f, "{}<", base)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TypeDesc::vec(TypeDesc::int()).to_string(), "Vec<int>");
        assert_eq!(TypeDesc::array(TypeDesc::param("T")).to_string(), "[T]");
        assert_eq!(
            TypeDesc::tuple(vec![TypeDesc::bool(), TypeDesc::string()]).to_string(),
            "Tuple2<bool, String>"
        );
    }

    #[test]
    fn test_base_strips_arguments() {
        let ty = TypeDesc::option(TypeDesc::vec(TypeDesc::char()));
        assert_eq!(ty.base(), Some(BaseKey::new(OPTION)));
        assert_eq!(TypeDesc::array(TypeDesc::int()).base(), Some(BaseKey::new(ARRAY)));
        assert_eq!(TypeDesc::param("T").base(), None);
        assert!(ty.is_generic());
        assert!(!TypeDesc::int().is_generic());
    }

    #[test]
    fn test_free_params_in_order() {
        let ty = TypeDesc::function(
            TypeDesc::param("B"),
            TypeDesc::tuple(vec![TypeDesc::param("A"), TypeDesc::param("B")]),
        );
        assert_eq!(ty.free_params(), vec![ParamId("B".into()), ParamId("A".into())]);
        assert!(!ty.is_ground());
        assert!(TypeDesc::vec(TypeDesc::int()).is_ground());
    }
}
