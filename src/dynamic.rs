//! Dynamically-typed generated values
//!
//! Argument lists are heterogeneous: one property may draw an integer, a list
//! of strings and a function. They are carried as [`Dynamic`] values, a tagged
//! union that keeps its own [`TypeDesc`] next to the value. The `Display` impl
//! is the display form used when a sample is reported.
//!
//! [`Typed`], [`Describe`] and [`FromDynamic`] connect ordinary Rust types to
//! this representation.

use crate::error::InvokeError;
use crate::resolve::TypeDesc;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// A callable dynamic value.
pub type DynFn = Rc<dyn Fn(&Dynamic) -> Result<Dynamic, InvokeError>>;

/// Equality on two opaque payloads of the same concrete type.
pub type OpaqueEq = Rc<dyn Fn(&dyn Any, &dyn Any) -> bool>;

/// Payload of a [`Dynamic`].
#[derive(Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    Option(Option<Box<Dynamic>>),
    /// Elements of a `Vec` or an array; the descriptor tells them apart.
    List(Vec<Dynamic>),
    Tuple(Vec<Dynamic>),
    Function(DynFn),
    /// A user value the engine only knows how to display and compare.
    Opaque {
        value: Rc<dyn Any>,
        shown: String,
        same: OpaqueEq,
    },
}

/// A value together with its type descriptor.
#[derive(Clone)]
pub struct Dynamic {
    ty: TypeDesc,
    value: Value,
}

impl Dynamic {
    pub fn new(ty: TypeDesc, value: Value) -> Self {
        Self { ty, value }
    }

    /// Wrap an arbitrary value, remembering its `Debug` form for reports and
    /// its `PartialEq` impl for comparisons.
    pub fn opaque<T: fmt::Debug + PartialEq + 'static>(ty: TypeDesc, value: T) -> Self {
        let shown = format!("{:?}", value);
        let same: OpaqueEq = Rc::new(|a: &dyn Any, b: &dyn Any| {
            match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        });
        Self::new(
            ty,
            Value::Opaque {
                value: Rc::new(value),
                shown,
                same,
            },
        )
    }

    pub fn ty(&self) -> &TypeDesc {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    fn mismatch(&self, expected: &str) -> InvokeError {
        InvokeError::TypeMismatch {
            expected: expected.to_string(),
            found: self.ty.to_string(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, InvokeError> {
        match self.value {
            Value::Bool(b) => Ok(b),
            _ => Err(self.mismatch("bool")),
        }
    }

    pub fn as_int(&self) -> Result<i64, InvokeError> {
        match self.value {
            Value::Int(n) => Ok(n),
            _ => Err(self.mismatch("int")),
        }
    }

    pub fn as_float(&self) -> Result<f64, InvokeError> {
        match self.value {
            Value::Float(x) => Ok(x),
            _ => Err(self.mismatch("float")),
        }
    }

    pub fn as_str(&self) -> Result<&str, InvokeError> {
        match &self.value {
            Value::Str(s) => Ok(s),
            _ => Err(self.mismatch("String")),
        }
    }

    /// Elements of a list, array or tuple.
    pub fn as_slice(&self) -> Result<&[Dynamic], InvokeError> {
        match &self.value {
            Value::List(items) | Value::Tuple(items) => Ok(items),
            _ => Err(self.mismatch("a sequence")),
        }
    }

    /// Borrow an opaque payload as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Result<&T, InvokeError> {
        match &self.value {
            Value::Opaque { value, .. } => value
                .downcast_ref::<T>()
                .ok_or_else(|| self.mismatch(std::any::type_name::<T>())),
            _ => Err(self.mismatch(std::any::type_name::<T>())),
        }
    }

    /// Call a function value.
    pub fn apply(&self, argument: &Dynamic) -> Result<Dynamic, InvokeError> {
        match &self.value {
            Value::Function(f) => f(argument),
            _ => Err(InvokeError::NotCallable(self.ty.to_string())),
        }
    }
}

fn write_seq(
    f: &mut fmt::Formatter<'_>,
    open: &str,
    items: &[Dynamic],
    close: &str,
) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Option(None) => write!(f, "None"),
            Value::Option(Some(inner)) => write!(f, "Some({})", inner),
            Value::List(items) => write_seq(f, "[", items, "]"),
            Value::Tuple(items) => write_seq(f, "(", items, ")"),
            Value::Function(_) => write!(f, "<function>"),
            Value::Opaque { shown, .. } => write!(f, "{}", shown),
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self, self.ty)
    }
}

/// Structural equality. Opaque payloads compare with their own `PartialEq`;
/// functions are never equal.
impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.value, &other.value) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Option(a), Value::Option(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Opaque { value: a, same, .. }, Value::Opaque { value: b, .. }) => {
                same(&**a, &**b)
            }
            _ => false,
        }
    }
}

/// Types with a static descriptor.
pub trait Typed {
    fn descriptor() -> TypeDesc;
}

/// Values that can be reported as a [`Dynamic`].
pub trait Describe {
    fn to_dynamic(&self) -> Dynamic;
}

/// Values that can be recovered from a [`Dynamic`].
pub trait FromDynamic: Sized {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError>;
}

impl Describe for Dynamic {
    fn to_dynamic(&self) -> Dynamic {
        self.clone()
    }
}

impl FromDynamic for Dynamic {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
        Ok(value.clone())
    }
}

macro_rules! scalar_dynamic {
    ($ty:ty, $desc:ident, $variant:ident, $expected:expr) => {
        impl Typed for $ty {
            fn descriptor() -> TypeDesc {
                TypeDesc::$desc()
            }
        }

        impl Describe for $ty {
            fn to_dynamic(&self) -> Dynamic {
                Dynamic::new(TypeDesc::$desc(), Value::$variant(self.clone()))
            }
        }

        impl FromDynamic for $ty {
            fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
                match &value.value {
                    Value::$variant(v) => Ok(v.clone()),
                    _ => Err(value.mismatch($expected)),
                }
            }
        }
    };
}

scalar_dynamic!(bool, bool, Bool, "bool");
scalar_dynamic!(i64, int, Int, "int");
scalar_dynamic!(f64, float, Float, "float");
scalar_dynamic!(char, char, Char, "char");
scalar_dynamic!(String, string, Str, "String");

impl Typed for () {
    fn descriptor() -> TypeDesc {
        TypeDesc::unit()
    }
}

impl Describe for () {
    fn to_dynamic(&self) -> Dynamic {
        Dynamic::new(TypeDesc::unit(), Value::Unit)
    }
}

impl FromDynamic for () {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
        match value.value {
            Value::Unit => Ok(()),
            _ => Err(value.mismatch("()")),
        }
    }
}

impl<T: Typed> Typed for Option<T> {
    fn descriptor() -> TypeDesc {
        TypeDesc::option(T::descriptor())
    }
}

impl<T: Typed + Describe> Describe for Option<T> {
    fn to_dynamic(&self) -> Dynamic {
        let inner = self.as_ref().map(|v| Box::new(v.to_dynamic()));
        Dynamic::new(Self::descriptor(), Value::Option(inner))
    }
}

impl<T: FromDynamic> FromDynamic for Option<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
        match &value.value {
            Value::Option(None) => Ok(None),
            Value::Option(Some(inner)) => T::from_dynamic(inner).map(Some),
            _ => Err(value.mismatch("Option")),
        }
    }
}

impl<T: Typed> Typed for Vec<T> {
    fn descriptor() -> TypeDesc {
        TypeDesc::vec(T::descriptor())
    }
}

impl<T: Typed + Describe> Describe for Vec<T> {
    fn to_dynamic(&self) -> Dynamic {
        let items = self.iter().map(Describe::to_dynamic).collect();
        Dynamic::new(Self::descriptor(), Value::List(items))
    }
}

/// Accepts both `Vec` and array descriptors.
impl<T: FromDynamic> FromDynamic for Vec<T> {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
        match &value.value {
            Value::List(items) => items.iter().map(T::from_dynamic).collect(),
            _ => Err(value.mismatch("Vec")),
        }
    }
}

impl<A: Typed, B: Typed> Typed for (A, B) {
    fn descriptor() -> TypeDesc {
        TypeDesc::tuple(vec![A::descriptor(), B::descriptor()])
    }
}

impl<A: Typed + Describe, B: Typed + Describe> Describe for (A, B) {
    fn to_dynamic(&self) -> Dynamic {
        let items = vec![self.0.to_dynamic(), self.1.to_dynamic()];
        Dynamic::new(Self::descriptor(), Value::Tuple(items))
    }
}

impl<A: FromDynamic, B: FromDynamic> FromDynamic for (A, B) {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
        match &value.value {
            Value::Tuple(items) if items.len() == 2 => {
                Ok((A::from_dynamic(&items[0])?, B::from_dynamic(&items[1])?))
            }
            _ => Err(value.mismatch("a pair")),
        }
    }
}

impl<A: Typed, B: Typed, C: Typed> Typed for (A, B, C) {
    fn descriptor() -> TypeDesc {
        TypeDesc::tuple(vec![A::descriptor(), B::descriptor(), C::descriptor()])
    }
}

impl<A, B, C> Describe for (A, B, C)
where
    A: Typed + Describe,
    B: Typed + Describe,
    C: Typed + Describe,
{
    fn to_dynamic(&self) -> Dynamic {
        let items = vec![self.0.to_dynamic(), self.1.to_dynamic(), self.2.to_dynamic()];
        Dynamic::new(Self::descriptor(), Value::Tuple(items))
    }
}

impl<A: FromDynamic, B: FromDynamic, C: FromDynamic> FromDynamic for (A, B, C) {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
        match &value.value {
            Value::Tuple(items) if items.len() == 3 => Ok((
                A::from_dynamic(&items[0])?,
                B::from_dynamic(&items[1])?,
                C::from_dynamic(&items[2])?,
            )),
            _ => Err(value.mismatch("a triple")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(42i64.to_dynamic().to_string(), "42");
        assert_eq!("hi".to_string().to_dynamic().to_string(), "\"hi\"");
        assert_eq!(vec![Some(1i64), None].to_dynamic().to_string(), "[Some(1), None]");
        assert_eq!((true, 'x').to_dynamic().to_string(), "(true, 'x')");
        assert_eq!(
            format!("{:?}", vec![1i64].to_dynamic()),
            "[1] : Vec<int>"
        );
    }

    #[test]
    fn test_round_trip_through_dynamic() {
        let original = (vec![1i64, -2, 3], Some("a".to_string()));
        let back = <(Vec<i64>, Option<String>)>::from_dynamic(&original.to_dynamic()).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let err = bool::from_dynamic(&7i64.to_dynamic()).unwrap_err();
        assert_eq!(
            err,
            InvokeError::TypeMismatch {
                expected: "bool".into(),
                found: "int".into()
            }
        );
    }

    #[test]
    fn test_opaque_values() {
        #[derive(Debug, PartialEq)]
        struct Point(i32, i32);

        let d = Dynamic::opaque(TypeDesc::named("Point", Vec::new()), Point(1, 2));
        assert_eq!(d.to_string(), "Point(1, 2)");
        assert_eq!(d.downcast_ref::<Point>().unwrap(), &Point(1, 2));
        assert!(d.downcast_ref::<String>().is_err());
    }

    #[test]
    fn test_opaque_values_compare_by_payload() {
        #[derive(Debug, PartialEq)]
        struct Point(i32, i32);

        let ty = TypeDesc::named("Point", Vec::new());
        let d = Dynamic::opaque(ty.clone(), Point(1, 2));
        assert_eq!(d, d.clone());
        assert_eq!(d, Dynamic::opaque(ty.clone(), Point(1, 2)));
        assert_ne!(d, Dynamic::opaque(ty.clone(), Point(2, 1)));
        // same descriptor, different payload type
        assert_ne!(d, Dynamic::opaque(ty, (1i32, 2i32)));
    }

    #[test]
    fn test_apply_requires_function() {
        let not_fn = 1i64.to_dynamic();
        assert_eq!(
            not_fn.apply(&not_fn).unwrap_err(),
            InvokeError::NotCallable("int".into())
        );
    }
}
