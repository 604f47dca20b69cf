//! Co-generators and generated functions
//!
//! A co-generator perturbs a random source by the value of an argument. Running
//! a result generator on the perturbed source gives a function whose output
//! depends only on its input: the same argument always selects the same
//! perturbation, so generated functions are referentially transparent.

use crate::arbitrary::Arbitrary;
use crate::dynamic::{Describe, Dynamic, FromDynamic, Typed, Value};
use crate::generator::Generator;
use crate::random::RandomSource;
use crate::resolve::TypeDesc;
use std::fmt;
use std::rc::Rc;

/// Values that can perturb a random source.
pub trait CoArbitrary {
    fn perturb(&self, source: RandomSource) -> RandomSource;
}

/// Run `generator` on a source perturbed by `value`.
pub fn coarbitrary<A, T>(value: &A, generator: Generator<T>) -> Generator<T>
where
    A: CoArbitrary + Clone + 'static,
    T: 'static,
{
    let value = value.clone();
    Generator::new(move |size, source| generator.generate(size, value.perturb(source)))
}

/// A generated function.
pub struct Fun<A, B> {
    run: Rc<dyn Fn(&A) -> B>,
}

impl<A, B> Fun<A, B> {
    pub fn new<F: Fn(&A) -> B + 'static>(f: F) -> Self {
        Self { run: Rc::new(f) }
    }

    pub fn call(&self, argument: &A) -> B {
        (self.run)(argument)
    }
}

impl<A, B> Clone for Fun<A, B> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<A, B> fmt::Debug for Fun<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function>")
    }
}

/// Turn an argument-indexed family of generators into a generator of
/// functions. Every call of the produced function reuses the size and source
/// the function was generated with.
pub fn promote<A, B, F>(family: F) -> Generator<Fun<A, B>>
where
    A: 'static,
    B: 'static,
    F: Fn(&A) -> Generator<B> + 'static,
{
    let family = Rc::new(family);
    Generator::new(move |size, source| {
        let family = Rc::clone(&family);
        Fun::new(move |argument: &A| family(argument).generate(size, source))
    })
}

/// Generate functions using a caller-supplied co-generator.
///
/// Calling the produced function with `a` runs `result` on the generation
/// source perturbed by `cogen(a, source)`.
pub fn function_with<A, B, C>(cogen: C, result: Generator<B>) -> Generator<Fun<A, B>>
where
    A: 'static,
    B: 'static,
    C: Fn(&A, RandomSource) -> RandomSource + 'static,
{
    let cogen = Rc::new(cogen);
    Generator::new(move |size, source| {
        let cogen = Rc::clone(&cogen);
        let result = result.clone();
        Fun::new(move |argument: &A| result.generate(size, cogen(argument, source)))
    })
}

/// Generate functions using the argument type's [`CoArbitrary`] impl.
pub fn function<A, B>(result: Generator<B>) -> Generator<Fun<A, B>>
where
    A: CoArbitrary + 'static,
    B: 'static,
{
    function_with(|argument: &A, source| argument.perturb(source), result)
}

impl<A, B> Arbitrary for Fun<A, B>
where
    A: CoArbitrary + 'static,
    B: Arbitrary,
{
    fn arbitrary() -> Generator<Self> {
        function(B::arbitrary())
    }
}

impl<A: Typed, B: Typed> Typed for Fun<A, B> {
    fn descriptor() -> TypeDesc {
        TypeDesc::function(A::descriptor(), B::descriptor())
    }
}

impl<A, B> Describe for Fun<A, B>
where
    A: Typed + FromDynamic + 'static,
    B: Typed + Describe + 'static,
{
    fn to_dynamic(&self) -> Dynamic {
        let f = self.clone();
        Dynamic::new(
            Self::descriptor(),
            Value::Function(Rc::new(move |argument: &Dynamic| {
                let a = A::from_dynamic(argument)?;
                Ok(f.call(&a).to_dynamic())
            })),
        )
    }
}

fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

fn perturb_seq<'a, T, I>(items: I, source: RandomSource) -> RandomSource
where
    T: CoArbitrary + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut source = source;
    for item in items {
        source = item.perturb(source.variant(1));
    }
    source.variant(0)
}

impl CoArbitrary for () {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source
    }
}

impl CoArbitrary for bool {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source.variant(u64::from(*self))
    }
}

impl CoArbitrary for i64 {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source.variant(zigzag(*self))
    }
}

impl CoArbitrary for i32 {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source.variant(zigzag(i64::from(*self)))
    }
}

impl CoArbitrary for u64 {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source.variant(*self)
    }
}

impl CoArbitrary for usize {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source.variant(*self as u64)
    }
}

impl CoArbitrary for char {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source.variant(u64::from(u32::from(*self)))
    }
}

/// Perturbs by the bit pattern, so `0.0` and `-0.0` are different arguments.
impl CoArbitrary for f64 {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        source.variant(self.to_bits())
    }
}

impl CoArbitrary for String {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        let chars: Vec<char> = self.chars().collect();
        perturb_seq(&chars, source)
    }
}

impl<T: CoArbitrary> CoArbitrary for Vec<T> {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        perturb_seq(self, source)
    }
}

impl<T: CoArbitrary> CoArbitrary for Option<T> {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        match self {
            None => source.variant(0),
            Some(value) => value.perturb(source.variant(1)),
        }
    }
}

impl<A: CoArbitrary, B: CoArbitrary> CoArbitrary for (A, B) {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        self.1.perturb(self.0.perturb(source))
    }
}

impl<A: CoArbitrary, B: CoArbitrary, C: CoArbitrary> CoArbitrary for (A, B, C) {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        self.2.perturb(self.1.perturb(self.0.perturb(source)))
    }
}

/// Perturbs structurally; functions cannot be inspected and leave the source
/// unchanged, opaque values perturb by their display form.
impl CoArbitrary for Dynamic {
    fn perturb(&self, source: RandomSource) -> RandomSource {
        match self.value() {
            Value::Unit | Value::Function(_) => source,
            Value::Bool(b) => b.perturb(source),
            Value::Int(n) => n.perturb(source),
            Value::Float(x) => x.perturb(source),
            Value::Char(c) => c.perturb(source),
            Value::Str(s) => s.perturb(source),
            Value::Option(None) => source.variant(0),
            Value::Option(Some(inner)) => inner.perturb(source.variant(1)),
            Value::List(items) | Value::Tuple(items) => perturb_seq(items, source),
            Value::Opaque { shown, .. } => shown.perturb(source),
        }
    }
}
