//! Built-in generators
//!
//! The free functions build generators for the basic types; the [`Arbitrary`]
//! trait picks the default generator for a Rust type.

use crate::generator::{choose, constant, lift_gen3, sized, vector, Generator};

/// Types with a default generator.
pub trait Arbitrary: Sized + 'static {
    fn arbitrary() -> Generator<Self>;
}

pub fn unit() -> Generator<()> {
    constant(())
}

/// `true` or `false` with equal probability.
pub fn boolean() -> Generator<bool> {
    choose(0, 1).map(|n| n == 1)
}

/// An integer in `[-size, size]`.
pub fn integer() -> Generator<i64> {
    sized(|size| {
        let bound = i64::try_from(size).unwrap_or(i64::MAX);
        choose(-bound, bound)
    })
}

/// A float built from three size-bounded integers as `a + b / (|c| + 1)`.
pub fn float() -> Generator<f64> {
    lift_gen3(
        |a: i64, b: i64, c: i64| a as f64 + b as f64 / (c.unsigned_abs() as f64 + 1.0),
        integer(),
        integer(),
        integer(),
    )
}

/// A printable ASCII character.
pub fn character() -> Generator<char> {
    choose(0x20, 0x7e).map(|code| char::from(code as u8))
}

/// A string of printable ASCII characters, as long as a list would be.
pub fn string() -> Generator<String> {
    vec_of(character()).map(|chars| chars.into_iter().collect())
}

/// Absent at size 0; otherwise present, with the inner value drawn at
/// `size - 1` so nested options terminate.
pub fn option<T: 'static>(inner: Generator<T>) -> Generator<Option<T>> {
    sized(move |size| {
        if size == 0 {
            Generator::new(|_, _| None)
        } else {
            inner.clone().resize(size - 1).map(Some)
        }
    })
}

/// A list whose length is uniform in `[0, size]`.
pub fn vec_of<T: 'static>(element: Generator<T>) -> Generator<Vec<T>> {
    sized(move |size| {
        let element = element.clone();
        let bound = i64::try_from(size).unwrap_or(i64::MAX);
        choose(0, bound).bind(move |len| vector(len as usize, element.clone()))
    })
}

impl Arbitrary for () {
    fn arbitrary() -> Generator<Self> {
        unit()
    }
}

impl Arbitrary for bool {
    fn arbitrary() -> Generator<Self> {
        boolean()
    }
}

impl Arbitrary for i64 {
    fn arbitrary() -> Generator<Self> {
        integer()
    }
}

impl Arbitrary for i32 {
    fn arbitrary() -> Generator<Self> {
        integer().map(|n| n.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
    }
}

impl Arbitrary for usize {
    fn arbitrary() -> Generator<Self> {
        integer().map(|n| n.unsigned_abs() as usize)
    }
}

impl Arbitrary for f64 {
    fn arbitrary() -> Generator<Self> {
        float()
    }
}

impl Arbitrary for char {
    fn arbitrary() -> Generator<Self> {
        character()
    }
}

impl Arbitrary for String {
    fn arbitrary() -> Generator<Self> {
        string()
    }
}

impl<T: Arbitrary> Arbitrary for Option<T> {
    fn arbitrary() -> Generator<Self> {
        option(T::arbitrary())
    }
}

impl<T: Arbitrary> Arbitrary for Vec<T> {
    fn arbitrary() -> Generator<Self> {
        vec_of(T::arbitrary())
    }
}

impl<A: Arbitrary, B: Arbitrary> Arbitrary for (A, B) {
    fn arbitrary() -> Generator<Self> {
        crate::generator::zip(A::arbitrary(), B::arbitrary())
    }
}

impl<A: Arbitrary, B: Arbitrary, C: Arbitrary> Arbitrary for (A, B, C) {
    fn arbitrary() -> Generator<Self> {
        crate::generator::zip3(A::arbitrary(), B::arbitrary(), C::arbitrary())
    }
}
