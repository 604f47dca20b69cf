//! Generator combinator algebra
//!
//! A [`Generator<T>`] is a pure function of a size and a [`RandomSource`].
//! Generators hold no mutable state: they are assembled once and then sampled
//! as many times as needed, each time with a fresh source.
//!
//! Sequencing always splits the source before running the two halves of a
//! computation, so the draws of a continuation never depend on the bits used
//! to produce the value it received.

use crate::random::RandomSource;
use std::fmt;
use std::rc::Rc;

/// A pure `(size, source) -> T` function.
pub struct Generator<T> {
    run: Rc<dyn Fn(usize, RandomSource) -> T>,
}

impl<T> Clone for Generator<T> {
    fn clone(&self) -> Self {
        Self {
            run: Rc::clone(&self.run),
        }
    }
}

impl<T> fmt::Debug for Generator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generator<{}>", std::any::type_name::<T>())
    }
}

impl<T: 'static> Generator<T> {
    /// Wrap a generation function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(usize, RandomSource) -> T + 'static,
    {
        Self { run: Rc::new(f) }
    }

    /// Produce a value at the given size from the given source.
    pub fn generate(&self, size: usize, source: RandomSource) -> T {
        (self.run)(size, source)
    }

    /// Transform every produced value.
    pub fn map<U, F>(self, f: F) -> Generator<U>
    where
        U: 'static,
        F: Fn(T) -> U + 'static,
    {
        Generator::new(move |size, source| f(self.generate(size, source)))
    }

    /// Monadic sequencing.
    ///
    /// The source is split first: the left half draws the value, the right half
    /// runs the continuation's generator. Both run at the current size.
    pub fn bind<U, F>(self, f: F) -> Generator<U>
    where
        U: 'static,
        F: Fn(T) -> Generator<U> + 'static,
    {
        Generator::new(move |size, source| {
            let (now, later) = source.split();
            let value = self.generate(size, now);
            f(value).generate(size, later)
        })
    }

    /// Run as if the current size were `size`.
    pub fn resize(self, size: usize) -> Generator<T> {
        Generator::new(move |_, source| self.generate(size, source))
    }

    /// Run with the current size transformed by `f`.
    pub fn scale<F>(self, f: F) -> Generator<T>
    where
        F: Fn(usize) -> usize + 'static,
    {
        Generator::new(move |size, source| self.generate(f(size), source))
    }
}

/// Build a generator from the current size.
pub fn sized<T, F>(f: F) -> Generator<T>
where
    T: 'static,
    F: Fn(usize) -> Generator<T> + 'static,
{
    Generator::new(move |size, source| f(size).generate(size, source))
}

/// Run `generator` as if the current size were `size`.
///
/// Recursive generators use this to force termination, e.g. by reaching an
/// absent case at size 0.
pub fn resize<T: 'static>(size: usize, generator: Generator<T>) -> Generator<T> {
    generator.resize(size)
}

/// Always produce `value`.
pub fn constant<T: Clone + 'static>(value: T) -> Generator<T> {
    Generator::new(move |_, _| value.clone())
}

/// An integer uniformly distributed in `[lo, hi]`.
///
/// # Panics
///
/// Panics immediately if `lo > hi`.
pub fn choose(lo: i64, hi: i64) -> Generator<i64> {
    assert!(lo <= hi, "choose: empty range [{}, {}]", lo, hi);
    Generator::new(move |_, source| source.range(lo, hi).0)
}

fn pick_index(len: usize, source: RandomSource) -> (usize, RandomSource) {
    let (index, rest) = source.range(0, len as i64 - 1);
    (index as usize, rest)
}

/// Pick one of `items` uniformly.
///
/// # Panics
///
/// Panics immediately if `items` is empty.
pub fn elements<T: Clone + 'static>(items: Vec<T>) -> Generator<T> {
    assert!(!items.is_empty(), "elements: empty list");
    Generator::new(move |_, source| items[pick_index(items.len(), source).0].clone())
}

/// Pick one of `generators` uniformly and run it.
///
/// # Panics
///
/// Panics immediately if `generators` is empty.
pub fn oneof<T: 'static>(generators: Vec<Generator<T>>) -> Generator<T> {
    assert!(!generators.is_empty(), "oneof: empty list");
    Generator::new(move |size, source| {
        let (now, later) = source.split();
        let (index, _) = pick_index(generators.len(), now);
        generators[index].generate(size, later)
    })
}

/// Weighted choice among generators.
///
/// Draws `n` in `[1, total]` and runs the first generator whose cumulative
/// weight is at least `n`.
///
/// # Panics
///
/// Panics immediately if the list is empty or any weight is zero. That is an
/// error in how the test was written, not a test outcome.
pub fn frequency<T: 'static>(weighted: Vec<(u32, Generator<T>)>) -> Generator<T> {
    assert!(!weighted.is_empty(), "frequency: empty list");
    if let Some(index) = weighted.iter().position(|(weight, _)| *weight == 0) {
        panic!("frequency: weight at position {} must be positive", index);
    }
    let total: u64 = weighted.iter().map(|(weight, _)| u64::from(*weight)).sum();
    Generator::new(move |size, source| {
        let (now, later) = source.split();
        let (n, _) = now.range(1, total as i64);
        let mut cumulative = 0i64;
        for (weight, generator) in &weighted {
            cumulative += i64::from(*weight);
            if cumulative >= n {
                return generator.generate(size, later);
            }
        }
        unreachable!("frequency: draw {} beyond total weight {}", n, total)
    })
}

/// Combine two generators with a function.
pub fn lift_gen2<A, B, R, F>(f: F, a: Generator<A>, b: Generator<B>) -> Generator<R>
where
    A: 'static,
    B: 'static,
    R: 'static,
    F: Fn(A, B) -> R + 'static,
{
    Generator::new(move |size, source| {
        let (first, rest) = source.split();
        let x = a.generate(size, first);
        f(x, b.generate(size, rest))
    })
}

/// Combine three generators with a function.
pub fn lift_gen3<A, B, C, R, F>(
    f: F,
    a: Generator<A>,
    b: Generator<B>,
    c: Generator<C>,
) -> Generator<R>
where
    A: 'static,
    B: 'static,
    C: 'static,
    R: 'static,
    F: Fn(A, B, C) -> R + 'static,
{
    Generator::new(move |size, source| {
        let (first, rest) = source.split();
        let (second, third) = rest.split();
        let x = a.generate(size, first);
        let y = b.generate(size, second);
        f(x, y, c.generate(size, third))
    })
}

/// Combine four generators with a function.
pub fn lift_gen4<A, B, C, D, R, F>(
    f: F,
    a: Generator<A>,
    b: Generator<B>,
    c: Generator<C>,
    d: Generator<D>,
) -> Generator<R>
where
    A: 'static,
    B: 'static,
    C: 'static,
    D: 'static,
    R: 'static,
    F: Fn(A, B, C, D) -> R + 'static,
{
    Generator::new(move |size, source| {
        let (first, rest) = source.split();
        let (second, rest) = rest.split();
        let (third, fourth) = rest.split();
        let w = a.generate(size, first);
        let x = b.generate(size, second);
        let y = c.generate(size, third);
        f(w, x, y, d.generate(size, fourth))
    })
}

/// Pair up two generators.
pub fn zip<A: 'static, B: 'static>(a: Generator<A>, b: Generator<B>) -> Generator<(A, B)> {
    lift_gen2(|x, y| (x, y), a, b)
}

/// Triple up three generators.
pub fn zip3<A: 'static, B: 'static, C: 'static>(
    a: Generator<A>,
    b: Generator<B>,
    c: Generator<C>,
) -> Generator<(A, B, C)> {
    lift_gen3(|x, y, z| (x, y, z), a, b, c)
}

/// Run every generator in order and collect the results.
pub fn sequence<T: 'static>(generators: Vec<Generator<T>>) -> Generator<Vec<T>> {
    Generator::new(move |size, source| {
        let mut rest = source;
        let mut values = Vec::with_capacity(generators.len());
        for generator in &generators {
            let (now, later) = rest.split();
            values.push(generator.generate(size, now));
            rest = later;
        }
        values
    })
}

/// Exactly `len` values from `generator`.
pub fn vector<T: 'static>(len: usize, generator: Generator<T>) -> Generator<Vec<T>> {
    sequence(vec![generator; len])
}
