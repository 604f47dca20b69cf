//! # propcheck
//!
//! Randomized property-based testing.
//!
//! Properties are checked against many generated samples. All randomness flows
//! from a splittable, seedable [`RandomSource`], so every run is reproducible
//! from its seed. The crate is organised in layers:
//!
//! - [`random`]: the splittable random source.
//! - [`generator`], [`arbitrary`], [`cogen`]: size-aware generator combinators,
//!   default generators per type, and generated functions.
//! - [`property`]: per-sample results, quantification, preconditions and
//!   classification stamps.
//! - [`engine`], [`config`]: the lazy test stream, the run loop and its
//!   reporting sink.
//! - [`resolve`]: synthesis of generators from structural type descriptors,
//!   and batch checking of every property a type exposes.
//!
//! ```
//! use propcheck::{check, for_all, vec_of, integer, Config, NullSink};
//!
//! let config = Config::quick().with_seed(7).with_sink(NullSink);
//! let result = check(
//!     &config,
//!     for_all(vec_of(integer()), |xs: Vec<i64>| {
//!         let mut twice = xs.clone();
//!         twice.reverse();
//!         twice.reverse();
//!         twice == xs
//!     }),
//! );
//! assert!(result.is_success());
//! assert_eq!(result.data().count, 100);
//! ```

pub mod arbitrary;
pub mod cogen;
pub mod config;
pub mod dynamic;
pub mod engine;
pub mod error;
pub mod generator;
pub mod property;
pub mod random;
pub mod resolve;

// Re-export the everyday surface
pub use arbitrary::{boolean, character, float, integer, option, string, unit, vec_of, Arbitrary};
pub use cogen::{coarbitrary, function, function_with, promote, CoArbitrary, Fun};
pub use config::{Config, LogSink, NullSink, Sink};
pub use dynamic::{Describe, Dynamic, FromDynamic, Typed, Value};
pub use engine::{
    check, quick_check, run, run_with_source, verbose_check, TestData, TestResult, TestStep,
    TestSummary,
};
pub use error::{InvokeError, ResolutionError, ResolutionResult};
pub use generator::{
    choose, constant, elements, frequency, lift_gen2, lift_gen3, lift_gen4, oneof, resize, sequence,
    sized, vector, zip, zip3, Generator,
};
pub use property::{
    classify, collect, for_all, implies, label, prop, propl, result, trivial, CaseResult, Failure,
    Property, Testable, Verdict,
};
pub use random::RandomSource;
pub use resolve::{check_type, Checkable, Operation, Registry, TypeDesc, TypeHandle};
