//! Properties and per-sample results
//!
//! A [`Property`] is a generator of [`CaseResult`]s. Combinators here build
//! properties out of generators and predicates, attach classification stamps
//! and preconditions, and install the failure barrier in [`for_all`] that turns
//! a panicking predicate into a falsification instead of aborting the run.

use crate::dynamic::{Describe, Dynamic};
use crate::generator::{constant, Generator};
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// A generator of per-sample results.
pub type Property = Generator<CaseResult>;

/// A runtime failure captured while evaluating a property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Extract a message from a panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "panic with a non-string payload".to_string()
        };
        Self { message }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Pass/fail decision of one sample, possibly not yet evaluated.
#[derive(Clone)]
pub enum Verdict {
    Ready(bool),
    Deferred(Rc<dyn Fn() -> bool>),
}

impl Verdict {
    /// Evaluate the verdict. Forcing a deferred verdict runs user code and may
    /// panic.
    pub fn force(&self) -> bool {
        match self {
            Verdict::Ready(b) => *b,
            Verdict::Deferred(thunk) => thunk(),
        }
    }
}

impl fmt::Debug for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ready(b) => write!(f, "Ready({})", b),
            Verdict::Deferred(_) => write!(f, "Deferred"),
        }
    }
}

/// Outcome of evaluating a property on one sample.
#[derive(Debug, Clone)]
pub struct CaseResult {
    /// `None` means the sample was discarded.
    pub outcome: Option<Verdict>,
    /// Classification tags, innermost label last.
    pub stamps: Vec<String>,
    /// Generated arguments, outermost `for_all` first.
    pub arguments: Vec<Dynamic>,
    pub failure: Option<Failure>,
}

impl CaseResult {
    /// A result with neither arguments nor stamps.
    pub fn from_verdict(outcome: Option<Verdict>) -> Self {
        Self {
            outcome,
            stamps: Vec::new(),
            arguments: Vec::new(),
            failure: None,
        }
    }

    pub fn from_bool(b: bool) -> Self {
        Self::from_verdict(Some(Verdict::Ready(b)))
    }

    /// A sample excluded from pass/fail accounting.
    pub fn discard() -> Self {
        Self::from_verdict(None)
    }

    /// A definite failure carrying what went wrong.
    pub fn failed_with(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::from_bool(false)
        }
    }

    pub fn is_discard(&self) -> bool {
        self.outcome.is_none()
    }

    /// Replace a deferred verdict by its value.
    fn forced(mut self) -> Self {
        if let Some(Verdict::Deferred(thunk)) = &self.outcome {
            let value = thunk();
            self.outcome = Some(Verdict::Ready(value));
        }
        self
    }
}

/// Anything that can be checked as a property.
pub trait Testable {
    fn into_property(self) -> Property;
}

impl Testable for Property {
    fn into_property(self) -> Property {
        self
    }
}

impl Testable for bool {
    fn into_property(self) -> Property {
        prop(self)
    }
}

impl Testable for CaseResult {
    fn into_property(self) -> Property {
        result(self)
    }
}

/// Lift a plain result into a constant property.
pub fn result(r: CaseResult) -> Property {
    constant(r)
}

/// A property that holds exactly when `b` does.
pub fn prop(b: bool) -> Property {
    result(CaseResult::from_bool(b))
}

/// A property whose check runs only when the verdict is forced, i.e. inside the
/// failure barrier of an enclosing [`for_all`].
pub fn propl<F>(check: F) -> Property
where
    F: Fn() -> bool + 'static,
{
    result(CaseResult::from_verdict(Some(Verdict::Deferred(Rc::new(check)))))
}

/// Run `evaluate` and force its verdict, converting any panic into a failed
/// result.
fn guarded<F>(evaluate: F) -> CaseResult
where
    F: FnOnce() -> CaseResult,
{
    match catch_unwind(AssertUnwindSafe(|| evaluate().forced())) {
        Ok(r) => r,
        Err(payload) => {
            let failure = Failure::from_panic(payload);
            log::debug!("property panicked: {}", failure);
            CaseResult::failed_with(failure)
        }
    }
}

/// Universal quantification: draw a value from `generator`, check `body`
/// against it, and record the value as an argument of the result.
///
/// Panics raised by `body`, by the property it returns or by forcing a
/// deferred verdict are caught here and reported as a falsification.
pub fn for_all<T, P, F>(generator: Generator<T>, body: F) -> Property
where
    T: Describe + 'static,
    P: Testable,
    F: Fn(T) -> P + 'static,
{
    Generator::new(move |size, source| {
        let (now, later) = source.split();
        let value = generator.generate(size, now);
        let shown = value.to_dynamic();
        let mut r = guarded(|| body(value).into_property().generate(size, later));
        r.arguments.insert(0, shown);
        r
    })
}

/// Precondition: when `condition` is false the sample is discarded.
pub fn implies<P: Testable>(condition: bool, property: P) -> Property {
    if condition {
        property.into_property()
    } else {
        result(CaseResult::discard())
    }
}

/// Attach a classification stamp.
pub fn label<P: Testable>(text: impl Into<String>, property: P) -> Property {
    let text = text.into();
    property.into_property().map(move |mut r| {
        r.stamps.insert(0, text.clone());
        r
    })
}

/// Stamp with `name` when `condition` holds.
pub fn classify<P: Testable>(condition: bool, name: impl Into<String>, property: P) -> Property {
    if condition {
        label(name, property)
    } else {
        property.into_property()
    }
}

/// Stamp trivial cases as `"trivial"`.
pub fn trivial<P: Testable>(condition: bool, property: P) -> Property {
    classify(condition, "trivial", property)
}

/// Stamp with the debug form of `value`.
pub fn collect<V: fmt::Debug, P: Testable>(value: V, property: P) -> Property {
    label(format!("{:?}", value), property)
}
