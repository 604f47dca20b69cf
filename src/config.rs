//! Run configuration and the reporting sink
//!
//! A [`Config`] controls how long a run lasts and where its events go. Output
//! formatting belongs to whatever implements [`Sink`]; the crate only ships
//! [`LogSink`], which forwards events to the `log` facade, and [`NullSink`].

use crate::dynamic::Dynamic;
use crate::engine::TestResult;
use crate::random::{default_source, RandomSource};
use std::fmt;
use std::rc::Rc;

/// Default number of passing samples for a successful run.
pub const DEFAULT_MAX_TEST: usize = 100;

/// Default number of discarded samples before giving up.
pub const DEFAULT_MAX_FAIL: usize = 1000;

/// Size the default size step grows to and then stays at.
pub const DEFAULT_MAX_SIZE: f64 = 100.0;

/// Previous size to next size; applied once per sample.
pub type SizeStep = Rc<dyn Fn(f64) -> f64>;

/// Formats one generated sample from its index and arguments.
pub type SampleFormatter = Rc<dyn Fn(usize, &[Dynamic]) -> String>;

/// Receiver of run events.
pub trait Sink {
    /// Called once per generated sample, before its outcome is known.
    fn on_sample(
        &self,
        index: usize,
        arguments: &[Dynamic],
        formatter: &dyn Fn(usize, &[Dynamic]) -> String,
    );

    /// Called exactly once when a run halts.
    fn on_finished(&self, name: &str, result: &TestResult);
}

/// Forwards run events to the `log` facade.
///
/// Samples go out at `trace` level, successes at `info`, exhaustion and
/// falsification at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl Sink for LogSink {
    fn on_sample(
        &self,
        index: usize,
        arguments: &[Dynamic],
        formatter: &dyn Fn(usize, &[Dynamic]) -> String,
    ) {
        let line = formatter(index, arguments);
        if !line.is_empty() {
            log::trace!("{}", line);
        }
    }

    fn on_finished(&self, name: &str, result: &TestResult) {
        let data = result.data();
        match result {
            TestResult::Success(_) => {
                log::info!("{}: OK, passed {} tests", name, data.count);
                for (percentage, stamps) in &data.stamps {
                    log::info!("{}: {}% {}", name, percentage, stamps.join(", "));
                }
            }
            TestResult::Exhausted(_) => {
                log::warn!("{}: arguments exhausted after {} tests", name, data.count);
            }
            TestResult::Falsified(_, arguments, failure) => {
                let shown: Vec<String> = arguments.iter().map(ToString::to_string).collect();
                log::warn!(
                    "{}: falsifiable after {} tests: {}",
                    name,
                    data.count + 1,
                    shown.join(", ")
                );
                if let Some(failure) = failure {
                    log::warn!("{}: exception thrown: {}", name, failure);
                }
            }
        }
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Sink for NullSink {
    fn on_sample(
        &self,
        _index: usize,
        _arguments: &[Dynamic],
        _formatter: &dyn Fn(usize, &[Dynamic]) -> String,
    ) {
    }

    fn on_finished(&self, _name: &str, _result: &TestResult) {}
}

/// Configuration for one checking run.
#[derive(Clone)]
pub struct Config {
    /// Passed samples needed for success.
    pub max_test: usize,
    /// Discarded samples after which the run is exhausted.
    pub max_fail: usize,
    /// Label attached to the reported outcome.
    pub name: String,
    pub size_step: SizeStep,
    pub on_sample: SampleFormatter,
    pub sink: Rc<dyn Sink>,
    /// Fixed seed; `None` draws from the process default source.
    pub seed: Option<u64>,
}

impl Config {
    /// Quiet preset: samples are not formatted.
    pub fn quick() -> Self {
        Self {
            max_test: DEFAULT_MAX_TEST,
            max_fail: DEFAULT_MAX_FAIL,
            name: "property".to_string(),
            size_step: Rc::new(|size| (size + 1.0).min(DEFAULT_MAX_SIZE)),
            on_sample: Rc::new(|_, _| String::new()),
            sink: Rc::new(LogSink),
            seed: None,
        }
    }

    /// Verbose preset: every sample is formatted with its arguments.
    pub fn verbose() -> Self {
        Self {
            on_sample: Rc::new(|index, arguments| {
                let mut out = format!("{}:", index);
                for argument in arguments {
                    out.push('\n');
                    out.push_str(&argument.to_string());
                }
                out
            }),
            ..Self::quick()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_test(mut self, max_test: usize) -> Self {
        self.max_test = max_test;
        self
    }

    pub fn with_max_fail(mut self, max_fail: usize) -> Self {
        self.max_fail = max_fail;
        self
    }

    pub fn with_size_step<F: Fn(f64) -> f64 + 'static>(mut self, step: F) -> Self {
        self.size_step = Rc::new(step);
        self
    }

    pub fn with_on_sample<F>(mut self, formatter: F) -> Self
    where
        F: Fn(usize, &[Dynamic]) -> String + 'static,
    {
        self.on_sample = Rc::new(formatter);
        self
    }

    pub fn with_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sink = Rc::new(sink);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The source a run under this configuration starts from.
    pub fn source(&self) -> RandomSource {
        match self.seed {
            Some(seed) => RandomSource::from_seed(seed),
            None => default_source(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::quick()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("max_test", &self.max_test)
            .field("max_fail", &self.max_fail)
            .field("name", &self.name)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
