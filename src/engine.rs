//! Execution engine
//!
//! [`test`] turns a property into an unbounded, lazily realised stream of
//! [`TestStep`] events: for every sample a `Generated` step followed by exactly
//! one outcome step. [`run`] pulls from that stream until the first
//! falsification, until enough samples passed, or until too many were
//! discarded, whichever happens first. It then reports the outcome once through
//! the configured sink.

use crate::config::{Config, SizeStep};
use crate::dynamic::Dynamic;
use crate::property::{Failure, Property, Testable, Verdict};
use crate::random::RandomSource;
use serde::Serialize;
use std::collections::BTreeMap;

/// One event of the test stream.
#[derive(Debug, Clone)]
pub enum TestStep {
    /// A sample was drawn; its outcome follows as the next step.
    Generated(Vec<Dynamic>),
    Passed(Vec<String>),
    Falsified(Vec<Dynamic>, Option<Failure>),
    /// The sample was discarded.
    Failed,
}

/// Counters and stamp distribution of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestData {
    /// Passed samples.
    pub count: usize,
    /// Discarded samples.
    pub discarded: usize,
    /// `(percentage of passed samples, stamps)`, ascending by percentage.
    pub stamps: Vec<(usize, Vec<String>)>,
}

/// Final disposition of a run.
#[derive(Debug, Clone)]
pub enum TestResult {
    Success(TestData),
    Falsified(TestData, Vec<Dynamic>, Option<Failure>),
    Exhausted(TestData),
}

impl TestResult {
    pub fn data(&self) -> &TestData {
        match self {
            TestResult::Success(data) | TestResult::Exhausted(data) => data,
            TestResult::Falsified(data, _, _) => data,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestResult::Success(_))
    }

    pub fn is_falsified(&self) -> bool {
        matches!(self, TestResult::Falsified(..))
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, TestResult::Exhausted(_))
    }

    /// The falsifying arguments, if any.
    pub fn counterexample(&self) -> Option<&[Dynamic]> {
        match self {
            TestResult::Falsified(_, arguments, _) => Some(arguments),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            TestResult::Falsified(_, _, failure) => failure.as_ref(),
            _ => None,
        }
    }

    /// Machine-readable form of the outcome.
    pub fn summary(&self, name: &str) -> TestSummary {
        let status = match self {
            TestResult::Success(_) => Status::Success,
            TestResult::Falsified(..) => Status::Falsified,
            TestResult::Exhausted(_) => Status::Exhausted,
        };
        TestSummary {
            name: name.to_string(),
            status,
            data: self.data().clone(),
            arguments: self
                .counterexample()
                .map(|args| args.iter().map(ToString::to_string).collect())
                .unwrap_or_default(),
            failure: self.failure().cloned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Falsified,
    Exhausted,
}

/// Serialisable report of one run, for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSummary {
    pub name: String,
    pub status: Status,
    pub data: TestData,
    pub arguments: Vec<String>,
    pub failure: Option<Failure>,
}

/// Lazy stream of test steps. Never ends on its own.
pub struct TestSteps {
    size: f64,
    size_step: SizeStep,
    source: RandomSource,
    property: Property,
    pending: Option<TestStep>,
}

/// Start the test stream at `initial_size`.
///
/// For each sample the size advances through `size_step`, the source is split,
/// and one half generates the result at the new size while the other is kept
/// for the rest of the stream.
pub fn test(
    initial_size: f64,
    size_step: SizeStep,
    source: RandomSource,
    property: Property,
) -> TestSteps {
    TestSteps {
        size: initial_size,
        size_step,
        source,
        property,
        pending: None,
    }
}

impl Iterator for TestSteps {
    type Item = TestStep;

    fn next(&mut self) -> Option<TestStep> {
        if let Some(step) = self.pending.take() {
            return Some(step);
        }

        let next_size = (self.size_step)(self.size);
        let (now, later) = self.source.split();
        // `as` saturates: negative and NaN sizes become 0
        let r = self.property.generate(next_size as usize, now);
        self.size = next_size;
        self.source = later;

        let outcome = match r.outcome.as_ref().map(Verdict::force) {
            None => TestStep::Failed,
            Some(true) => TestStep::Passed(r.stamps),
            Some(false) => TestStep::Falsified(r.arguments.clone(), r.failure),
        };
        self.pending = Some(outcome);
        Some(TestStep::Generated(r.arguments))
    }
}

/// Group identical non-empty stamp lists into an ascending percentage table.
fn stamp_table(stamps: Vec<Vec<String>>, passed: usize) -> Vec<(usize, Vec<String>)> {
    let mut groups: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    for entry in stamps.into_iter().filter(|s| !s.is_empty()) {
        *groups.entry(entry).or_insert(0) += 1;
    }
    let mut table: Vec<(usize, Vec<String>)> = groups
        .into_iter()
        .map(|(entry, count)| (100 * count / passed, entry))
        .collect();
    table.sort_by_key(|(percentage, _)| *percentage);
    table
}

/// Check a property under `config`, starting from `source`.
pub fn run_with_source(config: &Config, source: RandomSource, property: Property) -> TestResult {
    log::debug!("{}: starting run from {:?} with {:?}", config.name, source, config);

    let mut passed = 0usize;
    let mut discarded = 0usize;
    let mut index = 0usize;
    let mut stamps = Vec::new();
    let mut steps = test(0.0, config.size_step.clone(), source, property);

    let falsified = loop {
        if passed >= config.max_test || discarded >= config.max_fail {
            break None;
        }
        match steps.next() {
            Some(TestStep::Generated(arguments)) => {
                config.sink.on_sample(index, &arguments, &*config.on_sample);
                index += 1;
            }
            Some(TestStep::Passed(s)) => {
                passed += 1;
                stamps.push(s);
            }
            Some(TestStep::Failed) => discarded += 1,
            Some(TestStep::Falsified(arguments, failure)) => break Some((arguments, failure)),
            None => break None,
        }
    };

    let data = TestData {
        count: passed,
        discarded,
        stamps: stamp_table(stamps, passed),
    };
    let result = match falsified {
        Some((arguments, failure)) => TestResult::Falsified(data, arguments, failure),
        None if passed >= config.max_test => TestResult::Success(data),
        None => TestResult::Exhausted(data),
    };

    log::debug!(
        "{}: finished after {} samples ({} passed, {} discarded)",
        config.name,
        index,
        passed,
        discarded
    );
    config.sink.on_finished(&config.name, &result);
    result
}

/// Check a property under `config`.
///
/// The run starts from the configured seed, or from a fresh split of the
/// process default source.
pub fn run(config: &Config, property: Property) -> TestResult {
    run_with_source(config, config.source(), property)
}

/// Check anything testable under `config`.
pub fn check<P: Testable>(config: &Config, testable: P) -> TestResult {
    run(config, testable.into_property())
}

/// Check with the quiet preset.
pub fn quick_check<P: Testable>(testable: P) -> TestResult {
    check(&Config::quick(), testable)
}

/// Check with the verbose preset.
pub fn verbose_check<P: Testable>(testable: P) -> TestResult {
    check(&Config::verbose(), testable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::integer;
    use crate::config::NullSink;
    use crate::generator::constant;
    use crate::property::{collect, for_all, implies, prop, propl};
    use std::rc::Rc;

    fn quiet(max_test: usize, max_fail: usize) -> Config {
        Config::quick()
            .with_sink(NullSink)
            .with_seed(17)
            .with_max_test(max_test)
            .with_max_fail(max_fail)
    }

    #[test]
    fn test_stream_alternates_generated_and_outcome() {
        let mut steps = test(0.0, Rc::new(|s| s + 1.0), RandomSource::from_seed(1), prop(true));
        for _ in 0..10 {
            assert!(matches!(steps.next(), Some(TestStep::Generated(_))));
            assert!(matches!(steps.next(), Some(TestStep::Passed(_))));
        }
    }

    #[test]
    fn test_stream_reports_discards_and_falsifications() {
        let source = RandomSource::from_seed(1);
        let mut discards = test(0.0, Rc::new(|s| s), source, implies(false, true));
        discards.next();
        assert!(matches!(discards.next(), Some(TestStep::Failed)));

        let p = for_all(constant(5i64), |x| x < 0);
        let mut falsified = test(0.0, Rc::new(|s| s), RandomSource::from_seed(1), p);
        falsified.next();
        match falsified.next() {
            Some(TestStep::Falsified(arguments, None)) => assert_eq!(arguments.len(), 1),
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn test_size_grows_through_size_step() {
        let sizes = crate::generator::sized(|n| constant(n as i64));
        let p = for_all(sizes, |_| true);
        let seen: Vec<String> = test(0.0, Rc::new(|s| s * 2.0 + 1.0), RandomSource::from_seed(1), p)
            .filter_map(|step| match step {
                TestStep::Generated(args) => Some(args[0].to_string()),
                _ => None,
            })
            .take(4)
            .collect();
        assert_eq!(seen, vec!["1", "3", "7", "15"]);
    }

    #[test]
    fn test_success_counts_exactly_max_test() {
        let p = for_all(constant(0i64), |x| propl(move || x == 0));
        let result = run(&quiet(25, 10), p);
        assert!(result.is_success());
        assert_eq!(result.data().count, 25);
        assert_eq!(result.data().discarded, 0);
    }

    #[test]
    fn test_exhaustion_after_max_fail_discards() {
        let result = run(&quiet(100, 5), implies(false, true));
        assert!(result.is_exhausted());
        assert_eq!(result.data().count, 0);
        assert_eq!(result.data().discarded, 5);
    }

    #[test]
    fn test_falsification_stops_the_run() {
        let p = for_all(integer(), |x| x < 3);
        let result = run(&quiet(1000, 1000), p);
        assert!(result.is_falsified());
        let args = result.counterexample().unwrap();
        assert!(args[0].as_int().unwrap() >= 3);
        assert!(result.data().count < 1000);
    }

    #[test]
    fn test_zero_max_test_succeeds_immediately() {
        let result = run(&quiet(0, 10), prop(false));
        assert!(result.is_success());
        assert_eq!(result.data().count, 0);
    }

    #[test]
    fn test_stamp_table() {
        let stamps = vec![
            vec!["a".to_string()],
            vec![],
            vec!["a".to_string()],
            vec!["b".to_string()],
        ];
        assert_eq!(
            stamp_table(stamps, 4),
            vec![(25, vec!["b".to_string()]), (50, vec!["a".to_string()])]
        );
    }

    #[test]
    fn test_collected_distribution() {
        let p = for_all(crate::generator::elements(vec![1i64, 2]), |x| collect(x, true));
        let result = run(&quiet(200, 10), p);
        let table = &result.data().stamps;
        assert_eq!(table.len(), 2);
        assert!(table[0].0 <= table[1].0);
        let total: usize = table.iter().map(|(p, _)| p).sum();
        assert!((98..=100).contains(&total));
    }

    #[test]
    fn test_summary_serializes() {
        let result = run(&quiet(10, 10), for_all(constant(1i64), |x| x == 2));
        let json = serde_json::to_value(result.summary("demo")).unwrap();
        assert_eq!(json["status"], "falsified");
        assert_eq!(json["name"], "demo");
        assert_eq!(json["arguments"][0], "1");
        assert_eq!(json["data"]["count"], 0);
    }
}
