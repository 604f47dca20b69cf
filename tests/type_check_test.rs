//! # Type-Directed Checking Test Suite
//!
//! Exercises the resolution engine through the process-scoped registry: user
//! types registered at start-up, generic operations instantiated at random,
//! and the batch checker's reporting and error behaviour.

use propcheck::resolve::{self, Bindings, ParamId, ResolutionContext};
use propcheck::{
    check_type, for_all, integer, lift_gen2, vec_of, Arbitrary, Checkable, Config, Describe,
    Dynamic, FromDynamic, Generator, InvokeError, NullSink, Operation, RandomSource, Registry,
    ResolutionError, TestResult, TypeDesc, TypeHandle, Typed, Value,
};
use std::sync::Once;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: i64,
    y: i64,
}

impl Point {
    fn add(self, other: Point) -> Point {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Typed for Point {
    fn descriptor() -> TypeDesc {
        TypeDesc::named("Point", vec![])
    }
}

impl Describe for Point {
    fn to_dynamic(&self) -> Dynamic {
        Dynamic::opaque(Self::descriptor(), *self)
    }
}

impl FromDynamic for Point {
    fn from_dynamic(value: &Dynamic) -> Result<Self, InvokeError> {
        value.downcast_ref::<Point>().copied()
    }
}

impl Arbitrary for Point {
    fn arbitrary() -> Generator<Self> {
        lift_gen2(|x, y| Point { x, y }, integer(), integer())
    }
}

fn point(value: &Dynamic) -> Result<Point, InvokeError> {
    Point::from_dynamic(value)
}

impl Checkable for Point {
    fn type_handle() -> TypeHandle {
        TypeHandle::new("Point")
            .with_operation(Operation::predicate(
                "add_commutes",
                vec![Point::descriptor(), Point::descriptor()],
                |args| {
                    let (a, b) = (point(&args[0])?, point(&args[1])?);
                    Ok(a.add(b) == b.add(a))
                },
            ))
            .with_operation(Operation::property("shift_by_any", vec![Point::descriptor()], |args| {
                let p = point(&args[0])?;
                Ok(for_all(integer(), move |dx| p.add(Point { x: dx, y: 0 }).y == p.y))
            }))
            .with_operation(Operation::predicate(
                "x_is_small",
                vec![Point::descriptor()],
                |args| Ok(point(&args[0])?.x.abs() < 5),
            ))
    }
}

static SETUP: Once = Once::new();

fn setup() {
    SETUP.call_once(|| {
        resolve::initialize();
        resolve::register_arbitrary::<Point>();
    });
}

fn config() -> Config {
    Config::quick().with_seed(31).with_sink(NullSink)
}

fn by_name<'a>(results: &'a [(String, TestResult)], name: &str) -> &'a TestResult {
    &results.iter().find(|(n, _)| n == name).unwrap().1
}

#[test]
fn test_registered_type_checks_all_operations() {
    setup();
    let results = Point::check_all(&config()).unwrap();
    assert_eq!(results.len(), 3);
    assert!(by_name(&results, "Point.add_commutes").is_success());
    assert!(by_name(&results, "Point.shift_by_any").is_success());

    let small = by_name(&results, "Point.x_is_small");
    assert!(small.is_falsified());
    let tuple = small.counterexample().unwrap()[0].as_slice().unwrap();
    assert!(tuple[0].downcast_ref::<Point>().unwrap().x.abs() >= 5);
}

#[test]
fn test_generic_operation_instantiates_params() {
    setup();
    let handle = TypeHandle::new("Lists").with_operation(Operation::predicate(
        "concat_length",
        vec![TypeDesc::vec(TypeDesc::param("T")), TypeDesc::vec(TypeDesc::param("T"))],
        |args| {
            let (a, b) = (args[0].as_slice()?, args[1].as_slice()?);
            let joined: Vec<Dynamic> = a.iter().chain(b).cloned().collect();
            Ok(joined.len() == a.len() + b.len())
        },
    ));
    let results = check_type(&handle, &config()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "Lists.concat_length");
    assert!(results[0].1.is_success());
}

fn reverse_twice() -> Operation {
    Operation::predicate(
        "reverse_twice",
        vec![TypeDesc::vec(TypeDesc::param("T"))],
        |args| {
            let items = args[0].as_slice()?.to_vec();
            let mut twice = items.clone();
            twice.reverse();
            twice.reverse();
            Ok(twice == items)
        },
    )
}

#[test]
fn test_generic_operation_over_registered_opaque_type() {
    let mut registry = Registry::new();
    registry.register_arbitrary::<Point>();
    registry.register_fn(resolve::VEC, 1, |ty, args| {
        let ty = ty.clone();
        vec_of(args[0].generator.clone())
            .map(move |items| Dynamic::new(ty.clone(), Value::List(items)))
    });
    assert_eq!(registry.non_generic().len(), 1);

    let handle = TypeHandle::new("Lists").with_operation(reverse_twice());
    let source = RandomSource::from_seed(8);
    let results = resolve::check_type_with(&registry, &handle, &config(), source).unwrap();
    let outcome = &results[0].1;
    assert!(outcome.is_success(), "falsified by {:?}", outcome.counterexample());
    assert_eq!(outcome.data().count, 100);
}

#[test]
fn test_shared_param_gets_one_type() {
    setup();
    let handle = TypeHandle::new("Same").with_operation(Operation::predicate(
        "same_type",
        vec![TypeDesc::param("T"), TypeDesc::option(TypeDesc::param("T"))],
        |args| match args[1].value() {
            Value::Option(Some(inner)) => Ok(inner.ty() == args[0].ty()),
            _ => Ok(true),
        },
    ));
    for seed in 0..10 {
        let results = check_type(&handle, &config().with_seed(seed)).unwrap();
        assert!(results[0].1.is_success());
    }
}

#[test]
fn test_missing_factory_aborts_batch_before_running() {
    setup();
    let handle = TypeHandle::new("Mixed")
        .with_operation(Operation::predicate("fine", vec![TypeDesc::int()], |_| Ok(true)))
        .with_operation(Operation::predicate(
            "unknown",
            vec![TypeDesc::vec(TypeDesc::named("Gadget", vec![]))],
            |_| Ok(true),
        ));
    match check_type(&handle, &config()) {
        Err(ResolutionError::Operation { operation, index, source }) => {
            assert_eq!(operation, "Mixed.unknown");
            assert_eq!(index, 0);
            assert_eq!(*source, ResolutionError::NoFactory("Gadget".into()));
        }
        other => panic!("expected a resolution error, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn test_resolved_point_generator_produces_points() {
    setup();
    let registry = resolve::global_registry();
    let mut ctx = ResolutionContext::new(RandomSource::from_seed(4));
    let ty = TypeDesc::vec(Point::descriptor());
    let resolved = resolve::resolve(&registry, &ty, &mut ctx).unwrap();
    let value = resolved.generator.generate(10, RandomSource::from_seed(5));
    for item in value.as_slice().unwrap() {
        assert!(item.downcast_ref::<Point>().is_ok());
    }
}

#[test]
fn test_unify_against_resolved_type() {
    let mut bindings = Bindings::new();
    let pattern = TypeDesc::function(TypeDesc::param("A"), TypeDesc::param("B"));
    let concrete = TypeDesc::function(TypeDesc::int(), TypeDesc::string());
    resolve::unify(&pattern, &concrete, &mut bindings);
    assert_eq!(bindings.get(&ParamId("A".into())), Some(&TypeDesc::int()));
    assert_eq!(bindings.get(&ParamId("B".into())), Some(&TypeDesc::string()));
}
