//! Failure policy tests
//!
//! A failure at step k leaves exactly the store produced by steps [0, k).

use std::sync::Arc;

use proptest::prelude::*;
use segrun_engine::{
    Destination, EngineConfig, Executor, Invocation, LogEvent, LogSink, Operand, PeerTransport,
    Response, Segment, Session, SinkError, Step, TransportError,
};
use segrun_foundation::{ErrorKind, Value};

fn executor() -> Executor {
    Executor::default().with_config(EngineConfig::deterministic(5))
}

// =============================================================================
// Fixed Cases
// =============================================================================

#[test]
fn failing_step_changes_nothing() {
    let segment = Segment::new()
        .call("newilist", vec!["a".into(), Operand::Ints(vec![1, 2, 3])])
        .call("setitem", vec!["a".into(), Operand::Int(9), Operand::Int(7)]);
    let mut session = Session::seeded(1);
    let failure = executor().execute(&mut session, &segment).unwrap_err();
    assert_eq!(failure.position, 1);
    assert!(matches!(failure.error.kind, ErrorKind::IndexOutOfRange { .. }));
    assert_eq!(session.store().get("a").unwrap(), &Value::from(vec![1i64, 2, 3]));
}

#[test]
fn validation_errors_report_position() {
    let segment = Segment::new()
        .call("newilist", vec!["a".into(), Operand::Int(1)])
        .call("concat", vec!["b".into(), "a".into(), "missing".into()]);
    let mut session = Session::seeded(1);
    let failure = executor().execute(&mut session, &segment).unwrap_err();
    assert_eq!(failure.position, 1);
    assert_eq!(
        failure.error.kind,
        ErrorKind::VariableNotFound("missing".into())
    );
    let context = failure.error.context.unwrap();
    assert_eq!(context.opcode.as_deref(), Some("concat"));
    assert_eq!(context.position, Some(1));
}

#[test]
fn type_errors_are_not_coerced() {
    let segment = Segment::new()
        .call("newilist", vec!["a".into(), Operand::Int(1)])
        .call("newflist", vec!["f".into(), Operand::Float(1.0)])
        .call("add", vec!["s".into(), "a".into(), "f".into()]);
    let mut session = Session::seeded(1);
    let failure = executor().execute(&mut session, &segment).unwrap_err();
    assert_eq!(failure.position, 2);
    assert!(matches!(failure.error.kind, ErrorKind::TypeMismatch { .. }));
    assert!(!session.store().contains("s"));
}

/// Delivers to `up` and nothing else.
struct OnlyUp;

impl PeerTransport for OnlyUp {
    fn send(&self, to: &Destination, _payload: &[u8]) -> Result<(), TransportError> {
        if to.peer == "up" {
            Ok(())
        } else {
            Err(TransportError::Unreachable(to.peer.clone()))
        }
    }
}

#[test]
fn failure_reports_earlier_deliveries() {
    let executor = executor().with_transport(Arc::new(OnlyUp));
    let segment = Segment::new()
        .call("newilist", vec!["x".into(), Operand::Ints(vec![1, 2])])
        .call("transmit", vec![Operand::text("up"), "y".into(), "x".into()])
        .call("getitem", vec!["z".into(), "x".into(), Operand::Int(5)]);
    let mut session = Session::seeded(1);
    let failure = executor.execute(&mut session, &segment).unwrap_err();

    assert_eq!(failure.position, 2);
    assert_eq!(failure.responses.len(), 2);
    assert_eq!(failure.responses[1], Response::Ack);
    assert_eq!(failure.transmissions.len(), 1);
    assert_eq!(failure.transmissions[0].peer, "up");
    assert_eq!(failure.transmissions[0].name, "y");
    assert!(failure.transmissions[0].delivered());
}

#[test]
fn failure_reports_the_failed_delivery() {
    let executor = executor().with_transport(Arc::new(OnlyUp));
    let segment = Segment::new()
        .call("newilist", vec!["x".into(), Operand::Int(1)])
        .call("transmit", vec![Operand::text("up"), "y".into(), "x".into()])
        .call("transmit", vec![Operand::text("down"), "y".into(), "x".into()]);
    let mut session = Session::seeded(1);
    let failure = executor.execute(&mut session, &segment).unwrap_err();

    assert_eq!(failure.position, 2);
    let peers: Vec<_> = failure
        .transmissions
        .iter()
        .map(|t| (t.peer.as_str(), t.delivered()))
        .collect();
    assert_eq!(peers, vec![("up", true), ("down", false)]);
    assert_eq!(
        failure.transmissions[1].result,
        Err(TransportError::Unreachable("down".into()))
    );
}

struct Broken;

impl LogSink for Broken {
    fn record(&self, _event: &LogEvent) -> Result<(), SinkError> {
        Err(SinkError("sink offline".into()))
    }
}

#[test]
fn logging_never_fails_a_segment() {
    let executor = executor().with_sink(Arc::new(Broken));
    let segment = Segment::new()
        .call("logmessage", vec![Operand::text("hello"), Operand::Int(3)])
        .call("logvariable", vec!["nobody".into()])
        .call("logstats", vec![]);
    let mut session = Session::seeded(1);
    let outcome = executor.execute(&mut session, &segment).unwrap();
    assert_eq!(outcome.responses.len(), 3);
}

// =============================================================================
// Prefix Property
// =============================================================================

fn step_strategy() -> impl Strategy<Value = Step> {
    let name = prop::sample::select(vec!["a", "b", "c"]);
    prop_oneof![
        (name.clone(), -5i64..5).prop_map(|(n, v)| {
            Step::Call(Invocation::new(
                "newilist",
                vec![n.into(), Operand::Ints(vec![v, v + 1])],
            ))
        }),
        (name.clone(), name.clone(), name.clone()).prop_map(|(out, x, y)| {
            Step::Call(Invocation::new(
                "add",
                vec![out.into(), x.into(), y.into()],
            ))
        }),
        (name.clone(), name.clone(), -3i64..3).prop_map(|(out, x, k)| {
            Step::Call(Invocation::new(
                "getitem",
                vec![out.into(), x.into(), Operand::Int(k)],
            ))
        }),
        (name.clone(), name.clone()).prop_map(|(out, x)| {
            Step::Call(Invocation::new(
                "concat",
                vec![out.into(), x.into(), x.into()],
            ))
        }),
        name.prop_map(|n| Step::Call(Invocation::new("del", vec![n.into()]))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn failure_leaves_prefix_state(steps in prop::collection::vec(step_strategy(), 1..12)) {
        let executor = executor();
        let segment = Segment { steps: steps.clone(), ..Segment::default() };
        let mut session = Session::seeded(3);

        match executor.execute(&mut session, &segment) {
            Ok(outcome) => prop_assert_eq!(outcome.responses.len(), steps.len()),
            Err(failure) => {
                let prefix = Segment { steps: steps[..failure.position].to_vec(), ..Segment::default() };
                let mut replay = Session::seeded(3);
                prop_assert!(executor.execute(&mut replay, &prefix).is_ok());
                prop_assert_eq!(session.store(), replay.store());
            }
        }
    }
}
