//! Tracing segment execution through a shared tracer

use std::sync::Arc;

use segrun_engine::{EngineConfig, LogEvent, Operand, Segment};
use segrun_runtime::trace::{HumanFormatter, TraceFormatter, Tracer, TracerConfig};
use segrun_runtime::{Peer, PeerConfig};

fn traced_peer(tracer: &Arc<Tracer>) -> Peer {
    Peer::new(PeerConfig::new("1").with_engine(EngineConfig::deterministic(8)))
        .with_sink(tracer.clone())
}

#[test]
fn records_follow_segment_structure() {
    let tracer = Arc::new(Tracer::new(TracerConfig::new().enabled()));
    let peer = traced_peer(&tracer);
    let segment = Segment::new()
        .with_id("seg-1")
        .call("newilist", vec!["x".into(), Operand::Ints(vec![1, 2])])
        .call("logvariable", vec![Operand::text("x"), Operand::text("nope")])
        .call("logmessage", vec![Operand::text("done")]);
    peer.run("s", &segment).unwrap();

    let kinds: Vec<&str> = tracer.records().iter().map(|r| r.kind()).collect();
    assert_eq!(kinds.first(), Some(&"segment_start"));
    assert_eq!(kinds.last(), Some(&"segment_end"));
    assert_eq!(tracer.by_kind("command_start").len(), 3);
    assert_eq!(tracer.by_kind("variable").len(), 2);

    let message = &tracer.by_kind("message")[0];
    assert_eq!(message.event, LogEvent::Message("done".into()));
    assert_eq!(message.segment, 1);
    assert_eq!(
        HumanFormatter::new().format(message),
        "S0001   MESSAGE done"
    );
}

#[test]
fn failures_are_traced() {
    let tracer = Arc::new(Tracer::new(TracerConfig::new().enabled()));
    let peer = traced_peer(&tracer);
    peer.run("s", &Segment::new().call("newilist", vec!["x".into(), Operand::Int(1)]))
        .unwrap();
    let _ = peer.run("s", &Segment::new().call("getitem", vec!["y".into(), "missing".into(), Operand::Int(0)]));

    let failed = tracer.by_kind("command_failed");
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].segment, 2);
    assert!(matches!(
        &tracer.recent(1)[0].event,
        LogEvent::SegmentEnd { completed: 0, failed: true }
    ));
}

#[test]
fn filtered_tracer_keeps_user_events() {
    let config = TracerConfig::new()
        .enabled()
        .filter_events(vec!["message".to_string(), "stats".to_string()]);
    let tracer = Arc::new(Tracer::new(config));
    let peer = traced_peer(&tracer);
    peer.run(
        "s",
        &Segment::new()
            .call("logmessage", vec![Operand::text("a")])
            .call("logstats", vec![]),
    )
    .unwrap();

    assert_eq!(tracer.len(), 2);
    assert!(tracer.records().iter().all(|r| r.is_user_event()));
}
