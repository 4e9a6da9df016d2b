//! Multi-peer delivery over the in-process transport

use std::sync::{Arc, Barrier};
use std::thread;

use segrun_engine::{EngineConfig, Operand, Segment};
use segrun_foundation::{ErrorKind, Value};
use segrun_runtime::{DEFAULT_SESSION, MemoryTransport, Peer, PeerConfig};

fn network(ids: &[&str]) -> (Arc<MemoryTransport>, Vec<Arc<Peer>>) {
    let transport = Arc::new(MemoryTransport::new());
    let peers = ids
        .iter()
        .map(|id| {
            let peer = Arc::new(
                Peer::new(PeerConfig::new(*id).with_engine(EngineConfig::deterministic(5)))
                    .with_transport(transport.clone()),
            );
            transport.register(&peer);
            peer
        })
        .collect();
    (transport, peers)
}

fn value(peer: &Peer, label: &str, name: &str) -> Option<Value> {
    let session = peer.session(label);
    let session = session.lock().unwrap();
    session.store().get(name).ok().cloned()
}

#[test]
fn transmit_lands_in_matching_session() {
    let (_transport, peers) = network(&["1", "2"]);
    let segment = Segment::new()
        .call("newilist", vec!["x".into(), Operand::Ints(vec![4, 5])])
        .call("transmit", vec![Operand::text("2"), Operand::text("y"), "x".into()]);

    let outcome = peers[0].run("job", &segment).unwrap();
    assert_eq!(outcome.transmissions.len(), 1);
    assert!(outcome.transmissions[0].result.is_ok());

    assert_eq!(value(&peers[1], "job", "y"), Some(Value::from(vec![4i64, 5])));
    assert_eq!(value(&peers[1], DEFAULT_SESSION, "y"), None);
}

#[test]
fn received_values_feed_later_segments() {
    let (_transport, peers) = network(&["1", "2"]);
    peers[0]
        .run(
            "job",
            &Segment::new()
                .call("newilist", vec!["x".into(), Operand::Ints(vec![3, 1, 2])])
                .call("transmit", vec![Operand::text("2"), Operand::text("x"), "x".into()]),
        )
        .unwrap();
    peers[1]
        .run("job", &Segment::new().call("sorted", vec!["s".into(), "x".into()]))
        .unwrap();
    assert_eq!(value(&peers[1], "job", "s"), Some(Value::from(vec![1i64, 2, 3])));
}

#[test]
fn transmit_to_missing_peer_fails_the_step() {
    let (_transport, peers) = network(&["1"]);
    let segment = Segment::new()
        .call("newilist", vec!["x".into(), Operand::Ints(vec![1])])
        .call("transmit", vec![Operand::text("7"), Operand::text("y"), "x".into()])
        .call("newilist", vec!["after".into(), Operand::Ints(vec![1])]);

    let failure = peers[0].run("s", &segment).unwrap_err();
    assert_eq!(failure.position, 1);
    assert!(matches!(
        failure.error.kind,
        ErrorKind::TransmissionError { ref peer, .. } if peer == "7"
    ));
    assert!(value(&peers[0], "s", "x").is_some());
    assert!(value(&peers[0], "s", "after").is_none());
}

#[test]
fn broadcast_reports_partial_delivery() {
    let (transport, peers) = network(&["1", "2", "3"]);
    assert!(transport.unregister("3"));
    let segment = Segment::new()
        .call("newilist", vec!["x".into(), Operand::Ints(vec![9])])
        .call(
            "broadcast",
            vec![
                "ok".into(),
                Operand::text("got"),
                "x".into(),
                Operand::text("2"),
                Operand::text("3"),
                Operand::text("1"),
            ],
        );

    peers[0].run("b", &segment).unwrap();
    assert_eq!(value(&peers[0], "b", "ok"), Some(Value::from(vec![1i64, 0, 1])));
    assert_eq!(value(&peers[0], "b", "got"), Some(Value::from(vec![9i64])));
    assert_eq!(value(&peers[1], "b", "got"), Some(Value::from(vec![9i64])));
    assert_eq!(value(&peers[2], "b", "got"), None);
}

fn send_to(other: &str, x: i64) -> Segment {
    Segment::new()
        .call("newilist", vec!["x".into(), Operand::Ints(vec![x])])
        .call("transmit", vec![Operand::text(other), Operand::text("y"), "x".into()])
        .call("newilist", vec!["sent".into(), Operand::Int(1)])
}

#[test]
fn delivery_into_a_busy_session_does_not_block() {
    let (_transport, peers) = network(&["1", "2"]);
    let busy = peers[1].session("swap");
    let guard = busy.lock().unwrap();

    let outcome = peers[0].run("swap", &send_to("2", 7)).unwrap();
    assert!(outcome.transmissions[0].delivered());
    assert!(guard.store().get("y").is_err());
    drop(guard);

    assert_eq!(value(&peers[1], "swap", "y"), Some(Value::from(vec![7i64])));
}

#[test]
fn peers_exchange_values_concurrently() {
    for _ in 0..20 {
        let (_transport, peers) = network(&["1", "2"]);
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [(0usize, "2", 1i64), (1, "1", 2)]
            .into_iter()
            .map(|(me, other, x)| {
                let peer = Arc::clone(&peers[me]);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    peer.run("swap", &send_to(other, x))
                })
            })
            .collect();
        for handle in handles {
            let outcome = handle.join().unwrap().unwrap();
            assert!(outcome.transmissions.iter().all(|t| t.delivered()));
        }

        assert_eq!(value(&peers[0], "swap", "y"), Some(Value::from(vec![2i64])));
        assert_eq!(value(&peers[1], "swap", "y"), Some(Value::from(vec![1i64])));
    }
}

#[test]
fn sessions_run_concurrently() {
    let (_transport, peers) = network(&["1"]);
    let peer = Arc::clone(&peers[0]);
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let peer = Arc::clone(&peer);
            thread::spawn(move || {
                let label = format!("s{n}");
                let segment = Segment::new()
                    .call("arange", vec!["r".into(), Operand::Int(0), Operand::Int(n + 1), Operand::Int(1)])
                    .call("reduce", vec!["t".into(), "r".into(), Operand::text("sum")]);
                peer.run(&label, &segment).unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(peer.sessions().len(), 4);
    for n in 0..4i64 {
        let label = format!("s{n}");
        assert_eq!(value(&peer, &label, "t"), Some(Value::from(vec![n * (n + 1) / 2])));
    }
}

#[test]
fn encoded_segments_cross_the_wire() {
    let (_transport, peers) = network(&["1", "2"]);
    let segment = Segment::new()
        .with_id("remote")
        .call("newilist", vec!["x".into(), Operand::Ints(vec![2])])
        .call("transmit", vec![Operand::text("1"), Operand::text("back"), "x".into()]);
    let bytes = segment.to_bytes().unwrap();

    peers[1].run_encoded("r", &bytes).unwrap();
    assert_eq!(value(&peers[0], "r", "back"), Some(Value::from(vec![2i64])));
}
