//! End-to-end segment scenarios
//!
//! Whole segments run through a default executor.

use std::sync::Arc;

use segrun_engine::{
    Destination, EngineConfig, Executor, Invocation, Operand, PeerTransport, Response, Segment,
    Session, TransportError,
};
use segrun_foundation::{ErrorKind, TypeCode, Value};

fn executor() -> Executor {
    Executor::default().with_config(EngineConfig::deterministic(1))
}

struct Down;

impl PeerTransport for Down {
    fn send(&self, to: &Destination, _payload: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Unreachable(to.peer.clone()))
    }
}

#[test]
fn sort_then_take_first() {
    let segment = Segment::new()
        .call(
            "newarray",
            vec!["a".into(), Operand::text("i"), Operand::Ints(vec![3, 1, 2])],
        )
        .call("sort", vec!["b".into(), "a".into()])
        .call("getitem", vec!["c".into(), "b".into(), Operand::Int(0)]);
    let mut session = Session::seeded(1);
    let outcome = executor().execute(&mut session, &segment).unwrap();

    assert_eq!(session.store().get("c").unwrap(), &Value::from(vec![1i64]));
    assert_eq!(
        outcome.responses[2],
        Response::Array {
            typecode: segrun_foundation::ValueType::Array(TypeCode::Integer),
            name: "c".into()
        }
    );
}

#[test]
fn digest_survives_failed_transmit() {
    let executor = executor().with_transport(Arc::new(Down));
    let segment = Segment::new()
        .call("sha", vec!["h".into(), Operand::Bytes(b"abc".to_vec())])
        .call("transmit", vec![Operand::text("peerX"), "h2".into(), "h".into()]);
    let mut session = Session::seeded(1);
    let failure = executor.execute(&mut session, &segment).unwrap_err();

    assert_eq!(failure.position, 1);
    assert_eq!(failure.opcode, "transmit");
    assert!(matches!(
        failure.error.kind,
        ErrorKind::TransmissionError { ref peer, .. } if peer == "peerX"
    ));
    let h = session.store().get("h").unwrap();
    assert_eq!(h.typecode(), Some(TypeCode::ByteArray(32)));
    assert_eq!(h.single_row().unwrap()[..4], [0x3a, 0x98, 0x5d, 0xa7]);
}

#[test]
fn slicing_matches_half_open_ranges() {
    let segment = Segment::new()
        .call(
            "slicetoindices",
            vec![
                "x".into(),
                Operand::Int(1),
                Operand::Int(4),
                Operand::Int(1),
                Operand::Int(6),
            ],
        )
        .call(
            "slicetoindices",
            vec![
                "y".into(),
                Operand::Int(-2),
                Operand::text("none"),
                Operand::Int(1),
                Operand::Int(6),
            ],
        );
    let mut session = Session::seeded(1);
    executor().execute(&mut session, &segment).unwrap();
    assert_eq!(session.store().get("x").unwrap(), &Value::from(vec![1i64, 2, 3]));
    assert_eq!(session.store().get("y").unwrap(), &Value::from(vec![4i64, 5]));
}

#[test]
fn sort_is_stable() {
    let segment = Segment::new()
        .call("newilist", vec!["keys".into(), Operand::Ints(vec![2, 1, 2, 1, 0])])
        .call("indexsorted", vec!["order".into(), "keys".into()]);
    let mut session = Session::seeded(1);
    executor().execute(&mut session, &segment).unwrap();
    assert_eq!(
        session.store().get("order").unwrap(),
        &Value::from(vec![4i64, 1, 3, 0, 2])
    );
}

#[test]
fn mux_dispatches_on_computed_selector() {
    let branches = vec![
        Invocation::new("newilist", vec!["r".into(), Operand::Int(100)]),
        Invocation::new("newilist", vec!["r".into(), Operand::Int(200)]),
        Invocation::new("newilist", vec!["r".into(), Operand::Int(300)]),
    ];
    let segment = Segment::new()
        .call("newilist", vec!["a".into(), Operand::Int(5)])
        .call("newilist", vec!["b".into(), Operand::Int(3)])
        .call("sub", vec!["d".into(), "a".into(), "b".into()])
        .mux(Operand::var("d"), branches);
    let mut session = Session::seeded(1);
    let outcome = executor().execute(&mut session, &segment).unwrap();
    assert_eq!(outcome.responses.len(), 4);
    assert_eq!(session.store().get("r").unwrap(), &Value::from(vec![300i64]));
}

#[test]
fn encrypted_round_trip_in_one_segment() {
    let key: Vec<u8> = (0u8..32).collect();
    let segment = Segment::new()
        .call("newarray", vec!["m".into(), Operand::text("b16"), Operand::Int(3)])
        .call("aes256_encrypt", vec!["c".into(), "m".into(), Operand::Bytes(key.clone())])
        .call("aes256_decrypt", vec!["p".into(), "c".into(), Operand::Bytes(key)])
        .call("eq", vec!["same".into(), "p".into(), "m".into()]);
    let mut session = Session::seeded(1);
    executor().execute(&mut session, &segment).unwrap();
    assert_eq!(session.store().get("p").unwrap(), session.store().get("m").unwrap());
    assert_ne!(session.store().get("c").unwrap(), session.store().get("m").unwrap());
}

#[test]
fn pickled_value_can_be_encrypted() {
    let key: Vec<u8> = (0u8..32).collect();
    let iv = vec![7u8; 16];
    let segment = Segment::new()
        .call("newflist", vec!["x".into(), Operand::Floats(vec![1.5, -2.25])])
        .call("serialise", vec!["bytes".into(), "x".into()])
        .call(
            "aes256_ctr",
            vec!["sealed".into(), "bytes".into(), Operand::Bytes(key.clone()), Operand::Bytes(iv.clone())],
        )
        .call(
            "aes256_ctr",
            vec!["opened".into(), "sealed".into(), Operand::Bytes(key), Operand::Bytes(iv)],
        )
        .call("deserialise", vec!["y".into(), "opened".into()]);
    let mut session = Session::seeded(1);
    executor().execute(&mut session, &segment).unwrap();
    assert_eq!(session.store().get("y").unwrap(), session.store().get("x").unwrap());
}

#[test]
fn seeded_sessions_replay_randomness() {
    let segment = Segment::new()
        .call("randomarray", vec!["r".into(), Operand::text("i"), Operand::Int(8)])
        .call("randomperm", vec!["p".into(), Operand::Int(8)]);
    let config = EngineConfig::deterministic(99);
    let executor = executor().with_config(config.clone());

    let mut first = Session::new(&config);
    let mut second = Session::new(&config);
    executor.execute(&mut first, &segment).unwrap();
    executor.execute(&mut second, &segment).unwrap();
    assert_eq!(first.store(), second.store());
}

#[test]
fn segments_travel_as_bytes() {
    let segment = Segment::new()
        .with_id("seg-1")
        .call("newilist", vec!["a".into(), Operand::Int(1)])
        .mux(Operand::Int(0), vec![Invocation::new("logstats", vec![])]);
    let decoded = Segment::from_bytes(&segment.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, segment);
}
