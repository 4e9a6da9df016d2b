//! Command set tests driven through segments
//!
//! Exercises list-maps, search, signatures, and the registry as a caller
//! sees them.

use proptest::prelude::*;
use segrun_engine::{CommandRegistry, EngineConfig, Executor, Operand, Segment, Session};
use segrun_foundation::{ErrorKind, Value};

fn executor() -> Executor {
    Executor::default().with_config(EngineConfig::deterministic(11))
}

fn run(segment: &Segment) -> Session {
    let mut session = Session::seeded(11);
    executor().execute(&mut session, segment).unwrap();
    session
}

fn get(session: &Session, name: &str) -> Value {
    session.store().get(name).unwrap().clone()
}

// =============================================================================
// Registry
// =============================================================================

#[test]
fn standard_registry_has_every_family() {
    let registry = CommandRegistry::standard();
    for opcode in [
        "newarray", "sort", "sorted", "getitem", "contains", "index", "lookup", "select",
        "newlistmap", "listmap_additem", "add", "wadd", "divmod", "neg", "randomarray",
        "sha", "sha3_256", "ecdsa256_sign", "rsa_verify", "grain128aeadv2", "transmit",
        "broadcast", "auxdb_read", "save", "load", "serialise", "logmessage", "newnode",
        "pair", "unpair", "nonzero", "verify",
    ] {
        assert!(registry.contains(opcode), "missing {opcode}");
    }
    assert!(!registry.contains("mux"));
}

// =============================================================================
// Search
// =============================================================================

#[test]
fn index_lookup_conventions() {
    let session = run(&Segment::new()
        .call("newilist", vec!["a".into(), Operand::Ints(vec![4, 8, 15])])
        .call("index", vec!["i".into(), "a".into(), Operand::Ints(vec![15, 16])])
        .call("lookup", vec!["l".into(), "a".into(), Operand::Ints(vec![1, 7]), Operand::Int(0)])
        .call("nonzeroindices", vec!["nz".into(), Operand::Ints(vec![0, 3, 0, 1])]));
    assert_eq!(get(&session, "i"), Value::from(vec![2i64, -1]));
    assert_eq!(get(&session, "l"), Value::from(vec![8i64, 0]));
    assert_eq!(get(&session, "nz"), Value::from(vec![1i64, 3]));
}

proptest! {
    #[test]
    fn contains_iff_index_found(
        target in prop::collection::vec(-4i64..4, 0..10),
        probes in prop::collection::vec(-5i64..5, 1..10),
    ) {
        let session = run(&Segment::new()
            .call("contains", vec!["c".into(), Operand::Ints(target.clone()), Operand::Ints(probes.clone())])
            .call("index", vec!["i".into(), Operand::Ints(target), Operand::Ints(probes)]));
        let c = get(&session, "c");
        let i = get(&session, "i");
        for (hit, pos) in c.ints().unwrap().iter().zip(i.ints().unwrap()) {
            prop_assert_eq!(*hit == 1, *pos >= 0);
        }
    }
}

// =============================================================================
// List-maps
// =============================================================================

#[test]
fn listmap_lifecycle() {
    let session = run(&Segment::new()
        .call(
            "newlistmap",
            vec!["m".into(), Operand::text("ii"), Operand::Ints(vec![1, 2]), Operand::Ints(vec![10, 20])],
        )
        .call(
            "listmap_additem",
            vec![
                "added".into(),
                "pos".into(),
                "m".into(),
                Operand::Int(1),
                Operand::Ints(vec![2, 3]),
                Operand::Ints(vec![20, 30]),
            ],
        )
        .call(
            "listmap_getitem",
            vec!["where".into(), "m".into(), Operand::Ints(vec![3, 9]), Operand::Ints(vec![30, 90]), Operand::Int(-1)],
        )
        .call(
            "listmap_removeitem",
            vec![
                "removed".into(),
                "from".into(),
                "to".into(),
                "m".into(),
                Operand::Int(0),
                Operand::Int(1),
                Operand::Int(10),
            ],
        )
        .call("listmap_keys", vec!["k0".into(), "k1".into(), "m".into()]));

    assert_eq!(get(&session, "pos"), Value::from(vec![2i64]));
    assert_eq!(get(&session, "where"), Value::from(vec![2i64, -1]));
    assert_eq!(get(&session, "removed"), Value::from(vec![0i64]));
    assert_eq!(get(&session, "from"), Value::from(vec![1i64, 2]));
    assert_eq!(get(&session, "to"), Value::from(vec![0i64, 1]));
    assert_eq!(get(&session, "k0"), Value::from(vec![2i64, 3]));
    assert_eq!(get(&session, "k1"), Value::from(vec![20i64, 30]));
}

#[test]
fn listmap_duplicate_fails_in_place() {
    let segment = Segment::new()
        .call("newlistmap", vec!["m".into(), Operand::text("i"), Operand::Ints(vec![1])])
        .call(
            "listmap_additem",
            vec!["a".into(), "p".into(), "m".into(), Operand::Int(0), Operand::Ints(vec![1])],
        );
    let mut session = Session::seeded(1);
    let failure = executor().execute(&mut session, &segment).unwrap_err();
    assert_eq!(failure.position, 1);
    assert!(matches!(failure.error.kind, ErrorKind::DuplicateKey(_)));
    assert!(!session.store().contains("a"));
}

// =============================================================================
// Signatures
// =============================================================================

#[test]
fn ecdsa_segment_detects_tampering() {
    let session = run(&Segment::new()
        .call("ecdsa256_keygen", vec!["sk".into()])
        .call("ecdsa256_public_key", vec!["pk".into(), "sk".into()])
        .call("ecdsa256_sign", vec!["sig".into(), "sk".into(), Operand::text("hello")])
        .call("ecdsa256_verify", vec!["ok".into(), "pk".into(), Operand::text("hello"), "sig".into()])
        .call("ecdsa256_verify", vec!["bad".into(), "pk".into(), Operand::text("hellp"), "sig".into()]));
    assert_eq!(get(&session, "ok"), Value::from(vec![1i64]));
    assert_eq!(get(&session, "bad"), Value::from(vec![0i64]));
}

#[test]
fn rsa_segment_round_trip() {
    let session = run(&Segment::new()
        .call("rsa_keygen", vec!["sk".into()])
        .call("rsa_public_key", vec!["pk".into(), "sk".into()])
        .call("rsa_encrypt", vec!["c".into(), "pk".into(), Operand::text("secret")])
        .call("rsa_decrypt", vec!["p".into(), "sk".into(), "c".into()])
        .call("rsa_sign", vec!["sig".into(), "sk".into(), Operand::text("secret")])
        .call("rsa_verify", vec!["ok".into(), "pk".into(), Operand::text("secret"), "sig".into()]));
    assert_eq!(get(&session, "p"), Value::bytes(b"secret").unwrap());
    assert_eq!(get(&session, "ok"), Value::from(vec![1i64]));
}

#[test]
fn short_aes_key_is_rejected() {
    let segment = Segment::new().call(
        "aes256_encrypt",
        vec!["c".into(), Operand::Bytes(vec![0; 16]), Operand::Bytes(vec![0; 16])],
    );
    let mut session = Session::seeded(1);
    let failure = executor().execute(&mut session, &segment).unwrap_err();
    assert_eq!(
        failure.error.kind,
        ErrorKind::InvalidKeyLength { expected: 32, actual: 16 }
    );
}

// =============================================================================
// Aggregates
// =============================================================================

#[test]
fn pairs_and_divmod() {
    let session = run(&Segment::new()
        .call("divmod", vec!["qr".into(), Operand::Int(-7), Operand::Int(2)])
        .call("unpair", vec!["q".into(), "r".into(), "qr".into()])
        .call("pair", vec!["back".into(), "q".into(), "r".into()]));
    assert_eq!(get(&session, "q"), Value::from(vec![-4i64]));
    assert_eq!(get(&session, "r"), Value::from(vec![1i64]));
    assert_eq!(get(&session, "back"), get(&session, "qr"));
}
