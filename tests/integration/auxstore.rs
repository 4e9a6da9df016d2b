//! Auxiliary store backends driven through segments

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use segrun_engine::{EngineConfig, Executor, Operand, Segment, Session};
use segrun_foundation::{ErrorKind, Value};
use segrun_runtime::{FileAuxStore, MemoryAuxStore, Peer, PeerConfig};

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("segrun-it-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn save_then_load() -> (Segment, Segment) {
    let save = Segment::new()
        .call("newilist", vec!["x".into(), Operand::Ints(vec![7, 8])])
        .call("pair", vec!["p".into(), "x".into(), Operand::Floats(vec![0.5])])
        .call("save", vec![Operand::text("p"), Operand::text("run1")])
        .call("auxdb_write", vec![Operand::text("config/limit"), Operand::Int(64)]);
    let load = Segment::new()
        .call("load", vec!["q".into(), Operand::text("run1"), Operand::text("p")])
        .call("auxdb_read", vec!["limit".into(), Operand::text("config/limit")]);
    (save, load)
}

#[test]
fn file_store_outlives_the_session() {
    let root = scratch("file");
    let aux = Arc::new(FileAuxStore::new(&root));
    let executor = Executor::default()
        .with_config(EngineConfig::deterministic(2))
        .with_aux_store(aux.clone());
    let (save, load) = save_then_load();

    let mut first = executor.new_session();
    executor.execute(&mut first, &save).unwrap();
    assert!(root.join("run1").join("p.pickle").is_file());
    assert!(root.join("config").join("limit.pickle").is_file());

    let mut second = Session::seeded(9);
    executor.execute(&mut second, &load).unwrap();
    assert_eq!(second.store().get("q").unwrap(), first.store().get("p").unwrap());
    assert_eq!(second.store().get("limit").unwrap(), &Value::from(vec![64i64]));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn memory_store_is_shared_between_peers() {
    let aux = Arc::new(MemoryAuxStore::new());
    let peer = |id: &str| {
        Peer::new(PeerConfig::new(id).with_engine(EngineConfig::deterministic(3)))
            .with_aux_store(aux.clone())
    };
    let (writer, reader) = (peer("1"), peer("2"));
    let (save, load) = save_then_load();

    writer.run("a", &save).unwrap();
    assert_eq!(aux.keys(), vec!["config/limit".to_string(), "run1/p".to_string()]);
    reader.run("b", &load).unwrap();

    let session = reader.session("b");
    let session = session.lock().unwrap();
    assert_eq!(session.store().get("limit").unwrap(), &Value::from(vec![64i64]));
}

#[test]
fn missing_key_fails_without_effects() {
    let executor = Executor::default()
        .with_config(EngineConfig::deterministic(4))
        .with_aux_store(Arc::new(MemoryAuxStore::new()));
    let segment = Segment::new()
        .call("newilist", vec!["x".into(), Operand::Ints(vec![1])])
        .call("auxdb_read", vec!["x".into(), Operand::text("absent")]);

    let mut session = executor.new_session();
    let failure = executor.execute(&mut session, &segment).unwrap_err();
    assert_eq!(failure.position, 1);
    assert_eq!(failure.error.kind, ErrorKind::KeyNotFound("absent".into()));
    assert_eq!(session.store().get("x").unwrap(), &Value::from(vec![1i64]));
}

#[test]
fn invalid_file_key_is_a_store_error() {
    let root = scratch("badkey");
    let executor = Executor::default()
        .with_config(EngineConfig::deterministic(4))
        .with_aux_store(Arc::new(FileAuxStore::new(&root)));
    let segment = Segment::new().call("auxdb_write", vec![Operand::text("../escape"), Operand::Int(1)]);

    let mut session = executor.new_session();
    let failure = executor.execute(&mut session, &segment).unwrap_err();
    assert!(matches!(failure.error.kind, ErrorKind::AuxStoreError(_)));
    assert!(!root.exists());
}
