use lotgen::core::broker;
use lotgen::core::config::LinePolicy;
use lotgen::core::error::LottoError;
use lotgen::core::store::Store;
use lotgen::plugins::batch::{BatchStore, hash_lines};
use lotgen::plugins::draw::{Batch, DrawEngine};
use lotgen::plugins::rules::RuleSpec;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn generate(variant: &str, spec: &RuleSpec, lines: u32, seed: u64) -> Batch {
    DrawEngine::seeded(LinePolicy::default(), 1, seed)
        .generate(variant, spec, lines)
        .expect("generate")
}

fn dir_listing(root: &Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = fs::read_dir(root)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn save_then_load_round_trips_lines_and_count() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path().join("store")));
    let batch = generate("SmallLotto", &RuleSpec::new(50, 6), 3, 1);

    let saved_at = store.save(&batch).expect("save");
    let loaded = store.load("SmallLotto").expect("load");

    assert_eq!(loaded.created_at, saved_at);
    assert_eq!(loaded.variant, "SmallLotto");
    assert_eq!(loaded.line_count, 3);
    assert_eq!(loaded.lines, batch.lines);
    assert!(loaded.persisted);
    assert!(loaded.lines.iter().all(|l| l.secondary.is_empty()));
}

#[test]
fn save_creates_missing_root_directory() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("a").join("b");
    let store = BatchStore::new(Store::new(&root));
    store
        .save(&generate("Lotto", &RuleSpec::new(60, 6), 1, 2))
        .expect("save");
    assert!(root.join("Lotto.db").is_file());
    assert_eq!(dir_listing(&root), vec!["Lotto.db", "store.events.jsonl"]);
}

#[test]
fn secondary_sets_survive_round_trip() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    let spec = RuleSpec::new(51, 5).with_secondary(13, 2);
    let batch = generate("EuroMillions", &spec, 7, 3);

    store.save(&batch).unwrap();
    let loaded = store.load("EuroMillions").unwrap();
    assert_eq!(loaded.lines, batch.lines);
    assert!(loaded.lines.iter().all(|l| l.secondary.len() == 2));
}

#[test]
fn second_save_replaces_first() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    let spec = RuleSpec::new(60, 6);
    let first = generate("Lotto", &spec, 8, 10);
    let second = generate("Lotto", &spec, 2, 11);

    store.save(&first).unwrap();
    store.save(&second).unwrap();

    let loaded = store.load("Lotto").unwrap();
    assert_eq!(loaded.line_count, 2);
    assert_eq!(loaded.lines, second.lines);
    assert_eq!(store.saved_variants().unwrap(), vec!["Lotto".to_string()]);
}

#[test]
fn records_are_independent_per_variant() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    let a = generate("Lotto", &RuleSpec::new(60, 6), 2, 1);
    let b = generate("Thunderball", &RuleSpec::new(40, 5).with_secondary(15, 1), 4, 2);
    store.save(&a).unwrap();
    store.save(&b).unwrap();

    assert!(store.delete("Lotto").unwrap());
    assert_eq!(store.load("Thunderball").unwrap().lines, b.lines);
    assert!(matches!(store.load("Lotto"), Err(LottoError::NoSuchRecord(_))));
}

#[test]
fn load_of_never_saved_variant_is_no_such_record() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    match store.load("Lotto") {
        Err(LottoError::NoSuchRecord(path)) => assert_eq!(path, tmp.path().join("Lotto.db")),
        other => panic!("expected NoSuchRecord, got {other:?}"),
    }
}

#[test]
fn delete_never_saved_returns_false_without_touching_disk() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("store");
    let store = BatchStore::new(Store::new(&root));

    assert!(!store.delete("NeverSaved").unwrap());
    assert!(!root.exists());

    fs::create_dir_all(&root).unwrap();
    let before = dir_listing(&root);
    assert!(!store.delete("NeverSaved").unwrap());
    assert_eq!(dir_listing(&root), before);
}

#[test]
fn delete_twice_after_save_yields_true_then_false() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    store
        .save(&generate("Lotto", &RuleSpec::new(60, 6), 1, 4))
        .unwrap();

    assert!(store.delete("Lotto").unwrap());
    assert!(!store.delete("Lotto").unwrap());
    assert!(!store.exists("Lotto").unwrap());
}

#[test]
fn garbage_file_is_corrupt_not_missing() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    fs::write(tmp.path().join("Lotto.db"), vec![b'x'; 4096]).unwrap();

    assert!(matches!(
        store.load("Lotto"),
        Err(LottoError::CorruptRecord { .. })
    ));
}

#[test]
fn save_replaces_a_corrupt_record() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    fs::write(tmp.path().join("Lotto.db"), vec![b'j'; 4096]).unwrap();

    let batch = generate("Lotto", &RuleSpec::new(60, 6), 3, 5);
    store.save(&batch).unwrap();
    assert_eq!(store.load("Lotto").unwrap().lines, batch.lines);
}

#[test]
fn tampered_line_fails_checksum() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    let batch = generate("Lotto", &RuleSpec::new(60, 6), 3, 6);
    store.save(&batch).unwrap();

    let conn = Connection::open(tmp.path().join("Lotto.db")).unwrap();
    conn.execute("UPDATE lines SET main = '[1,2,3,4,5,6]' WHERE idx = 1", [])
        .unwrap();
    drop(conn);

    match store.load("Lotto") {
        Err(LottoError::CorruptRecord { reason, .. }) => assert!(reason.contains("checksum")),
        other => panic!("expected CorruptRecord, got {other:?}"),
    }
}

#[test]
fn null_secondary_marker_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    store
        .save(&generate("Lotto", &RuleSpec::new(60, 6), 2, 7))
        .unwrap();

    let conn = Connection::open(tmp.path().join("Lotto.db")).unwrap();
    conn.execute("UPDATE lines SET extra = NULL WHERE idx = 0", [])
        .unwrap();
    drop(conn);

    match store.load("Lotto") {
        Err(LottoError::CorruptRecord { reason, .. }) => {
            assert!(reason.contains("secondary marker"), "{reason}")
        }
        other => panic!("expected CorruptRecord, got {other:?}"),
    }
}

#[test]
fn missing_line_row_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    store
        .save(&generate("Lotto", &RuleSpec::new(60, 6), 4, 8))
        .unwrap();

    let conn = Connection::open(tmp.path().join("Lotto.db")).unwrap();
    conn.execute("DELETE FROM lines WHERE idx = 3", []).unwrap();
    drop(conn);

    assert!(matches!(
        store.load("Lotto"),
        Err(LottoError::CorruptRecord { .. })
    ));
}

#[test]
fn unknown_schema_version_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    store
        .save(&generate("Lotto", &RuleSpec::new(60, 6), 1, 9))
        .unwrap();

    let conn = Connection::open(tmp.path().join("Lotto.db")).unwrap();
    conn.execute("UPDATE record SET schema_version = 99", []).unwrap();
    drop(conn);

    match store.load("Lotto") {
        Err(LottoError::CorruptRecord { reason, .. }) => assert!(reason.contains("schema")),
        other => panic!("expected CorruptRecord, got {other:?}"),
    }
}

#[test]
fn record_copied_under_another_name_is_corrupt() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    store
        .save(&generate("Lotto", &RuleSpec::new(60, 6), 1, 10))
        .unwrap();
    fs::copy(tmp.path().join("Lotto.db"), tmp.path().join("Lotto6aus49.db")).unwrap();

    assert!(matches!(
        store.load("Lotto6aus49"),
        Err(LottoError::CorruptRecord { .. })
    ));
}

#[test]
fn inconsistent_batch_is_refused_and_prior_record_survives() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    let good = generate("Lotto", &RuleSpec::new(60, 6), 2, 11);
    store.save(&good).unwrap();

    let mut bad = generate("Lotto", &RuleSpec::new(60, 6), 3, 12);
    bad.line_count = 5;
    assert!(matches!(
        store.save(&bad),
        Err(LottoError::StoreWriteError { .. })
    ));
    assert_eq!(store.load("Lotto").unwrap().lines, good.lines);
}

#[test]
fn root_that_is_a_file_is_a_store_write_error() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("not-a-dir");
    fs::write(&root, b"occupied").unwrap();
    let store = BatchStore::new(Store::new(&root));

    let result = store.save(&generate("Lotto", &RuleSpec::new(60, 6), 2, 13));
    assert!(matches!(result, Err(LottoError::StoreWriteError { .. })));
    assert_eq!(fs::read(&root).unwrap(), b"occupied");
}

#[test]
fn failed_replace_leaves_no_temp_files_behind() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    // A directory at the record path cannot be replaced by a file.
    fs::create_dir_all(tmp.path().join("Lotto.db").join("inner")).unwrap();

    let result = store.save(&generate("Lotto", &RuleSpec::new(60, 6), 4, 14));
    assert!(matches!(result, Err(LottoError::StoreWriteError { .. })));
    assert_eq!(
        dir_listing(tmp.path()),
        vec!["Lotto.db", "store.events.jsonl"]
    );
    assert!(tmp.path().join("Lotto.db").join("inner").is_dir());
}

#[test]
fn concurrent_savers_resolve_to_one_complete_record() {
    let tmp = tempdir().unwrap();
    let spec = RuleSpec::new(60, 6);
    let first: Vec<Batch> = (0..40).map(|i| generate("Lotto", &spec, 3, 100 + i)).collect();
    let second: Vec<Batch> = (0..40).map(|i| generate("Lotto", &spec, 5, 200 + i)).collect();

    std::thread::scope(|scope| {
        for batches in [&first, &second] {
            let store = BatchStore::new(Store::new(tmp.path()));
            scope.spawn(move || {
                for batch in batches {
                    store.save(batch).expect("concurrent save");
                }
            });
        }
        let reader = BatchStore::new(Store::new(tmp.path()));
        scope.spawn(move || {
            for _ in 0..200 {
                match reader.load("Lotto") {
                    Ok(batch) => assert!(batch.line_count == 3 || batch.line_count == 5),
                    Err(LottoError::NoSuchRecord(_)) => {}
                    Err(e) => panic!("reader saw a damaged record: {e}"),
                }
            }
        });
    });

    let last = BatchStore::new(Store::new(tmp.path())).load("Lotto").unwrap();
    assert!(
        last.lines == first[39].lines || last.lines == second[39].lines,
        "final record must be one writer's last save"
    );
    assert_eq!(
        dir_listing(tmp.path()),
        vec!["Lotto.db", "store.events.jsonl"]
    );
}

#[test]
fn mutations_are_journaled_and_reads_are_not() {
    let tmp = tempdir().unwrap();
    let root = Store::new(tmp.path());
    let store = BatchStore::new(root.clone());
    store
        .save(&generate("Lotto", &RuleSpec::new(60, 6), 1, 15))
        .unwrap();
    store.load("Lotto").unwrap();
    assert!(!store.delete("EuroMillions").unwrap());
    assert!(store.delete("Lotto").unwrap());

    let events = broker::read_events(&root.events_path()).unwrap();
    let ops: Vec<(&str, &str)> = events
        .iter()
        .map(|e| (e.op.as_str(), e.status.as_str()))
        .collect();
    assert_eq!(
        ops,
        vec![("batch.save", "success"), ("batch.delete", "success")]
    );
    assert!(events.iter().all(|e| e.variant == "Lotto"));
}

#[test]
fn stored_checksum_matches_lines() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    let batch = generate("Lotto", &RuleSpec::new(60, 6), 3, 16);
    store.save(&batch).unwrap();

    let conn = Connection::open(tmp.path().join("Lotto.db")).unwrap();
    let checksum: String = conn
        .query_row("SELECT checksum FROM record", [], |r| r.get(0))
        .unwrap();
    assert_eq!(checksum, hash_lines(&batch.lines).unwrap());
    let extra: String = conn
        .query_row("SELECT extra FROM lines WHERE idx = 0", [], |r| r.get(0))
        .unwrap();
    assert_eq!(extra, "[]");
}

#[test]
fn invalid_variant_key_is_rejected() {
    let tmp = tempdir().unwrap();
    let store = BatchStore::new(Store::new(tmp.path()));
    assert!(matches!(
        store.load("../escape"),
        Err(LottoError::InvalidVariantKey(_))
    ));
    assert!(matches!(
        store.delete("a/b"),
        Err(LottoError::InvalidVariantKey(_))
    ));
}
