//! Integration tests for cache lookup and update

use lintcache::cache::{read_triplets, CacheStore, CacheUpdate, Triplet, UpdateOutcome};
use lintcache::entry::{parse, serialize, Entry};
use lintcache::error::CacheError;
use lintcache::record::{Field, Record};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write a cache file with the given raw content
fn create_cache(dir: &std::path::Path, content: &str) -> PathBuf {
    let path = dir.join(".lintcache");
    fs::write(&path, content).expect("Failed to write cache");
    path
}

fn unused_variable(line: i64) -> Record {
    Record::new()
        .with(Field::Code, "211")
        .with(Field::Name, "x")
        .with(Field::Line, line)
        .with(Field::Column, 7)
}

mod lookup {
    use super::*;
    use pretty_assertions::assert_eq;

    const TWO_ENTRIES: &str = "a.x\n100\nreturn {{[1]=\"err\",[3]=5},}\nb.x\n200\nreturn false\n";

    #[test]
    fn test_both_entries_fresh() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(create_cache(temp.path(), TWO_ENTRIES));

        let found = store.load([("a.x", 100), ("b.x", 200)]).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(
            found["a.x"],
            Entry::Results(vec![Record::new()
                .with(Field::Code, "err")
                .with(Field::Line, 5)])
        );
        assert_eq!(found["b.x"], Entry::Skipped);
    }

    #[test]
    fn test_mtime_mismatch_gives_no_entry() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(create_cache(temp.path(), TWO_ENTRIES));

        let found = store.load([("a.x", 999)]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_unrequested_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(create_cache(temp.path(), TWO_ENTRIES));

        let found = store.load([("b.x", 200), ("c.x", 1)]).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("b.x"));
    }

    #[test]
    fn test_cold_start_is_empty_not_error() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path().join("absent"));

        assert!(store.load([("a.x", 1)]).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_trailing_triplet_fails() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(create_cache(
            temp.path(),
            &format!("{}c.x\n300\n", TWO_ENTRIES),
        ));

        let result = store.load([("c.x", 300)]);
        assert!(matches!(result, Err(CacheError::MalformedTriplet { .. })));
    }

    #[test]
    fn test_disallowed_construct_fails() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(create_cache(
            temp.path(),
            "a.x\n1\nreturn {{io.open('/etc/passwd')}}\n",
        ));

        let result = store.load([("a.x", 1)]);
        assert!(matches!(result, Err(CacheError::InvalidBlob { .. })));
    }

    #[test]
    fn test_corrupt_blob_behind_stale_mtime_is_not_parsed() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(create_cache(temp.path(), "a.x\n1\nreturn {{\n"));

        // Only blobs whose mtime matches are parsed
        assert!(store.load([("a.x", 2)]).unwrap().is_empty());
        assert!(store.load([("a.x", 1)]).is_err());
    }
}

mod update {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_update_on_absent_cache() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".lintcache");
        let store = CacheStore::new(&path);

        let outcome = store
            .update(&[CacheUpdate::new("a.x", 100, Entry::Skipped)])
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Appended);
        assert!(outcome.is_append_only());
        assert_eq!(
            read_triplets(&path).unwrap(),
            vec![Triplet {
                filename: "a.x".to_string(),
                mtime: 100,
                blob: "return false".to_string(),
            }]
        );
    }

    #[test]
    fn test_append_keeps_old_triplets_byte_for_byte() {
        let temp = TempDir::new().unwrap();
        // Non-canonical but valid formatting must survive an append
        let original = "old.x\n5\nreturn { {[3] = 1} , }\n";
        let path = create_cache(temp.path(), original);
        let store = CacheStore::new(&path);

        let outcome = store
            .update(&[
                CacheUpdate::new("n1.x", 1, Entry::Results(vec![unused_variable(2)])),
                CacheUpdate::new("n2.x", 2, Entry::Skipped),
                CacheUpdate::new("n1.x", 9, Entry::Skipped),
            ])
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Appended);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(original));

        let filenames: Vec<String> = read_triplets(&path)
            .unwrap()
            .into_iter()
            .map(|t| t.filename)
            .collect();
        assert_eq!(filenames, vec!["old.x", "n1.x", "n2.x"]);

        let found = store.load([("n1.x", 1)]).unwrap();
        assert_eq!(found["n1.x"], Entry::Results(vec![unused_variable(2)]));
    }

    #[test]
    fn test_refresh_preserves_order_and_appends_new() {
        let temp = TempDir::new().unwrap();
        let path = create_cache(
            temp.path(),
            "a.x\n1\nreturn false\nb.x\n2\nreturn false\nc.x\n3\nreturn false\n",
        );
        let store = CacheStore::new(&path);

        let outcome = store
            .update(&[
                CacheUpdate::new("d.x", 4, Entry::Skipped),
                CacheUpdate::new("b.x", 20, Entry::Results(vec![unused_variable(1)])),
            ])
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Rewritten);
        let triplets = read_triplets(&path).unwrap();
        let summary: Vec<(&str, i64)> = triplets
            .iter()
            .map(|t| (t.filename.as_str(), t.mtime))
            .collect();
        assert_eq!(summary, vec![("a.x", 1), ("b.x", 20), ("c.x", 3), ("d.x", 4)]);
        assert_eq!(triplets[1].blob, serialize(&Entry::Results(vec![unused_variable(1)])));
    }

    #[test]
    fn test_identical_update_twice_gives_same_triplets() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".lintcache");
        let store = CacheStore::new(&path);
        let updates = vec![
            CacheUpdate::new("a.x", 1, Entry::Results(vec![unused_variable(3)])),
            CacheUpdate::new("b.x", 2, Entry::Skipped),
        ];

        assert!(store.update(&updates).unwrap().is_append_only());
        let first = read_triplets(&path).unwrap();

        let second_outcome = store.update(&updates).unwrap();
        assert!(!second_outcome.is_append_only());
        assert_eq!(read_triplets(&path).unwrap(), first);
    }

    #[test]
    fn test_updated_entries_are_found_again() {
        let temp = TempDir::new().unwrap();
        let store = CacheStore::new(temp.path().join(".lintcache"));
        let entry = Entry::Results(vec![
            unused_variable(1),
            Record::new()
                .with(Field::Code, "113")
                .with(Field::Name, "undefined_global")
                .with(Field::Global, true)
                .with(Field::Filtered111, false)
                .with(Field::InModule, true),
        ]);

        store
            .update(&[CacheUpdate::new("src/m.lua", 1_700_000_000, entry.clone())])
            .unwrap();

        let found = store.load([("src/m.lua", 1_700_000_000)]).unwrap();
        assert_eq!(found["src/m.lua"], entry);
    }
}

mod blobs {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_of_sparse_records() {
        let entry = Entry::Results(vec![
            Record::new().with(Field::InModule, true),
            Record::new()
                .with(Field::Code, "421")
                .with(Field::PrevLine, 3)
                .with(Field::PrevColumn, 9)
                .with(Field::Secondary, true),
            Record::new(),
        ]);

        let blob = serialize(&entry);
        assert_eq!(parse(&blob).unwrap(), entry);
    }

    #[test]
    fn test_absent_fields_stay_absent_after_round_trip() {
        let entry = Entry::Results(vec![Record::new().with(Field::Line, 10)]);
        let parsed = parse(&serialize(&entry)).unwrap();

        let record = &parsed.records()[0];
        assert_eq!(record.len(), 1);
        for field in Field::ALL {
            if field != Field::Line {
                assert!(record.get(field).is_none(), "{} should be absent", field);
            }
        }
    }
}
