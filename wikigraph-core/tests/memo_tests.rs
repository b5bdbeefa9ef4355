// Tests for the persistent memo map

use tempfile::TempDir;
use wikigraph_core::memo::MemoMap;

fn create_test_memo() -> (TempDir, MemoMap) {
    let temp_dir = TempDir::new().unwrap();
    let memo = MemoMap::open(temp_dir.path().join("memo.db")).unwrap();
    (temp_dir, memo)
}

#[test]
fn test_insert_and_get() {
    let (_temp_dir, memo) = create_test_memo();

    memo.insert("distances", &vec![1i64, 2, 3]).unwrap();
    let value: Option<Vec<i64>> = memo.get("distances").unwrap();
    assert_eq!(value, Some(vec![1, 2, 3]));
}

#[test]
fn test_get_missing_key() {
    let (_temp_dir, memo) = create_test_memo();

    let value: Option<String> = memo.get("absent").unwrap();
    assert_eq!(value, None);
}

#[test]
fn test_insert_replaces_existing() {
    let (_temp_dir, memo) = create_test_memo();

    memo.insert("k", &"first".to_string()).unwrap();
    memo.insert("k", &"second".to_string()).unwrap();

    let value: Option<String> = memo.get("k").unwrap();
    assert_eq!(value, Some("second".to_string()));
    assert_eq!(memo.len().unwrap(), 1);
}

#[test]
fn test_remove() {
    let (_temp_dir, memo) = create_test_memo();

    memo.insert("k", &42i64).unwrap();
    assert!(memo.remove("k").unwrap());
    assert!(!memo.remove("k").unwrap());
    assert!(memo.is_empty().unwrap());
}

#[test]
fn test_keys_and_len() {
    let (_temp_dir, memo) = create_test_memo();

    memo.insert("a", &1i64).unwrap();
    memo.insert("b", &2i64).unwrap();

    let mut keys = memo.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(memo.len().unwrap(), 2);
}

#[test]
fn test_reopen_persists_entries() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("memo.db");

    {
        let memo = MemoMap::open(&path).unwrap();
        memo.insert("k", &"kept".to_string()).unwrap();
    }

    // Open-or-create semantics: reopening an existing memo map is allowed.
    let memo = MemoMap::open(&path).unwrap();
    let value: Option<String> = memo.get("k").unwrap();
    assert_eq!(value, Some("kept".to_string()));
}
