use crossbeam_utils::thread;
use mini_kv::{KvEngine, KvStore};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// Should get previously stored value
#[test]
fn get_stored_value() {
    let store = KvStore::new();

    store.set("key1".to_owned(), "value1".to_owned());
    store.set("key2".to_owned(), "value2".to_owned());

    assert_eq!(store.get("key1"), Some("value1".to_owned()));
    assert_eq!(store.get("key2"), Some("value2".to_owned()));
    assert_eq!(store.len(), 2);
}

// Should overwrite existent value
#[test]
fn overwrite_value() {
    let store = KvStore::new();

    store.set("key1".to_owned(), "value1".to_owned());
    assert_eq!(store.get("key1"), Some("value1".to_owned()));
    store.set("key1".to_owned(), "value2".to_owned());
    assert_eq!(store.get("key1"), Some("value2".to_owned()));
    assert_eq!(store.len(), 1);
}

// Should get `None` when getting a non-existent key
#[test]
fn get_non_existent_value() {
    let store = KvStore::new();

    store.set("key1".to_owned(), "value1".to_owned());
    assert_eq!(store.get("key2"), None);
}

#[test]
fn remove_key() {
    let store = KvStore::new();

    store.set("key1".to_owned(), "value1".to_owned());
    assert!(store.remove("key1"));
    assert_eq!(store.get("key1"), None);
    assert!(store.is_empty());
}

#[test]
fn remove_non_existent_key() {
    let store = KvStore::new();

    assert!(!store.remove("key1"));
    store.set("key1".to_owned(), "value1".to_owned());
    assert!(store.remove("key1"));
    assert!(!store.remove("key1"));
}

#[test]
fn clones_share_entries() {
    let store = KvStore::new();
    let handle = store.clone();

    handle.set("key1".to_owned(), "value1".to_owned());
    assert_eq!(store.get("key1"), Some("value1".to_owned()));
}

#[test]
fn concurrent_inserts_are_not_lost() {
    const THREADS: usize = 8;
    const KEYS_PER_THREAD: usize = 10_000;
    let store = KvStore::new();

    thread::scope(|s| {
        for t in 0..THREADS {
            let store = store.clone();
            s.spawn(move |_| {
                for i in 0..KEYS_PER_THREAD {
                    store.set(format!("k{}", t * KEYS_PER_THREAD + i), format!("v{}", i));
                }
            });
        }
    })
    .unwrap();

    assert_eq!(store.len(), THREADS * KEYS_PER_THREAD);
    for t in 0..THREADS {
        let last = t * KEYS_PER_THREAD + KEYS_PER_THREAD - 1;
        assert_eq!(
            store.get(&format!("k{}", last)),
            Some(format!("v{}", KEYS_PER_THREAD - 1))
        );
    }
}

// Every thread hammers the same key with random sets and removes. Whatever order the store
// picked, the operation applied last is the last operation of one of the threads, so the
// final state must match one thread's final operation.
#[test]
fn same_key_ends_in_some_threads_final_state() {
    const THREADS: u64 = 6;
    const OPS: usize = 2_000;
    let store = KvStore::new();

    let finals: Vec<Option<String>> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let store = store.clone();
                s.spawn(move |_| {
                    let mut rng = SmallRng::seed_from_u64(t);
                    let mut last = None;
                    for i in 0..OPS {
                        if rng.gen_bool(0.7) {
                            let value = format!("t{}-{}", t, i);
                            store.set("shared".to_owned(), value.clone());
                            last = Some(value);
                        } else {
                            store.remove("shared");
                            last = None;
                        }
                    }
                    last
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap();

    let end = store.get("shared");
    assert!(finals.contains(&end), "{:?} is not in {:?}", end, finals);
}
