// HashMap integration suite.
//
// Each test documents the behavior verified and the invariants assumed.
// The core invariants exercised:
// - Keyed semantics: insert/get/remove agree with a plain map regardless
//   of how keys collide.
// - Growth: capacity stays a power of two and doubles when the entry count
//   passes capacity * load factor.
// - Collisions: keys piled into one slot stay reachable through treeify,
//   resize splits and untreeify.
// - Surface: trait impls (Debug, Clone, Eq, Index, Extend, FromIterator)
//   behave like std's HashMap.
use std::hash::{BuildHasher, Hasher};
use treebin_map::{Config, HashMap, MapError};

// Hashes an integer key to itself so tests can steer keys into slots.
#[derive(Clone, Copy, Default)]
struct Identity;
struct IdentityHasher(u64);
impl BuildHasher for Identity {
    type Hasher = IdentityHasher;
    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher(0)
    }
}
impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }
    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }
    fn finish(&self) -> u64 {
        self.0
    }
}

// Key whose hash is chosen by the test but whose equality is by `id`, to
// force many distinct keys onto one hash.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Colliding {
    id: u32,
    hash: u32,
}
impl std::hash::Hash for Colliding {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

// Test: basic put/get/remove.
// Verifies: insert returns the previous value; remove returns the value
// and leaves the key absent.
#[test]
fn insert_get_remove() {
    let mut m = HashMap::new();
    assert_eq!(m.insert("a".to_string(), 1), None);
    assert_eq!(m.insert("b".to_string(), 2), None);
    assert_eq!(m.insert("a".to_string(), 3), Some(1));
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&3));
    assert_eq!(m.remove("a"), Some(3));
    assert_eq!(m.get("a"), None);
    assert_eq!(m.remove("a"), None);
    assert_eq!(m.len(), 1);
}

// Test: default growth schedule.
// Assumes: default capacity 16 and load factor 0.75.
// Verifies: the 13th distinct key doubles capacity; all keys survive.
#[test]
fn default_growth_schedule() {
    let mut m: HashMap<u32, u32> = HashMap::new();
    assert_eq!(m.capacity(), 16);
    for k in 0..12 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), 16);
    m.insert(12, 12);
    assert_eq!(m.capacity(), 32);
    for k in 13..1000 {
        m.insert(k, k);
    }
    assert!(m.capacity().is_power_of_two());
    assert!(m.len() as f32 <= m.capacity() as f32 * m.load_factor());
    assert!((0..1000).all(|k| m[&k] == k));
}

// Test: many keys with one hash.
// Assumes: identical hashes are told apart only by equality.
// Verifies: every key remains reachable while inserting and removing.
#[test]
fn identical_hashes_stay_reachable() {
    let mut m = HashMap::new();
    let key = |id| Colliding { id, hash: 7 };
    for id in 0..200 {
        m.insert(key(id), id);
    }
    assert_eq!(m.len(), 200);
    for id in 0..200 {
        assert_eq!(m.get(&key(id)), Some(&id));
    }
    for id in (0..200).filter(|id| id % 2 == 1) {
        assert_eq!(m.remove(&key(id)), Some(id));
    }
    for id in 0..200 {
        assert_eq!(m.contains_key(&key(id)), id % 2 == 0);
    }
}

// Test: slot collisions with distinct hashes.
// Assumes: identity hashing puts multiples of 64 in slot 0 at capacity 64.
// Verifies: nine such keys are all found; growing then splits them.
#[test]
fn slot_collisions_survive_growth() {
    let mut m = HashMap::with_capacity_and_hasher(64, Identity);
    for k in 0..9u32 {
        m.insert(k * 64, k);
    }
    assert_eq!(m.capacity(), 64);
    for k in 0..9u32 {
        assert_eq!(m.get(&(k * 64)), Some(&k));
    }
    for k in 1000..1100u32 {
        m.insert(k, k);
    }
    assert!(m.capacity() >= 256);
    for k in 0..9u32 {
        assert_eq!(m.get(&(k * 64)), Some(&k));
    }
}

// Test: shrinking a crowded slot.
// Verifies: after removals the survivors are still found and iteration
// yields exactly them.
#[test]
fn removals_in_crowded_slot() {
    let mut m = HashMap::with_capacity_and_hasher(64, Identity);
    for k in 0..10u32 {
        m.insert(k * 64, k);
    }
    for k in 0..4u32 {
        assert_eq!(m.remove(&(k * 64)), Some(k));
    }
    let mut left: Vec<u32> = m.values().copied().collect();
    left.sort_unstable();
    assert_eq!(left, (4..10).collect::<Vec<_>>());
}

// Test: construction parameters.
// Verifies: invalid load factors are rejected with InvalidArgument; a
// requested capacity rounds up to a power of two.
#[test]
fn config_validation() {
    let err = HashMap::<u32, u32>::with_config(Config::new().load_factor(f32::NAN)).unwrap_err();
    assert!(matches!(err, MapError::InvalidArgument(_)));
    assert!(HashMap::<u32, u32>::with_config(Config::new().load_factor(-0.5)).is_err());
    let m = HashMap::<u32, u32>::with_capacity(17);
    assert_eq!(m.capacity(), 32);
    let m = HashMap::<u32, u32>::with_config(Config::new().load_factor(4.0)).unwrap();
    assert_eq!(m.load_factor(), 4.0);
}

// Test: a high load factor lets chains grow long before any resize.
// Assumes: identity hashing spreads keys 0..60 evenly over 16 slots.
// Verifies: 60 keys fit in 16 slots and stay reachable.
#[test]
fn high_load_factor_defers_growth() {
    let mut m = HashMap::with_config_and_hasher(Config::new().load_factor(4.0), Identity).unwrap();
    for k in 0..60u32 {
        m.insert(k, k * 2);
    }
    assert_eq!(m.capacity(), 16);
    assert!((0..60).all(|k| m.get(&k) == Some(&(k * 2))));
}

// Test: a tiny load factor.
// Assumes: floor(capacity * 0.01) is zero below capacity 128.
// Verifies: growth settles once the threshold becomes nonzero; 12 keys end
// in 2048 slots instead of doubling on every insert.
#[test]
fn tiny_load_factor_growth_is_bounded() {
    let mut m = HashMap::with_config_and_hasher(Config::new().load_factor(0.01), Identity).unwrap();
    for k in 0..12u32 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), 2048);
    assert!((0..12).all(|k| m.get(&k) == Some(&k)));
}

// Test: draining a crowded slot through a cursor, then refilling it.
// Assumes: capacity 64 with identity hashing puts every k * 64 in slot 0,
// which is a tree.
// Verifies: cursor removals down to a single entry leave a slot that takes
// new keys and finds every survivor.
#[test]
fn cursor_drain_then_refill_crowded_slot() {
    let mut m = HashMap::with_capacity_and_hasher(64, Identity);
    for k in 0..20u32 {
        m.insert(k * 64, k);
    }
    let mut c = m.cursor();
    while m.len() > 1 {
        c.next(&m).unwrap();
        c.remove(&mut m).unwrap();
    }
    let last = *m.keys().next().unwrap();
    for k in 20..30u32 {
        m.insert(k * 64, k);
    }
    assert_eq!(m.len(), 11);
    assert_eq!(m.get(&last), Some(&(last / 64)));
    assert!((20..30).all(|k| m.get(&(k * 64)) == Some(&k)));
}

// Test: value-level queries.
#[test]
fn value_queries() {
    let mut m: HashMap<&str, i32> = HashMap::new();
    m.insert("x", 1);
    m.insert("y", 2);
    assert!(m.contains_value(&2));
    assert!(!m.contains_value(&3));
    assert_eq!(m.get_or(&"z", &-1), &-1);
    assert_eq!(m.get_key_value(&"x"), Some((&"x", &1)));
    let mut total = 0;
    m.for_each(|_, v| total += v);
    assert_eq!(total, 3);
    m.replace_all(|k, v| if *k == "x" { v * 10 } else { *v });
    assert_eq!(m[&"x"], 10);
}

// Test: trait surface.
// Verifies: Debug prints entries; clones compare equal and are
// independent; Extend over references copies entries.
#[test]
fn trait_surface() {
    let mut m: HashMap<u32, u32> = [(1, 10)].into_iter().collect();
    assert_eq!(format!("{m:?}"), "{1: 10}");
    let c = m.clone();
    assert_eq!(c, m);
    m.insert(2, 20);
    assert_ne!(c, m);
    let mut d: HashMap<u32, u32> = HashMap::default();
    let pairs: Vec<(u32, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
    d.extend(pairs.iter().map(|(k, v)| (k, v)));
    assert_eq!(d, m);
    for (_, v) in &mut d {
        *v += 1;
    }
    assert_eq!(d[&2], 21);
    let sum: u32 = (&d).into_iter().map(|(_, v)| v).sum();
    assert_eq!(sum, 32);
}

// Test: indexing a missing key panics like std's HashMap.
#[test]
#[should_panic(expected = "key not present")]
fn index_missing_panics() {
    let m: HashMap<u32, u32> = HashMap::new();
    let _ = m[&1];
}

// Test: clear.
// Verifies: entries drop, capacity stays, the map is reusable.
#[test]
fn clear_and_reuse() {
    let mut m: HashMap<u32, String> = (0..40).map(|k| (k, k.to_string())).collect();
    let cap = m.capacity();
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.capacity(), cap);
    assert_eq!(m.iter().next(), None);
    m.insert(3, "three".into());
    assert_eq!(m.get(&3).map(String::as_str), Some("three"));
}

// Test: reserve ahead of a bulk load.
// Verifies: no growth happens while inserting the reserved count.
#[test]
fn reserve_avoids_growth() {
    let mut m: HashMap<u32, u32> = HashMap::new();
    m.reserve(1000);
    let cap = m.capacity();
    for k in 0..1000 {
        m.insert(k, k);
    }
    assert_eq!(m.capacity(), cap);
}

// Test: insert_if_absent never overwrites.
// Verifies: the second call reports the existing value and leaves it.
#[test]
fn insert_if_absent_keeps_first() {
    let mut m = HashMap::new();
    assert_eq!(m.insert_if_absent("x", 1), None);
    assert_eq!(m.insert_if_absent("x", 2), Some(&1));
    assert_eq!(m.get("x"), Some(&1));
}

// Test: merge with a summing combiner.
// Verifies: absent keys take the given value; present ones accumulate.
#[test]
fn merge_sums() {
    let mut m = HashMap::new();
    assert_eq!(m.merge("k", 5, |a, b| Some(a + b)).copied(), Some(5));
    assert_eq!(m.merge("k", 5, |a, b| Some(a + b)).copied(), Some(10));
    assert_eq!(m["k"], 10);
}
