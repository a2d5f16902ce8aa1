//! HashMap: public surface over `RawTable`.
//!
//! This layer hashes keys, normalizes the hash, and turns the table's
//! find/insert/remove primitives into the keyed operations. It is the only
//! place that calls user closures.

use crate::bucket::EntryId;
use crate::config::Config;
use crate::cursor::{Cursor, Owner};
use crate::error::MapError;
use crate::hash::{spread, NormHash};
use crate::iter::{IntoIter, Iter, IterMut, Keys, Values, ValuesMut};
use crate::raw::RawTable;
use crate::split_cursor::SplitCursor;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;
use hashbrown::hash_map::DefaultHashBuilder;

/// Separately chained hash map whose crowded slots become red-black trees.
///
/// Keys need only `Eq + Hash`; entries sharing a tree slot are ordered by
/// hash with insertion identity as the tie-break, so heavy collisions cost
/// `O(log n)` per lookup only when the hashes differ.
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    hasher: S,
    pub(crate) table: RawTable<K, V>,
    pub(crate) owner: Owner,
}

impl<K, V> HashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Sizes the first allocation to the power of two at or above
    /// `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    /// Builds a map from an explicit [`Config`]; rejects invalid load
    /// factors.
    pub fn with_config(config: Config) -> Result<Self, MapError> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(hasher, Config::new())
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::from_parts(hasher, Config::new().initial_capacity(capacity))
    }

    pub fn with_config_and_hasher(config: Config, hasher: S) -> Result<Self, MapError> {
        config.validate()?;
        Ok(Self::from_parts(hasher, config))
    }

    fn from_parts(hasher: S, config: Config) -> Self {
        Self {
            hasher,
            table: RawTable::new(config),
            owner: Owner::fresh(),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Number of bucket slots, or the size the first insert will allocate.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load_factor(&self) -> f32 {
        self.table.config.get_load_factor()
    }

    /// Removes every entry but keeps the bucket array.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Grows the table so `additional` more entries fit without a resize.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.table)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.entries.iter_mut(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Detached cursor that can remove the entry it last returned.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self)
    }

    /// Detached, splittable cursor over the whole table.
    pub fn split_cursor(&self) -> SplitCursor {
        SplitCursor::new(self)
    }

    /// Whether some entry holds `value`. Linear in capacity.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.values().any(|v| v == value)
    }

    /// Calls `f` on every entry in table order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (k, v) in self.iter() {
            f(k, v);
        }
    }

    /// Replaces every value with `f(key, old)`. Not a structural change.
    pub fn replace_all<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &V) -> V,
    {
        let mut cur = self.table.first_from(0);
        while let Some((index, id)) = cur {
            let e = self.table.entry_mut(id);
            e.value = f(&e.key, &e.value);
            cur = self.table.successor(index, id);
        }
    }

    /// Keeps only the entries for which `f` returns true.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut cur = self.table.first_from(0);
        while let Some((index, id)) = cur {
            cur = self.table.successor(index, id);
            let e = self.table.entry_mut(id);
            if !f(&e.key, &mut e.value) {
                self.table.remove_id(id, false);
            }
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> NormHash
    where
        Q: ?Sized + Hash,
    {
        spread(self.hasher.hash_one(q))
    }

    fn find<Q>(&self, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.find(self.make_hash(key), key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).map(|id| &self.table.entry(id).value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find(key)?;
        Some(&mut self.table.entry_mut(id).value)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).map(|id| {
            let e = self.table.entry(id);
            (&e.key, &e.value)
        })
    }

    /// The mapped value, or `default` when `key` is absent.
    pub fn get_or<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).unwrap_or(default)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(key).is_some()
    }

    /// Maps `key` to `value` and returns the previous value. Updating an
    /// existing key keeps the stored key and is not a structural change.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.make_hash(&key);
        match self.table.find(hash, &key) {
            Some(id) => Some(core::mem::replace(
                &mut self.table.entry_mut(id).value,
                value,
            )),
            None => {
                self.table.insert_new(hash, key, value);
                None
            }
        }
    }

    /// Inserts only when `key` is absent. Returns the value already mapped,
    /// leaving it untouched, or `None` after inserting.
    pub fn insert_if_absent(&mut self, key: K, value: V) -> Option<&V> {
        let hash = self.make_hash(&key);
        if let Some(id) = self.table.find(hash, &key) {
            return Some(&self.table.entry(id).value);
        }
        self.table.insert_new(hash, key, value);
        None
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find(key)?;
        Some(self.table.remove_id(id, true))
    }

    /// Removes `key` only while it maps to a value equal to `expected`.
    pub fn remove_if_eq<Q>(&mut self, key: &Q, expected: &V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        match self.find(key) {
            Some(id) if self.table.entry(id).value == *expected => {
                self.table.remove_id(id, true);
                true
            }
            _ => false,
        }
    }

    /// Overwrites the value of a present key; absent keys are left absent.
    pub fn replace<Q>(&mut self, key: &Q, value: V) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.find(key)?;
        Some(core::mem::replace(
            &mut self.table.entry_mut(id).value,
            value,
        ))
    }

    /// Overwrites the value only while it equals `expected`.
    pub fn replace_if_eq<Q>(&mut self, key: &Q, expected: &V, value: V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: PartialEq,
    {
        match self.find(key) {
            Some(id) if self.table.entry(id).value == *expected => {
                self.table.entry_mut(id).value = value;
                true
            }
            _ => false,
        }
    }

    /// Returns the value for `key`, computing and inserting it when absent.
    /// When `f` declines (`None`) nothing is inserted.
    pub fn compute_if_absent<F>(&mut self, key: K, f: F) -> Option<&mut V>
    where
        F: FnOnce(&K) -> Option<V>,
    {
        let hash = self.make_hash(&key);
        let id = match self.table.find(hash, &key) {
            Some(id) => id,
            None => {
                let value = f(&key)?;
                self.table.insert_new(hash, key, value)
            }
        };
        Some(&mut self.table.entry_mut(id).value)
    }

    /// Recomputes the value of a present key. `None` from `f` removes the
    /// entry.
    pub fn compute_if_present<Q, F>(&mut self, key: &Q, f: F) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&K, &V) -> Option<V>,
    {
        let id = self.find(key)?;
        let e = self.table.entry(id);
        let next = f(&e.key, &e.value);
        self.apply(id, next)
    }

    /// Computes a new mapping from the current one (`None` when absent).
    /// `None` from `f` removes the entry, or leaves the key absent.
    pub fn compute<F>(&mut self, key: K, f: F) -> Option<&mut V>
    where
        F: FnOnce(&K, Option<&V>) -> Option<V>,
    {
        let hash = self.make_hash(&key);
        match self.table.find(hash, &key) {
            Some(id) => {
                let e = self.table.entry(id);
                let next = f(&e.key, Some(&e.value));
                self.apply(id, next)
            }
            None => {
                let value = f(&key, None)?;
                let id = self.table.insert_new(hash, key, value);
                Some(&mut self.table.entry_mut(id).value)
            }
        }
    }

    /// Inserts `value` when `key` is absent, otherwise combines it with the
    /// current value through `f`. `None` from `f` removes the entry.
    pub fn merge<F>(&mut self, key: K, value: V, f: F) -> Option<&mut V>
    where
        F: FnOnce(&V, V) -> Option<V>,
    {
        let hash = self.make_hash(&key);
        match self.table.find(hash, &key) {
            Some(id) => {
                let next = f(&self.table.entry(id).value, value);
                self.apply(id, next)
            }
            None => {
                let id = self.table.insert_new(hash, key, value);
                Some(&mut self.table.entry_mut(id).value)
            }
        }
    }

    /// Stores a computed value in place, or removes the entry on `None`.
    fn apply(&mut self, id: EntryId, value: Option<V>) -> Option<&mut V> {
        match value {
            Some(v) => {
                let slot = &mut self.table.entry_mut(id).value;
                *slot = v;
                Some(slot)
            }
            None => {
                self.table.remove_id(id, true);
                None
            }
        }
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> Clone for HashMap<K, V, S>
where
    K: Clone,
    V: Clone,
    S: Clone,
{
    /// Copies the structure as is; the copy gets its own cursor identity.
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            table: self.table.clone(),
            owner: Owner::fresh(),
        }
    }
}

impl<K, V, S> fmt::Debug for HashMap<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for HashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Eq + Hash,
    S: BuildHasher,
{
    type Output = V;

    /// Panics when `key` is absent.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in HashMap")
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S> Extend<(&'a K, &'a V)> for HashMap<K, V, S>
where
    K: Eq + Hash + Copy,
    V: Copy,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(&k, &v)| (k, v)));
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            inner: self.table.entries.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::Slot;
    use crate::test_hasher::{ConstState, IdentityState};

    fn identity_map(capacity: usize) -> HashMap<u32, u32, IdentityState> {
        HashMap::with_capacity_and_hasher(capacity, IdentityState)
    }

    /// Invariant: default sizing grows 16 -> 32 on the 13th distinct key.
    #[test]
    fn grows_on_thirteenth_key() {
        let mut m: HashMap<u32, u32> = HashMap::new();
        for k in 0..12 {
            m.insert(k, k);
        }
        assert_eq!((m.capacity(), m.table.threshold), (16, 12));
        m.insert(12, 12);
        assert_eq!((m.capacity(), m.table.threshold), (32, 24));
        assert_eq!(m.len(), 13);
        assert!((0..13).all(|k| m.get(&k) == Some(&k)));
    }

    /// Invariant: nine keys colliding at capacity 64 turn the slot into a
    /// tree, and each is still found.
    #[test]
    fn colliding_keys_treeify() {
        let mut m = identity_map(64);
        for k in 0..9u32 {
            assert_eq!(m.insert(k * 64, k), None);
        }
        assert_eq!(m.capacity(), 64);
        assert!(matches!(m.table.slot(0), Slot::Tree(_)));
        assert!((0..9).all(|k| m.get(&(k * 64)) == Some(&k)));
        m.table.check_invariants().unwrap();
    }

    /// Invariant: the same collisions in a 16-slot table grow it to 64
    /// before any tree is built.
    #[test]
    fn small_table_grows_before_treeify() {
        let mut m = identity_map(16);
        for k in 0..9u32 {
            m.insert(k * 64, k);
        }
        assert_eq!(m.capacity(), 64);
        assert!((0..9).all(|k| m.contains_key(&(k * 64))));
        m.table.check_invariants().unwrap();
    }

    /// Invariant: removing down to six entries turns the tree back into a
    /// chain with every survivor reachable.
    #[test]
    fn removals_untreeify() {
        let mut m = identity_map(64);
        for k in 0..10u32 {
            m.insert(k * 64, k);
        }
        assert!(matches!(m.table.slot(0), Slot::Tree(_)));
        for k in 0..4u32 {
            assert_eq!(m.remove(&(k * 64)), Some(k));
        }
        assert!(matches!(m.table.slot(0), Slot::Chain(_)));
        assert!((4..10).all(|k| m.get(&(k * 64)) == Some(&k)));
        m.table.check_invariants().unwrap();
    }

    /// Invariant: draining a tree slot one key at a time keeps it a tree
    /// above six entries, a chain at or below, and every survivor findable.
    #[test]
    fn draining_tree_slot_reverts_at_six() {
        let mut m = identity_map(64);
        for k in 0..12u32 {
            m.insert(k * 64, k);
        }
        for k in 0..12u32 {
            m.remove(&(k * 64));
            match (m.len(), m.table.slot(0)) {
                (0, slot) => assert_eq!(slot, Slot::Empty),
                (1..=6, slot) => assert!(matches!(slot, Slot::Chain(_))),
                (_, slot) => assert!(matches!(slot, Slot::Tree(_))),
            }
            assert!((k + 1..12).all(|j| m.get(&(j * 64)) == Some(&j)));
            m.table.check_invariants().unwrap();
        }
    }

    /// Invariant: keys with identical hashes still resolve by equality once
    /// treeified.
    #[test]
    fn equal_hashes_resolve_by_equality() {
        let mut m = HashMap::with_capacity_and_hasher(64, ConstState);
        for k in 0..40u32 {
            m.insert(k, k * 10);
        }
        assert!((0..40).all(|k| m.get(&k) == Some(&(k * 10))));
        assert_eq!(m.get(&40), None);
        for k in (0..40u32).step_by(3) {
            assert_eq!(m.remove(&k), Some(k * 10));
            m.table.check_invariants().unwrap();
        }
        assert_eq!(m.len(), 26);
    }

    /// Invariant: value updates do not bump the mutation counter.
    #[test]
    fn value_update_is_not_structural() {
        let mut m: HashMap<u32, u32> = HashMap::new();
        m.insert(1, 1);
        let mc = m.table.mod_count;
        m.insert(1, 2);
        m.replace(&1, 3);
        m.replace_if_eq(&1, &3, 4);
        m.replace_all(|_, v| v + 1);
        *m.get_mut(&1).unwrap() += 1;
        m.merge(1, 1, |a, b| Some(a + b));
        assert_eq!(m.table.mod_count, mc);
        assert_eq!(m[&1], 7);
    }

    #[test]
    fn compute_family() {
        let mut m: HashMap<&str, i32> = HashMap::new();
        assert_eq!(m.compute_if_absent("a", |_| Some(1)).copied(), Some(1));
        assert_eq!(m.compute_if_absent("a", |_| Some(9)).copied(), Some(1));
        assert_eq!(m.compute_if_absent("b", |_| None), None);
        assert!(!m.contains_key("b"));

        assert_eq!(m.compute_if_present("a", |_, v| Some(v + 1)).copied(), Some(2));
        assert_eq!(m.compute_if_present("zz", |_, v| Some(v + 1)), None);
        assert_eq!(m.compute_if_present("a", |_, _| None), None);
        assert!(m.is_empty());

        assert_eq!(m.compute("c", |_, old| Some(old.map_or(10, |v| v * 2))).copied(), Some(10));
        assert_eq!(m.compute("c", |_, old| Some(old.map_or(10, |v| v * 2))).copied(), Some(20));
        assert_eq!(m.compute("c", |_, _| None), None);
        assert_eq!(m.compute("d", |_, _| None), None);
        assert!(m.is_empty());

        assert_eq!(m.merge("e", 5, |a, b| Some(a + b)).copied(), Some(5));
        assert_eq!(m.merge("e", 5, |a, b| Some(a + b)).copied(), Some(10));
        assert_eq!(m.merge("e", 5, |_, _| None), None);
        assert!(m.is_empty());
    }

    #[test]
    fn conditional_operations() {
        let mut m: HashMap<u32, &str> = HashMap::new();
        assert_eq!(m.insert_if_absent(1, "a"), None);
        assert_eq!(m.insert_if_absent(1, "b"), Some(&"a"));
        assert_eq!(m.replace(&2, "x"), None);
        assert!(!m.contains_key(&2));
        assert!(!m.replace_if_eq(&1, &"b", "c"));
        assert!(m.replace_if_eq(&1, &"a", "c"));
        assert!(!m.remove_if_eq(&1, &"a"));
        assert!(m.remove_if_eq(&1, &"c"));
        assert_eq!(m.get_or(&1, &"dflt"), &"dflt");
    }

    /// Invariant: retain removes without reordering, so it can run over
    /// a tree slot while walking it.
    #[test]
    fn retain_over_tree_slot() {
        let mut m = identity_map(64);
        for k in 0..30u32 {
            m.insert(k * 64, k);
        }
        m.retain(|_, v| *v % 3 != 0);
        assert_eq!(m.len(), 20);
        assert!(m.iter().all(|(_, v)| v % 3 != 0));
        m.table.check_invariants().unwrap();
    }

    #[test]
    fn clear_keeps_capacity_and_accepts_inserts() {
        let mut m: HashMap<u32, u32> = (0..100).map(|k| (k, k)).collect();
        let cap = m.capacity();
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
        m.insert(5, 5);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn rejects_bad_load_factor() {
        for lf in [0.0f32, -1.0, f32::NAN, f32::INFINITY] {
            let r: Result<HashMap<u32, u32>, _> =
                HashMap::with_config(Config::new().load_factor(lf));
            assert!(matches!(r, Err(MapError::InvalidArgument(_))));
        }
        let m: HashMap<u32, u32> =
            HashMap::with_config(Config::new().initial_capacity(100).load_factor(0.5)).unwrap();
        assert_eq!((m.capacity(), m.load_factor()), (128, 0.5));
    }

    #[test]
    fn equality_ignores_order_and_capacity() {
        let a: HashMap<u32, u32> = (0..20).map(|k| (k, k)).collect();
        let mut b: HashMap<u32, u32> = HashMap::with_capacity(1024);
        b.extend((0..20).rev().map(|k| (k, k)));
        assert_eq!(a, b);
        b.insert(0, 1);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }
}
