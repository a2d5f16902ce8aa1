//! Cursor: detached, fail-fast traversal with removal.
//!
//! A `Cursor` owns no borrow of its map. It records the map's owner token
//! and mutation counter when created and takes the map on every call, so
//! the map may be mutated between calls; any structural change other than
//! `Cursor::remove` is then reported as `MapError::ConcurrentModification`.

use crate::bucket::EntryId;
use crate::error::MapError;
use crate::map::HashMap;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Identity of one map instance. Clones get a fresh token.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Owner(usize);

impl Owner {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        Owner(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Remove-capable cursor over a [`HashMap`], visiting entries in bucket
/// order.
///
/// ```
/// use treebin_map::HashMap;
///
/// let mut map: HashMap<u32, &str> = (0..6).map(|k| (k, "v")).collect();
/// let mut cursor = map.cursor();
/// while cursor.has_next() {
///     let (&k, _) = cursor.next(&map).unwrap();
///     if k % 2 == 0 {
///         cursor.remove(&mut map).unwrap();
///     }
/// }
/// assert_eq!(map.len(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct Cursor {
    owner: Owner,
    expected_mod_count: usize,
    /// Slot holding `next`.
    index: usize,
    next: Option<EntryId>,
    /// Entry returned by the last `next`, cleared by `remove`.
    current: Option<EntryId>,
}

impl Cursor {
    pub(crate) fn new<K, V, S>(map: &HashMap<K, V, S>) -> Self {
        let first = map.table.first_from(0);
        Self {
            owner: map.owner,
            expected_mod_count: map.table.mod_count,
            index: first.map_or(0, |(i, _)| i),
            next: first.map(|(_, id)| id),
            current: None,
        }
    }

    /// Whether another entry remains. Does not detect modification.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Returns the next entry.
    ///
    /// Fails with `ConcurrentModification` if the map changed structurally
    /// since this cursor last synchronised, and `NoSuchElement` once
    /// exhausted.
    pub fn next<'m, K, V, S>(
        &mut self,
        map: &'m HashMap<K, V, S>,
    ) -> Result<(&'m K, &'m V), MapError> {
        self.check(map)?;
        let id = self.next.ok_or(MapError::NoSuchElement)?;
        let table = &map.table;
        let e = table
            .entries
            .get(id)
            .ok_or(MapError::ConcurrentModification)?;
        let succ = table.successor(self.index, id);
        self.index = succ.map_or(table.buckets.len(), |(i, _)| i);
        self.next = succ.map(|(_, n)| n);
        self.current = Some(id);
        Ok((&e.key, &e.value))
    }

    /// Removes the entry last returned by `next` and resynchronises with
    /// the map. Other entries keep their slot positions, so the traversal
    /// continues where it was.
    pub fn remove<K, V, S>(&mut self, map: &mut HashMap<K, V, S>) -> Result<(K, V), MapError> {
        let id = self.current.ok_or(MapError::IllegalState)?;
        self.check(map)?;
        self.current = None;
        let kv = map.table.remove_id(id, false);
        self.expected_mod_count = map.table.mod_count;
        Ok(kv)
    }

    fn check<K, V, S>(&self, map: &HashMap<K, V, S>) -> Result<(), MapError> {
        if map.owner != self.owner {
            Err(MapError::WrongMap)
        } else if map.table.mod_count != self.expected_mod_count {
            Err(MapError::ConcurrentModification)
        } else {
            Ok(())
        }
    }
}
