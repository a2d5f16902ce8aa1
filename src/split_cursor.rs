//! SplitCursor: partitionable traversal over a range of bucket slots.
//!
//! The range end binds lazily on first use: at that point the cursor takes
//! the table length, the entry count as its size estimate, and the mutation
//! counter it will check. Splitting halves the remaining slot range and the
//! estimate. Halves own no borrow of the map, so they can be sent to other
//! threads and driven against a shared `&HashMap`.

use crate::bucket::EntryId;
use crate::cursor::Owner;
use crate::error::MapError;
use crate::map::HashMap;

/// Splittable cursor over a [`HashMap`].
///
/// ```
/// use treebin_map::HashMap;
///
/// let map: HashMap<u32, u32> = (0..100).map(|k| (k, k)).collect();
/// let mut left = map.split_cursor();
/// let mut right = left.try_split(&map).unwrap();
/// let mut sum = 0;
/// left.for_each_remaining(&map, |_, v| sum += v).unwrap();
/// right.for_each_remaining(&map, |_, v| sum += v).unwrap();
/// assert_eq!(sum, (0..100).sum());
/// ```
#[derive(Clone, Debug)]
pub struct SplitCursor {
    owner: Owner,
    /// Next slot to load.
    index: usize,
    /// One past the last slot; `None` until bound.
    fence: Option<usize>,
    est: usize,
    expected_mod_count: usize,
    /// Entry to yield next within the slot last loaded.
    current: Option<EntryId>,
}

impl SplitCursor {
    pub(crate) fn new<K, V, S>(map: &HashMap<K, V, S>) -> Self {
        Self {
            owner: map.owner,
            index: 0,
            fence: None,
            est: 0,
            expected_mod_count: 0,
            current: None,
        }
    }

    fn fence<K, V, S>(&mut self, map: &HashMap<K, V, S>) -> usize {
        match self.fence {
            Some(hi) => hi,
            None => {
                let hi = map.table.buckets.len();
                self.est = map.len();
                self.expected_mod_count = map.table.mod_count;
                self.fence = Some(hi);
                hi
            }
        }
    }

    /// Upper estimate of the entries left in this cursor's range.
    pub fn estimate_size<K, V, S>(&mut self, map: &HashMap<K, V, S>) -> usize {
        self.fence(map);
        self.est
    }

    /// Hands the lower half of the remaining slot range to a new cursor and
    /// keeps the upper half. Returns `None` when the range is too small,
    /// traversal of a slot is in progress, or `map` is not the map this
    /// cursor was created from.
    pub fn try_split<K, V, S>(&mut self, map: &HashMap<K, V, S>) -> Option<SplitCursor> {
        if map.owner != self.owner {
            return None;
        }
        let hi = self.fence(map);
        let lo = self.index;
        let mid = lo + (hi - lo) / 2;
        if lo >= mid || self.current.is_some() {
            return None;
        }
        self.index = mid;
        self.est >>= 1;
        Some(SplitCursor {
            owner: self.owner,
            index: lo,
            fence: Some(mid),
            est: self.est,
            expected_mod_count: self.expected_mod_count,
            current: None,
        })
    }

    /// Feeds the next entry of the range to `f`. Returns `Ok(false)` once
    /// the range is exhausted.
    pub fn try_advance<'m, K, V, S, F>(
        &mut self,
        map: &'m HashMap<K, V, S>,
        f: F,
    ) -> Result<bool, MapError>
    where
        F: FnOnce(&'m K, &'m V),
    {
        let hi = self.fence(map);
        self.check(map)?;
        let table = &map.table;
        while self.current.is_some() || self.index < hi {
            match self.current {
                None => {
                    self.current = table.buckets[self.index].head();
                    self.index += 1;
                }
                Some(id) => {
                    let e = table
                        .entries
                        .get(id)
                        .ok_or(MapError::ConcurrentModification)?;
                    self.current = e.next;
                    f(&e.key, &e.value);
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Feeds every remaining entry of the range to `f`.
    pub fn for_each_remaining<'m, K, V, S, F>(
        &mut self,
        map: &'m HashMap<K, V, S>,
        mut f: F,
    ) -> Result<(), MapError>
    where
        F: FnMut(&'m K, &'m V),
    {
        let hi = self.fence(map);
        self.check(map)?;
        let table = &map.table;
        let mut i = self.index;
        let mut cur = self.current.take();
        self.index = hi;
        loop {
            match cur {
                Some(id) => {
                    let e = table
                        .entries
                        .get(id)
                        .ok_or(MapError::ConcurrentModification)?;
                    f(&e.key, &e.value);
                    cur = e.next;
                }
                None if i < hi => {
                    cur = table.buckets[i].head();
                    i += 1;
                }
                None => return Ok(()),
            }
        }
    }

    fn check<K, V, S>(&self, map: &HashMap<K, V, S>) -> Result<(), MapError> {
        if map.owner != self.owner {
            Err(MapError::WrongMap)
        } else if map.table.mod_count != self.expected_mod_count
            || map.table.buckets.len() < self.fence.unwrap_or(0)
        {
            Err(MapError::ConcurrentModification)
        } else {
            Ok(())
        }
    }
}
