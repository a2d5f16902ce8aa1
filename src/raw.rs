//! RawTable: structural layer owning the entry arena and bucket array.
//!
//! Lookups, inserts and removals compute a slot from the normalized hash and
//! dispatch on the slot's representation. The chain, tree, treeify and
//! resize modules extend this type with the per-representation algorithms.
//! Nothing here hashes keys or calls into user code other than `K: Eq`.

use crate::bucket::{Entry, EntryId, Slot};
use crate::config::{capacity_for, threshold_for, Config, TREEIFY_THRESHOLD};
use crate::hash::NormHash;
use core::borrow::Borrow;
use slotmap::SlotMap;

#[derive(Clone, Debug)]
pub(crate) struct RawTable<K, V> {
    pub(crate) entries: SlotMap<EntryId, Entry<K, V>>,
    /// Empty until the first insert (or an explicit reserve).
    pub(crate) buckets: Box<[Slot]>,
    /// Entry count above which the table doubles.
    pub(crate) threshold: usize,
    pub(crate) config: Config,
    /// Bumped on every structural change; never on in-place value updates.
    pub(crate) mod_count: usize,
}

impl<K, V> RawTable<K, V> {
    pub(crate) fn new(config: Config) -> Self {
        Self {
            entries: SlotMap::with_key(),
            buckets: Box::default(),
            threshold: 0,
            config,
            mod_count: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Current bucket count, or the size the first allocation will use.
    pub(crate) fn capacity(&self) -> usize {
        if self.buckets.is_empty() {
            self.config.initial_table_size()
        } else {
            self.buckets.len()
        }
    }

    #[inline]
    pub(crate) fn bump_mod_count(&mut self) {
        self.mod_count = self.mod_count.wrapping_add(1);
    }

    #[inline]
    pub(crate) fn index_of(&self, hash: NormHash) -> usize {
        debug_assert!(!self.buckets.is_empty());
        (hash as usize) & (self.buckets.len() - 1)
    }

    #[inline]
    pub(crate) fn entry(&self, id: EntryId) -> &Entry<K, V> {
        &self.entries[id]
    }

    #[inline]
    pub(crate) fn entry_mut(&mut self, id: EntryId) -> &mut Entry<K, V> {
        &mut self.entries[id]
    }

    /// First entry at or after slot `from`, with its slot index.
    pub(crate) fn first_from(&self, from: usize) -> Option<(usize, EntryId)> {
        self.buckets
            .iter()
            .enumerate()
            .skip(from)
            .find_map(|(i, s)| s.head().map(|h| (i, h)))
    }

    /// Entry following `id` in table order: its intra-slot successor, else
    /// the head of the next occupied slot.
    pub(crate) fn successor(&self, index: usize, id: EntryId) -> Option<(usize, EntryId)> {
        match self.entries[id].next {
            Some(n) => Some((index, n)),
            None => self.first_from(index + 1),
        }
    }

    /// Locates the entry for `key`. The slot head is checked first, then the
    /// chain is scanned or the tree searched.
    pub(crate) fn find<Q>(&self, hash: NormHash, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        if self.buckets.is_empty() {
            return None;
        }
        let slot = self.buckets[self.index_of(hash)];
        let head = slot.head()?;
        let first = &self.entries[head];
        if first.hash == hash && first.key.borrow() == key {
            return Some(head);
        }
        first.next?;
        match slot {
            Slot::Tree(bin) => self.tree_find(self.root_of(bin.first), hash, key),
            Slot::Chain(head) => self.chain_find(head, hash, key).map(|(_, id)| id),
            Slot::Empty => None,
        }
    }

    /// Inserts an entry for a key known to be absent and returns its id.
    ///
    /// New chain entries are appended at the tail; a chain reaching
    /// `TREEIFY_THRESHOLD` is handed to the treeify controller. Grows the
    /// table when the entry count passes the threshold.
    pub(crate) fn insert_new(&mut self, hash: NormHash, key: K, value: V) -> EntryId {
        if self.buckets.is_empty() {
            self.resize();
        }
        let index = self.index_of(hash);
        let id = self.entries.insert(Entry::new(key, value, hash));
        match self.buckets[index] {
            Slot::Empty => self.buckets[index] = Slot::Chain(id),
            Slot::Chain(head) => {
                let len = self.chain_append(head, id);
                if len >= TREEIFY_THRESHOLD {
                    self.treeify_bin(index);
                }
            }
            Slot::Tree(_) => self.tree_link(index, id),
        }
        self.bump_mod_count();
        if self.entries.len() > self.threshold {
            self.resize();
        }
        id
    }

    /// Unlinks `id` from its slot and frees it.
    ///
    /// `movable == false` keeps every other entry at its slot position (no
    /// root-to-front move, no untreeify) so that a cursor parked on the next
    /// entry stays valid.
    pub(crate) fn remove_id(&mut self, id: EntryId, movable: bool) -> (K, V) {
        let index = self.index_of(self.entries[id].hash);
        match self.buckets[index] {
            Slot::Chain(head) => self.chain_unlink(index, head, id),
            Slot::Tree(_) => self.remove_tree_node(index, id, movable),
            Slot::Empty => debug_assert!(false, "removing from an empty slot"),
        }
        self.bump_mod_count();
        let e = self
            .entries
            .remove(id)
            .expect("entry must exist while linked into a slot");
        (e.key, e.value)
    }

    /// Drops every entry; keeps the bucket array and its capacity.
    pub(crate) fn clear(&mut self) {
        self.bump_mod_count();
        self.entries.clear();
        self.buckets.iter_mut().for_each(|s| *s = Slot::Empty);
    }

    /// Grows until `len + additional` entries fit under the threshold.
    pub(crate) fn reserve(&mut self, additional: usize) {
        let wanted = self.len().saturating_add(additional);
        if self.buckets.is_empty() {
            let needed = capacity_for(wanted, self.config.get_load_factor());
            if needed > self.config.initial_table_size() {
                self.config = self.config.initial_capacity(needed);
            }
            self.resize();
        }
        while wanted > self.threshold && self.threshold != usize::MAX {
            self.resize();
        }
    }

    /// Threshold recomputed from scratch for the current capacity.
    pub(crate) fn fresh_threshold(&self, capacity: usize) -> usize {
        threshold_for(capacity, self.config.get_load_factor())
    }
}

#[cfg(test)]
impl<K, V> RawTable<K, V> {
    /// Full structural check: slot addressing, entry count, tree validity
    /// with tree/list agreement, and capacity shape.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        use crate::bucket::TreeLinks;
        use crate::config::MAXIMUM_CAPACITY;

        let cap = self.buckets.len();
        if cap != 0 && (!cap.is_power_of_two() || cap > MAXIMUM_CAPACITY) {
            return Err(format!("bad capacity {cap}"));
        }
        let mut total = 0;
        for (i, slot) in self.buckets.iter().enumerate() {
            let mut seen = 0;
            let mut cur = slot.head();
            while let Some(id) = cur {
                let e = &self.entries[id];
                if self.index_of(e.hash) != i {
                    return Err(format!("entry with hash {:#x} found in slot {i}", e.hash));
                }
                if let Slot::Chain(_) = slot {
                    if e.links != TreeLinks::default() {
                        return Err(format!("chain entry in slot {i} carries tree links"));
                    }
                }
                seen += 1;
                cur = e.next;
            }
            if let Slot::Tree(bin) = slot {
                if self.entries[bin.first].links.prev.is_some() {
                    return Err(format!("tree head in slot {i} has a prev link"));
                }
                if bin.len != seen {
                    return Err(format!("tree bin len {} but {seen} listed", bin.len));
                }
                let root = self.root_of(bin.first);
                self.check_tree(root)
                    .map_err(|m| format!("slot {i}: {m}"))?;
                let nodes = self.tree_size(root);
                if nodes != seen {
                    return Err(format!("slot {i}: {nodes} tree nodes, {seen} listed"));
                }
            }
            total += seen;
        }
        if total != self.entries.len() {
            return Err(format!("{total} reachable, {} stored", self.entries.len()));
        }
        Ok(())
    }

    /// Representation of slot `index`, for tests.
    pub(crate) fn slot(&self, index: usize) -> Slot {
        self.buckets[index]
    }
}
