//! Entry storage and the per-slot representation tag.
//!
//! Entries live in a `SlotMap` arena and are linked by `EntryId`. A slot of
//! the bucket array is either empty, the head of a singly-linked chain, or a
//! red-black tree whose nodes are additionally threaded on a doubly-linked
//! adjacency list starting at `TreeBin::first`.

use crate::hash::NormHash;
use slotmap::new_key_type;

new_key_type! {
    /// Stable, generational id of an entry in the arena. Its ordering is the
    /// identity tie-break between tree nodes with equal hashes.
    pub(crate) struct EntryId;
}

/// Tree topology and adjacency back-link. Meaningful only while the entry
/// sits in a tree slot; reset to the default on untreeify.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct TreeLinks {
    pub(crate) parent: Option<EntryId>,
    pub(crate) left: Option<EntryId>,
    pub(crate) right: Option<EntryId>,
    pub(crate) prev: Option<EntryId>,
    pub(crate) red: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: NormHash,
    /// Chain successor, or adjacency successor inside a tree.
    pub(crate) next: Option<EntryId>,
    pub(crate) links: TreeLinks,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, hash: NormHash) -> Self {
        Self {
            key,
            value,
            hash,
            next: None,
            links: TreeLinks::default(),
        }
    }
}

/// A treeified slot: head of the adjacency list and the live node count.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct TreeBin {
    /// First entry in slot order. Normally the tree root; a non-reordering
    /// removal may leave another node here.
    pub(crate) first: EntryId,
    pub(crate) len: usize,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(crate) enum Slot {
    #[default]
    Empty,
    Chain(EntryId),
    Tree(TreeBin),
}

impl Slot {
    /// First entry reachable from this slot, whatever its representation.
    #[inline]
    pub(crate) fn head(&self) -> Option<EntryId> {
        match *self {
            Slot::Empty => None,
            Slot::Chain(head) => Some(head),
            Slot::Tree(bin) => Some(bin.first),
        }
    }
}

/// Allocates an all-empty bucket array of `capacity` slots.
pub(crate) fn new_buckets(capacity: usize) -> Box<[Slot]> {
    debug_assert!(capacity.is_power_of_two());
    vec![Slot::Empty; capacity].into_boxed_slice()
}
