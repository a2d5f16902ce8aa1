//! Chain store: singly-linked entries of a non-tree slot.

use crate::bucket::{EntryId, Slot};
use crate::hash::NormHash;
use crate::raw::RawTable;
use core::borrow::Borrow;

impl<K, V> RawTable<K, V> {
    /// Scans the chain starting at `head`. Compares the cached hash before
    /// the key. Returns the match and its predecessor.
    pub(crate) fn chain_find<Q>(
        &self,
        head: EntryId,
        hash: NormHash,
        key: &Q,
    ) -> Option<(Option<EntryId>, EntryId)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut pred = None;
        let mut cur = Some(head);
        while let Some(id) = cur {
            let e = &self.entries[id];
            if e.hash == hash && e.key.borrow() == key {
                return Some((pred, id));
            }
            pred = Some(id);
            cur = e.next;
        }
        None
    }

    /// Appends `id` after the last entry of the chain at `head` and returns
    /// the new chain length.
    pub(crate) fn chain_append(&mut self, head: EntryId, id: EntryId) -> usize {
        let mut len = 1;
        let mut tail = head;
        while let Some(n) = self.entries[tail].next {
            tail = n;
            len += 1;
        }
        self.entries[tail].next = Some(id);
        len + 1
    }

    /// Splices `id` out of the chain in slot `index`.
    pub(crate) fn chain_unlink(&mut self, index: usize, head: EntryId, id: EntryId) {
        let next = self.entries[id].next.take();
        if head == id {
            self.buckets[index] = match next {
                Some(n) => Slot::Chain(n),
                None => Slot::Empty,
            };
            return;
        }
        let mut pred = head;
        while let Some(n) = self.entries[pred].next {
            if n == id {
                self.entries[pred].next = next;
                return;
            }
            pred = n;
        }
        debug_assert!(false, "entry not found in its chain");
    }

    /// Number of entries in the chain starting at `head`.
    #[cfg(test)]
    pub(crate) fn chain_len(&self, head: EntryId) -> usize {
        let mut len = 0;
        let mut cur = Some(head);
        while let Some(id) = cur {
            len += 1;
            cur = self.entries[id].next;
        }
        len
    }
}
