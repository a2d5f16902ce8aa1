//! Resize engine: allocates or doubles the bucket array and splits every
//! occupied slot on the one new address bit.
//!
//! Because capacity is a power of two, an entry in old slot `j` lands in
//! either `j` or `j + old_capacity`. Chains are split with two tail pointers
//! so each half keeps its original relative order; trees go through
//! `split_tree`.

use crate::bucket::{new_buckets, EntryId, Slot, TreeBin, TreeLinks};
use crate::config::{DEFAULT_INITIAL_CAPACITY, MAXIMUM_CAPACITY};
use crate::raw::RawTable;

impl<K, V> RawTable<K, V> {
    /// Allocates the first bucket array, or doubles the current one.
    pub(crate) fn resize(&mut self) {
        let old_cap = self.buckets.len();
        let (new_cap, new_thr) = if old_cap == 0 {
            let cap = self.config.initial_table_size();
            (cap, self.fresh_threshold(cap))
        } else if old_cap >= MAXIMUM_CAPACITY {
            self.threshold = usize::MAX;
            return;
        } else {
            let cap = old_cap << 1;
            let thr = if cap < MAXIMUM_CAPACITY && old_cap >= DEFAULT_INITIAL_CAPACITY {
                self.threshold.saturating_mul(2)
            } else {
                0
            };
            // a zero threshold never doubles away
            let thr = if thr == 0 { self.fresh_threshold(cap) } else { thr };
            (cap, thr)
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(
            old_capacity = old_cap,
            new_capacity = new_cap,
            len = self.entries.len(),
            "resizing bucket array"
        );

        self.threshold = new_thr;
        let old = core::mem::replace(&mut self.buckets, new_buckets(new_cap));
        if old_cap > 0 {
            self.bump_mod_count();
        }
        for (j, slot) in old.into_vec().into_iter().enumerate() {
            match slot {
                Slot::Empty => {}
                Slot::Chain(head) | Slot::Tree(TreeBin { first: head, .. })
                    if self.entries[head].next.is_none() =>
                {
                    self.entries[head].links = TreeLinks::default();
                    let index = self.index_of(self.entries[head].hash);
                    self.buckets[index] = Slot::Chain(head);
                }
                Slot::Tree(bin) => self.split_tree(bin, j, old_cap),
                Slot::Chain(head) => self.split_chain(head, j, old_cap),
            }
        }
    }

    /// Splits the chain from old slot `index` into `index` (bit clear) and
    /// `index + bit` (bit set).
    fn split_chain(&mut self, head: EntryId, index: usize, bit: usize) {
        let (mut lo_head, mut lo_tail): (Option<EntryId>, Option<EntryId>) = (None, None);
        let (mut hi_head, mut hi_tail): (Option<EntryId>, Option<EntryId>) = (None, None);
        let mut cur = Some(head);
        while let Some(e) = cur {
            cur = self.entries[e].next.take();
            let (h, t) = if (self.entries[e].hash as usize) & bit == 0 {
                (&mut lo_head, &mut lo_tail)
            } else {
                (&mut hi_head, &mut hi_tail)
            };
            match *t {
                None => *h = Some(e),
                Some(tail) => self.entries[tail].next = Some(e),
            }
            *t = Some(e);
        }
        if let Some(h) = lo_head {
            self.buckets[index] = Slot::Chain(h);
        }
        if let Some(h) = hi_head {
            self.buckets[index + bit] = Slot::Chain(h);
        }
    }
}
