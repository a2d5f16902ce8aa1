//! Treeify controller: decides between growing the table and converting a
//! crowded chain into a tree.

use crate::bucket::Slot;
use crate::config::MIN_TREEIFY_CAPACITY;
use crate::raw::RawTable;

impl<K, V> RawTable<K, V> {
    /// Called when the chain in slot `index` reached `TREEIFY_THRESHOLD`.
    /// Small tables grow instead, which usually spreads the chain out.
    pub(crate) fn treeify_bin(&mut self, index: usize) {
        if self.buckets.len() < MIN_TREEIFY_CAPACITY {
            self.resize();
        } else if let Slot::Chain(_) = self.buckets[index] {
            self.treeify(index);
        }
    }
}
