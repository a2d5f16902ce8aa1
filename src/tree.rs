//! Tree store: red-black trees for crowded slots.
//!
//! Nodes are ordered by `(hash, EntryId)`. Keys need only `Eq`, so entries
//! with equal hashes are placed by arena id, and a lookup that meets an
//! equal-hash node it cannot rule out searches both subtrees.
//!
//! Every tree node is also threaded on a doubly-linked adjacency list
//! (`next` / `links.prev`) in slot order. Rebalancing never touches that
//! list; it is what untreeify and resize splitting walk. When a node with
//! two children is deleted, it swaps tree linkage with its successor rather
//! than contents, so entry ids held by cursors stay attached to their keys.

use crate::bucket::{EntryId, Slot, TreeBin, TreeLinks};
use crate::config::UNTREEIFY_THRESHOLD;
use crate::hash::NormHash;
use crate::raw::RawTable;
use core::borrow::Borrow;

impl<K, V> RawTable<K, V> {
    #[inline]
    fn parent(&self, x: EntryId) -> Option<EntryId> {
        self.entries[x].links.parent
    }

    #[inline]
    fn left(&self, x: EntryId) -> Option<EntryId> {
        self.entries[x].links.left
    }

    #[inline]
    fn right(&self, x: EntryId) -> Option<EntryId> {
        self.entries[x].links.right
    }

    #[inline]
    fn red(&self, x: EntryId) -> bool {
        self.entries[x].links.red
    }

    /// Absent children count as black.
    #[inline]
    fn is_red(&self, x: Option<EntryId>) -> bool {
        x.map_or(false, |x| self.red(x))
    }

    #[inline]
    fn set_parent(&mut self, x: EntryId, p: Option<EntryId>) {
        self.entries[x].links.parent = p;
    }

    #[inline]
    fn set_left(&mut self, x: EntryId, l: Option<EntryId>) {
        self.entries[x].links.left = l;
    }

    #[inline]
    fn set_right(&mut self, x: EntryId, r: Option<EntryId>) {
        self.entries[x].links.right = r;
    }

    #[inline]
    fn set_red(&mut self, x: EntryId, red: bool) {
        self.entries[x].links.red = red;
    }

    /// Points `pp`'s child link that currently holds `old` at `new`.
    #[inline]
    fn replace_child(&mut self, pp: EntryId, old: EntryId, new: Option<EntryId>) {
        if self.left(pp) == Some(old) {
            self.set_left(pp, new);
        } else {
            self.set_right(pp, new);
        }
    }

    /// Whether `x` sorts before `p`: by hash, then by arena id.
    #[inline]
    fn goes_left(&self, x: EntryId, p: EntryId) -> bool {
        (self.entries[x].hash, x) < (self.entries[p].hash, p)
    }

    pub(crate) fn root_of(&self, mut x: EntryId) -> EntryId {
        while let Some(p) = self.parent(x) {
            x = p;
        }
        x
    }

    /// Searches the subtree at `start`.
    pub(crate) fn tree_find<Q>(&self, start: EntryId, hash: NormHash, key: &Q) -> Option<EntryId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut p = Some(start);
        while let Some(id) = p {
            let e = &self.entries[id];
            if e.hash > hash {
                p = e.links.left;
            } else if e.hash < hash {
                p = e.links.right;
            } else if e.key.borrow() == key {
                return Some(id);
            } else {
                p = match (e.links.left, e.links.right) {
                    (None, r) => r,
                    (l, None) => l,
                    (Some(l), Some(r)) => {
                        if let Some(q) = self.tree_find(r, hash, key) {
                            return Some(q);
                        }
                        Some(l)
                    }
                };
            }
        }
        None
    }

    /// Links a new entry (whose key is known to be absent) into the tree of
    /// slot `index`. The entry is placed right after its tree parent in the
    /// adjacency list.
    pub(crate) fn tree_link(&mut self, index: usize, x: EntryId) {
        let Slot::Tree(mut bin) = self.buckets[index] else {
            debug_assert!(false, "tree_link on a non-tree slot");
            return;
        };
        let root = self.root_of(bin.first);
        let mut p = root;
        loop {
            let left = self.goes_left(x, p);
            let child = if left { self.left(p) } else { self.right(p) };
            if let Some(c) = child {
                p = c;
                continue;
            }
            let pn = self.entries[p].next;
            if left {
                self.set_left(p, Some(x));
            } else {
                self.set_right(p, Some(x));
            }
            self.entries[p].next = Some(x);
            let xe = &mut self.entries[x];
            xe.next = pn;
            xe.links.parent = Some(p);
            xe.links.prev = Some(p);
            if let Some(n) = pn {
                self.entries[n].links.prev = Some(x);
            }
            bin.len += 1;
            self.buckets[index] = Slot::Tree(bin);
            let root = self.balance_insertion(root, x);
            self.move_root_to_front(index, root);
            return;
        }
    }

    /// Converts the chain in slot `index` into a tree by inserting its
    /// entries in chain order, then moves the root to the slot head.
    pub(crate) fn treeify(&mut self, index: usize) {
        if let Some(root) = self.build_tree(index) {
            self.move_root_to_front(index, root);
        }
    }

    /// Builds the tree for slot `index` over its list without reordering
    /// the list. Returns the root.
    fn build_tree(&mut self, index: usize) -> Option<EntryId> {
        let first = self.buckets[index].head()?;
        let mut root: Option<EntryId> = None;
        let mut prev = None;
        let mut len = 0;
        let mut cur = Some(first);
        while let Some(x) = cur {
            cur = self.entries[x].next;
            len += 1;
            self.entries[x].links = TreeLinks {
                prev,
                ..TreeLinks::default()
            };
            prev = Some(x);
            let Some(r) = root else {
                root = Some(x);
                continue;
            };
            let mut p = r;
            loop {
                let left = self.goes_left(x, p);
                let child = if left { self.left(p) } else { self.right(p) };
                match child {
                    Some(c) => p = c,
                    None => {
                        self.set_parent(x, Some(p));
                        if left {
                            self.set_left(p, Some(x));
                        } else {
                            self.set_right(p, Some(x));
                        }
                        root = Some(self.balance_insertion(r, x));
                        break;
                    }
                }
            }
        }
        self.buckets[index] = Slot::Tree(TreeBin { first, len });
        #[cfg(feature = "tracing")]
        tracing::debug!(index, len, "treeified slot");
        root
    }

    /// Replaces the tree in slot `index` by a plain chain in adjacency order.
    pub(crate) fn untreeify(&mut self, index: usize) {
        let Some(first) = self.buckets[index].head() else {
            return;
        };
        let mut cur = Some(first);
        while let Some(x) = cur {
            self.entries[x].links = TreeLinks::default();
            cur = self.entries[x].next;
        }
        self.buckets[index] = Slot::Chain(first);
        #[cfg(feature = "tracing")]
        tracing::debug!(index, "untreeified slot");
    }

    /// Makes `root` the first entry of the adjacency list of slot `index`.
    pub(crate) fn move_root_to_front(&mut self, index: usize, root: EntryId) {
        let Slot::Tree(mut bin) = self.buckets[index] else {
            return;
        };
        if bin.first != root {
            let rn = self.entries[root].next;
            let rp = self.entries[root].links.prev;
            if let Some(rn) = rn {
                self.entries[rn].links.prev = rp;
            }
            if let Some(rp) = rp {
                self.entries[rp].next = rn;
            }
            self.entries[bin.first].links.prev = Some(root);
            self.entries[root].next = Some(bin.first);
            self.entries[root].links.prev = None;
            bin.first = root;
            self.buckets[index] = Slot::Tree(bin);
        }
        debug_assert_eq!(self.check_tree(root).err(), None);
    }

    /// Removes `p` from the tree of slot `index`. The entry itself stays in
    /// the arena; the caller frees it.
    ///
    /// With `movable`, a tree left with at most `UNTREEIFY_THRESHOLD` nodes
    /// reverts to a chain and the new root is moved to the slot head.
    pub(crate) fn remove_tree_node(&mut self, index: usize, p: EntryId, movable: bool) {
        let Slot::Tree(bin) = self.buckets[index] else {
            debug_assert!(false, "remove_tree_node on a non-tree slot");
            return;
        };
        let succ = self.entries[p].next;
        let pred = self.entries[p].links.prev;
        let first = match pred {
            None => succ,
            Some(pred) => {
                self.entries[pred].next = succ;
                Some(bin.first)
            }
        };
        if let Some(succ) = succ {
            self.entries[succ].links.prev = pred;
        }
        self.entries[p].next = None;
        let Some(first) = first else {
            self.buckets[index] = Slot::Empty;
            return;
        };
        let len = bin.len - 1;
        self.buckets[index] = Slot::Tree(TreeBin { first, len });
        if movable && len <= UNTREEIFY_THRESHOLD {
            self.untreeify(index);
            return;
        }

        let mut root = self.root_of(first);
        let pl = self.left(p);
        let pr = self.right(p);
        let replacement = match (pl, pr) {
            (Some(pl), Some(pr)) => {
                let mut s = pr;
                while let Some(sl) = self.left(s) {
                    s = sl;
                }
                let (sc, pc) = (self.red(s), self.red(p));
                self.set_red(s, pc);
                self.set_red(p, sc);
                let sr = self.right(s);
                let pp = self.parent(p);
                if s == pr {
                    // p was s's direct parent
                    self.set_parent(p, Some(s));
                    self.set_right(s, Some(p));
                } else {
                    let sp = self.parent(s);
                    self.set_parent(p, sp);
                    if let Some(sp) = sp {
                        self.replace_child(sp, s, Some(p));
                    }
                    self.set_right(s, Some(pr));
                    self.set_parent(pr, Some(s));
                }
                self.set_left(p, None);
                self.set_right(p, sr);
                if let Some(sr) = sr {
                    self.set_parent(sr, Some(p));
                }
                self.set_left(s, Some(pl));
                self.set_parent(pl, Some(s));
                self.set_parent(s, pp);
                match pp {
                    None => root = s,
                    Some(pp) => self.replace_child(pp, p, Some(s)),
                }
                sr.unwrap_or(p)
            }
            (Some(pl), None) => pl,
            (None, Some(pr)) => pr,
            (None, None) => p,
        };
        if replacement != p {
            let pp = self.parent(p);
            self.set_parent(replacement, pp);
            match pp {
                None => {
                    root = replacement;
                    self.set_red(replacement, false);
                }
                Some(pp) => self.replace_child(pp, p, Some(replacement)),
            }
            // colour is still read below
            let links = &mut self.entries[p].links;
            links.parent = None;
            links.left = None;
            links.right = None;
        }

        let root = if self.red(p) {
            root
        } else {
            self.balance_deletion(root, replacement)
        };

        if replacement == p {
            // detach
            if let Some(pp) = self.parent(p) {
                if self.left(pp) == Some(p) {
                    self.set_left(pp, None);
                } else if self.right(pp) == Some(p) {
                    self.set_right(pp, None);
                }
            }
            self.entries[p].links = TreeLinks::default();
        }
        if movable {
            self.move_root_to_front(index, root);
        }
    }

    /// Partitions the tree in old slot `index` by address bit `bit` into the
    /// new table's slots `index` and `index + bit`, keeping adjacency order.
    /// Small halves become chains; a half that received the whole tree keeps
    /// its existing tree. Rebuilt halves leave their root where it falls in
    /// the list.
    pub(crate) fn split_tree(&mut self, bin: TreeBin, index: usize, bit: usize) {
        let (mut lo_head, mut lo_tail) = (None, None);
        let (mut hi_head, mut hi_tail) = (None, None);
        let (mut lc, mut hc) = (0usize, 0usize);
        let mut cur = Some(bin.first);
        while let Some(e) = cur {
            cur = self.entries[e].next.take();
            let (head, tail, count) = if (self.entries[e].hash as usize) & bit == 0 {
                (&mut lo_head, &mut lo_tail, &mut lc)
            } else {
                (&mut hi_head, &mut hi_tail, &mut hc)
            };
            self.entries[e].links.prev = *tail;
            match *tail {
                None => *head = Some(e),
                Some(t) => self.entries[t].next = Some(e),
            }
            *tail = Some(e);
            *count += 1;
        }
        if let Some(first) = lo_head {
            self.place_split_half(index, TreeBin { first, len: lc }, hi_head.is_some());
        }
        if let Some(first) = hi_head {
            self.place_split_half(index + bit, TreeBin { first, len: hc }, lo_head.is_some());
        }
    }

    fn place_split_half(&mut self, index: usize, half: TreeBin, other_half_used: bool) {
        self.buckets[index] = Slot::Tree(half);
        if half.len <= UNTREEIFY_THRESHOLD {
            self.untreeify(index);
        } else if other_half_used {
            if let Some(root) = self.build_tree(index) {
                debug_assert_eq!(self.check_tree(root).err(), None);
            }
        }
    }

    fn rotate_left(&mut self, mut root: EntryId, p: EntryId) -> EntryId {
        let Some(r) = self.right(p) else {
            return root;
        };
        let rl = self.left(r);
        self.set_right(p, rl);
        if let Some(rl) = rl {
            self.set_parent(rl, Some(p));
        }
        let pp = self.parent(p);
        self.set_parent(r, pp);
        match pp {
            None => {
                root = r;
                self.set_red(r, false);
            }
            Some(pp) => self.replace_child(pp, p, Some(r)),
        }
        self.set_left(r, Some(p));
        self.set_parent(p, Some(r));
        root
    }

    fn rotate_right(&mut self, mut root: EntryId, p: EntryId) -> EntryId {
        let Some(l) = self.left(p) else {
            return root;
        };
        let lr = self.right(l);
        self.set_left(p, lr);
        if let Some(lr) = lr {
            self.set_parent(lr, Some(p));
        }
        let pp = self.parent(p);
        self.set_parent(l, pp);
        match pp {
            None => {
                root = l;
                self.set_red(l, false);
            }
            Some(pp) => self.replace_child(pp, p, Some(l)),
        }
        self.set_right(l, Some(p));
        self.set_parent(p, Some(l));
        root
    }

    fn balance_insertion(&mut self, mut root: EntryId, mut x: EntryId) -> EntryId {
        self.set_red(x, true);
        loop {
            let Some(xp) = self.parent(x) else {
                self.set_red(x, false);
                return x;
            };
            if !self.red(xp) {
                return root;
            }
            let Some(xpp) = self.parent(xp) else {
                return root;
            };
            let xppl = self.left(xpp);
            if xppl == Some(xp) {
                let xppr = self.right(xpp);
                if let Some(uncle) = xppr.filter(|&u| self.red(u)) {
                    self.set_red(uncle, false);
                    self.set_red(xp, false);
                    self.set_red(xpp, true);
                    x = xpp;
                } else {
                    let (mut xp, mut xpp) = (Some(xp), Some(xpp));
                    if xp.and_then(|xp| self.right(xp)) == Some(x) {
                        if let Some(old_xp) = xp {
                            x = old_xp;
                            root = self.rotate_left(root, x);
                        }
                        xp = self.parent(x);
                        xpp = xp.and_then(|xp| self.parent(xp));
                    }
                    if let Some(xp) = xp {
                        self.set_red(xp, false);
                        if let Some(xpp) = xpp {
                            self.set_red(xpp, true);
                            root = self.rotate_right(root, xpp);
                        }
                    }
                }
            } else if let Some(uncle) = xppl.filter(|&u| self.red(u)) {
                self.set_red(uncle, false);
                self.set_red(xp, false);
                self.set_red(xpp, true);
                x = xpp;
            } else {
                let (mut xp, mut xpp) = (Some(xp), Some(xpp));
                if xp.and_then(|xp| self.left(xp)) == Some(x) {
                    if let Some(old_xp) = xp {
                        x = old_xp;
                        root = self.rotate_right(root, x);
                    }
                    xp = self.parent(x);
                    xpp = xp.and_then(|xp| self.parent(xp));
                }
                if let Some(xp) = xp {
                    self.set_red(xp, false);
                    if let Some(xpp) = xpp {
                        self.set_red(xpp, true);
                        root = self.rotate_left(root, xpp);
                    }
                }
            }
        }
    }

    fn balance_deletion(&mut self, mut root: EntryId, mut x: EntryId) -> EntryId {
        loop {
            if x == root {
                return root;
            }
            let Some(xp) = self.parent(x) else {
                self.set_red(x, false);
                return x;
            };
            if self.red(x) {
                self.set_red(x, false);
                return root;
            }
            if self.left(xp) == Some(x) {
                let mut xpr = self.right(xp);
                if let Some(s) = xpr.filter(|&s| self.red(s)) {
                    self.set_red(s, false);
                    self.set_red(xp, true);
                    root = self.rotate_left(root, xp);
                    xpr = self.right(xp);
                }
                let Some(s) = xpr else {
                    x = xp;
                    continue;
                };
                let (sl, sr) = (self.left(s), self.right(s));
                if !self.is_red(sr) && !self.is_red(sl) {
                    self.set_red(s, true);
                    x = xp;
                    continue;
                }
                if !self.is_red(sr) {
                    if let Some(sl) = sl {
                        self.set_red(sl, false);
                    }
                    self.set_red(s, true);
                    root = self.rotate_right(root, s);
                    xpr = self.right(xp);
                }
                if let Some(s) = xpr {
                    let c = self.red(xp);
                    self.set_red(s, c);
                    if let Some(sr) = self.right(s) {
                        self.set_red(sr, false);
                    }
                }
                self.set_red(xp, false);
                root = self.rotate_left(root, xp);
                x = root;
            } else {
                let mut xpl = self.left(xp);
                if let Some(s) = xpl.filter(|&s| self.red(s)) {
                    self.set_red(s, false);
                    self.set_red(xp, true);
                    root = self.rotate_right(root, xp);
                    xpl = self.left(xp);
                }
                let Some(s) = xpl else {
                    x = xp;
                    continue;
                };
                let (sl, sr) = (self.left(s), self.right(s));
                if !self.is_red(sl) && !self.is_red(sr) {
                    self.set_red(s, true);
                    x = xp;
                    continue;
                }
                if !self.is_red(sl) {
                    if let Some(sr) = sr {
                        self.set_red(sr, false);
                    }
                    self.set_red(s, true);
                    root = self.rotate_left(root, s);
                    xpl = self.left(xp);
                }
                if let Some(s) = xpl {
                    let c = self.red(xp);
                    self.set_red(s, c);
                    if let Some(sl) = self.left(s) {
                        self.set_red(sl, false);
                    }
                }
                self.set_red(xp, false);
                root = self.rotate_right(root, xp);
                x = root;
            }
        }
    }

    /// Validates the tree at `root`: root black and parentless, parent/child
    /// and prev/next links mutually consistent, strict `(hash, id)` order,
    /// no red node with a red child, equal black height. Returns the black
    /// height.
    pub(crate) fn check_tree(&self, root: EntryId) -> Result<usize, &'static str> {
        if self.parent(root).is_some() {
            return Err("root has a parent");
        }
        if self.red(root) {
            return Err("root is red");
        }
        self.check_subtree(root)
    }

    fn check_subtree(&self, t: EntryId) -> Result<usize, &'static str> {
        let e = &self.entries[t];
        if let Some(b) = e.links.prev {
            if self.entries[b].next != Some(t) {
                return Err("prev neighbour does not link back");
            }
        }
        if let Some(n) = e.next {
            if self.entries[n].links.prev != Some(t) {
                return Err("next neighbour does not link back");
            }
        }
        if let Some(p) = e.links.parent {
            if self.left(p) != Some(t) && self.right(p) != Some(t) {
                return Err("parent does not own child");
            }
        }
        let mut heights = [1usize; 2];
        for (slot, child, is_left) in [(0, e.links.left, true), (1, e.links.right, false)] {
            let Some(c) = child else { continue };
            if self.parent(c) != Some(t) {
                return Err("child has wrong parent");
            }
            if self.goes_left(c, t) != is_left {
                return Err("child out of (hash, id) order");
            }
            if e.links.red && self.red(c) {
                return Err("red node with red child");
            }
            heights[slot] = self.check_subtree(c)?;
        }
        if heights[0] != heights[1] {
            return Err("unequal black height");
        }
        Ok(heights[0] + usize::from(!e.links.red))
    }

    #[cfg(test)]
    pub(crate) fn tree_size(&self, root: EntryId) -> usize {
        let l = self.left(root).map_or(0, |c| self.tree_size(c));
        let r = self.right(root).map_or(0, |c| self.tree_size(c));
        1 + l + r
    }
}
