//! treebin-map: a separately chained hash map whose crowded buckets turn
//! into red-black trees, with detached fail-fast cursors.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a general-purpose map that keeps average O(1) operations while
//!   bounding the damage of hash collisions to O(log n) per bucket.
//! - Layers:
//!   - Entry storage (`bucket`): a `SlotMap` arena of entries linked by
//!     generational `EntryId`s; each bucket slot is `Empty`, a `Chain`, or
//!     a `Tree`.
//!   - RawTable (`raw`, `chain`, `tree`, `treeify`, `resize`): structural
//!     layer. Finds, links and unlinks entries by normalized hash, converts
//!     between chains and trees, and doubles the bucket array. Only calls
//!     `K: Eq`.
//!   - HashMap (`map`): public API. Hashes keys, runs user closures, and
//!     exposes iterators, `Cursor` and `SplitCursor`.
//!
//! Constraints
//! - Capacity is zero (unallocated) or a power of two no larger than
//!   `MAXIMUM_CAPACITY`. Entry `e` lives in slot `hash(e) & (capacity - 1)`.
//! - A chain reaching `TREEIFY_THRESHOLD` entries becomes a tree once the
//!   table has `MIN_TREEIFY_CAPACITY` slots; until then the table grows.
//! - A tree left with `UNTREEIFY_THRESHOLD` or fewer entries by a removal
//!   or a resize split becomes a chain again.
//! - Tree order is `(hash, EntryId)`. Keys need no `Ord`; equal hashes are
//!   resolved by searching both subtrees with `Eq`.
//!
//! Slot order and cursors
//! - Every tree also threads its nodes on a doubly linked adjacency list.
//!   Iteration and cursors follow that list, never the tree shape, so the
//!   visit order of one slot only changes on structural modification.
//! - Removals through `Cursor::remove` and `retain` never reorder a slot
//!   or untreeify it, keeping a parked cursor position valid.
//! - A mutation counter moves on insert of a new key, removal, clear and
//!   resize. Detached cursors record it and fail with
//!   `MapError::ConcurrentModification` when it moved underneath them.
//!
//! Hashing
//! - The raw `u64` from the `BuildHasher` is folded to 32 bits and its high
//!   half mixed into the low half, so small tables still see high bits.
//!   The normalized hash is cached per entry; resize never rehashes keys.
//!
//! Notes and non-goals
//! - Not a concurrent map. `HashMap` is `Send`/`Sync` when its parts are;
//!   `SplitCursor` halves may be driven from several threads against a
//!   shared `&HashMap`.
//! - No insertion-ordered or access-ordered variant.
//! - The `tracing` feature emits events for resize, treeify and untreeify.

mod bucket;
mod chain;
pub mod config;
mod cursor;
mod error;
mod hash;
pub mod iter;
mod map;
mod map_proptest;
mod raw;
mod resize;
mod split_cursor;
#[cfg(test)]
mod test_hasher;
mod tree;
mod treeify;

// Public surface
pub use config::{
    Config, DEFAULT_INITIAL_CAPACITY, DEFAULT_LOAD_FACTOR, MAXIMUM_CAPACITY, MIN_TREEIFY_CAPACITY,
    TREEIFY_THRESHOLD, UNTREEIFY_THRESHOLD,
};
pub use cursor::Cursor;
pub use error::MapError;
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use map::HashMap;
pub use split_cursor::SplitCursor;
