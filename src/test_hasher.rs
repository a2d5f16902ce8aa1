//! Deterministic hashers for tests that need to steer keys into slots.

use core::hash::{BuildHasher, Hasher};

/// Hashes an integer key to itself, so `k * capacity` keys share slot 0.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct IdentityState;

pub(crate) struct IdentityHasher(u64);

impl Hasher for IdentityHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }

    fn write_u16(&mut self, n: u16) {
        self.0 = u64::from(n);
    }

    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }
}

impl BuildHasher for IdentityState {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher(0)
    }
}

/// Sends every key to the same hash, forcing one tree of equal hashes.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct ConstState;

pub(crate) struct ConstHasher;

impl Hasher for ConstHasher {
    fn finish(&self) -> u64 {
        0x2a
    }

    fn write(&mut self, _bytes: &[u8]) {}
}

impl BuildHasher for ConstState {
    type Hasher = ConstHasher;

    fn build_hasher(&self) -> ConstHasher {
        ConstHasher
    }
}
