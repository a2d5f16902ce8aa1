//! Sizing constants and the validated construction `Config`.

use crate::error::MapError;

/// Capacity used when no initial capacity is requested.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
/// Largest bucket array the table will allocate. Always a power of two.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;
/// Load factor used when none is requested.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;
/// Chain length (including a newly appended entry) at which a slot is
/// converted to a tree.
pub const TREEIFY_THRESHOLD: usize = 8;
/// Tree size at or below which a slot reverts to a plain chain.
pub const UNTREEIFY_THRESHOLD: usize = 6;
/// Smallest capacity at which slots are treeified. Below it the table grows
/// instead.
pub const MIN_TREEIFY_CAPACITY: usize = 64;

/// Construction parameters for [`HashMap`](crate::HashMap).
///
/// ```
/// use treebin_map::{Config, HashMap};
///
/// let map: HashMap<u32, u32> =
///     HashMap::with_config(Config::new().initial_capacity(100).load_factor(0.5)).unwrap();
/// assert!(map.is_empty());
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    initial_capacity: Option<usize>,
    load_factor: f32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            initial_capacity: None,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    /// Requested number of buckets. Rounded up to a power of two and capped
    /// at [`MAXIMUM_CAPACITY`] when the table is first allocated.
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity.min(MAXIMUM_CAPACITY));
        self
    }

    pub fn load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), MapError> {
        let lf = self.load_factor;
        if lf.is_nan() || lf <= 0.0 || lf.is_infinite() {
            return Err(MapError::InvalidArgument(format!("illegal load factor: {lf}")));
        }
        Ok(())
    }

    pub(crate) fn get_load_factor(&self) -> f32 {
        self.load_factor
    }

    /// Bucket count for the first allocation.
    pub(crate) fn initial_table_size(&self) -> usize {
        match self.initial_capacity {
            Some(c) => table_size_for(c),
            None => DEFAULT_INITIAL_CAPACITY,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Smallest power of two `>= cap`, clamped to `[1, MAXIMUM_CAPACITY]`.
pub(crate) fn table_size_for(cap: usize) -> usize {
    cap.clamp(1, MAXIMUM_CAPACITY).next_power_of_two()
}

/// Bucket count that holds `wanted` entries under `load_factor`, before
/// rounding. Saturates for requests beyond any table.
pub(crate) fn capacity_for(wanted: usize, load_factor: f32) -> usize {
    ((wanted as f32 / load_factor) as usize).saturating_add(1)
}

/// `floor(capacity * load_factor)`, or `usize::MAX` once the table can no
/// longer grow.
pub(crate) fn threshold_for(capacity: usize, load_factor: f32) -> usize {
    let ft = capacity as f32 * load_factor;
    if capacity < MAXIMUM_CAPACITY && ft < MAXIMUM_CAPACITY as f32 {
        ft as usize
    } else {
        usize::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_size_rounds_up_to_power_of_two() {
        assert_eq!(table_size_for(0), 1);
        assert_eq!(table_size_for(1), 1);
        assert_eq!(table_size_for(3), 4);
        assert_eq!(table_size_for(16), 16);
        assert_eq!(table_size_for(17), 32);
        assert_eq!(table_size_for(usize::MAX), MAXIMUM_CAPACITY);
    }

    #[test]
    fn threshold_is_floor_of_product() {
        assert_eq!(threshold_for(16, 0.75), 12);
        assert_eq!(threshold_for(32, 0.75), 24);
        assert_eq!(threshold_for(10, 0.33), 3);
        assert_eq!(threshold_for(MAXIMUM_CAPACITY, 0.75), usize::MAX);
        assert_eq!(threshold_for(1 << 29, 4.0), usize::MAX);
    }

    #[test]
    fn capacity_for_saturates() {
        assert_eq!(capacity_for(12, 0.75), 17);
        assert_eq!(capacity_for(0, 0.75), 1);
        assert_eq!(capacity_for(usize::MAX, 0.75), usize::MAX);
        assert_eq!(capacity_for(usize::MAX, 0.01), usize::MAX);
        assert_eq!(
            Config::new()
                .initial_capacity(capacity_for(usize::MAX, 0.75))
                .initial_table_size(),
            MAXIMUM_CAPACITY
        );
    }

    #[test]
    fn rejects_bad_load_factors() {
        for lf in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let err = Config::new().load_factor(lf).validate().unwrap_err();
            assert!(matches!(err, MapError::InvalidArgument(_)), "{lf}");
        }
        assert!(Config::new().load_factor(2.5).validate().is_ok());
    }

    #[test]
    fn initial_capacity_is_capped_and_rounded() {
        assert_eq!(Config::new().initial_table_size(), DEFAULT_INITIAL_CAPACITY);
        assert_eq!(Config::new().initial_capacity(100).initial_table_size(), 128);
        assert_eq!(
            Config::new().initial_capacity(usize::MAX).initial_table_size(),
            MAXIMUM_CAPACITY
        );
    }
}
