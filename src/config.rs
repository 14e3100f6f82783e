use crate::error::MapError;
use crate::error::Result;

/// Number of buckets a freshly constructed (or cleared) table starts with.
pub const DEFAULT_STARTING_CAPACITY: usize = 13;

/// Load factor above which the next insertion grows the table.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.67;

/// Sizing policy shared by [`HashTable`](crate::HashTable),
/// [`ChainedHashMap`](crate::ChainedHashMap) and
/// [`HashSet`](crate::HashSet).
///
/// # Examples
///
/// ```rust
/// use chain_hash::MapConfig;
///
/// let config = MapConfig::new(5, 0.75).unwrap();
/// assert_eq!(config.starting_capacity(), 5);
/// assert!(config.exceeds(4, 5));
/// assert!(!config.exceeds(3, 5));
///
/// assert!(MapConfig::new(0, 0.75).is_err());
/// assert!(MapConfig::new(5, f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    starting_capacity: usize,
    max_load_factor: f64,
}

impl MapConfig {
    /// Creates a validated configuration.
    ///
    /// `starting_capacity` must be at least one bucket and `max_load_factor`
    /// must be a finite, strictly positive number.
    pub fn new(starting_capacity: usize, max_load_factor: f64) -> Result<Self> {
        if starting_capacity == 0 {
            return Err(MapError::InvalidArgument(
                "starting capacity must be at least one bucket",
            ));
        }
        if !max_load_factor.is_finite() || max_load_factor <= 0.0 {
            return Err(MapError::InvalidArgument(
                "max load factor must be finite and greater than zero",
            ));
        }

        Ok(Self {
            starting_capacity,
            max_load_factor,
        })
    }

    /// Bucket count of a new or cleared table.
    pub fn starting_capacity(&self) -> usize {
        self.starting_capacity
    }

    /// Growth trigger threshold.
    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    /// Returns `true` if holding `len` entries in `capacity` buckets would
    /// put the table over its maximum load factor.
    #[inline]
    pub fn exceeds(&self, len: usize, capacity: usize) -> bool {
        len as f64 / capacity as f64 > self.max_load_factor
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            starting_capacity: DEFAULT_STARTING_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}
