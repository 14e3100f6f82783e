#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

/// Sizing policy: starting capacity and maximum load factor.
pub mod config;

/// Error type shared by the map operations.
pub mod error;

/// A key-value map using external chaining.
///
/// This module provides [`ChainedHashMap`], which wraps the chained
/// `HashTable` and provides a checked key-value interface with configurable
/// hashers.
pub mod hash_map;

pub mod hash_table;

/// A hash set built on the chained `HashTable`.
///
/// [`ChainedHashMap::key_set`] returns its keys as a [`HashSet`].
pub mod hash_set;

pub use config::DEFAULT_MAX_LOAD_FACTOR;
pub use config::DEFAULT_STARTING_CAPACITY;
pub use config::MapConfig;
pub use error::MapError;
pub use error::Result;
pub use hash_map::ChainedHashMap;
pub use hash_set::HashSet;
pub use hash_table::HashTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder selected by the enabled features: `foldhash`'s
        /// fast `RandomState`.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder selected by the enabled features: the standard
        /// library's SipHash `RandomState`.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    }
}
