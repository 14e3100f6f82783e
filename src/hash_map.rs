use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::config::MapConfig;
use crate::error::MapError;
use crate::error::Result;
use crate::hash_set::HashSet;
use crate::hash_table::HashTable;

const ABSENT_KEY: &str = "key cannot be absent";
const ABSENT_VALUE: &str = "value cannot be absent";

#[inline]
fn present<T>(argument: Option<T>, reason: &'static str) -> Result<T> {
    argument.ok_or(MapError::InvalidArgument(reason))
}

/// A hash map resolving collisions by external chaining.
///
/// `ChainedHashMap<K, V, S>` stores key-value pairs where keys implement
/// `Hash + Eq` and uses a configurable hasher builder `S` to hash keys. Each
/// bucket of the underlying [`HashTable`] holds a singly linked chain of the
/// entries whose hash reduces to it.
///
/// # Absent arguments
///
/// Keys and values are accepted as anything convertible into an `Option`, so
/// plain values can be passed directly. Passing `None` is rejected with
/// [`MapError::InvalidArgument`] before the map is touched.
///
/// # Growth
///
/// The map starts with [`MapConfig::starting_capacity`] buckets. When adding
/// one more entry would exceed [`MapConfig::max_load_factor`], the bucket
/// count grows to `2 * capacity + 1` and every entry is re-inserted. The check
/// runs before the key is looked up, so updating an existing key at the
/// threshold also grows the map. [`clear`](Self::clear) returns to the
/// starting capacity.
#[derive(Clone)]
pub struct ChainedHashMap<K, V, S> {
    table: HashTable<K, V>,
    hash_builder: S,
}

impl<K, V, S> Debug for ChainedHashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.table.iter()).finish()
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates an empty map with the default configuration and the given
    /// hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainedHashMap;
    /// # use chain_hash::DEFAULT_STARTING_CAPACITY;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let map: ChainedHashMap<i32, String, _> = ChainedHashMap::with_hasher(SimpleHasher);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), DEFAULT_STARTING_CAPACITY);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_config_and_hasher(MapConfig::default(), hash_builder)
    }

    /// Creates an empty map with the given sizing policy and hasher builder.
    pub fn with_config_and_hasher(config: MapConfig, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_config(config),
            hash_builder,
        }
    }

    /// Returns the number of key-value pairs in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the sizing policy of this map.
    pub fn config(&self) -> &MapConfig {
        self.table.config()
    }

    /// Returns the current ratio of entries to buckets.
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all elements and discards any capacity growth.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainedHashMap;
    /// # use chain_hash::MapConfig;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let config = MapConfig::new(5, 0.75).unwrap();
    /// let mut map: ChainedHashMap<u32, u32, _> =
    ///     ChainedHashMap::with_config_and_hasher(config, SimpleHasher);
    /// for i in 0..100u32 {
    ///     map.add(i, i * i).unwrap();
    /// }
    /// assert!(map.capacity() > 5);
    ///
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 5);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    fn insert_pair(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_builder.hash_one(&key);
        let hash_builder = &self.hash_builder;
        self.table
            .insert(hash, key, value, |k| hash_builder.hash_one(k))
    }

    /// Associates `value` with `key`.
    ///
    /// Returns `Ok(None)` if the key was not present, or `Ok(Some(previous))`
    /// if an existing value was replaced. Fails with
    /// [`MapError::InvalidArgument`] if either argument is `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainedHashMap;
    /// # use chain_hash::MapError;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: ChainedHashMap<i32, &str, _> = ChainedHashMap::with_hasher(SimpleHasher);
    /// assert_eq!(map.add(37, "a"), Ok(None));
    /// assert_eq!(map.add(37, "b"), Ok(Some("a")));
    /// assert_eq!(map.get(&37), Ok(&"b"));
    ///
    /// assert!(matches!(map.add(None, "c"), Err(MapError::InvalidArgument(_))));
    /// assert!(matches!(map.add(38, None), Err(MapError::InvalidArgument(_))));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn add(
        &mut self,
        key: impl Into<Option<K>>,
        value: impl Into<Option<V>>,
    ) -> Result<Option<V>> {
        let key = present(key.into(), ABSENT_KEY)?;
        let value = present(value.into(), ABSENT_VALUE)?;
        Ok(self.insert_pair(key, value))
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// Fails with [`MapError::NotFound`] if the key is not present.
    pub fn get<'k>(&self, key: impl Into<Option<&'k K>>) -> Result<&V>
    where
        K: 'k,
    {
        let key = present(key.into(), ABSENT_KEY)?;
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, |k| k == key)
            .map(|(_, v)| v)
            .ok_or(MapError::NotFound)
    }

    /// Returns a mutable reference to the value stored for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainedHashMap;
    /// # use chain_hash::MapError;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: ChainedHashMap<i32, Vec<i32>, _> = ChainedHashMap::with_hasher(SimpleHasher);
    /// map.add(1, vec![1]).unwrap();
    /// map.get_mut(&1).unwrap().push(2);
    /// assert_eq!(map.get(&1), Ok(&vec![1, 2]));
    /// assert_eq!(map.get_mut(&2), Err(MapError::NotFound));
    /// ```
    pub fn get_mut<'k>(&mut self, key: impl Into<Option<&'k K>>) -> Result<&mut V>
    where
        K: 'k,
    {
        let key = present(key.into(), ABSENT_KEY)?;
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, |k| k == key)
            .ok_or(MapError::NotFound)
    }

    /// Returns `Ok(true)` if the map holds a value for `key`.
    pub fn contains<'k>(&self, key: impl Into<Option<&'k K>>) -> Result<bool>
    where
        K: 'k,
    {
        let key = present(key.into(), ABSENT_KEY)?;
        let hash = self.hash_builder.hash_one(key);
        Ok(self.table.find(hash, |k| k == key).is_some())
    }

    /// Removes `key` from the map and returns the value it held.
    ///
    /// Fails with [`MapError::NotFound`] if the key is not present, leaving
    /// the map unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainedHashMap;
    /// # use chain_hash::MapError;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: ChainedHashMap<i32, &str, _> = ChainedHashMap::with_hasher(SimpleHasher);
    /// map.add(1, "a").unwrap();
    /// assert_eq!(map.remove(&1), Ok("a"));
    /// assert_eq!(map.remove(&1), Err(MapError::NotFound));
    /// ```
    pub fn remove<'k>(&mut self, key: impl Into<Option<&'k K>>) -> Result<V>
    where
        K: 'k,
    {
        let key = present(key.into(), ABSENT_KEY)?;
        let hash = self.hash_builder.hash_one(key);
        self.table
            .remove(hash, |k| k == key)
            .map(|(_, v)| v)
            .ok_or(MapError::NotFound)
    }

    /// Returns a new set holding a copy of every key.
    ///
    /// The set shares this map's sizing policy and hasher builder.
    pub fn key_set(&self) -> HashSet<K, S>
    where
        K: Clone,
        S: Clone,
    {
        let mut keys =
            HashSet::with_config_and_hasher(*self.table.config(), self.hash_builder.clone());
        keys.extend(self.table.iter().map(|(k, _)| k.clone()));
        keys
    }

    /// Returns a new vector holding a copy of every value, in bucket order
    /// and, within a bucket, chain order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use chain_hash::ChainedHashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map: ChainedHashMap<&str, i32, _> = ChainedHashMap::with_hasher(SimpleHasher);
    /// map.add("one", 1).unwrap();
    /// map.add("uno", 1).unwrap();
    ///
    /// let values = map.values();
    /// assert_eq!(values, vec![1, 1]);
    /// ```
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.table.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Returns an iterator over the key-value pairs in bucket order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Exposes the bucket array. Intended for tests and diagnostics only.
    #[cfg(any(test, feature = "stats"))]
    pub fn raw_table(&self) -> &[Option<alloc::boxed::Box<crate::hash_table::Entry<K, V>>>] {
        self.table.raw_table()
    }

    /// Returns occupancy statistics of the underlying table.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::ChainStats {
        self.table.debug_stats()
    }

    /// Returns the number of buckets for each chain length.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        self.table.chain_histogram()
    }

    /// Prints the chain-length histogram of the underlying table to stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        self.table.print_chain_histogram();
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates an empty map using the default configuration and hasher
    /// builder.
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates an empty map with the given sizing policy using the default
    /// hasher builder.
    pub fn with_config(config: MapConfig) -> Self {
        Self::with_config_and_hasher(config, S::default())
    }
}

impl<K, V, S> Default for ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert_pair(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

/// An iterator over the key-value pairs of a `ChainedHashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An owning iterator over the key-value pairs of a `ChainedHashMap`.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
