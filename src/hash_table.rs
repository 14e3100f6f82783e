use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;

use log::debug;
use log::trace;

use crate::config::MapConfig;

/// Reduces a 64-bit hash to a bucket index.
///
/// The hash is read as a signed value and its magnitude is taken before the
/// modulo, so a hash and its negation share a bucket.
#[inline(always)]
fn bucket_index(hash: u64, capacity: usize) -> usize {
    ((hash as i64).unsigned_abs() % capacity as u64) as usize
}

fn empty_buckets<K, V>(capacity: usize) -> Vec<Option<Box<Entry<K, V>>>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, || None);
    buckets
}

/// Unlinks a chain node by node. Dropping the head directly would recurse
/// once per node.
fn release_chain<K, V>(mut link: Option<Box<Entry<K, V>>>) {
    while let Some(mut entry) = link {
        link = entry.next.take();
    }
}

fn chain<K, V>(head: Option<&Entry<K, V>>) -> impl Iterator<Item = &Entry<K, V>> {
    core::iter::successors(head, |entry| entry.next())
}

/// A node of a bucket chain.
///
/// Every entry exclusively owns the next node of its chain, so each bucket is
/// a singly linked list rooted in a table slot.
pub struct Entry<K, V> {
    key: K,
    value: V,
    next: Option<Box<Entry<K, V>>>,
}

impl<K, V> Entry<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            next: None,
        }
    }

    /// The key stored in this node.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The value stored in this node.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The following node in the same chain, if any.
    pub fn next(&self) -> Option<&Entry<K, V>> {
        self.next.as_deref()
    }
}

impl<K: Debug, V: Debug> Debug for Entry<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("has_next", &self.next.is_some())
            .finish()
    }
}

/// Chain statistics for hash table analysis.
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct ChainStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Number of buckets
    pub capacity: usize,
    /// Buckets holding at least one entry
    pub occupied_buckets: usize,
    /// Buckets with no chain
    pub empty_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / capacity)
    pub load_factor: f64,
    /// Bucket utilization (occupied_buckets / capacity)
    pub bucket_utilization: f64,
    /// Mean length of the non-empty chains
    pub average_chain: f64,
    /// Bytes held by the bucket array and the chain nodes
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl ChainStats {
    /// Pretty-print the chain statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Chained Table Statistics ===");
        println!(
            "Population: {}/{} buckets ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% utilization, {} empty)",
            self.occupied_buckets,
            self.capacity,
            self.bucket_utilization * 100.0,
            self.empty_buckets
        );
        println!(
            "Chains: longest {}, average {:.2}",
            self.longest_chain, self.average_chain
        );
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// A hash table resolving collisions by external chaining.
///
/// `HashTable<K, V>` keeps an array of buckets, each holding the head of a
/// singly linked chain of [`Entry`] nodes. Like other raw tables, it does not
/// hash keys itself: callers pass the hash of the key for every operation, an
/// equality predicate for lookups, and a rehash function for insertions that
/// may grow the table.
///
/// ## Growth
///
/// Before each insertion the table checks whether one more entry would push
/// it over its maximum load factor. If so, it allocates `2 * capacity + 1`
/// buckets and re-inserts every entry, in bucket then chain order, before
/// placing the new one. The check happens before the key is looked up, so an
/// update made at the threshold also grows the table.
///
/// ## Example
///
/// ```rust
/// # use core::hash::Hash;
/// # use core::hash::Hasher;
/// #
/// # use chain_hash::hash_table::HashTable;
/// # use siphasher::sip::SipHasher;
/// #
/// # fn hash_id(id: &u64) -> u64 {
/// #     let mut hasher = SipHasher::new();
/// #     id.hash(&mut hasher);
/// #     hasher.finish()
/// # }
///
/// let mut table = HashTable::new();
///
/// assert_eq!(table.insert(hash_id(&123), 123, "Alice", hash_id), None);
/// assert_eq!(table.insert(hash_id(&123), 123, "Bob", hash_id), Some("Alice"));
///
/// assert_eq!(table.find(hash_id(&123), |id| *id == 123), Some((&123, &"Bob")));
/// assert_eq!(table.remove(hash_id(&123), |id| *id == 123), Some((123, "Bob")));
/// assert!(table.is_empty());
/// ```
pub struct HashTable<K, V> {
    buckets: Vec<Option<Box<Entry<K, V>>>>,
    populated: usize,
    config: MapConfig,
}

impl<K, V> Debug for HashTable<K, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field(
                "chains",
                &self
                    .buckets
                    .iter()
                    .map(|head| chain(head.as_deref()).count())
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.populated)
            .field("capacity", &self.buckets.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<K, V> Clone for HashTable<K, V>
where
    K: Clone,
    V: Clone,
{
    fn clone(&self) -> Self {
        let buckets = self
            .buckets
            .iter()
            .map(|head| {
                let mut copy = None;
                let mut tail = &mut copy;
                for entry in chain(head.as_deref()) {
                    let node = tail.insert(Box::new(Entry::new(
                        entry.key.clone(),
                        entry.value.clone(),
                    )));
                    tail = &mut node.next;
                }
                copy
            })
            .collect();

        Self {
            buckets,
            populated: self.populated,
            config: self.config,
        }
    }
}

impl<K, V> Drop for HashTable<K, V> {
    fn drop(&mut self) {
        for head in self.buckets.drain(..) {
            release_chain(head);
        }
    }
}

impl<K, V> Default for HashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> HashTable<K, V> {
    /// Creates an empty table with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MapConfig::default())
    }

    /// Creates an empty table with `config.starting_capacity()` buckets.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::MapConfig;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u64, String> = HashTable::with_config(MapConfig::new(7, 0.5).unwrap());
    /// assert_eq!(table.capacity(), 7);
    /// ```
    pub fn with_config(config: MapConfig) -> Self {
        Self {
            buckets: empty_buckets(config.starting_capacity()),
            populated: 0,
            config,
        }
    }

    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the sizing policy of this table.
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[inline(always)]
    fn index_of(&self, hash: u64) -> usize {
        bucket_index(hash, self.buckets.len())
    }

    /// Finds the entry matching `eq` in the chain selected by `hash`.
    pub fn find(&self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<(&K, &V)> {
        chain(self.buckets[self.index_of(hash)].as_deref())
            .find(|entry| eq(&entry.key))
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Finds the entry matching `eq` and returns mutable access to its value.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<&mut V> {
        let index = self.index_of(hash);
        let mut link = self.buckets[index].as_deref_mut();
        while let Some(entry) = link {
            if eq(&entry.key) {
                return Some(&mut entry.value);
            }
            link = entry.next.as_deref_mut();
        }

        None
    }

    /// Inserts `key`/`value`, returning the previous value if an equal key
    /// was already present.
    ///
    /// `hash` must be the hash of `key`; `hasher` recomputes the hash of any
    /// stored key and is only called when the table grows.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::MapConfig;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_config(MapConfig::new(5, 0.75).unwrap());
    /// for key in 1..=3u64 {
    ///     table.insert(key, key, (), |k| *k);
    /// }
    /// assert_eq!(table.capacity(), 5);
    ///
    /// // (3 + 1) / 5 > 0.75, so the fourth insertion grows the table first.
    /// table.insert(4, 4, (), |k| *k);
    /// assert_eq!(table.capacity(), 11);
    /// assert_eq!(table.len(), 4);
    /// ```
    pub fn insert(&mut self, hash: u64, key: K, value: V, hasher: impl Fn(&K) -> u64) -> Option<V>
    where
        K: Eq,
    {
        self.insert_checked(hash, key, value, &hasher)
    }

    fn insert_checked(
        &mut self,
        hash: u64,
        key: K,
        value: V,
        hasher: &dyn Fn(&K) -> u64,
    ) -> Option<V>
    where
        K: Eq,
    {
        if self
            .config
            .exceeds(self.populated + 1, self.buckets.len())
        {
            self.resize(hasher);
        }

        self.insert_no_grow(hash, key, value)
    }

    fn insert_no_grow(&mut self, hash: u64, key: K, value: V) -> Option<V>
    where
        K: Eq,
    {
        let index = self.index_of(hash);
        let mut depth = 0;
        let mut link = &mut self.buckets[index];
        while let Some(entry) = link {
            if entry.key == key {
                return Some(core::mem::replace(&mut entry.value, value));
            }
            link = &mut entry.next;
            depth += 1;
        }

        *link = Some(Box::new(Entry::new(key, value)));
        self.populated += 1;
        trace!("appended entry to bucket {index} at chain position {depth}");
        None
    }

    /// Grows to `2 * capacity + 1` buckets and re-inserts every entry.
    ///
    /// Re-insertion goes through the load-factor check again, so a very small
    /// maximum load factor can grow the new table before the rebuild ends.
    fn resize(&mut self, hasher: &dyn Fn(&K) -> u64)
    where
        K: Eq,
    {
        let old_capacity = self.buckets.len();
        let new_capacity = old_capacity
            .checked_mul(2)
            .and_then(|doubled| doubled.checked_add(1))
            .expect("capacity overflow");

        let old_buckets = core::mem::replace(&mut self.buckets, empty_buckets(new_capacity));
        let moved = core::mem::replace(&mut self.populated, 0);

        for (key, value) in IntoIter::new(old_buckets, moved) {
            let hash = hasher(&key);
            self.insert_checked(hash, key, value, hasher);
        }

        debug_assert_eq!(self.populated, moved);
        debug!(
            "resized chained table from {old_capacity} to {new_capacity} buckets ({moved} entries, now {} buckets)",
            self.buckets.len()
        );
    }

    /// Removes the entry matching `eq` from the chain selected by `hash` and
    /// returns its key and value.
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&K) -> bool) -> Option<(K, V)> {
        let index = self.index_of(hash);
        let position = chain(self.buckets[index].as_deref()).position(|entry| eq(&entry.key))?;

        let mut link = &mut self.buckets[index];
        for _ in 0..position {
            link = &mut link.as_mut()?.next;
        }

        let mut removed = link.take()?;
        *link = removed.next.take();
        self.populated -= 1;
        trace!("unlinked entry from bucket {index} at chain position {position}");

        let Entry { key, value, .. } = *removed;
        Some((key, value))
    }

    /// Removes every entry and shrinks back to the starting capacity.
    pub fn clear(&mut self) {
        let starting_capacity = self.config.starting_capacity();
        if self.buckets.len() != starting_capacity {
            debug!(
                "clearing chained table from {} back to {starting_capacity} buckets",
                self.buckets.len()
            );
        }

        let old_buckets = core::mem::replace(&mut self.buckets, empty_buckets(starting_capacity));
        self.populated = 0;
        for head in old_buckets {
            release_chain(head);
        }
    }

    /// Returns an iterator over the entries in bucket order, walking each
    /// chain from head to tail.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.populated,
        }
    }

    /// Exposes the bucket array. Intended for tests and diagnostics only.
    #[cfg(any(test, feature = "stats"))]
    pub fn raw_table(&self) -> &[Option<Box<Entry<K, V>>>] {
        &self.buckets
    }

    /// Computes a histogram of chain lengths.
    ///
    /// Index `n` of the returned vector holds the number of buckets whose
    /// chain has exactly `n` entries; index 0 counts empty buckets.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; 1];
        for head in &self.buckets {
            let length = chain(head.as_deref()).count();
            if length >= hist.len() {
                hist.resize(length + 1, 0);
            }
            hist[length] += 1;
        }

        hist
    }

    /// Returns occupancy statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> ChainStats {
        let hist = self.chain_histogram();
        let capacity = self.buckets.len();
        let empty_buckets = hist[0];
        let occupied_buckets = capacity - empty_buckets;

        ChainStats {
            populated: self.populated,
            capacity,
            occupied_buckets,
            empty_buckets,
            longest_chain: hist.len() - 1,
            load_factor: self.populated as f64 / capacity as f64,
            bucket_utilization: occupied_buckets as f64 / capacity as f64,
            average_chain: if occupied_buckets == 0 {
                0.0
            } else {
                self.populated as f64 / occupied_buckets as f64
            },
            total_bytes: capacity * core::mem::size_of::<Option<Box<Entry<K, V>>>>()
                + self.populated * core::mem::size_of::<Entry<K, V>>(),
        }
    }

    /// Pretty-prints the chain-length histogram horizontally using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = hist.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "chain histogram ({} entries in {} buckets):",
            self.populated,
            self.buckets.len()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                0 => None,
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                _ => Some('▉'),
            };
            bar.extend(partial);
            bar
        };

        for (length, &count) in hist.iter().enumerate() {
            println!("{:>3} | {} ({})", length, make_bar(count), count);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a HashTable<K, V> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> IntoIterator for HashTable<K, V> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(mut self) -> Self::IntoIter {
        let buckets = core::mem::take(&mut self.buckets);
        IntoIter::new(buckets, self.populated)
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// Entries are yielded bucket by bucket, each chain from head to tail.
pub struct Iter<'a, K, V> {
    buckets: core::slice::Iter<'a, Option<Box<Entry<K, V>>>>,
    chain: Option<&'a Entry<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain {
                self.chain = entry.next.as_deref();
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }

            self.chain = self.buckets.next()?.as_deref();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An owning iterator over the entries of a [`HashTable`], in the same order
/// as [`Iter`].
pub struct IntoIter<K, V> {
    buckets: alloc::vec::IntoIter<Option<Box<Entry<K, V>>>>,
    chain: Option<Box<Entry<K, V>>>,
    remaining: usize,
}

impl<K, V> IntoIter<K, V> {
    fn new(buckets: Vec<Option<Box<Entry<K, V>>>>, remaining: usize) -> Self {
        Self {
            buckets: buckets.into_iter(),
            chain: None,
            remaining,
        }
    }
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(mut entry) = self.chain.take() {
                self.chain = entry.next.take();
                self.remaining -= 1;
                let Entry { key, value, .. } = *entry;
                return Some((key, value));
            }

            self.chain = self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> Drop for IntoIter<K, V> {
    fn drop(&mut self) {
        for _ in &mut *self {}
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    fn small_config() -> MapConfig {
        MapConfig::new(5, 0.75).unwrap()
    }

    fn identity(key: &u64) -> u64 {
        *key
    }

    fn colliding(_: &u64) -> u64 {
        0
    }

    fn chain_keys(table: &HashTable<u64, i32>, bucket: usize) -> Vec<u64> {
        chain(table.raw_table()[bucket].as_deref())
            .map(|entry| *entry.key())
            .collect()
    }

    #[test]
    fn insert_and_find() {
        crate::test_logging::init();
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::new();
        for k in 0..64u64 {
            let hash = hash_key(&state, k);
            assert_eq!(
                table.insert(hash, k, k as i32 * 2, |k| hash_key(&state, *k)),
                None
            );
            assert_eq!(
                table.find(hash, |key| *key == k),
                Some((&k, &(k as i32 * 2))),
                "{:#?}",
                table
            );
        }
        assert_eq!(table.len(), 64);

        for k in 0..64u64 {
            let hash = hash_key(&state, k);
            assert_eq!(table.find(hash, |key| *key == k), Some((&k, &(k as i32 * 2))));
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |key| *key == 999).is_none());
    }

    #[test]
    fn duplicate_insert_updates_in_place() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::new();
        let hash = hash_key(&state, 42);

        assert_eq!(table.insert(hash, 42, 7, |k| hash_key(&state, *k)), None);
        assert_eq!(table.insert(hash, 42, 11, |k| hash_key(&state, *k)), Some(7));
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(hash, |k| *k == 42), Some((&42, &11)));
    }

    #[test]
    fn find_mut_updates_value() {
        let mut table: HashTable<u64, String> = HashTable::with_config(small_config());
        table.insert(3, 3, "three".to_string(), identity);
        table.insert(8, 8, "eight".to_string(), identity);

        table.find_mut(8, |k| *k == 8).unwrap().push('!');
        assert_eq!(table.find(8, |k| *k == 8), Some((&8, &"eight!".to_string())));
        assert!(table.find_mut(13, |k| *k == 13).is_none());
    }

    #[test]
    fn bucket_index_uses_magnitude() {
        assert_eq!(bucket_index(7, 5), 2);
        assert_eq!(bucket_index(-7i64 as u64, 5), 2);
        assert_eq!(bucket_index(u64::MAX, 5), 1);
        // |i64::MIN| = 2^63 and 2^63 = 8^21 ≡ 1 (mod 7).
        assert_eq!(bucket_index(i64::MIN as u64, 7), 1);
    }

    #[test]
    fn placement_follows_reduced_hash() {
        let mut table: HashTable<u64, i32> = HashTable::with_config(small_config());
        table.insert(1, 1, 10, identity);
        table.insert(2, 2, 20, identity);
        table.insert(7, 7, 70, identity);

        assert_eq!(chain_keys(&table, 1), vec![1]);
        assert_eq!(chain_keys(&table, 2), vec![2, 7]);
        assert!(table.raw_table()[0].is_none());
        assert!(table.raw_table()[3].is_none());
    }

    #[test]
    fn resize_grows_to_odd_capacity() {
        crate::test_logging::init();
        let mut table: HashTable<u64, i32> = HashTable::with_config(small_config());
        let mut capacities = vec![table.capacity()];
        for k in 0..40u64 {
            table.insert(k, k, k as i32, identity);
            if *capacities.last().unwrap() != table.capacity() {
                capacities.push(table.capacity());
            }
            assert!(!table.config().exceeds(table.len(), table.capacity()));
        }

        assert_eq!(capacities, vec![5, 11, 23, 47, 95]);
        for k in 0..40u64 {
            assert_eq!(table.find(k, |key| *key == k), Some((&k, &(k as i32))));
        }
    }

    #[test]
    fn resize_rehashes_every_entry() {
        let mut table: HashTable<u64, i32> = HashTable::with_config(small_config());
        for k in [3u64, 8, 13] {
            table.insert(k, k, 0, identity);
        }
        assert_eq!(chain_keys(&table, 3), vec![3, 8, 13]);

        table.insert(20, 20, 0, identity);
        assert_eq!(table.capacity(), 11);
        assert_eq!(chain_keys(&table, 3), vec![3]);
        assert_eq!(chain_keys(&table, 8), vec![8]);
        assert_eq!(chain_keys(&table, 2), vec![13]);
        assert_eq!(chain_keys(&table, 9), vec![20]);
    }

    #[test]
    fn update_at_threshold_still_resizes() {
        let mut table: HashTable<u64, i32> = HashTable::with_config(small_config());
        for k in 1..=3u64 {
            table.insert(k, k, 0, identity);
        }
        assert_eq!(table.capacity(), 5);

        assert_eq!(table.insert(1, 1, 5, identity), Some(0));
        assert_eq!(table.capacity(), 11);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn rebuild_rechecks_load_factor() {
        let config = MapConfig::new(5, 0.01).unwrap();
        let mut table: HashTable<u64, i32> = HashTable::with_config(config);

        table.insert(1, 1, 10, identity);
        assert_eq!(table.capacity(), 11);

        // Growing to 23 re-adds key 1, which sees 1 / 23 > 0.01 and grows
        // again before key 2 is placed.
        table.insert(2, 2, 20, identity);
        assert_eq!(table.capacity(), 47);
        assert_eq!(table.len(), 2);
        assert_eq!(chain_keys(&table, 1), vec![1]);
        assert_eq!(chain_keys(&table, 2), vec![2]);
    }

    #[test]
    fn colliding_chain_appends_at_tail() {
        let config = MapConfig::new(5, 100.0).unwrap();
        let mut table: HashTable<u64, i32> = HashTable::with_config(config);
        for k in [4u64, 9, 1, 7] {
            table.insert(0, k, k as i32, colliding);
        }

        assert_eq!(table.capacity(), 5);
        assert_eq!(chain_keys(&table, 0), vec![4, 9, 1, 7]);
        assert_eq!(
            table.iter().map(|(_, v)| *v).collect::<Vec<_>>(),
            vec![4, 9, 1, 7]
        );
    }

    #[test]
    fn remove_head_middle_and_tail() {
        let config = MapConfig::new(5, 100.0).unwrap();
        let mut table: HashTable<u64, i32> = HashTable::with_config(config);
        for k in 0..5u64 {
            table.insert(0, k, k as i32, colliding);
        }

        assert_eq!(table.remove(0, |k| *k == 0), Some((0, 0)));
        assert_eq!(chain_keys(&table, 0), vec![1, 2, 3, 4]);

        assert_eq!(table.remove(0, |k| *k == 2), Some((2, 2)));
        assert_eq!(chain_keys(&table, 0), vec![1, 3, 4]);

        assert_eq!(table.remove(0, |k| *k == 4), Some((4, 4)));
        assert_eq!(chain_keys(&table, 0), vec![1, 3]);

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn remove_missing_leaves_table_untouched() {
        let mut table: HashTable<u64, i32> = HashTable::with_config(small_config());
        assert_eq!(table.remove(2, |k| *k == 2), None);

        table.insert(2, 2, 1, identity);
        assert_eq!(table.remove(7, |k| *k == 7), None);
        assert_eq!(table.remove(3, |k| *k == 3), None);
        assert_eq!(table.len(), 1);
        assert_eq!(chain_keys(&table, 2), vec![2]);
    }

    #[test]
    fn clear_returns_to_starting_capacity() {
        let mut table: HashTable<u64, i32> = HashTable::with_config(small_config());
        for k in 0..20u64 {
            table.insert(k, k, 0, identity);
        }
        assert!(table.capacity() > 5);

        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), 5);
        assert!(table.raw_table().iter().all(Option::is_none));
        assert!(table.find(3, |k| *k == 3).is_none());
    }

    #[test]
    fn iteration_is_bucket_then_chain_order() {
        let mut table: HashTable<u64, i32> = HashTable::with_config(small_config());
        table.insert(7, 7, 70, identity);
        table.insert(4, 4, 40, identity);
        table.insert(2, 2, 20, identity);

        let iter = table.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(
            iter.map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
            vec![(7, 70), (2, 20), (4, 40)]
        );
    }

    #[test]
    fn into_iter_yields_owned_pairs() {
        let mut table: HashTable<u64, String> = HashTable::with_config(small_config());
        table.insert(1, 1, "one".to_string(), identity);
        table.insert(6, 6, "six".to_string(), identity);
        table.insert(3, 3, "three".to_string(), identity);

        let mut iter = table.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some((1, "one".to_string())));
        assert_eq!(iter.len(), 2);
        // Remaining entries are released when the iterator is dropped.
    }

    #[test]
    fn long_chain_drops_without_recursion() {
        let mut table: HashTable<u64, u64> = HashTable::with_config(small_config());
        let mut head = None;
        for k in 0..200_000u64 {
            let mut entry = Box::new(Entry::new(k, k));
            entry.next = head;
            head = Some(entry);
        }
        table.buckets[0] = head;
        table.populated = 200_000;

        assert_eq!(table.iter().count(), 200_000);
        drop(table);
    }

    #[test]
    fn clone_preserves_layout() {
        let config = MapConfig::new(5, 100.0).unwrap();
        let mut original: HashTable<u64, i32> = HashTable::with_config(config);
        for k in [5u64, 10, 15, 1] {
            original.insert(k, k, k as i32, identity);
        }

        let cloned = original.clone();
        assert_eq!(cloned.len(), original.len());
        assert_eq!(cloned.capacity(), original.capacity());
        assert_eq!(chain_keys(&cloned, 0), vec![5, 10, 15]);
        assert_eq!(chain_keys(&cloned, 1), vec![1]);

        original.clear();
        assert_eq!(cloned.len(), 4);
    }

    #[test]
    fn stats_and_histogram() {
        let config = MapConfig::new(5, 100.0).unwrap();
        let mut table: HashTable<u64, i32> = HashTable::with_config(config);
        for k in [0u64, 5, 10, 1, 6, 2] {
            table.insert(k, k, 0, identity);
        }

        assert_eq!(table.chain_histogram(), vec![2, 1, 1, 1]);

        let stats = table.debug_stats();
        assert_eq!(stats.populated, 6);
        assert_eq!(stats.capacity, 5);
        assert_eq!(stats.occupied_buckets, 3);
        assert_eq!(stats.empty_buckets, 2);
        assert_eq!(stats.longest_chain, 3);
        assert!((stats.average_chain - 2.0).abs() < f64::EPSILON);
        assert!((stats.load_factor - 1.2).abs() < 1e-9);
    }

    #[test]
    fn empty_histogram() {
        let table: HashTable<u64, i32> = HashTable::with_config(small_config());
        assert_eq!(table.chain_histogram(), vec![5]);
        assert_eq!(table.debug_stats().longest_chain, 0);
        assert_eq!(table.debug_stats().average_chain, 0.0);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    #[cfg(feature = "std")]
    fn histogram_output() {
        let state = HashState::default();
        let mut table: HashTable<u64, i32> = HashTable::new();
        for k in 0..10_000u64 {
            table.insert(hash_key(&state, k), k, k as i32, |k| hash_key(&state, *k));
        }

        table.print_chain_histogram();
        table.debug_stats().print();
    }

    #[test]
    fn debug_output_lists_chain_lengths() {
        let config = MapConfig::new(3, 100.0).unwrap();
        let mut table: HashTable<u64, i32> = HashTable::with_config(config);
        table.insert(0, 0, 0, identity);
        table.insert(3, 3, 0, identity);

        let rendered = alloc::format!("{:?}", table);
        assert!(rendered.contains("chains: [2, 0, 0]"), "{rendered}");
        assert!(rendered.contains("populated: 2"), "{rendered}");
    }
}
