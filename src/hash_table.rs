use std::{
    borrow::Borrow,
    hash::{BuildHasher, BuildHasherDefault, DefaultHasher, Hash},
    iter::FusedIterator,
    slice,
};

use log::{debug, warn};

use crate::primes::{self, DEFAULT_CAPACITY, MAX_PRIME};

/// Advisory size used by [`HashTable::default`].
pub const DEFAULT_SIZE_HINT: usize = 101;

/// Hasher builder used when none is given. It is unseeded, so bucket placement is deterministic.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;

/// The pairs whose keys hash to the same bucket, in insertion order
type Chain<K, V> = Vec<(K, V)>;

/// A hash table resolving collisions by separate chaining.
///
/// Every bucket holds a chain of key-value pairs. The number of buckets is always a prime taken
/// from [`primes`](crate::primes); once the number of stored pairs exceeds the number of buckets
/// (load factor above 1.0) the table grows to the first prime above twice its size and
/// redistributes every pair.
///
/// Keys are unique. Inserting a key that is already present is rejected and leaves the stored
/// value untouched.
///
/// Note: This implementation is not thread-safe. Wrap it in a `Mutex` to share it between
/// threads.
#[derive(Debug, Clone)]
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    /// One chain per bucket; the length of this vector is the capacity
    buckets: Vec<Chain<K, V>>,
    /// Number of pairs stored across all chains
    len: usize,
    /// Builds the hasher used to place keys into buckets
    hash_builder: S,
}

impl<K, V> HashTable<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty table sized for roughly `size` entries.
    ///
    /// The bucket count is the largest prime at or below `size`, and never less than
    /// [`DEFAULT_CAPACITY`].
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self::with_hasher(size, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for HashTable<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_HINT)
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates an empty table sized for roughly `size` entries that hashes keys with
    /// `hash_builder`.
    pub fn with_hasher(size: usize, hash_builder: S) -> Self {
        Self { buckets: empty_buckets(primes::initial_capacity(size)), len: 0, hash_builder }
    }

    /// Maps a key to the index of its bucket under the current capacity
    pub(crate) fn bucket_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        bucket_for(self.hash_builder.hash_one(key), self.buckets.len())
    }

    /// Returns the chain a key belongs to
    fn chain<Q>(&self, key: &Q) -> Option<&Chain<K, V>>
    where
        Q: Hash + ?Sized,
    {
        self.buckets.get(self.bucket_index(key))
    }

    /// Returns `true` if the table holds a pair with the given key.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns `true` if the table holds a pair with the same key *and* an equal value.
    pub fn match_pair(&self, pair: &(K, V)) -> bool
    where
        V: PartialEq,
    {
        let (key, value) = pair;
        self.get(key).is_some_and(|stored| stored == value)
    }

    /// Returns the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.chain(key)?.iter().find(|(k, _)| k.borrow() == key).map(|(_, v)| v)
    }

    /// Inserts a pair, taking ownership of it.
    ///
    /// Returns `false` without touching the table if the key is already present. Otherwise the
    /// pair is appended to its chain and `true` is returned; the table rehashes when this pushes
    /// the load factor above 1.0, unless it already has [`MAX_PRIME`] buckets.
    pub fn insert(&mut self, pair: (K, V)) -> bool {
        let index = self.bucket_index(&pair.0);
        debug_assert!(index < self.buckets.len(), "bucket index {index} out of range");
        let Some(chain) = self.buckets.get_mut(index) else {
            return false;
        };
        if chain.iter().any(|(k, _)| *k == pair.0) {
            return false;
        }

        chain.push(pair);
        self.len = self.len.saturating_add(1);

        if self.len > self.buckets.len() && self.buckets.len() < MAX_PRIME {
            self.rehash();
        }

        true
    }

    /// Inserts a copy of `pair`.
    ///
    /// Same contract as [`insert`](Self::insert); the pair is only cloned when it is actually
    /// stored.
    pub fn insert_cloned(&mut self, pair: &(K, V)) -> bool
    where
        K: Clone,
        V: Clone,
    {
        if self.contains(&pair.0) {
            return false;
        }
        self.insert(pair.clone())
    }

    /// Removes the pair with the given key. Returns `false` if there was none.
    ///
    /// The remaining pairs of the chain keep their order. The table never shrinks on removal.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_index(key);
        let Some(chain) = self.buckets.get_mut(index) else {
            return false;
        };
        let Some(position) = chain.iter().position(|(k, _)| k.borrow() == key) else {
            return false;
        };

        chain.remove(position);
        self.len = self.len.saturating_sub(1);
        true
    }

    /// Grows the bucket array and moves every pair into its chain under the new capacity.
    ///
    /// Pairs are moved, not reinserted, so this never recurses and never changes `len`.
    fn rehash(&mut self) {
        let old_capacity = self.buckets.len();
        let new_capacity = primes::next_capacity(old_capacity);
        if new_capacity <= old_capacity {
            return;
        }

        let mut buckets = empty_buckets(new_capacity);
        let mut moved: usize = 0;
        for (key, value) in self.buckets.drain(..).flatten() {
            let index = bucket_for(self.hash_builder.hash_one(&key), new_capacity);
            debug_assert!(index < new_capacity, "bucket index {index} out of range");
            if let Some(chain) = buckets.get_mut(index) {
                chain.push((key, value));
                moved = moved.saturating_add(1);
            }
        }
        debug_assert_eq!(moved, self.len, "rehash must move every entry exactly once");
        self.buckets = buckets;

        debug!("rehashed {} entries from {old_capacity} to {new_capacity} buckets", self.len);
        if new_capacity >= MAX_PRIME {
            warn!(
                "hash table reached its maximum of {MAX_PRIME} buckets, chains grow from here on \
                 ({} entries)",
                self.len
            );
        }
    }
}

impl<K, V, S> HashTable<K, V, S> {
    /// Removes every pair and shrinks the table back to [`DEFAULT_CAPACITY`] buckets.
    pub fn clear(&mut self) {
        self.buckets = empty_buckets(DEFAULT_CAPACITY);
        self.len = 0;
    }

    /// Returns the number of stored pairs.
    #[must_use]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Returns the number of stored pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no pairs are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the ratio of stored pairs to buckets.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// Returns the length of every chain, in bucket order.
    pub fn chain_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(Vec::len)
    }

    /// Returns the length of the longest chain.
    #[must_use]
    pub fn longest_chain(&self) -> usize {
        self.chain_lengths().max().unwrap_or(0)
    }

    /// Iterates over the chains in bucket order, yielding each bucket's index and its pairs.
    pub(crate) fn chains(&self) -> impl Iterator<Item = (usize, &[(K, V)])> + '_ {
        self.buckets.iter().map(Vec::as_slice).enumerate()
    }

    /// Returns an iterator over the stored pairs.
    ///
    /// Buckets are visited in index order and each chain in insertion order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter { buckets: self.buckets.iter(), chain: Default::default(), remaining: self.len }
    }
}

/// Allocates `capacity` empty chains
fn empty_buckets<K, V>(capacity: usize) -> Vec<Chain<K, V>> {
    let mut buckets = Vec::with_capacity(capacity);
    buckets.resize_with(capacity, Vec::new);
    buckets
}

/// Reduces a 64-bit hash to a bucket index in `0..capacity`
#[allow(clippy::cast_possible_truncation)]
fn bucket_for(hash: u64, capacity: usize) -> usize {
    // capacity never exceeds MAX_PRIME, so both conversions are lossless
    let capacity = u64::try_from(capacity).unwrap_or(u64::MAX);
    hash.checked_rem(capacity).map_or(0, |index| index as usize)
}

impl<K, V, S> Extend<(K, V)> for HashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for pair in iter {
            self.insert(pair);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for HashTable<K, V>
where
    K: Eq + Hash,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::default();
        table.extend(iter);
        table
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the key-value pairs of a [`HashTable`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    /// Buckets not yet visited
    buckets: slice::Iter<'a, Chain<K, V>>,
    /// Rest of the chain currently being walked
    chain: slice::Iter<'a, (K, V)>,
    /// Pairs left to yield
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, value)) = self.chain.next() {
                self.remaining = self.remaining.saturating_sub(1);
                return Some((key, value));
            }
            self.chain = self.buckets.next()?.iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::HashTableExtensions;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};

    fn init_test_logger() {
        let _ = env_logger::builder().filter_level(log::LevelFilter::Trace).is_test(true).try_init();
    }

    fn sorted_pairs<S: BuildHasher>(table: &HashTable<i32, String, S>) -> Vec<(i32, String)> {
        let mut pairs = table.pairs();
        pairs.sort();
        pairs
    }

    #[test]
    fn test_new_uses_prime_capacity() {
        assert_eq!(HashTable::<i32, i32>::new(101).capacity(), 101);
        assert_eq!(HashTable::<i32, i32>::new(100).capacity(), 97);
        assert_eq!(HashTable::<i32, i32>::new(0).capacity(), DEFAULT_CAPACITY);
        assert_eq!(HashTable::<i32, i32>::new(4).capacity(), DEFAULT_CAPACITY);
        assert_eq!(HashTable::<i32, i32>::default().capacity(), 101);
        assert_eq!(HashTable::<i32, i32>::new(usize::MAX).capacity(), MAX_PRIME);
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut table = HashTable::new(11);
        assert!(table.insert((1, "a".to_string())));
        assert!(table.insert((2, "b".to_string())));
        assert!(!table.insert((1, "c".to_string())));

        assert_eq!(table.size(), 2);
        assert!(table.contains(&1));
        assert!(table.match_pair(&(1, "a".to_string())));
        assert!(!table.match_pair(&(1, "c".to_string())));
        assert_eq!(table.get(&1).map(String::as_str), Some("a"));
    }

    #[test]
    fn test_match_pair_needs_key_and_value() {
        let mut table = HashTable::new(11);
        table.insert(("apple".to_string(), 1));

        assert!(table.match_pair(&("apple".to_string(), 1)));
        assert!(!table.match_pair(&("apple".to_string(), 2)));
        assert!(!table.match_pair(&("pear".to_string(), 1)));
    }

    #[test]
    fn test_insert_cloned() {
        let mut table = HashTable::new(11);
        let pair = ("key1".to_string(), 1);

        assert!(table.insert_cloned(&pair));
        assert!(!table.insert_cloned(&pair));
        assert!(!table.insert_cloned(&("key1".to_string(), 2)));
        assert_eq!(table.get("key1"), Some(&1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_borrowed_lookup() {
        let mut table = HashTable::new(11);
        table.insert(("key1".to_string(), 1));

        assert!(table.contains("key1"));
        assert!(!table.contains("key2"));
        assert!(table.remove("key1"));
        assert!(!table.contains("key1"));
    }

    #[test]
    fn test_remove() {
        let mut table = HashTable::new(11);
        table.insert((1, 10));
        table.insert((2, 20));

        assert!(table.remove(&1));
        assert!(!table.contains(&1));
        assert!(table.contains(&2));
        assert!(!table.remove(&1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove_keeps_chain_order() {
        let mut table: HashTable<i32, i32> = HashTable::new(11);
        let colliding: Vec<i32> =
            (0..10_000).filter(|k| table.bucket_index(k) == 0).take(3).collect();
        assert_eq!(colliding.len(), 3);
        for &key in &colliding {
            table.insert((key, key));
        }

        assert!(table.remove(&colliding[1]));
        let chain: Vec<i32> = table.chains().next().unwrap().1.iter().map(|(k, _)| *k).collect();
        assert_eq!(chain, vec![colliding[0], colliding[2]]);
    }

    #[test]
    fn test_rehash_at_twelfth_insert() {
        init_test_logger();
        let mut table = HashTable::new(11);
        assert_eq!(table.capacity(), 11);

        for key in 0..11 {
            assert!(table.insert((key, key * 2)));
        }
        assert_eq!(table.capacity(), 11);

        assert!(table.insert((11, 22)));
        assert_eq!(table.capacity(), 23);
        assert_eq!(table.len(), 12);
        for key in 0..12 {
            assert!(table.contains(&key));
            assert_eq!(table.get(&key), Some(&(key * 2)));
        }
    }

    #[test]
    fn test_rehash_preserves_every_pair() {
        init_test_logger();
        let mut table = HashTable::new(11);
        let mut expected = Vec::new();

        for key in 0..500 {
            let pair = (key, format!("value-{key}"));
            expected.push(pair.clone());
            assert!(table.insert(pair));
        }

        assert!(table.capacity() > 11);
        assert!(primes::is_prime(table.capacity()));
        assert!(table.load_factor() <= 1.0);
        assert_eq!(sorted_pairs(&table), expected);
        assert_eq!(table.chain_lengths().sum::<usize>(), table.len());
    }

    #[test]
    fn test_bucket_for_stays_in_range() {
        for capacity in [DEFAULT_CAPACITY, 23, 101, MAX_PRIME] {
            for hash in [0, 1, 10, 11, 12, u64::MAX, u64::MAX - 1, 0x9e37_79b9_7f4a_7c15] {
                assert!(bucket_for(hash, capacity) < capacity);
            }
        }
        assert_eq!(bucket_for(25, 11), 3);
    }

    #[test]
    fn test_growth_stops_at_max_capacity() {
        init_test_logger();
        // The largest prime below the cap grows straight to the cap on its next rehash.
        let mut table: HashTable<u32, ()> = HashTable::new(MAX_PRIME - 1);
        let start = table.capacity();
        assert!(start < MAX_PRIME);
        assert_eq!(primes::next_capacity(start), MAX_PRIME);

        let total = u32::try_from(MAX_PRIME).unwrap() + 1_000;
        for key in 0..total {
            assert!(table.insert((key, ())));
            if key == u32::try_from(start).unwrap() {
                assert_eq!(table.capacity(), MAX_PRIME);
            }
        }

        assert_eq!(table.capacity(), MAX_PRIME);
        assert_eq!(table.len(), usize::try_from(total).unwrap());
        assert_eq!(table.chain_lengths().sum::<usize>(), table.len());
        assert!(table.load_factor() > 1.0);
        assert!(table.longest_chain() >= 2);
        assert!((0..total).all(|key| table.contains(&key)));
        assert!(!table.insert((0, ())));
    }

    #[test]
    fn test_clear_resets_capacity() {
        let mut table = HashTable::new(11);
        for key in 0..100 {
            table.insert((key, key));
        }
        assert!(table.capacity() > DEFAULT_CAPACITY);

        table.clear();

        assert_eq!(table.size(), 0);
        assert!(table.is_empty());
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
        for key in 0..100 {
            assert!(!table.contains(&key));
        }
        assert!(table.insert((1, 1)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_iter() {
        let mut table = HashTable::new(11);
        table.insert(("key1".to_string(), 1));
        table.insert(("key2".to_string(), 2));
        table.insert(("key3".to_string(), 3));

        let iter = table.iter();
        assert_eq!(iter.len(), 3);

        let mut count = 0;
        let mut sum = 0;
        for (_, &value) in &table {
            count += 1;
            sum += value;
        }

        assert_eq!(count, 3);
        assert_eq!(sum, 6);
    }

    #[test]
    fn test_iter_follows_bucket_then_chain_order() {
        let mut table = HashTable::new(11);
        for key in 0..40 {
            table.insert((key, ()));
        }

        let from_chains: Vec<i32> =
            table.chains().flat_map(|(_, chain)| chain.iter().map(|(k, _)| *k)).collect();
        let from_iter: Vec<i32> = table.iter().map(|(k, _)| *k).collect();
        assert_eq!(from_iter, from_chains);
    }

    #[test]
    fn test_from_iter_and_extend_reject_duplicates() {
        let mut table: HashTable<&str, i32> = [("a", 1), ("b", 2), ("a", 3)].into_iter().collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a"), Some(&1));

        table.extend([("c", 4), ("b", 5)]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("b"), Some(&2));
        assert_eq!(table.get("c"), Some(&4));
    }

    #[test]
    fn test_custom_hasher() {
        let mut table = HashTable::with_hasher(11, std::hash::RandomState::new());
        for key in 0..50 {
            assert!(table.insert((key, key)));
        }
        assert_eq!(table.len(), 50);
        assert!((0..50).all(|key| table.contains(&key)));
    }

    #[test]
    fn test_shared_behind_mutex() {
        use std::sync::{Arc, Mutex};
        use std::thread;

        let table = Arc::new(Mutex::new(HashTable::new(11)));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for i in 0..100 {
                        table.lock().unwrap().insert((t * 100 + i, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.lock().unwrap().len(), 400);
    }

    proptest! {
        #[test]
        fn prop_size_counts_distinct_keys(pairs in prop::collection::vec((0u16..300, any::<i32>()), 0..400)) {
            let mut table = HashTable::new(11);
            let mut model: HashMap<u16, i32> = HashMap::new();
            for (key, value) in pairs {
                let fresh = !model.contains_key(&key);
                if fresh {
                    model.insert(key, value);
                }
                prop_assert_eq!(table.insert((key, value)), fresh);
            }

            prop_assert_eq!(table.size(), model.len());
            prop_assert_eq!(table.chain_lengths().sum::<usize>(), model.len());
            for (key, value) in &model {
                prop_assert_eq!(table.get(key), Some(value));
            }
        }

        #[test]
        fn prop_insert_then_remove(keys in prop::collection::hash_set(any::<u32>(), 0..200)) {
            let mut table = HashTable::new(11);
            for &key in &keys {
                prop_assert!(table.insert((key, key)));
                prop_assert!(table.contains(&key));
            }
            prop_assert!(table.load_factor() <= 1.0);

            let removed: HashSet<u32> = keys.iter().copied().filter(|k| k % 2 == 0).collect();
            for key in &removed {
                prop_assert!(table.remove(key));
                prop_assert!(!table.contains(key));
            }
            prop_assert_eq!(table.len(), keys.len() - removed.len());
            for key in keys.difference(&removed) {
                prop_assert!(table.contains(key));
            }
        }
    }
}
