//! Utility traits for `HashTable`

use crate::HashTable;

/// Extension trait that copies the contents of a table out into plain vectors
pub trait HashTableExtensions<K, V> {
    /// Returns the keys of the table as a Vec, in iteration order
    fn keys(&self) -> Vec<K>;

    /// Returns the values of the table as a Vec, in iteration order
    fn values(&self) -> Vec<V>;

    /// Returns every stored pair as a Vec, in iteration order
    fn pairs(&self) -> Vec<(K, V)>;
}

impl<K, V, S> HashTableExtensions<K, V> for HashTable<K, V, S>
where
    K: Clone,
    V: Clone,
{
    fn keys(&self) -> Vec<K> {
        self.iter().map(|(k, _)| k.clone()).collect()
    }

    fn values(&self) -> Vec<V> {
        self.iter().map(|(_, v)| v.clone()).collect()
    }

    fn pairs(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}
