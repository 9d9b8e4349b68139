//! # Chain Map
//!
//! A Rust implementation of a hash table with separate chaining and prime bucket counts.
//!
//! [`HashTable`] keeps one chain of key-value pairs per bucket. The bucket count is always a prime
//! from a table shared by the whole process (see [`primes`]); when the number of stored pairs
//! exceeds the number of buckets the table grows to the first prime above twice its size and
//! redistributes every pair.
//!
//! Inserting a key that is already present is rejected: `insert` returns `false` and the stored
//! value stays as it was.
//!
//! ## Basic Usage
//!
//! ```rust
//! use chainmap::HashTable;
//!
//! // Create a table with 11 buckets
//! let mut table = HashTable::new(11);
//!
//! // Insert pairs
//! assert!(table.insert((1, "a".to_string())));
//! assert!(table.insert((2, "b".to_string())));
//!
//! // Existing keys are never overwritten
//! assert!(!table.insert((1, "c".to_string())));
//! assert_eq!(table.size(), 2);
//! assert!(table.match_pair(&(1, "a".to_string())));
//! assert!(!table.match_pair(&(1, "c".to_string())));
//!
//! // Remove pairs
//! assert!(table.remove(&1));
//! assert!(!table.contains(&1));
//! ```
//!
//! ## Growth
//!
//! ```rust
//! use chainmap::HashTable;
//!
//! let mut table = HashTable::new(11);
//! for key in 0..12 {
//!     table.insert((key, key * key));
//! }
//!
//! // The twelfth pair pushed the load factor above 1.0
//! assert_eq!(table.capacity(), 23);
//! assert!((0..12).all(|key| table.contains(&key)));
//! ```
//!
//! ## Files
//!
//! ```rust,no_run
//! use chainmap::HashTable;
//!
//! let mut table: HashTable<String, u32> = HashTable::default();
//! if !table.load("scores.txt") {
//!     eprintln!("could not read scores.txt");
//! }
//! table.insert(("carol".to_string(), 7));
//! assert!(table.write_to_file("scores.txt"));
//! ```

/// Error types for loading and writing tables
mod error;
/// Module implementing the separate-chaining hash table
mod hash_table;
/// Line-oriented file persistence and diagnostic dumps
mod persist;
/// Prime bucket capacities shared by every table
pub mod primes;
/// Utility traits for the hash table
mod utils;

pub use error::{Error, Result};
pub use hash_table::{DEFAULT_SIZE_HINT, DefaultHashBuilder, HashTable, Iter};
pub use persist::LoadSummary;
pub use primes::{DEFAULT_CAPACITY, MAX_PRIME};
pub use utils::HashTableExtensions;
