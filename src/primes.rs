//! Prime bucket capacities.
//!
//! Bucket counts are always taken from a sorted table of primes up to [`MAX_PRIME`]. The table is
//! sieved once, on first use, and shared read-only by every `HashTable` in the process.

use log::trace;
use std::sync::OnceLock;

/// The largest bucket count a table will ever grow to.
pub const MAX_PRIME: usize = 1_301_081;

/// The smallest bucket count a table will ever use.
pub const DEFAULT_CAPACITY: usize = 11;

/// Sorted primes in `2..=MAX_PRIME`.
static PRIMES: OnceLock<Vec<u32>> = OnceLock::new();

/// Returns the shared prime table, sieving it on first access.
fn primes() -> &'static [u32] {
    PRIMES.get_or_init(|| {
        let primes = sieve(MAX_PRIME);
        trace!("built prime table: {} primes up to {MAX_PRIME}", primes.len());
        primes
    })
}

/// Sieve of Eratosthenes over `0..=limit`.
fn sieve(limit: usize) -> Vec<u32> {
    let mut composite = vec![false; limit.saturating_add(1)];
    let mut primes = Vec::new();

    for n in 2..=limit {
        if composite.get(n).copied().unwrap_or(true) {
            continue;
        }
        if let Ok(prime) = u32::try_from(n) {
            primes.push(prime);
        }
        // Multiples below n * n were already struck out by smaller primes.
        if let Some(start) = n.checked_mul(n) {
            for slot in composite.iter_mut().skip(start).step_by(n) {
                *slot = true;
            }
        }
    }

    primes
}

/// Widens a table entry back to `usize`.
fn widen(prime: u32) -> usize {
    usize::try_from(prime).unwrap_or(MAX_PRIME)
}

/// Returns the number of primes `<= n` in the table, i.e. the index of the first prime `> n`.
fn rank(n: usize) -> usize {
    let table = primes();
    match u32::try_from(n) {
        Ok(n) => table.partition_point(|&p| p <= n),
        Err(_) => table.len(),
    }
}

/// Returns `true` if `n` is a prime no larger than [`MAX_PRIME`].
#[must_use]
pub fn is_prime(n: usize) -> bool {
    u32::try_from(n).is_ok_and(|n| primes().binary_search(&n).is_ok())
}

/// Returns the largest prime `<= n`.
///
/// Requests above [`MAX_PRIME`] are clamped to it. Returns `None` when `n < 2`.
#[must_use]
pub fn prime_below(n: usize) -> Option<usize> {
    let n = n.min(MAX_PRIME);
    rank(n).checked_sub(1).and_then(|index| primes().get(index)).copied().map(widen)
}

/// Returns the smallest prime strictly greater than `n`, or `None` if it would exceed
/// [`MAX_PRIME`].
#[must_use]
pub fn prime_above(n: usize) -> Option<usize> {
    primes().get(rank(n)).copied().map(widen)
}

/// Bucket count for a freshly constructed table given an advisory `size`.
///
/// This is the largest prime at or below `size`, but never less than [`DEFAULT_CAPACITY`].
#[must_use]
pub fn initial_capacity(size: usize) -> usize {
    prime_below(size).map_or(DEFAULT_CAPACITY, |prime| prime.max(DEFAULT_CAPACITY))
}

/// Bucket count to grow to from `current`: the first prime above twice the current size.
///
/// Capped at [`MAX_PRIME`]; a table already at the cap gets the cap back.
#[must_use]
pub fn next_capacity(current: usize) -> usize {
    let doubled = current.saturating_mul(2);
    prime_above(doubled).unwrap_or(MAX_PRIME).max(current.min(MAX_PRIME))
}
