//! Near-duplicate detection over candidate commits.
//!
//! A fix that is backported across release branches shows up as several
//! commits whose message + diff token sets are nearly identical. This module
//! computes a fixed-size MinHash signature per candidate and indexes the
//! signatures with LSH banding, so twins are retrieved without a full
//! pairwise comparison over thousands of commits.
//!
//! # Parameters
//!
//! 128 permutations split into 4 bands of 32 rows. The banding S-curve
//! midpoint sits near `(1/4)^(1/32) ~= 0.958`, biased against false
//! positives for the default 0.95 Jaccard threshold. Band hits are confirmed
//! with the estimated signature similarity before being reported.
//!
//! The index is scoped to a single matching run and is never persisted.

use std::collections::{HashMap, HashSet};

/// Number of MinHash permutations per signature.
pub const SIGNATURE_SIZE: usize = 128;

/// LSH band layout: BANDS * ROWS == SIGNATURE_SIZE.
const BANDS: usize = 4;
const ROWS: usize = 32;

/// Fixed-size MinHash signature over a candidate's token set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHashSignature {
    values: [u64; SIGNATURE_SIZE],
}

impl MinHashSignature {
    /// Computes the signature of a token set.
    ///
    /// Empty token sets produce a degenerate all-`u64::MAX` signature;
    /// callers are expected to exclude them via a minimum-token threshold.
    pub fn compute(tokens: &HashSet<String>) -> Self {
        let mut values = [u64::MAX; SIGNATURE_SIZE];
        for token in tokens {
            let base = fnv1a(token.as_bytes());
            for (i, slot) in values.iter_mut().enumerate() {
                let h = splitmix64(base ^ PERMUTATION_SEEDS[i]);
                if h < *slot {
                    *slot = h;
                }
            }
        }
        Self { values }
    }

    /// Estimated Jaccard similarity: fraction of agreeing positions.
    pub fn similarity(&self, other: &Self) -> f64 {
        let matches = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / SIGNATURE_SIZE as f64
    }

    /// Hash of one LSH band (used as the bucket key).
    fn band_hash(&self, band: usize) -> u64 {
        let start = band * ROWS;
        let mut acc = 0xcbf2_9ce4_8422_2325u64;
        for value in &self.values[start..start + ROWS] {
            acc = splitmix64(acc ^ value);
        }
        acc
    }
}

/// Tokenizes commit content (message + diff) for similarity hashing.
///
/// Lowercased alphanumeric runs of length >= 2; the set is deduplicated,
/// matching the Jaccard model over token sets.
pub fn content_tokens(message: &str, diff: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    for text in [message, diff] {
        let mut current = String::new();
        for c in text.chars() {
            if c.is_alphanumeric() {
                current.extend(c.to_lowercase());
            } else if !current.is_empty() {
                if current.len() >= 2 {
                    tokens.insert(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
        if current.len() >= 2 {
            tokens.insert(current);
        }
    }
    tokens
}

/// Incremental LSH index over candidate signatures.
///
/// Scoped to one matching run. Inserts and queries may be interleaved;
/// `query_twins` only sees what has been inserted so far.
pub struct TwinIndex {
    /// Confirmation threshold on the estimated similarity
    threshold: f64,
    /// (band, band hash) -> entry indices
    buckets: HashMap<(usize, u64), Vec<usize>>,
    /// Inserted (candidate id, signature) pairs
    entries: Vec<(String, MinHashSignature)>,
}

impl TwinIndex {
    /// Creates an empty index with the given similarity threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            buckets: HashMap::new(),
            entries: Vec::new(),
        }
    }

    /// Number of indexed candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a candidate signature.
    pub fn insert(&mut self, candidate_id: impl Into<String>, signature: MinHashSignature) {
        let idx = self.entries.len();
        for band in 0..BANDS {
            let key = (band, signature.band_hash(band));
            self.buckets.entry(key).or_default().push(idx);
        }
        self.entries.push((candidate_id.into(), signature));
    }

    /// Retrieves candidate ids whose similarity with `signature` reaches the
    /// threshold, excluding `self_id`. Results are sorted for determinism.
    pub fn query_twins(&self, signature: &MinHashSignature, self_id: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut twins = Vec::new();

        for band in 0..BANDS {
            let key = (band, signature.band_hash(band));
            let Some(bucket) = self.buckets.get(&key) else {
                continue;
            };
            for &idx in bucket {
                if !seen.insert(idx) {
                    continue;
                }
                let (id, candidate_sig) = &self.entries[idx];
                if id == self_id {
                    continue;
                }
                if signature.similarity(candidate_sig) >= self.threshold {
                    twins.push(id.clone());
                }
            }
        }

        twins.sort();
        twins
    }
}

/// FNV-1a over the token bytes, used as the per-token base hash.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// SplitMix64 finalizer, mixing the base hash with a permutation seed.
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Deterministic per-permutation seeds (index mixed through SplitMix64).
static PERMUTATION_SEEDS: std::sync::LazyLock<[u64; SIGNATURE_SIZE]> =
    std::sync::LazyLock::new(|| {
        let mut seeds = [0u64; SIGNATURE_SIZE];
        for (i, seed) in seeds.iter_mut().enumerate() {
            *seed = splitmix64(0x5eed_0000_0000_0000 ^ i as u64);
        }
        seeds
    });
