//! Weighted multi-signature keys and the options used to derive them.

use std::collections::BTreeSet;

use crate::crypto::PublicKey;
use crate::error::{KeyError, KeyResult};

/// Maximum number of keys a weighted multisig key may hold.
pub const MAX_WEIGHTED_KEYS: usize = 10;

/// A public key with its voting weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeightedPublicKey {
    pub weight: u32,
    pub key: PublicKey,
}

impl WeightedPublicKey {
    pub const fn new(weight: u32, key: PublicKey) -> Self {
        Self { weight, key }
    }
}

/// Threshold multi-signature authority.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WeightedMultiSigKey {
    threshold: u32,
    keys: Vec<WeightedPublicKey>,
}

impl WeightedMultiSigKey {
    /// Validates weights, threshold, key count and uniqueness.
    pub fn new(threshold: u32, keys: Vec<WeightedPublicKey>) -> KeyResult<Self> {
        if keys.is_empty() {
            return Err(KeyError::InvalidAccountKey(
                "weighted multisig key needs at least one key".to_string(),
            ));
        }
        if keys.len() > MAX_WEIGHTED_KEYS {
            return Err(KeyError::TooManyKeys(keys.len()));
        }
        if keys.iter().any(|k| k.weight == 0) {
            return Err(KeyError::InvalidAccountKey(
                "weights must be at least 1".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        if !keys.iter().all(|k| seen.insert(k.key)) {
            return Err(KeyError::DuplicateKey);
        }

        let total_weight: u64 = keys.iter().map(|k| u64::from(k.weight)).sum();
        if threshold == 0 || u64::from(threshold) > total_weight {
            return Err(KeyError::InvalidThreshold {
                threshold,
                total_weight,
            });
        }

        Ok(Self { threshold, keys })
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn keys(&self) -> &[WeightedPublicKey] {
        &self.keys
    }

    pub fn total_weight(&self) -> u64 {
        self.keys.iter().map(|k| u64::from(k.weight)).sum()
    }

    pub fn contains(&self, key: &PublicKey) -> bool {
        self.keys.iter().any(|k| &k.key == key)
    }

    /// Sum of weights of the listed keys present in `signers`.
    ///
    /// Each entry counts once no matter how often it was recovered.
    pub fn matched_weight(&self, signers: &[PublicKey]) -> u64 {
        self.keys
            .iter()
            .filter(|k| signers.contains(&k.key))
            .map(|k| u64::from(k.weight))
            .sum()
    }
}

/// Threshold and weights for turning a set of keys into a weighted multisig key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedMultiSigOptions {
    pub threshold: u32,
    pub weights: Vec<u32>,
}

impl WeightedMultiSigOptions {
    /// Threshold 1 and weight 1 for each of `key_count` keys.
    pub fn uniform(key_count: usize) -> Self {
        Self {
            threshold: 1,
            weights: vec![1; key_count],
        }
    }

    pub(crate) fn apply(&self, keys: Vec<PublicKey>) -> KeyResult<WeightedMultiSigKey> {
        if self.weights.len() != keys.len() {
            return Err(KeyError::InvalidAccountKey(format!(
                "{} weights given for {} keys",
                self.weights.len(),
                keys.len()
            )));
        }
        let weighted = keys
            .into_iter()
            .zip(&self.weights)
            .map(|(key, weight)| WeightedPublicKey::new(*weight, key))
            .collect();
        WeightedMultiSigKey::new(self.threshold, weighted)
    }
}
