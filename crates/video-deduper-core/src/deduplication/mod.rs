//! Similarity scoring and duplicate resolution.

use serde::{Deserialize, Serialize};

use crate::processing::{PHash, VideoSignature};

mod resolver;

pub use resolver::{DuplicateResolver, ProcessedSet};

/// How two frame hashes are judged equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum HashMatch {
    /// Bit-for-bit equality
    #[default]
    Exact,

    /// Equal when at most `max_distance` bits differ
    Hamming { max_distance: u32 },
}

impl HashMatch {
    pub fn matches(&self, a: &PHash, b: &PHash) -> bool {
        match self {
            HashMatch::Exact => a == b,
            HashMatch::Hamming { max_distance } => a.is_similar(b, *max_distance),
        }
    }
}

/// Fraction of index-aligned matching hashes over the shorter sequence.
///
/// Only the common prefix is compared. Either side empty scores 0.
pub fn similarity(a: &[PHash], b: &[PHash], mode: HashMatch) -> f64 {
    let common = a.len().min(b.len());
    if common == 0 {
        return 0.0;
    }

    let matches = a
        .iter()
        .zip(b.iter())
        .filter(|(x, y)| mode.matches(x, y))
        .count();

    matches as f64 / common as f64
}

/// Scores pairs of video signatures
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureComparator {
    mode: HashMatch,
}

impl SignatureComparator {
    pub fn new(mode: HashMatch) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> HashMatch {
        self.mode
    }

    pub fn compare(&self, a: &VideoSignature, b: &VideoSignature) -> f64 {
        similarity(a.hashes(), b.hashes(), self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(hashes: &[u64]) -> VideoSignature {
        VideoSignature::from_hashes("v.mp4", hashes.iter().copied().map(PHash).collect())
    }

    #[test]
    fn test_identical_signatures_score_one() {
        let a = sig(&[1, 2, 3, 4]);
        let comparator = SignatureComparator::default();
        assert_eq!(comparator.compare(&a, &a.clone()), 1.0);
    }

    #[test]
    fn test_empty_and_disjoint_score_zero() {
        let comparator = SignatureComparator::default();
        assert_eq!(comparator.compare(&sig(&[]), &sig(&[])), 0.0);
        assert_eq!(comparator.compare(&sig(&[1, 2]), &sig(&[])), 0.0);
        assert_eq!(comparator.compare(&sig(&[1, 2]), &sig(&[3, 4])), 0.0);
    }

    #[test]
    fn test_common_prefix_only() {
        let comparator = SignatureComparator::default();
        // Short clip matches the opening of the long one
        let long = sig(&[1, 2, 3, 9, 9, 9, 9, 9]);
        let short = sig(&[1, 2, 3, 4]);
        assert_eq!(comparator.compare(&long, &short), 0.75);
    }

    #[test]
    fn test_symmetric() {
        let comparator = SignatureComparator::new(HashMatch::Hamming { max_distance: 1 });
        let pairs = [
            (sig(&[1, 2, 3]), sig(&[1, 3, 3, 3])),
            (sig(&[0b11, 0b100]), sig(&[0b10, 0b111])),
            (sig(&[]), sig(&[5])),
        ];
        for (a, b) in &pairs {
            assert_eq!(comparator.compare(a, b), comparator.compare(b, a));
        }
    }

    #[test]
    fn test_index_alignment_matters() {
        let comparator = SignatureComparator::default();
        // Same hashes shifted by one sample share nothing index-aligned
        assert_eq!(comparator.compare(&sig(&[1, 2, 3]), &sig(&[0, 1, 2, 3])), 0.0);
    }

    #[test]
    fn test_hamming_mode() {
        let a = sig(&[0b0000, 0b1111]);
        let b = sig(&[0b0001, 0b0000]);

        assert_eq!(SignatureComparator::new(HashMatch::Exact).compare(&a, &b), 0.0);
        assert_eq!(
            SignatureComparator::new(HashMatch::Hamming { max_distance: 1 }).compare(&a, &b),
            0.5
        );
        assert_eq!(
            SignatureComparator::new(HashMatch::Hamming { max_distance: 4 }).compare(&a, &b),
            1.0
        );
    }

    #[test]
    fn test_hash_match_serde_shape() {
        let json = serde_json::to_string(&HashMatch::Hamming { max_distance: 3 }).unwrap();
        assert_eq!(json, r#"{"mode":"hamming","max_distance":3}"#);

        let exact: HashMatch = serde_json::from_str(r#"{"mode":"exact"}"#).unwrap();
        assert_eq!(exact, HashMatch::Exact);
    }
}
