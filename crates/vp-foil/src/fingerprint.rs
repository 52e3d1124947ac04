//! Approximate geometry identity for cache invalidation.
//!
//! The sampled fingerprint reads the node count plus the first node and the
//! middle node (four coordinates). It catches node insertion/removal and
//! most edits to the leading or trailing edge, but two different foils that
//! agree on those samples collide. `Full` hashes every coordinate and has no
//! practical collisions, at O(n) cost per check.

use crate::geometry::FoilGeometry;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FingerprintMode {
    #[default]
    Sampled,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoilFingerprint {
    Sampled { n_nodes: usize, samples: [u64; 4] },
    Full { n_nodes: usize, digest: [u8; 32] },
}

impl FoilFingerprint {
    /// Sampled fingerprint of `foil`.
    pub fn of(foil: &dyn FoilGeometry) -> Self {
        Self::with_mode(foil, FingerprintMode::Sampled)
    }

    pub fn with_mode(foil: &dyn FoilGeometry, mode: FingerprintMode) -> Self {
        let n_nodes = foil.n_nodes();
        match mode {
            FingerprintMode::Sampled => {
                let mut samples = [0u64; 4];
                if n_nodes > 0 {
                    let mid = n_nodes / 2;
                    samples = [
                        foil.x(0).to_bits(),
                        foil.y(0).to_bits(),
                        foil.x(mid).to_bits(),
                        foil.y(mid).to_bits(),
                    ];
                }
                FoilFingerprint::Sampled { n_nodes, samples }
            }
            FingerprintMode::Full => {
                let mut hasher = Sha256::new();
                hasher.update((n_nodes as u64).to_le_bytes());
                for i in 0..n_nodes {
                    hasher.update(foil.x(i).to_le_bytes());
                    hasher.update(foil.y(i).to_le_bytes());
                }
                FoilFingerprint::Full {
                    n_nodes,
                    digest: hasher.finalize().into(),
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        match self {
            Self::Sampled { n_nodes, .. } | Self::Full { n_nodes, .. } => *n_nodes,
        }
    }
}
