use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::block::Block;

/// Quorum-signed statement that an epoch finished on a concrete last block.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AggregatedEpochFinalizationProof {
    pub last_leader: u64,
    pub last_index: u64,
    pub last_hash: String,
    pub hash_of_first_block_by_last_leader: String,
    /// Signer pubkey -> signature. The map shape guarantees one entry per
    /// exact key; case-variant duplicates are filtered at verification.
    #[serde(default)]
    pub proofs: BTreeMap<String, String>,
}

/// Quorum-signed finalization of a single block.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AggregatedFinalizationProof {
    pub prev_block_hash: String,
    pub block_id: String,
    pub block_hash: String,
    #[serde(default)]
    pub proofs: BTreeMap<String, String>,
}

/// Quorum-signed statement about how far a rotated-out leader got.
/// `skip_index == -1` means the leader produced no blocks this epoch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AggregatedLeaderRotationProof {
    pub first_block_hash: String,
    pub skip_index: i64,
    pub skip_hash: String,
    #[serde(default)]
    pub proofs: BTreeMap<String, String>,
}

/// Finality cutoff recorded per pool while walking rotation proofs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStatsPerPool {
    pub index: i64,
    pub hash: String,
    pub first_block_hash: String,
}

/// Peer response naming who it believes produced the first block of an
/// epoch. The index is untrusted and bounds-checked by the receiver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FirstBlockAssumption {
    pub index_of_first_block_creator: i64,
    pub afp_for_second_block: AggregatedFinalizationProof,
}

/// Cached result of first-block discovery for one pipeline. Populated on
/// the first successful discovery, invalidated at epoch rollover.
#[derive(Clone, Debug)]
pub struct PivotSearchData {
    pub position: usize,
    pub pivot_pub_key: String,
    pub first_block_by_pivot: Block,
    pub first_block_hash: String,
}

/// Outcome of first-block discovery surfaced to callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstBlockResult {
    pub first_block_creator: String,
    pub first_block_hash: String,
}

impl From<&PivotSearchData> for FirstBlockResult {
    fn from(pivot: &PivotSearchData) -> Self {
        Self {
            first_block_creator: pivot.pivot_pub_key.clone(),
            first_block_hash: pivot.first_block_hash.clone(),
        }
    }
}
