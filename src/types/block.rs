use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::crypto::blake3_hex;

use super::proofs::AggregatedLeaderRotationProof;
use super::PubKey;

/// Auxiliary consensus data attached to a block. Rotation proofs are keyed
/// by the pubkey of the rotated-out leader.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BlockExtraData {
    #[serde(default)]
    pub aggregated_leaders_rotation_proofs: BTreeMap<PubKey, AggregatedLeaderRotationProof>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Block {
    pub epoch_index: u64,
    pub creator_pub_key: PubKey,
    pub index: u64,
    pub prev_block_hash: String,
    /// Opaque transaction payloads; execution happens outside this core.
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
    #[serde(default)]
    pub extra_data: BlockExtraData,
}

impl Block {
    /// Canonical block identifier `"<epoch_index>:<creator>:<index>"`.
    pub fn compose_id(epoch_index: u64, creator_pub_key: &str, index: u64) -> String {
        format!("{epoch_index}:{creator_pub_key}:{index}")
    }

    pub fn block_id(&self) -> String {
        Self::compose_id(self.epoch_index, &self.creator_pub_key, self.index)
    }

    /// Deterministic content hash over the canonical block fields.
    pub fn hash(&self) -> String {
        let transactions =
            serde_json::to_string(&self.transactions).expect("serializing transactions");
        blake3_hex(&format!(
            "{}{}{}{}{}",
            self.creator_pub_key, self.epoch_index, self.index, self.prev_block_hash, transactions
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block {
            epoch_index: 3,
            creator_pub_key: "aabbcc".to_string(),
            index: 7,
            prev_block_hash: "00".repeat(32),
            transactions: Vec::new(),
            extra_data: BlockExtraData::default(),
        }
    }

    #[test]
    fn block_id_concatenates_epoch_creator_index() {
        assert_eq!(sample_block().block_id(), "3:aabbcc:7");
    }

    #[test]
    fn hash_is_deterministic_and_content_sensitive() {
        let block = sample_block();
        assert_eq!(block.hash(), block.hash());

        let mut other = sample_block();
        other.index = 8;
        assert_ne!(block.hash(), other.hash());
    }

    #[test]
    fn extra_data_defaults_when_absent_from_json() {
        let decoded: Block = serde_json::from_str(
            r#"{"epoch_index":0,"creator_pub_key":"aa","index":0,"prev_block_hash":""}"#,
        )
        .expect("decode block");
        assert!(decoded
            .extra_data
            .aggregated_leaders_rotation_proofs
            .is_empty());
    }
}
