use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::storage::Storage;

use super::PubKey;

/// Which logical pipeline is asking: the approvement thread advances
/// finality, the execution thread applies state transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadKind {
    Approvement,
    Execution,
}

/// Quorum member together with its reachable endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumMemberData {
    pub pub_key: PubKey,
    pub url: String,
}

/// Authoritative snapshot of a single epoch. Replaced wholesale at epoch
/// rollover by whichever thread owns it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EpochDataHandler {
    pub id: u64,
    pub hash: String,
    /// Entropy commitment the leaders sequence and quorum are drawn from.
    pub seed: String,
    pub pools_registry: BTreeSet<PubKey>,
    #[serde(default)]
    pub quorum: Vec<PubKey>,
    #[serde(default)]
    pub leaders_sequence: Vec<PubKey>,
    #[serde(default)]
    pub start_timestamp: u64,
    #[serde(default)]
    pub current_leader_index: usize,
}

impl EpochDataHandler {
    /// The value signed into every epoch-scoped proof.
    pub fn epoch_full_id(&self) -> String {
        format!("{}#{}", self.hash, self.id)
    }

    pub fn current_leader(&self) -> Option<&str> {
        self.leaders_sequence
            .get(self.current_leader_index)
            .map(String::as_str)
    }

    pub fn has_next_leader(&self) -> bool {
        self.current_leader_index + 1 < self.leaders_sequence.len()
    }

    /// The leadership window of the current leader has elapsed at `now_ms`.
    pub fn leader_time_is_out(&self, now_ms: u64, timeframe_ms: u64) -> bool {
        let elapsed_windows = self.current_leader_index as u64 + 1;
        now_ms >= self.start_timestamp + elapsed_windows * timeframe_ms
    }

    /// Resolves quorum members to their endpoints through the pool records.
    /// Members without a readable pool record are dropped.
    pub fn quorum_members(&self, storage: &Storage) -> Vec<QuorumMemberData> {
        self.quorum
            .iter()
            .filter_map(|pub_key| {
                storage.pool_storage(pub_key).map(|pool| QuorumMemberData {
                    pub_key: pub_key.clone(),
                    url: pool.pool_url,
                })
            })
            .collect()
    }
}

/// Per-thread container tracking the epoch the thread is advancing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ThreadMetadataHandler {
    pub core_major_version: u32,
    pub epoch: EpochDataHandler,
}

pub fn utc_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
