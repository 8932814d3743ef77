use std::time::Duration;

use parking_lot::Mutex;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::NodeConfig;
use crate::proofs::{check_alrp_chain_validity, verify_aggregated_finalization_proof};
use crate::storage::Storage;
use crate::types::{
    Block, EpochDataHandler, FirstBlockAssumption, PivotSearchData, ThreadKind,
};

/// Deadline for each outbound peer request. Timeouts are silent.
pub const PEER_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Per-pipeline cells caching the first proven block producer of an epoch.
/// Single writer (the thread driver); reset wholesale at epoch rollover.
#[derive(Default)]
pub struct PivotCache {
    approvement: Mutex<Option<PivotSearchData>>,
    execution: Mutex<Option<PivotSearchData>>,
}

impl PivotCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, thread: ThreadKind) -> &Mutex<Option<PivotSearchData>> {
        match thread {
            ThreadKind::Approvement => &self.approvement,
            ThreadKind::Execution => &self.execution,
        }
    }

    pub fn get(&self, thread: ThreadKind) -> Option<PivotSearchData> {
        self.cell(thread).lock().clone()
    }

    pub fn set(&self, thread: ThreadKind, pivot: PivotSearchData) {
        *self.cell(thread).lock() = Some(pivot);
    }

    pub fn clear(&self) {
        *self.approvement.lock() = None;
        *self.execution.lock() = None;
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(client: &Client, url: &str) -> Option<T> {
    let response = client
        .get(url)
        .timeout(PEER_REQUEST_TIMEOUT)
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    response.json::<T>().await.ok()
}

/// Returns the requested block from local storage, or from the first peer
/// in the quorum/bootstrap set that responds with a decodable body. The
/// returned block is untrusted until the caller verifies it.
pub async fn get_block(
    client: &Client,
    storage: &Storage,
    config: &NodeConfig,
    epoch: &EpochDataHandler,
    epoch_index: u64,
    block_creator: &str,
    index: u64,
) -> Option<Block> {
    let block_id = Block::compose_id(epoch_index, block_creator, index);
    if let Some(block) = storage.block(&block_id) {
        return Some(block);
    }

    let mut endpoints: Vec<String> = epoch
        .quorum_members(storage)
        .into_iter()
        .map(|member| member.url)
        .collect();
    endpoints.extend(config.bootstrap_nodes.iter().cloned());
    endpoints.retain(|endpoint| endpoint != &config.my_hostname);
    if endpoints.is_empty() {
        return None;
    }

    let (tx, mut rx) = mpsc::channel(endpoints.len());
    for endpoint in endpoints {
        let client = client.clone();
        let tx = tx.clone();
        let url = format!("{endpoint}/block/{block_id}");
        tokio::spawn(async move {
            if let Some(block) = fetch_json::<Block>(&client, &url).await {
                let _ = tx.send(block).await;
            }
        });
    }
    drop(tx);

    // first decoded response wins; later senders hit a closed channel
    let block = rx.recv().await;
    if block.is_none() {
        debug!(%block_id, "block unavailable locally and from peers");
    }
    block
}

/// Discovers the first block of the epoch as seen by the given pipeline.
/// Every quorum response is collected before the minimal creator index is
/// chosen; the first verified response wins ties. The result is cached
/// until the next epoch rollover.
pub async fn get_first_block_in_epoch(
    client: &Client,
    storage: &Storage,
    config: &NodeConfig,
    epoch: &EpochDataHandler,
    thread: ThreadKind,
    pivots: &PivotCache,
) -> Option<PivotSearchData> {
    if let Some(pivot) = pivots.get(thread) {
        return Some(pivot);
    }

    let members = epoch.quorum_members(storage);
    if members.is_empty() {
        return None;
    }

    let (tx, mut rx) = mpsc::channel(members.len());
    for member in members {
        let client = client.clone();
        let tx = tx.clone();
        let url = format!("{}/first_block_assumption/{}", member.url, epoch.id);
        tokio::spawn(async move {
            if let Some(assumption) = fetch_json::<FirstBlockAssumption>(&client, &url).await {
                let _ = tx.send(assumption).await;
            }
        });
    }
    drop(tx);

    let mut best: Option<(usize, FirstBlockAssumption)> = None;
    while let Some(assumption) = rx.recv().await {
        let index = assumption.index_of_first_block_creator;
        if index < 0 || index as usize >= epoch.leaders_sequence.len() {
            continue;
        }
        let position = index as usize;
        let leader = &epoch.leaders_sequence[position];
        if !verify_aggregated_finalization_proof(&assumption.afp_for_second_block, epoch) {
            continue;
        }
        let expected_second_block_id = format!("{}:{leader}:1", epoch.id);
        if assumption.afp_for_second_block.block_id != expected_second_block_id {
            continue;
        }
        if best
            .as_ref()
            .map_or(true, |(held_position, _)| position < *held_position)
        {
            best = Some((position, assumption));
        }
    }

    let (position, assumption) = best?;
    let pivot_pub_key = epoch.leaders_sequence[position].clone();
    let first_block = get_block(client, storage, config, epoch, epoch.id, &pivot_pub_key, 0).await?;
    let first_block_hash = assumption.afp_for_second_block.prev_block_hash.clone();
    if first_block.hash() != first_block_hash {
        warn!(pivot = %pivot_pub_key, "first block by pivot does not match its finalized hash");
        return None;
    }
    if !check_alrp_chain_validity(&first_block, epoch, position) {
        warn!(pivot = %pivot_pub_key, "rotation proof chain of the pivot block is invalid");
        return None;
    }

    let pivot = PivotSearchData {
        position,
        pivot_pub_key,
        first_block_by_pivot: first_block,
        first_block_hash,
    };
    pivots.set(thread, pivot.clone());
    Some(pivot)
}
