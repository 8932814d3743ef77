use std::collections::BTreeMap;

use malachite::Natural;
use tracing::debug;

use crate::crypto::blake3_hex;
use crate::storage::Storage;
use crate::types::EpochDataHandler;

/// Interprets a lowercase hex digest as an unsigned big-endian integer.
fn natural_from_digest(digest: &str) -> Natural {
    let bytes = hex::decode(digest).unwrap_or_default();
    let mut value = Natural::from(0u32);
    for byte in &bytes {
        value *= Natural::from(256u32);
        value += Natural::from(*byte);
    }
    value
}

/// Stake weights for every registered pool, in lexicographic pubkey order.
/// Pools without a readable record weigh nothing.
fn stake_weights(
    epoch: &EpochDataHandler,
    storage: &Storage,
) -> (BTreeMap<String, Natural>, Natural) {
    let mut weights = BTreeMap::new();
    let mut total = Natural::from(0u32);
    for pub_key in &epoch.pools_registry {
        let stake = storage
            .pool_storage(pub_key)
            .map(|pool| pool.total_staked.as_natural().clone())
            .unwrap_or_else(|| Natural::from(0u32));
        total += stake.clone();
        weights.insert(pub_key.clone(), stake);
    }
    (weights, total)
}

/// Stake-weighted sampling without replacement. The i-th draw is
/// `blake3(seed_hash + "_" + i) mod remaining_stake`, and the winner is the
/// first candidate (lexicographic order) whose cumulative stake reaches the
/// draw. Stops early once the remaining stake is exhausted.
fn sample_without_replacement(
    candidates: &mut BTreeMap<String, Natural>,
    mut total_stake: Natural,
    seed_hash: &str,
    target: usize,
) -> Vec<String> {
    let mut sampled = Vec::with_capacity(target);
    for i in 0..target {
        if total_stake == Natural::from(0u32) {
            break;
        }
        let mut draw = natural_from_digest(&blake3_hex(&format!("{seed_hash}_{i}")));
        draw %= total_stake.clone();

        let mut cumulative = Natural::from(0u32);
        let mut winner = None;
        for (pub_key, stake) in candidates.iter() {
            cumulative += stake.clone();
            if draw <= cumulative {
                winner = Some(pub_key.clone());
                break;
            }
        }
        let Some(pub_key) = winner else {
            break;
        };
        let stake = candidates
            .remove(&pub_key)
            .unwrap_or_else(|| Natural::from(0u32));
        total_stake -= stake;
        sampled.push(pub_key);
    }
    sampled
}

/// Derives the deterministic, epoch-fixed ordering in which pools become
/// the block producer, and stores it on the epoch handler.
pub fn set_leaders_sequence(epoch: &mut EpochDataHandler, epoch_seed: &str, storage: &Storage) {
    let seed_hash = blake3_hex(epoch_seed);
    let (mut weights, total) = stake_weights(epoch, storage);
    let target = epoch.pools_registry.len();
    epoch.leaders_sequence = sample_without_replacement(&mut weights, total, &seed_hash, target);
    debug!(
        epoch = epoch.id,
        leaders = epoch.leaders_sequence.len(),
        "leaders sequence derived"
    );
}

/// Draws the quorum for the epoch committed to `new_epoch_seed`. When the
/// registry does not exceed the configured size the whole registry serves.
pub fn current_epoch_quorum(
    epoch: &EpochDataHandler,
    quorum_size: usize,
    new_epoch_seed: &str,
    storage: &Storage,
) -> Vec<String> {
    if epoch.pools_registry.len() <= quorum_size {
        return epoch.pools_registry.iter().cloned().collect();
    }
    let seed_hash = blake3_hex(new_epoch_seed);
    let (mut weights, total) = stake_weights(epoch, storage);
    sample_without_replacement(&mut weights, total, &seed_hash, quorum_size)
}
