use std::collections::{BTreeMap, HashMap, HashSet};

use crate::crypto::verify_signature;
use crate::types::{
    AggregatedEpochFinalizationProof, AggregatedFinalizationProof, AggregatedLeaderRotationProof,
    Block, EpochDataHandler, ExecutionStatsPerPool,
};

/// `⌊2n/3⌋ + 1` signatures of a quorum of size `n`, capped at `n`.
pub fn quorum_majority(epoch: &EpochDataHandler) -> usize {
    let quorum_size = epoch.quorum.len();
    let majority = (2 * quorum_size) / 3 + 1;
    majority.min(quorum_size)
}

/// Counts valid signatures from distinct in-quorum signers. Signers are
/// deduplicated by lowercase pubkey, so case-variant entries count once.
fn count_valid_signatures(
    message: &str,
    proofs: &BTreeMap<String, String>,
    quorum: &[String],
) -> usize {
    let accepted: HashSet<String> = quorum.iter().map(|pk| pk.to_lowercase()).collect();
    let mut seen = HashSet::new();
    let mut ok = 0;
    for (pub_key, signature) in proofs {
        if verify_signature(message, pub_key, signature) {
            let lowered = pub_key.to_lowercase();
            if accepted.contains(&lowered) && seen.insert(lowered) {
                ok += 1;
            }
        }
    }
    ok
}

/// Checks an epoch-finalization proof against an explicit quorum and
/// majority, as seen from the epoch that committed to them.
pub fn verify_aggregated_epoch_finalization_proof(
    proof: &AggregatedEpochFinalizationProof,
    quorum: &[String],
    majority: usize,
    epoch_full_id: &str,
) -> bool {
    let message = format!(
        "EPOCH_DONE:{}:{}:{}:{}:{}",
        proof.last_leader,
        proof.last_index,
        proof.last_hash,
        proof.hash_of_first_block_by_last_leader,
        epoch_full_id
    );
    count_valid_signatures(&message, &proof.proofs, quorum) >= majority
}

pub fn verify_aggregated_finalization_proof(
    proof: &AggregatedFinalizationProof,
    epoch: &EpochDataHandler,
) -> bool {
    let message = format!(
        "{}{}{}{}",
        proof.prev_block_hash,
        proof.block_id,
        proof.block_hash,
        epoch.epoch_full_id()
    );
    count_valid_signatures(&message, &proof.proofs, &epoch.quorum) >= quorum_majority(epoch)
}

pub fn verify_aggregated_leader_rotation_proof(
    prev_leader: &str,
    proof: &AggregatedLeaderRotationProof,
    epoch: &EpochDataHandler,
) -> bool {
    let message = format!(
        "LEADER_ROTATION_PROOF:{}:{}:{}:{}:{}",
        prev_leader,
        proof.first_block_hash,
        proof.skip_index,
        proof.skip_hash,
        epoch.epoch_full_id()
    );
    count_valid_signatures(&message, &proof.proofs, &epoch.quorum) >= quorum_majority(epoch)
}

/// Walks `leaders_sequence[0..position]` in reverse over the rotation
/// proofs attached to `first_block`. Fails on the first missing or invalid
/// proof; stops once a predecessor provably produced a block.
fn alrp_chain_walk(
    first_block: &Block,
    epoch: &EpochDataHandler,
    position: usize,
    skip_signature_check: bool,
) -> Option<HashMap<String, ExecutionStatsPerPool>> {
    if position > epoch.leaders_sequence.len() {
        return None;
    }
    let rotation_proofs = &first_block.extra_data.aggregated_leaders_rotation_proofs;
    let mut stats = HashMap::new();
    let mut covered = 0;
    let mut found_producer = false;

    for prev_leader in epoch.leaders_sequence[..position].iter().rev() {
        let alrp = rotation_proofs.get(prev_leader)?;
        if !skip_signature_check
            && !verify_aggregated_leader_rotation_proof(prev_leader, alrp, epoch)
        {
            return None;
        }
        stats.insert(
            prev_leader.clone(),
            ExecutionStatsPerPool {
                index: alrp.skip_index,
                hash: alrp.skip_hash.clone(),
                first_block_hash: alrp.first_block_hash.clone(),
            },
        );
        covered += 1;
        if alrp.skip_index >= 0 {
            found_producer = true;
            break;
        }
    }

    (covered == position || found_producer).then_some(stats)
}

/// The first block a pool produced carries a valid, continuous chain of
/// rotation proofs for every leader scheduled before `position`.
pub fn check_alrp_chain_validity(
    first_block: &Block,
    epoch: &EpochDataHandler,
    position: usize,
) -> bool {
    alrp_chain_walk(first_block, epoch, position, false).is_some()
}

/// Chain validation that also reports the per-pool finality cutoffs the
/// accepted rotation proofs attest to. Returns an empty map on failure.
pub fn extended_alrp_chain_validity(
    first_block: &Block,
    epoch: &EpochDataHandler,
    position: usize,
    skip_signature_check: bool,
) -> (bool, HashMap<String, ExecutionStatsPerPool>) {
    match alrp_chain_walk(first_block, epoch, position, skip_signature_check) {
        Some(stats) => (true, stats),
        None => (false, HashMap::new()),
    }
}
