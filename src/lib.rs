//! Epoch-quorum consensus core for a proof-of-stake node.
//!
//! Two logical pipelines drive a node: the approvement thread validates
//! block proofs and advances finality, the execution thread applies state
//! transitions. Both are anchored to a per-epoch snapshot
//! ([`types::EpochDataHandler`]). The [`election`] module derives the
//! leaders sequence and the quorum for an epoch from its seed by
//! stake-weighted sampling, [`proofs`] checks aggregated finalization and
//! leader-rotation proofs against that quorum, and [`sync`] retrieves
//! blocks and first-block assumptions from quorum peers with bounded
//! fan-out. [`storage`] backs all of it with a cached, JSON-valued state
//! store.

pub mod config;
pub mod crypto;
pub mod election;
pub mod errors;
pub mod proofs;
pub mod storage;
pub mod sync;
pub mod types;
