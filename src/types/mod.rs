mod block;
mod epoch;
mod pool;
mod proofs;

pub use block::{Block, BlockExtraData};
pub use epoch::{
    utc_now_ms, EpochDataHandler, QuorumMemberData, ThreadKind, ThreadMetadataHandler,
};
pub use pool::{PoolStorage, Stake};
pub use proofs::{
    AggregatedEpochFinalizationProof, AggregatedFinalizationProof, AggregatedLeaderRotationProof,
    ExecutionStatsPerPool, FirstBlockAssumption, FirstBlockResult, PivotSearchData,
};

pub type PubKey = String;
