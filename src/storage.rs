use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
};
use tracing::debug;

use crate::errors::{ChainError, ChainResult};
use crate::types::{Block, PoolStorage};

pub(crate) const CF_BLOCKS: &str = "blocks";
pub(crate) const CF_STATE: &str = "state";

/// Byte-keyed state store backing the consensus core. Values are canonical
/// JSON. Pool records go through a read-through cache whose entries are
/// append-only within an epoch.
#[derive(Clone)]
pub struct Storage {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    pool_cache: Arc<RwLock<HashMap<String, PoolStorage>>>,
}

impl Storage {
    pub fn open(path: &Path) -> ChainResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_BLOCKS, Options::default()),
            ColumnFamilyDescriptor::new(CF_STATE, Options::default()),
        ];
        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)?;
        Ok(Self {
            db: Arc::new(db),
            pool_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    fn blocks_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_BLOCKS)
            .ok_or_else(|| ChainError::Config("missing blocks column family".into()))
    }

    fn state_cf(&self) -> ChainResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(CF_STATE)
            .ok_or_else(|| ChainError::Config("missing state column family".into()))
    }

    pub fn state_raw(&self, key: &str) -> ChainResult<Option<Vec<u8>>> {
        let cf = self.state_cf()?;
        Ok(self.db.get_cf(&cf, key.as_bytes())?)
    }

    pub fn put_state_raw(&self, key: &str, value: &[u8]) -> ChainResult<()> {
        let cf = self.state_cf()?;
        self.db.put_cf(&cf, key.as_bytes(), value)?;
        Ok(())
    }

    /// Cached lookup of the pool record for `pub_key`. A miss or an
    /// undecodable value reads as absent.
    pub fn pool_storage(&self, pub_key: &str) -> Option<PoolStorage> {
        let key = PoolStorage::storage_key(pub_key);
        if let Some(cached) = self.pool_cache.read().get(&key) {
            return Some(cached.clone());
        }
        let bytes = self.state_raw(&key).ok().flatten()?;
        let Ok(pool) = serde_json::from_slice::<PoolStorage>(&bytes) else {
            debug!(%key, "undecodable pool record in state store");
            return None;
        };
        self.pool_cache.write().insert(key, pool.clone());
        Some(pool)
    }

    pub fn put_pool_storage(&self, pub_key: &str, pool: &PoolStorage) -> ChainResult<()> {
        let key = PoolStorage::storage_key(pub_key);
        let encoded = serde_json::to_vec(pool)
            .map_err(|err| ChainError::Config(format!("unable to encode pool record: {err}")))?;
        self.put_state_raw(&key, &encoded)?;
        self.pool_cache.write().insert(key, pool.clone());
        Ok(())
    }

    /// Dropped by the rollover driver together with the pivot caches.
    pub fn clear_pool_cache(&self) {
        self.pool_cache.write().clear();
    }

    /// Lookup of a stored block by its canonical id. A miss or an
    /// undecodable value reads as absent.
    pub fn block(&self, block_id: &str) -> Option<Block> {
        let cf = self.blocks_cf().ok()?;
        let bytes = self.db.get_cf(&cf, block_id.as_bytes()).ok().flatten()?;
        match serde_json::from_slice(&bytes) {
            Ok(block) => Some(block),
            Err(err) => {
                debug!(%block_id, %err, "undecodable block in store");
                None
            }
        }
    }

    pub fn put_block(&self, block: &Block) -> ChainResult<()> {
        let cf = self.blocks_cf()?;
        let encoded = serde_json::to_vec(block)
            .map_err(|err| ChainError::Config(format!("unable to encode block: {err}")))?;
        self.db.put_cf(&cf, block.block_id().as_bytes(), encoded)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BlockExtraData, Stake};
    use tempfile::tempdir;

    fn sample_pool(url: &str) -> PoolStorage {
        PoolStorage {
            pool_url: url.to_string(),
            total_staked: Stake::from_u64(700),
            pool_pub_key: "aabb".to_string(),
        }
    }

    #[test]
    fn pool_record_round_trips_as_json() {
        let dir = tempdir().expect("tempdir");
        let storage = Storage::open(dir.path()).expect("open storage");
        storage
            .put_pool_storage("aabb", &sample_pool("http://pool-1:9000"))
            .expect("persist pool");

        let pool = storage.pool_storage("aabb").expect("read pool");
        assert_eq!(pool.pool_url, "http://pool-1:9000");
        assert_eq!(pool.total_staked, Stake::from_u64(700));
        assert!(storage.pool_storage("ccdd").is_none());
    }

    #[test]
    fn pool_reads_are_served_from_cache() {
        let dir = tempdir().expect("tempdir");
        let storage = Storage::open(dir.path()).expect("open storage");
        let key = PoolStorage::storage_key("aabb");
        let encoded = serde_json::to_vec(&sample_pool("http://pool-1:9000")).expect("encode");
        storage.put_state_raw(&key, &encoded).expect("seed pool");

        // first read populates the cache
        assert_eq!(
            storage.pool_storage("aabb").expect("read pool").pool_url,
            "http://pool-1:9000"
        );

        // underlying record changes, the cached entry keeps serving reads
        let replaced = serde_json::to_vec(&sample_pool("http://pool-2:9000")).expect("encode");
        storage.put_state_raw(&key, &replaced).expect("replace pool");
        assert_eq!(
            storage.pool_storage("aabb").expect("read pool").pool_url,
            "http://pool-1:9000"
        );

        storage.clear_pool_cache();
        assert_eq!(
            storage.pool_storage("aabb").expect("read pool").pool_url,
            "http://pool-2:9000"
        );
    }

    #[test]
    fn undecodable_records_read_as_absent() {
        let dir = tempdir().expect("tempdir");
        let storage = Storage::open(dir.path()).expect("open storage");
        storage
            .put_state_raw(&PoolStorage::storage_key("aabb"), b"{not json")
            .expect("seed garbage");
        assert!(storage.pool_storage("aabb").is_none());
        assert!(storage.block("0:aabb:0").is_none());
    }

    #[test]
    fn block_lookup_by_canonical_id() {
        let dir = tempdir().expect("tempdir");
        let storage = Storage::open(dir.path()).expect("open storage");
        let block = Block {
            epoch_index: 2,
            creator_pub_key: "aabb".to_string(),
            index: 5,
            prev_block_hash: "11".repeat(32),
            transactions: Vec::new(),
            extra_data: BlockExtraData::default(),
        };
        storage.put_block(&block).expect("persist block");

        let loaded = storage.block("2:aabb:5").expect("read block");
        assert_eq!(loaded.prev_block_hash, block.prev_block_hash);
        assert_eq!(loaded.block_id(), "2:aabb:5");
    }
}
