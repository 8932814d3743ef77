use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ChainError, ChainResult};

pub const DEFAULT_QUORUM_SIZE: usize = 21;
pub const DEFAULT_LEADERSHIP_TIMEFRAME_MS: u64 = 120_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    /// Own endpoint, excluded from peer fan-out.
    pub my_hostname: String,
    pub bootstrap_nodes: Vec<String>,
    #[serde(default = "default_quorum_size")]
    pub quorum_size: usize,
    #[serde(default = "default_leadership_timeframe_ms")]
    pub leadership_timeframe_ms: u64,
}

fn default_quorum_size() -> usize {
    DEFAULT_QUORUM_SIZE
}

fn default_leadership_timeframe_ms() -> u64 {
    DEFAULT_LEADERSHIP_TIMEFRAME_MS
}

impl NodeConfig {
    pub fn load(path: &Path) -> ChainResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|err| ChainError::Config(format!("unable to parse config: {err}")))?;
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ChainResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| ChainError::Config(format!("unable to encode config: {err}")))?;
        fs::write(path, encoded)?;
        Ok(())
    }

    pub fn ensure_valid(&self) -> ChainResult<()> {
        if self.quorum_size == 0 {
            return Err(ChainError::Config("quorum size must be positive".into()));
        }
        if self.leadership_timeframe_ms == 0 {
            return Err(ChainError::Config(
                "leadership timeframe must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn ensure_directories(&self) -> ChainResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            my_hostname: "http://localhost:9000".to_string(),
            bootstrap_nodes: Vec::new(),
            quorum_size: DEFAULT_QUORUM_SIZE,
            leadership_timeframe_ms: DEFAULT_LEADERSHIP_TIMEFRAME_MS,
        }
    }
}
