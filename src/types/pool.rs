use std::fmt;
use std::str::FromStr;

use malachite::Natural;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Non-negative stake amount, carried as a decimal string on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stake {
    inner: Natural,
}

impl Stake {
    pub fn zero() -> Self {
        Self {
            inner: Natural::from(0u32),
        }
    }

    pub fn from_natural(inner: Natural) -> Self {
        Self { inner }
    }

    pub fn from_u64(value: u64) -> Self {
        Self {
            inner: Natural::from(value),
        }
    }

    pub fn as_natural(&self) -> &Natural {
        &self.inner
    }
}

impl Default for Stake {
    fn default() -> Self {
        Self::zero()
    }
}

impl FromStr for Stake {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Natural::from_str(s).map(Stake::from_natural)
    }
}

impl Serialize for Stake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.inner.to_string())
    }
}

impl<'de> Deserialize<'de> for Stake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Natural::from_str(&value)
            .map(Stake::from_natural)
            .map_err(|_| serde::de::Error::custom("invalid stake value"))
    }
}

impl fmt::Display for Stake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Per-validator record kept in the approvement-thread state. Immutable for
/// the duration of an epoch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolStorage {
    pub pool_url: String,
    pub total_staked: Stake,
    pub pool_pub_key: String,
}

impl PoolStorage {
    /// Composite state-store key for the pool record of `pub_key`.
    pub fn storage_key(pub_key: &str) -> String {
        format!("{pub_key}(POOL)_STORAGE_POOL")
    }
}
