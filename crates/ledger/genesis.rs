use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use bytes::Bytes;
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("Failed to open genesis file: {0}")]
    File(#[from] std::io::Error),
    #[error("Failed to deserialize genesis file: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Initial state of the ledger, read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Genesis {
    /// Initial accounts, keyed by address.
    pub alloc: BTreeMap<Address, GenesisAccount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenesisAccount {
    #[serde(default, deserialize_with = "deserialize_hex_bytes")]
    pub code: Bytes,
    #[serde(default)]
    pub storage: BTreeMap<H256, H256>,
    #[serde(default)]
    pub balance: U256,
    #[serde(default)]
    pub nonce: u64,
}

fn deserialize_hex_bytes<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    let value = value.strip_prefix("0x").unwrap_or(&value);
    hex::decode(value)
        .map(Bytes::from)
        .map_err(serde::de::Error::custom)
}

impl TryFrom<&Path> for Genesis {
    type Error = GenesisError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let file = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(file)?)
    }
}
