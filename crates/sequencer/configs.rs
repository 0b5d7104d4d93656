use serde::Deserialize;

use crate::errors::SequencerError;

/// Sequencer configuration, read from the environment.
///
/// Every option has a workable default so a bare `seqrex` starts a local
/// devnet-style node.
#[derive(Debug, Clone, Deserialize)]
pub struct SequencerConfig {
    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_l1_rpc_url")]
    pub l1_rpc_url: String,
    #[serde(default = "default_l1_chain_id")]
    pub l1_chain_id: u64,
    #[serde(default = "default_l2_chain_id")]
    pub l2_chain_id: u64,
    /// 32-byte hex key used to sign batch submissions. Optional: without it
    /// the node sequences but refuses to submit.
    #[serde(default)]
    pub sequencer_private_key: Option<String>,
    #[serde(default = "default_batch_size_limit")]
    pub batch_size_limit: usize,
    #[serde(default = "default_block_gas_limit")]
    pub block_gas_limit: u64,
    #[serde(default = "default_batch_interval_ms")]
    pub batch_interval_ms: u64,
    #[serde(default = "default_mempool_max_size")]
    pub mempool_max_size: usize,
    #[serde(default = "default_mempool_wal_path")]
    pub mempool_wal_path: String,
    #[serde(default = "default_state_db_path")]
    pub state_db_path: String,
    #[serde(default)]
    pub emergency_halt: bool,
    /// Advisory ingress cap; enforcement is left to the deployment's
    /// reverse proxy.
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: u64,
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}
fn default_api_port() -> u16 {
    6197
}
fn default_l1_rpc_url() -> String {
    "http://localhost:8545".to_string()
}
fn default_l1_chain_id() -> u64 {
    1
}
fn default_l2_chain_id() -> u64 {
    1337
}
fn default_batch_size_limit() -> usize {
    1000
}
fn default_block_gas_limit() -> u64 {
    30_000_000
}
fn default_batch_interval_ms() -> u64 {
    2000
}
fn default_mempool_max_size() -> usize {
    100_000
}
fn default_mempool_wal_path() -> String {
    "./mempool.wal".to_string()
}
fn default_state_db_path() -> String {
    "./state.db".to_string()
}
fn default_rate_limit_per_second() -> u64 {
    1000
}

impl Default for SequencerConfig {
    fn default() -> Self {
        // empty environment = all defaults; the iterator source cannot fail
        envy::from_iter(std::iter::empty::<(String, String)>())
            .unwrap_or_else(|_| unreachable!("defaults are infallible"))
    }
}

impl SequencerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, SequencerError> {
        let config: SequencerConfig =
            envy::from_env().map_err(|err| SequencerError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), SequencerError> {
        if let Some(key) = &self.sequencer_private_key {
            let bytes = hex::decode(key.trim_start_matches("0x"))
                .map_err(|err| SequencerError::Config(format!("bad sequencer key: {err}")))?;
            if bytes.len() != 32 {
                return Err(SequencerError::Config(
                    "sequencer_private_key must be 32 bytes of hex".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The key decoded to raw bytes, when configured.
    pub fn sequencer_key_bytes(&self) -> Result<Option<[u8; 32]>, SequencerError> {
        match &self.sequencer_private_key {
            None => Ok(None),
            Some(key) => {
                let bytes = hex::decode(key.trim_start_matches("0x"))
                    .map_err(|err| SequencerError::Config(format!("bad sequencer key: {err}")))?;
                bytes
                    .try_into()
                    .map(Some)
                    .map_err(|_| SequencerError::Config("sequencer key must be 32 bytes".into()))
            }
        }
    }
}
