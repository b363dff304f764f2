use std::env;
use std::str::FromStr;

use log::warn;

use crate::blockchain::{
    ChainParams, DEFAULT_ADJUST_DIFFICULTY_BLOCKS, DEFAULT_BLOCK_LIMITATION,
    DEFAULT_BLOCK_TIME_SECS, DEFAULT_MINER_REWARDS,
};

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub host: String,
    pub port: u16,
    /// Address credited for mined blocks. A keypair is generated when unset.
    pub miner_address: Option<String>,
    pub chain: ChainParams,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            miner_address: None,
            chain: ChainParams::default(),
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take defaults and unparsable
    /// ones are logged and take defaults too.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            miner_address: lookup("MINER_ADDRESS")
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            chain: ChainParams {
                adjust_difficulty_blocks: parse_or(
                    &lookup,
                    "ADJUST_DIFFICULTY_BLOCKS",
                    DEFAULT_ADJUST_DIFFICULTY_BLOCKS,
                )
                .max(1),
                block_limitation: parse_or(&lookup, "BLOCK_LIMITATION", DEFAULT_BLOCK_LIMITATION)
                    .max(1),
                miner_rewards: parse_or(&lookup, "MINER_REWARDS", DEFAULT_MINER_REWARDS),
                block_time_secs: parse_or(&lookup, "BLOCK_TIME", DEFAULT_BLOCK_TIME_SECS),
            },
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{key}={raw:?} is not valid, using {default}");
            default
        }),
    }
}
