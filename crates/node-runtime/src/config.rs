//! # Environment Configuration
//!
//! Both binaries are configured exclusively through `AT_*` variables.
//! Parsing goes through a lookup function so it can be exercised without
//! touching the process environment.

use at_01_transport::TransportConfig;
use at_02_certifier::{NodeConfig, PolicyKind};
use at_04_coordinator::{CertificateRequest, CoordinatorConfig};
use shared_crypto::{decode_hex, BlsKeyPair};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const LISTEN_ADDR: &str = "AT_LISTEN_ADDR";
pub const BLS_PRIVATE_KEY: &str = "AT_BLS_PRIVATE_KEY";
pub const POLICY: &str = "AT_POLICY";
pub const ETH_RPC_URL: &str = "AT_ETH_RPC_URL";

pub const OPERATORS_FILE: &str = "AT_OPERATORS_FILE";
pub const TASK_INDEX: &str = "AT_TASK_INDEX";
pub const TASK_BLOCK: &str = "AT_TASK_BLOCK";
pub const QUORUM: &str = "AT_QUORUM";
pub const THRESHOLD: &str = "AT_THRESHOLD";
pub const PAYLOAD_HEX: &str = "AT_PAYLOAD_HEX";
pub const EXPIRY_SECS: &str = "AT_EXPIRY_SECS";
pub const AGGREGATION_WINDOW_MS: &str = "AT_AGGREGATION_WINDOW_MS";

const DEFAULT_THRESHOLD: u8 = 100;
const DEFAULT_EXPIRY_SECS: u64 = 30;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

fn invalid(var: &'static str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}

fn required<L>(lookup: &L, var: &'static str) -> Result<String, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parsed_or<L, T>(lookup: &L, var: &'static str, default: T) -> Result<T, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|e| invalid(var, e)),
        None => Ok(default),
    }
}

fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// `signer-node` settings.
#[derive(Debug)]
pub struct SignerSettings {
    pub node: NodeConfig,
    pub keypair: BlsKeyPair,
}

impl SignerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = NodeConfig::default();
        let node = NodeConfig {
            listen_addr: parsed_or(&lookup, LISTEN_ADDR, defaults.listen_addr)?,
            policy: parsed_or::<_, PolicyKind>(&lookup, POLICY, defaults.policy)?,
            eth_rpc_url: lookup(ETH_RPC_URL).filter(|url| !url.trim().is_empty()),
        };
        node.validate().map_err(|e| invalid(POLICY, e))?;

        let key = required(&lookup, BLS_PRIVATE_KEY)?;
        let keypair = BlsKeyPair::from_hex(&key).map_err(|e| invalid(BLS_PRIVATE_KEY, e))?;

        Ok(Self { node, keypair })
    }
}

/// `coordinator` settings: the operator set source plus one round.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub operators_file: PathBuf,
    pub request: CertificateRequest,
    pub coordinator: CoordinatorConfig,
    pub transport: TransportConfig,
}

impl CoordinatorSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let operators_file = PathBuf::from(required(&lookup, OPERATORS_FILE)?);

        let payload = match lookup(PAYLOAD_HEX) {
            Some(hex) => decode_hex(hex.trim()).map_err(|e| invalid(PAYLOAD_HEX, e))?,
            None => Vec::new(),
        };
        let expiry_secs: u64 = parsed_or(&lookup, EXPIRY_SECS, DEFAULT_EXPIRY_SECS)?;
        if expiry_secs == 0 {
            return Err(invalid(EXPIRY_SECS, "must be greater than zero"));
        }
        let threshold: u8 = parsed_or(&lookup, THRESHOLD, DEFAULT_THRESHOLD)?;
        if !(1..=100).contains(&threshold) {
            return Err(invalid(THRESHOLD, "must be between 1 and 100"));
        }

        let request = CertificateRequest {
            task_index: parsed_or(&lookup, TASK_INDEX, 0)?,
            created_at_block: parsed_or(&lookup, TASK_BLOCK, 0)?,
            quorum: parsed_or(&lookup, QUORUM, 0)?,
            threshold,
            payload,
            expiry: Duration::from_secs(expiry_secs),
        };

        let default_window = CoordinatorConfig::default().aggregation_window;
        let window_ms: u64 =
            parsed_or(&lookup, AGGREGATION_WINDOW_MS, default_window.as_millis() as u64)?;

        Ok(Self {
            operators_file,
            request,
            coordinator: CoordinatorConfig {
                aggregation_window: Duration::from_millis(window_ms),
            },
            transport: TransportConfig::default(),
        })
    }
}
