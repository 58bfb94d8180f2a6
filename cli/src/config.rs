//! Sweep configuration, loaded from TOML and overridden by CLI flags.

use dustsweep_rpc::RpcAuth;
use dustsweep_types::{Amount, FeeModel, Policy, Profile};
use dustsweep_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("Config is missing values. Make sure {} are filled in.", .0.join(", "))]
    Missing(Vec<&'static str>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Wallet daemon RPC host.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default)]
    pub rpc_user: Option<String>,

    #[serde(default)]
    pub rpc_password: Option<String>,

    /// Per-request timeout for daemon calls.
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    #[serde(default)]
    pub profile: Profile,

    /// Field-by-field overrides of the selected profile.
    #[serde(default)]
    pub policy: PolicyOverrides,

    /// Coin ticker shown next to amounts.
    #[serde(default = "default_ticker")]
    pub ticker: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// The `[policy]` table. Unset fields fall through to the profile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyOverrides {
    /// Default dust threshold in satoshis.
    pub dust_threshold: Option<u64>,
    pub max_inputs: Option<u32>,
    pub fee_per_byte: Option<u64>,
    pub fee_base: Option<u64>,
}

impl PolicyOverrides {
    pub fn apply(&self, policy: Policy) -> Policy {
        Policy {
            dust_threshold: self
                .dust_threshold
                .map(Amount::from_sat)
                .unwrap_or(policy.dust_threshold),
            max_inputs: self.max_inputs.unwrap_or(policy.max_inputs),
            fee_model: FeeModel::new(
                self.fee_per_byte.unwrap_or(policy.fee_model.per_byte),
                self.fee_base.unwrap_or(policy.fee_model.base),
            ),
        }
    }
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    15715
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_ticker() -> String {
    "BLK".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Everything needed to reach the daemon.
#[derive(Clone, Debug)]
pub struct Connection {
    pub url: String,
    pub auth: RpcAuth,
    pub timeout: Duration,
}

impl SweepConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The selected profile with `[policy]` overrides applied.
    pub fn policy(&self) -> Policy {
        self.policy.apply(self.profile.policy())
    }

    /// Names of required connection fields that are unset or blank.
    pub fn missing_values(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        let mut missing = Vec::new();
        if self.rpc_host.trim().is_empty() {
            missing.push("rpc_host");
        }
        if self.rpc_port == 0 {
            missing.push("rpc_port");
        }
        if blank(&self.rpc_user) {
            missing.push("rpc_user");
        }
        if blank(&self.rpc_password) {
            missing.push("rpc_password");
        }
        missing
    }

    /// Validate the connection fields and assemble the daemon endpoint.
    pub fn connection(&self) -> Result<Connection, ConfigError> {
        let missing = self.missing_values();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }
        Ok(Connection {
            url: format!("http://{}:{}", self.rpc_host.trim(), self.rpc_port),
            auth: RpcAuth {
                user: self.rpc_user.clone().unwrap_or_default(),
                password: self.rpc_password.clone().unwrap_or_default(),
            },
            timeout: Duration::from_secs(self.rpc_timeout_secs),
        })
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            rpc_user: None,
            rpc_password: None,
            rpc_timeout_secs: default_rpc_timeout_secs(),
            profile: Profile::default(),
            policy: PolicyOverrides::default(),
            ticker: default_ticker(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
