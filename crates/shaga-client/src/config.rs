//! Client connection settings.
//!
//! Loaded from TOML, then optionally overridden from the environment:
//! - `SHAGA_RPC_URL` replaces the endpoint
//! - `SHAGA_COMMITMENT` replaces the confirmation level

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::ClientError;

/// Environment variable overriding [`ClusterConfig::rpc_url`].
pub const RPC_URL_ENV: &str = "SHAGA_RPC_URL";

/// Environment variable overriding [`ClusterConfig::commitment`].
pub const COMMITMENT_ENV: &str = "SHAGA_COMMITMENT";

/// Cluster the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Local validator or in-process cluster.
    #[default]
    Localnet,
    /// Public development cluster.
    Devnet,
    /// Production cluster.
    Mainnet,
}

impl Network {
    /// Default RPC endpoint for this network.
    #[must_use]
    pub const fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Localnet => "http://127.0.0.1:8899",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Mainnet => "https://api.mainnet-beta.solana.com",
        }
    }
}

/// How far a submitted transaction must progress before it counts as landed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// Applied by the receiving node.
    Processed,
    /// Voted on by a supermajority.
    #[default]
    Confirmed,
    /// Rooted and irreversible.
    Finalized,
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed => write!(f, "processed"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Finalized => write!(f, "finalized"),
        }
    }
}

impl FromStr for Commitment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(ClientError::Config(format!("unknown commitment '{other}'"))),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Target network.
    pub network: Network,
    /// Explicit endpoint; the network default is used when unset.
    pub rpc_url: Option<String>,
    /// Confirmation level for submissions that wait.
    pub commitment: Commitment,
}

impl ClusterConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an http(s) URL.
    pub fn validate(&self) -> Result<()> {
        match &self.rpc_url {
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => Err(
                ClientError::Config(format!("rpc_url must be an http(s) URL, got '{url}'")),
            ),
            _ => Ok(()),
        }
    }

    /// Applies `SHAGA_RPC_URL` and `SHAGA_COMMITMENT` from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an override fails to parse or validate.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if an override fails to parse or validate.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup(RPC_URL_ENV).filter(|url| !url.is_empty()) {
            self.rpc_url = Some(url);
        }
        if let Some(commitment) = lookup(COMMITMENT_ENV) {
            self.commitment = commitment.parse()?;
        }
        self.validate()?;
        Ok(self)
    }

    /// The endpoint to connect to.
    #[must_use]
    pub fn rpc_endpoint(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }
}
