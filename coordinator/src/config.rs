//! Work service configuration with TOML file support.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use powrace_dpow::{DpowConfig, DpowProvider};
use powrace_store::{DEFAULT_FAILURE_KEY, DEFAULT_FAILURE_TTL};
use powrace_types::{Difficulty, NetworkId};
use powrace_utils::LogFormat;

use crate::CoordinatorError;

/// Configuration for a work service.
///
/// Can be loaded from a TOML file via [`WorkConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkConfig {
    /// Network whose base difficulty applies when a caller gives none.
    #[serde(default = "default_network")]
    pub network: NetworkId,

    /// `work_generate` endpoints raced on every call.
    #[serde(default)]
    pub work_peers: Vec<String>,

    /// RPC endpoint of the local node.
    #[serde(default = "default_node_url")]
    pub node_url: String,

    /// Whether the node itself is raced as one more work peer.
    #[serde(default)]
    pub node_work_generate: bool,

    /// How long one race round waits for the next completion.
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,

    /// Bound on a single peer `work_generate` round trip.
    #[serde(default = "default_peer_timeout_secs")]
    pub peer_timeout_secs: u64,

    /// Lifetime of the shared failure flag once set.
    #[serde(default = "default_failure_ttl_secs")]
    pub failure_ttl_secs: u64,

    /// Key the failure flag is stored under.
    #[serde(default = "default_failure_key")]
    pub failure_key: String,

    /// Directory of the shared LMDB store.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Local search threads (0 = one per core).
    #[serde(default)]
    pub work_threads: usize,

    /// RPC listen port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Distributed solver; absent means no distributed candidate.
    #[serde(default)]
    pub dpow: Option<DpowSection>,
}

/// The `[dpow]` table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpowSection {
    #[serde(default = "default_provider")]
    pub provider: DpowProvider,
    pub user: String,
    pub key: String,
    /// Overrides the provider's websocket URL.
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Overrides the provider's backup HTTP URL.
    #[serde(default)]
    pub fallback_url: Option<String>,
    /// Overrides the provider's difficulty floor.
    #[serde(default)]
    pub force_difficulty: Option<Difficulty>,
    #[serde(default = "default_dpow_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_secs: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_network() -> NetworkId {
    NetworkId::Nano
}

fn default_node_url() -> String {
    "http://127.0.0.1:7076".to_string()
}

fn default_round_timeout_secs() -> u64 {
    30
}

fn default_peer_timeout_secs() -> u64 {
    300
}

fn default_failure_ttl_secs() -> u64 {
    DEFAULT_FAILURE_TTL.as_secs()
}

fn default_failure_key() -> String {
    DEFAULT_FAILURE_KEY.to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./powrace_data")
}

fn default_rpc_port() -> u16 {
    7090
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_provider() -> DpowProvider {
    DpowProvider::Dpow
}

fn default_dpow_timeout_secs() -> u64 {
    15
}

fn default_reconnect_secs() -> u64 {
    5
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WorkConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, CoordinatorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoordinatorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, CoordinatorError> {
        toml::from_str(s).map_err(|e| CoordinatorError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, CoordinatorError> {
        toml::to_string_pretty(self).map_err(|e| CoordinatorError::Config(e.to_string()))
    }

    /// Every URL raced as a work peer: the configured peers, then the node
    /// when `node_work_generate` is on.
    pub fn peer_urls(&self) -> Vec<String> {
        let mut urls = self.work_peers.clone();
        if self.node_work_generate {
            urls.push(self.node_url.clone());
        }
        urls
    }

    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.round_timeout_secs)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_secs(self.peer_timeout_secs)
    }

    pub fn failure_ttl(&self) -> Duration {
        Duration::from_secs(self.failure_ttl_secs)
    }

    /// Fill the `[dpow]` credentials from the environment.
    ///
    /// `DPOW_USER`/`DPOW_KEY` select the Nano service; failing that,
    /// `BPOW_USER`/`BPOW_KEY` select the Banano one. A variable pair only
    /// counts when both halves are present. URL and difficulty overrides of an
    /// existing section are kept.
    pub fn with_env_credentials<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let found = [
            (DpowProvider::Dpow, "DPOW_USER", "DPOW_KEY"),
            (DpowProvider::Bpow, "BPOW_USER", "BPOW_KEY"),
        ]
        .into_iter()
        .find_map(|(provider, user_var, key_var)| {
            Some((provider, lookup(user_var)?, lookup(key_var)?))
        });

        if let Some((provider, user, key)) = found {
            match self.dpow.as_mut() {
                Some(section) => {
                    section.provider = provider;
                    section.user = user;
                    section.key = key;
                }
                None => self.dpow = Some(DpowSection::new(provider, user, key)),
            }
        }
        self
    }

    /// Client configuration for the distributed solver, if one is configured.
    pub fn dpow_config(&self) -> Option<DpowConfig> {
        let section = self.dpow.as_ref()?;
        let mut config = DpowConfig::new(
            section.provider,
            section.user.clone(),
            section.key.clone(),
            self.network,
        );
        if let Some(url) = &section.ws_url {
            config.ws_url = url.clone();
        }
        if let Some(url) = &section.fallback_url {
            config.fallback_url = url.clone();
        }
        if section.force_difficulty.is_some() {
            config.force_difficulty = section.force_difficulty;
        }
        config.request_timeout = Duration::from_secs(section.timeout_secs);
        config.reconnect_delay = Duration::from_secs(section.reconnect_secs);
        Some(config)
    }
}

impl DpowSection {
    pub fn new(provider: DpowProvider, user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            provider,
            user: user.into(),
            key: key.into(),
            ws_url: None,
            fallback_url: None,
            force_difficulty: None,
            timeout_secs: default_dpow_timeout_secs(),
            reconnect_secs: default_reconnect_secs(),
        }
    }
}

impl Default for WorkConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            work_peers: Vec::new(),
            node_url: default_node_url(),
            node_work_generate: false,
            round_timeout_secs: default_round_timeout_secs(),
            peer_timeout_secs: default_peer_timeout_secs(),
            failure_ttl_secs: default_failure_ttl_secs(),
            failure_key: default_failure_key(),
            store_path: default_store_path(),
            work_threads: 0,
            rpc_port: default_rpc_port(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            dpow: None,
        }
    }
}
