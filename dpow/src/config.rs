//! Distributed service selection and credentials.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use powrace_types::{Difficulty, NetworkId};

/// Which distributed proof-of-work service to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DpowProvider {
    /// The Nano distributed PoW service.
    Dpow,
    /// The Banano distributed PoW service.
    Bpow,
}

impl DpowProvider {
    pub fn default_ws_url(&self) -> &'static str {
        match self {
            Self::Dpow => "wss://dpow.nanocenter.org/service_ws/",
            Self::Bpow => "wss://bpow.banano.cc/service_ws/",
        }
    }

    pub fn default_fallback_url(&self) -> &'static str {
        match self {
            Self::Dpow => "https://dpow.nanocenter.org/service/",
            Self::Bpow => "https://bpow.banano.cc/service/",
        }
    }

    /// Difficulty floor forced on every websocket submission for `network`.
    ///
    /// Dpow always gets the Nano base difficulty. Bpow gets it too unless the
    /// work is for Banano, where the caller's difficulty is passed through.
    pub fn forced_difficulty(&self, network: NetworkId) -> Option<Difficulty> {
        match (self, network) {
            (Self::Bpow, NetworkId::Banano) => None,
            _ => Some(NetworkId::Nano.base_difficulty()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dpow => "dpow",
            Self::Bpow => "bpow",
        }
    }
}

/// Everything a [`crate::DpowClient`] needs, fixed for its lifetime.
#[derive(Clone, Debug)]
pub struct DpowConfig {
    pub provider: DpowProvider,
    pub user: String,
    pub api_key: String,
    pub ws_url: String,
    pub fallback_url: String,
    /// Minimum difficulty sent over the websocket; `None` passes the caller's through.
    pub force_difficulty: Option<Difficulty>,
    /// Service-side timeout sent with each websocket request, and the bound on backup POSTs.
    pub request_timeout: Duration,
    pub reconnect_delay: Duration,
}

impl DpowConfig {
    /// Provider defaults for `network`.
    pub fn new(
        provider: DpowProvider,
        user: impl Into<String>,
        api_key: impl Into<String>,
        network: NetworkId,
    ) -> Self {
        Self {
            provider,
            user: user.into(),
            api_key: api_key.into(),
            ws_url: provider.default_ws_url().to_string(),
            fallback_url: provider.default_fallback_url().to_string(),
            force_difficulty: provider.forced_difficulty(network),
            request_timeout: Duration::from_secs(15),
            reconnect_delay: Duration::from_secs(5),
        }
    }

    /// Difficulty to put on the wire for a request asking for `requested`.
    pub fn effective_difficulty(&self, requested: Difficulty) -> Difficulty {
        match self.force_difficulty {
            Some(forced) => forced.max(requested),
            None => requested,
        }
    }
}
