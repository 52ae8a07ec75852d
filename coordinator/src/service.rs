//! The long-lived work service: owns the peer HTTP client, the distributed
//! session, the failure flag store and the local worker, and hands out work.

use std::sync::Arc;

use tracing::info;

use powrace_dpow::DpowClient;
use powrace_peers::PeerClient;
use powrace_store::{FailureFlag, KvStore};
use powrace_store_lmdb::environment::DEFAULT_MAP_SIZE;
use powrace_store_lmdb::LmdbEnvironment;
use powrace_types::{BlockHash, Difficulty, WorkNonce};
use powrace_work::{CpuWorker, LocalWorker};

use crate::{CoordinatorError, CoordinatorMetrics, WorkConfig, WorkCoordinator};

pub struct WorkService {
    config: WorkConfig,
    coordinator: WorkCoordinator,
    dpow: Option<Arc<DpowClient>>,
}

impl WorkService {
    /// Start a service backed by the LMDB store at `config.store_path` and a
    /// CPU worker.
    ///
    /// Must be called from within a tokio runtime when a distributed solver is
    /// configured, since its session task is spawned here.
    pub fn start(config: WorkConfig) -> Result<Arc<Self>, CoordinatorError> {
        let env = LmdbEnvironment::open(&config.store_path, DEFAULT_MAP_SIZE)?;
        let store: Arc<dyn KvStore> = Arc::new(env.kv_store());
        let worker = CpuWorker::new(config.work_threads)?;
        info!(threads = worker.threads(), "local worker ready");
        Self::with_parts(config, store, Arc::new(worker))
    }

    /// Start a service over caller-supplied store and worker.
    pub fn with_parts(
        config: WorkConfig,
        store: Arc<dyn KvStore>,
        worker: Arc<dyn LocalWorker>,
    ) -> Result<Arc<Self>, CoordinatorError> {
        let metrics = Arc::new(CoordinatorMetrics::new()?);
        let flag = FailureFlag::with_key(store, config.failure_key.clone(), config.failure_ttl());
        let peers = PeerClient::new(config.peer_timeout())?;

        let dpow = match config.dpow_config() {
            Some(dpow_config) => Some(Arc::new(DpowClient::connect(dpow_config)?)),
            None => None,
        };

        let mut coordinator = WorkCoordinator::new(
            config.network,
            peers,
            config.peer_urls(),
            flag,
            worker,
            metrics,
        )
        .with_round_timeout(config.round_timeout());
        if let Some(client) = &dpow {
            coordinator = coordinator.with_dpow(Arc::clone(client));
        }

        info!(
            network = %config.network,
            peers = coordinator.peer_urls().len(),
            distributed = dpow.as_ref().map(|d| d.config().provider.as_str()),
            "work service started"
        );

        Ok(Arc::new(Self {
            config,
            coordinator,
            dpow,
        }))
    }

    pub fn config(&self) -> &WorkConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &WorkCoordinator {
        &self.coordinator
    }

    pub fn metrics(&self) -> &Arc<CoordinatorMetrics> {
        self.coordinator.metrics()
    }

    pub async fn generate(&self, hash: &BlockHash, difficulty: Option<Difficulty>) -> WorkNonce {
        self.coordinator.generate(hash, difficulty).await
    }

    pub fn cancel(&self, hash: &BlockHash) {
        self.coordinator.cancel(hash);
    }

    /// Stop the distributed session. Races already running keep their
    /// remaining candidates.
    pub async fn shutdown(&self) {
        if let Some(dpow) = &self.dpow {
            dpow.shutdown().await;
        }
        info!("work service stopped");
    }
}
