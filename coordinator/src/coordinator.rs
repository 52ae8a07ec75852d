//! The work race.
//!
//! One call to [`WorkCoordinator::generate`]:
//! 1. reads the shared failure flag,
//! 2. builds candidates (one per peer, at most one distributed, local when
//!    hedging or when nothing remote is configured),
//! 3. polls them together on the calling task, one bounded round at a time,
//! 4. returns the first work value, telling every peer to cancel,
//! 5. or, when every candidate is gone without a winner, sets the flag and
//!    computes locally.
//!
//! A round that times out drops every remote candidate still pending. The
//! local candidate is never timed out: it is awaited alongside the rounds
//! and, once the remote ones are gone, on its own. Remote candidates that
//! complete in the same wake are settled together; a fault ends that batch
//! and leaves the remaining completions for the next round.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use futures_util::{FutureExt, StreamExt};
use tracing::{debug, error, info, warn};

use powrace_dpow::{DpowClient, DpowError};
use powrace_peers::PeerClient;
use powrace_store::FailureFlag;
use powrace_types::{BlockHash, Difficulty, NetworkId, WorkNonce, WorkRequest};
use powrace_work::LocalWorker;

use crate::{Candidate, CandidateFault, CoordinatorMetrics, Outcome, RawResult};

/// Default wait for the next completion in one round.
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(30);

const LOCAL_RETRY_BACKOFF: Duration = Duration::from_millis(100);

type Completion = (Candidate, Result<RawResult, CandidateFault>);
type CandidateFuture<'a> = BoxFuture<'a, Completion>;

enum Wake {
    Remote(Option<Completion>),
    Local(Completion),
    RoundTimedOut,
}

enum Settled {
    Won(WorkNonce),
    Discarded,
    Faulted,
}

pub struct WorkCoordinator {
    network: NetworkId,
    peers: PeerClient,
    peer_urls: Vec<String>,
    dpow: Option<Arc<DpowClient>>,
    flag: FailureFlag,
    worker: Arc<dyn LocalWorker>,
    round_timeout: Duration,
    metrics: Arc<CoordinatorMetrics>,
}

impl WorkCoordinator {
    pub fn new(
        network: NetworkId,
        peers: PeerClient,
        peer_urls: Vec<String>,
        flag: FailureFlag,
        worker: Arc<dyn LocalWorker>,
        metrics: Arc<CoordinatorMetrics>,
    ) -> Self {
        Self {
            network,
            peers,
            peer_urls,
            dpow: None,
            flag,
            worker,
            round_timeout: DEFAULT_ROUND_TIMEOUT,
            metrics,
        }
    }

    /// Race the distributed solver too.
    pub fn with_dpow(mut self, client: Arc<DpowClient>) -> Self {
        self.dpow = Some(client);
        self
    }

    pub fn with_round_timeout(mut self, round_timeout: Duration) -> Self {
        self.round_timeout = round_timeout;
        self
    }

    pub fn network(&self) -> NetworkId {
        self.network
    }

    pub fn peer_urls(&self) -> &[String] {
        &self.peer_urls
    }

    pub fn flag(&self) -> &FailureFlag {
        &self.flag
    }

    pub fn metrics(&self) -> &Arc<CoordinatorMetrics> {
        &self.metrics
    }

    /// Obtain work for `hash` at `difficulty` (network base when `None`).
    ///
    /// Never fails: every remote failure is absorbed, and the last resort is
    /// local computation retried until it answers.
    pub async fn generate(&self, hash: &BlockHash, difficulty: Option<Difficulty>) -> WorkNonce {
        let request = WorkRequest::for_network(*hash, difficulty, self.network);
        let started = Instant::now();
        self.metrics.races_started.inc();

        let work = match self.race(&request).await {
            Some(work) => work,
            None => {
                warn!(hash = %request.hash, "every work candidate failed, falling back to local work");
                self.metrics.total_failures.inc();
                self.flag.set();
                self.compute_locally(&request).await
            }
        };

        self.metrics
            .generate_latency_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
        work
    }

    /// Tell every peer to stop working on `hash`.
    pub fn cancel(&self, hash: &BlockHash) {
        debug!(%hash, peers = self.peer_urls.len(), "broadcasting work_cancel");
        self.peers.broadcast_cancel(&self.peer_urls, hash);
    }

    async fn race(&self, request: &WorkRequest) -> Option<WorkNonce> {
        let (mut remote, mut local) = self.candidates(request).await;
        debug!(
            hash = %request.hash,
            remote = remote.len(),
            local = local.is_some(),
            "work race started"
        );

        while !remote.is_empty() || local.is_some() {
            let wake = {
                let round = async {
                    if remote.is_empty() {
                        return std::future::pending().await;
                    }
                    match tokio::time::timeout(self.round_timeout, remote.next()).await {
                        Ok(completion) => Wake::Remote(completion),
                        Err(_) => Wake::RoundTimedOut,
                    }
                };
                let local_done = async {
                    match local.as_mut() {
                        Some(candidate) => Wake::Local(candidate.await),
                        None => std::future::pending().await,
                    }
                };
                tokio::select! {
                    wake = round => wake,
                    wake = local_done => wake,
                }
            };

            let first = match wake {
                Wake::Local(completion) => {
                    local = None;
                    completion
                }
                Wake::Remote(Some(completion)) => completion,
                Wake::Remote(None) => continue,
                Wake::RoundTimedOut => {
                    warn!(
                        hash = %request.hash,
                        pending = remote.len(),
                        timeout_secs = self.round_timeout.as_secs(),
                        "work round timed out, dropping pending remote candidates"
                    );
                    self.metrics.candidates_timed_out.inc_by(remote.len() as u64);
                    remote.clear();
                    continue;
                }
            };

            let mut next = Some(first);
            while let Some((candidate, result)) = next.take() {
                match self.settle(&request.hash, &candidate, result) {
                    Settled::Won(work) => {
                        self.cancel(&request.hash);
                        return Some(work);
                    }
                    Settled::Discarded => next = remote.next().now_or_never().flatten(),
                    Settled::Faulted => break,
                }
            }
        }
        None
    }

    /// Remote candidates share the timed pool; the local one is awaited apart from it.
    async fn candidates<'a>(
        &'a self,
        request: &'a WorkRequest,
    ) -> (FuturesUnordered<CandidateFuture<'a>>, Option<CandidateFuture<'a>>) {
        let hedge = self.flag.is_set();
        let nothing_remote = self.peer_urls.is_empty() && self.dpow.is_none();

        let remote = FuturesUnordered::new();
        for url in &self.peer_urls {
            remote.push(self.peer_candidate(url, request));
        }

        if let Some(dpow) = &self.dpow {
            if let Some(candidate) = self.distributed_candidate(dpow, request).await {
                remote.push(candidate);
            }
        }

        let local = (hedge || nothing_remote).then(|| self.local_candidate(request));
        (remote, local)
    }

    fn peer_candidate<'a>(&'a self, url: &'a str, request: &'a WorkRequest) -> CandidateFuture<'a> {
        async move {
            let result = self
                .peers
                .request(url, request)
                .await
                .map(RawResult::Json)
                .map_err(CandidateFault::from);
            (Candidate::Peer { url: url.to_string() }, result)
        }
        .boxed()
    }

    /// Submit over the session, or race the backup endpoint when the session
    /// is closed. Any other submit error drops the distributed candidate.
    async fn distributed_candidate<'a>(
        &'a self,
        dpow: &'a DpowClient,
        request: &'a WorkRequest,
    ) -> Option<CandidateFuture<'a>> {
        let pending = dpow.register();
        let request_id = pending.id();

        match dpow.submit(request_id, request).await {
            Ok(()) => Some(
                async move {
                    let result = match pending.wait().await {
                        Some(notification) => RawResult::Pushed(notification),
                        None => RawResult::Absent,
                    };
                    (Candidate::Distributed { request_id }, Ok(result))
                }
                .boxed(),
            ),
            Err(DpowError::ConnectionClosed) => {
                drop(pending);
                info!(hash = %request.hash, request_id, "distributed session closed, using backup endpoint");
                Some(
                    async move {
                        let result = dpow
                            .submit_http(request)
                            .await
                            .map(RawResult::Json)
                            .map_err(CandidateFault::from);
                        (Candidate::DistributedFallback, result)
                    }
                    .boxed(),
                )
            }
            Err(e) => {
                warn!(hash = %request.hash, request_id, error = %e, "distributed submit failed");
                self.metrics.faults.with_label_values(&["distributed"]).inc();
                None
            }
        }
    }

    fn local_candidate<'a>(&self, request: &WorkRequest) -> CandidateFuture<'a> {
        let worker = Arc::clone(&self.worker);
        let request = *request;
        async move {
            let result = run_local(worker, request).await.map(RawResult::Work);
            (Candidate::Local, result)
        }
        .boxed()
    }

    fn settle(
        &self,
        hash: &BlockHash,
        candidate: &Candidate,
        result: Result<RawResult, CandidateFault>,
    ) -> Settled {
        let source = candidate.source();
        match result.and_then(RawResult::normalize) {
            Ok(Outcome::Work(work)) => {
                info!(%hash, %candidate, %work, "work_generate won");
                self.metrics.wins.with_label_values(&[source]).inc();
                Settled::Won(work)
            }
            Ok(Outcome::Error(message)) => {
                info!(%hash, %candidate, error = %message, "work_generate candidate returned error");
                self.metrics.solver_errors.with_label_values(&[source]).inc();
                Settled::Discarded
            }
            Ok(Outcome::Absent) => {
                info!(%hash, %candidate, "work_generate candidate returned nothing");
                Settled::Discarded
            }
            Err(fault) => {
                warn!(%hash, %candidate, error = %fault, "work_generate candidate failed");
                self.metrics.faults.with_label_values(&[source]).inc();
                Settled::Faulted
            }
        }
    }

    async fn compute_locally(&self, request: &WorkRequest) -> WorkNonce {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match run_local(Arc::clone(&self.worker), *request).await {
                Ok(work) => {
                    self.metrics.wins.with_label_values(&["local"]).inc();
                    return work;
                }
                Err(fault) if attempt == 1 => {
                    warn!(hash = %request.hash, error = %fault, "local work failed, retrying");
                }
                Err(fault) => {
                    error!(hash = %request.hash, attempt, error = %fault, "local work keeps failing, retrying");
                }
            }
            tokio::time::sleep(LOCAL_RETRY_BACKOFF).await;
        }
    }
}

/// Run the worker on the blocking pool. Once started it runs to completion
/// even if the awaiting future is dropped.
async fn run_local(worker: Arc<dyn LocalWorker>, request: WorkRequest) -> Result<WorkNonce, CandidateFault> {
    let work = tokio::task::spawn_blocking(move || {
        worker.work_generate(&request.hash, request.difficulty)
    })
    .await??;
    Ok(work)
}
