//! Race scenarios against stub work peers and a stub distributed service,
//! all bound to `127.0.0.1:0`.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use powrace_coordinator::{CoordinatorMetrics, WorkCoordinator};
use powrace_dpow::{DpowClient, DpowConfig, DpowProvider};
use powrace_nullables::{NullKvStore, NullLocalWorker};
use powrace_peers::PeerClient;
use powrace_store::{FailureFlag, KvStore};
use powrace_types::{BlockHash, Difficulty, NetworkId, WorkNonce};

const LOCAL_WORK: WorkNonce = WorkNonce(0x10ca1);

// ---------------------------------------------------------------------------
// Stub peers
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Behavior {
    Work(&'static str),
    WorkAfter(Duration, &'static str),
    Error,
    Hang,
    Fail,
}

type Seen = Arc<Mutex<Vec<Value>>>;

struct StubPeer {
    url: String,
    seen: Seen,
}

impl StubPeer {
    fn count(&self, action: &str) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|body| body["action"] == action)
            .count()
    }

    fn first(&self, action: &str) -> Value {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .find(|body| body["action"] == action)
            .cloned()
            .unwrap()
    }

    /// Cancels are fire-and-forget, so poll for them.
    async fn wait_for(&self, action: &str, count: usize) {
        for _ in 0..100 {
            if self.count(action) >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{} never received {count} {action}", self.url);
    }
}

async fn peer_handler(
    State((seen, behavior)): State<(Seen, Behavior)>,
    Json(body): Json<Value>,
) -> Response {
    seen.lock().unwrap().push(body.clone());
    if body["action"] == "work_cancel" {
        return Json(json!({})).into_response();
    }
    match behavior {
        Behavior::Work(work) => Json(json!({"work": work})).into_response(),
        Behavior::WorkAfter(delay, work) => {
            tokio::time::sleep(delay).await;
            Json(json!({"work": work})).into_response()
        }
        Behavior::Error => Json(json!({"error": "no work available"})).into_response(),
        Behavior::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        Behavior::Fail => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_peer(behavior: Behavior) -> StubPeer {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/", post(peer_handler))
        .with_state((seen.clone(), behavior));
    let addr = serve(app).await;
    StubPeer {
        url: format!("http://{addr}/"),
        seen,
    }
}

// ---------------------------------------------------------------------------
// Stub distributed service
// ---------------------------------------------------------------------------

/// Answers each websocket request with the first 16 hex digits of its hash as
/// the work value, so concurrent requests are distinguishable.
async fn spawn_dpow_service() -> SocketAddr {
    async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
        ws.on_upgrade(handle_socket)
    }

    async fn handle_socket(mut socket: WebSocket) {
        while let Some(Ok(msg)) = socket.recv().await {
            if let Message::Text(text) = msg {
                let req: Value = serde_json::from_str(&text).unwrap();
                let hash = req["hash"].as_str().unwrap().to_lowercase();
                let reply = json!({"id": req["id"], "work": &hash[..16]});
                if socket.send(Message::Text(reply.to_string())).await.is_err() {
                    break;
                }
            }
        }
    }

    let app = Router::new()
        .route("/service_ws/", get(ws_handler))
        .route(
            "/service/",
            post(|Json(_): Json<Value>| async { Json(json!({"work": "00000000000bac0f"})) }),
        );
    serve(app).await
}

fn dpow_config(ws_url: String, fallback_url: String) -> DpowConfig {
    let mut config = DpowConfig::new(DpowProvider::Dpow, "user", "key", NetworkId::Dev);
    config.ws_url = ws_url;
    config.fallback_url = fallback_url;
    config.reconnect_delay = Duration::from_secs(60);
    config
}

async fn wait_connected(client: &DpowClient) {
    for _ in 0..100 {
        if client.is_connected().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("distributed session never connected");
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    store: Arc<NullKvStore>,
    worker: Arc<NullLocalWorker>,
}

impl Harness {
    fn new() -> Self {
        Self::with_worker(NullLocalWorker::new(LOCAL_WORK))
    }

    fn with_worker(worker: NullLocalWorker) -> Self {
        Self {
            store: Arc::new(NullKvStore::new()),
            worker: Arc::new(worker),
        }
    }

    fn set_flag(&self) {
        self.store
            .set("work_failure", b"aa", Duration::from_secs(300))
            .unwrap();
    }

    fn coordinator(&self, peers: &[&StubPeer], round_timeout: Duration) -> WorkCoordinator {
        let flag = FailureFlag::new(self.store.clone());
        WorkCoordinator::new(
            NetworkId::Dev,
            PeerClient::new(Duration::from_secs(10)).unwrap(),
            peers.iter().map(|p| p.url.clone()).collect(),
            flag,
            self.worker.clone(),
            Arc::new(CoordinatorMetrics::new().unwrap()),
        )
        .with_round_timeout(round_timeout)
    }

    fn flag_is_set(&self) -> bool {
        self.store.exists("work_failure").unwrap()
    }
}

fn hash(byte: u8) -> BlockHash {
    BlockHash::new([byte; 32])
}

// ---------------------------------------------------------------------------
// Peers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_work_wins_and_every_peer_is_cancelled() {
    let fast = spawn_peer(Behavior::Work("1234")).await;
    let slow = spawn_peer(Behavior::Hang).await;
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[&fast, &slow], Duration::from_secs(5));

    let work = coordinator.generate(&hash(1), None).await;
    assert_eq!(work, WorkNonce(0x1234));

    fast.wait_for("work_cancel", 1).await;
    slow.wait_for("work_cancel", 1).await;
    assert_eq!(fast.count("work_cancel"), 1);
    assert_eq!(slow.count("work_cancel"), 1);
    assert_eq!(fast.first("work_cancel")["hash"], "01".repeat(32));

    assert_eq!(harness.worker.calls(), 0);
    assert!(!harness.flag_is_set());
    assert_eq!(
        coordinator.metrics().wins.with_label_values(&["peer"]).get(),
        1
    );
}

#[tokio::test]
async fn difficulty_defaults_to_network_base() {
    let peer = spawn_peer(Behavior::Work("1")).await;
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[&peer], Duration::from_secs(5));

    coordinator.generate(&hash(2), None).await;
    coordinator
        .generate(&hash(2), Some(Difficulty(0xfffffe0000000000)))
        .await;

    let bodies: Vec<Value> = peer
        .seen
        .lock()
        .unwrap()
        .iter()
        .filter(|b| b["action"] == "work_generate")
        .cloned()
        .collect();
    assert_eq!(bodies[0]["difficulty"], "ff00000000000000");
    assert_eq!(bodies[0]["hash"], "02".repeat(32));
    assert_eq!(bodies[1]["difficulty"], "fffffe0000000000");
}

#[tokio::test]
async fn all_errors_fall_back_to_local_and_set_flag() {
    let a = spawn_peer(Behavior::Error).await;
    let b = spawn_peer(Behavior::Error).await;
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[&a, &b], Duration::from_secs(5));

    assert!(!harness.flag_is_set());
    let work = coordinator.generate(&hash(3), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert!(harness.flag_is_set());
    assert_eq!(harness.worker.calls(), 1);
    assert_eq!(coordinator.metrics().total_failures.get(), 1);
    assert_eq!(
        coordinator.metrics().solver_errors.with_label_values(&["peer"]).get(),
        2
    );
    // No winner, no cancel.
    assert_eq!(a.count("work_cancel"), 0);
}

#[tokio::test]
async fn set_flag_adds_local_hedge() {
    let peer = spawn_peer(Behavior::Hang).await;
    let harness = Harness::new();
    harness.set_flag();
    let coordinator = harness.coordinator(&[&peer], Duration::from_secs(5));

    let work = coordinator.generate(&hash(4), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert_eq!(harness.worker.calls(), 1);
    assert_eq!(harness.worker.requests(), vec![(hash(4), NetworkId::Dev.base_difficulty())]);
    peer.wait_for("work_cancel", 1).await;
}

#[tokio::test]
async fn nothing_configured_runs_one_local_candidate() {
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[], Duration::from_secs(5));

    let work = coordinator.generate(&hash(5), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert_eq!(harness.worker.calls(), 1);
    assert_eq!(harness.store.write_count(), 0);
    assert_eq!(
        coordinator.metrics().wins.with_label_values(&["local"]).get(),
        1
    );
}

#[tokio::test]
async fn pending_candidates_are_dropped_when_the_round_times_out() {
    let peer = spawn_peer(Behavior::Hang).await;
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[&peer], Duration::from_millis(200));

    let work = coordinator.generate(&hash(6), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert!(harness.flag_is_set());
    assert_eq!(coordinator.metrics().candidates_timed_out.get(), 1);
}

#[tokio::test]
async fn slow_local_work_outlives_the_round_timeout() {
    let harness = Harness::with_worker(NullLocalWorker::with_delay(
        LOCAL_WORK,
        Duration::from_millis(500),
    ));
    let coordinator = harness.coordinator(&[], Duration::from_millis(200));

    let work = coordinator.generate(&hash(20), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert_eq!(harness.worker.calls(), 1);
    assert_eq!(harness.store.write_count(), 0);
    assert_eq!(coordinator.metrics().candidates_timed_out.get(), 0);
    assert_eq!(coordinator.metrics().total_failures.get(), 0);
}

#[tokio::test]
async fn hedge_keeps_running_after_remote_candidates_time_out() {
    let peer = spawn_peer(Behavior::Hang).await;
    let harness = Harness::with_worker(NullLocalWorker::with_delay(
        LOCAL_WORK,
        Duration::from_millis(500),
    ));
    harness.set_flag();
    let coordinator = harness.coordinator(&[&peer], Duration::from_millis(200));

    let work = coordinator.generate(&hash(21), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert_eq!(harness.worker.calls(), 1);
    assert_eq!(coordinator.metrics().candidates_timed_out.get(), 1);
    assert_eq!(coordinator.metrics().total_failures.get(), 0);
    assert_eq!(
        coordinator.metrics().wins.with_label_values(&["local"]).get(),
        1
    );
    peer.wait_for("work_cancel", 1).await;
}

#[tokio::test]
async fn failed_hedge_is_followed_by_final_local_work() {
    let peer = spawn_peer(Behavior::Error).await;
    let harness = Harness::with_worker(NullLocalWorker::new(LOCAL_WORK).failing_first(1));
    harness.set_flag();
    let coordinator = harness.coordinator(&[&peer], Duration::from_secs(5));

    let work = coordinator.generate(&hash(22), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert_eq!(harness.worker.calls(), 2);
    assert_eq!(
        coordinator.metrics().faults.with_label_values(&["local"]).get(),
        1
    );
    assert_eq!(coordinator.metrics().total_failures.get(), 1);
    assert_eq!(peer.count("work_cancel"), 0);
}

#[tokio::test]
async fn final_local_work_is_retried_until_it_succeeds() {
    let harness = Harness::with_worker(NullLocalWorker::new(LOCAL_WORK).failing_first(3));
    let coordinator = harness.coordinator(&[], Duration::from_secs(5));

    let work = coordinator.generate(&hash(23), None).await;

    // One failed race candidate, then two failed retries before the answer.
    assert_eq!(work, LOCAL_WORK);
    assert_eq!(harness.worker.calls(), 4);
    assert!(harness.flag_is_set());
    assert_eq!(
        coordinator.metrics().wins.with_label_values(&["local"]).get(),
        1
    );
}

#[tokio::test]
async fn fault_does_not_stop_later_work() {
    let broken = spawn_peer(Behavior::Fail).await;
    let slow = spawn_peer(Behavior::WorkAfter(Duration::from_millis(100), "beef")).await;
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[&broken, &slow], Duration::from_secs(5));

    let work = coordinator.generate(&hash(7), None).await;

    assert_eq!(work, WorkNonce(0xbeef));
    assert_eq!(harness.worker.calls(), 0);
    assert_eq!(
        coordinator.metrics().faults.with_label_values(&["peer"]).get(),
        1
    );
}

#[tokio::test]
async fn malformed_work_counts_as_failure() {
    let peer = spawn_peer(Behavior::Work("not-hex")).await;
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[&peer], Duration::from_secs(5));

    let work = coordinator.generate(&hash(8), None).await;

    assert_eq!(work, LOCAL_WORK);
    assert!(harness.flag_is_set());
}

#[tokio::test]
async fn unreachable_peer_falls_back_to_local() {
    let dead = StubPeer {
        url: "http://127.0.0.1:1/".to_string(),
        seen: Arc::default(),
    };
    let harness = Harness::new();
    let coordinator = harness.coordinator(&[&dead], Duration::from_secs(5));

    assert_eq!(coordinator.generate(&hash(9), None).await, LOCAL_WORK);
    assert!(harness.flag_is_set());
}

// ---------------------------------------------------------------------------
// Distributed solver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pushed_distributed_result_wins() {
    let addr = spawn_dpow_service().await;
    let client = Arc::new(
        DpowClient::connect(dpow_config(
            format!("ws://{addr}/service_ws/"),
            format!("http://{addr}/service/"),
        ))
        .unwrap(),
    );
    wait_connected(&client).await;

    let harness = Harness::new();
    let coordinator = harness
        .coordinator(&[], Duration::from_secs(5))
        .with_dpow(client.clone());

    let work = coordinator.generate(&hash(0xAB), None).await;

    assert_eq!(work, WorkNonce(0xabababababababab));
    // Something remote is configured, so no local hedge.
    assert_eq!(harness.worker.calls(), 0);
    assert!(client.registry().is_empty());
    client.shutdown().await;
}

#[tokio::test]
async fn concurrent_races_never_cross_deliver() {
    let addr = spawn_dpow_service().await;
    let client = Arc::new(
        DpowClient::connect(dpow_config(
            format!("ws://{addr}/service_ws/"),
            format!("http://{addr}/service/"),
        ))
        .unwrap(),
    );
    wait_connected(&client).await;

    let harness = Harness::new();
    let coordinator = harness
        .coordinator(&[], Duration::from_secs(5))
        .with_dpow(client.clone());

    let (h1, h2, h3) = (hash(0x11), hash(0x22), hash(0x33));
    let (a, b, c) = tokio::join!(
        coordinator.generate(&h1, None),
        coordinator.generate(&h2, None),
        coordinator.generate(&h3, None),
    );
    assert_eq!(a, WorkNonce(0x1111111111111111));
    assert_eq!(b, WorkNonce(0x2222222222222222));
    assert_eq!(c, WorkNonce(0x3333333333333333));
    client.shutdown().await;
}

#[tokio::test]
async fn closed_session_races_backup_endpoint() {
    let addr = spawn_dpow_service().await;
    // Nothing listens on port 1, so the session never opens.
    let client = Arc::new(
        DpowClient::connect(dpow_config(
            "ws://127.0.0.1:1/service_ws/".to_string(),
            format!("http://{addr}/service/"),
        ))
        .unwrap(),
    );

    let hanging = spawn_peer(Behavior::Hang).await;
    let harness = Harness::new();
    let coordinator = harness
        .coordinator(&[&hanging], Duration::from_secs(5))
        .with_dpow(client.clone());

    let work = coordinator.generate(&hash(0x44), None).await;

    assert_eq!(work, WorkNonce(0xbac0f));
    assert_eq!(
        coordinator.metrics().wins.with_label_values(&["distributed"]).get(),
        1
    );
    assert!(client.registry().is_empty());
    hanging.wait_for("work_cancel", 1).await;
    client.shutdown().await;
}
