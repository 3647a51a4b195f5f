//! End-to-end session flows against a loopback WebSocket server.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

use geoclash_client::ports::{StorageProvider, SystemClock};
use geoclash_client::{
    ConnectionState, GameConfig, GameRuntime, RecoveryState, RoomFootprint, SendDecision,
    SessionNotice, SessionStore,
};
use geoclash_protocol::{GameMode, RoomType};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Minimal in-memory storage; one instance per scope (tab or shared).
#[derive(Default)]
struct MemStore {
    entries: Mutex<HashMap<String, String>>,
}

impl StorageProvider for MemStore {
    fn save(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
    }

    fn load(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

fn fresh_store() -> SessionStore {
    SessionStore::new(Arc::new(MemStore::default()), Arc::new(MemStore::default()))
}

fn config(room_code: Option<&str>) -> GameConfig {
    GameConfig {
        display_name: "ada".to_owned(),
        game_mode: GameMode::Flag,
        room_type: RoomType::Private,
        rounds: 10,
        round_timeout_secs: 15,
        room_code: room_code.map(str::to_owned),
    }
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    (listener, format!("ws://{addr}/ws"))
}

async fn accept_ws(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.expect("accept");
    accept_async(stream).await.expect("handshake")
}

const GAME_STARTED: &str = r#"{
    "type": "game_started",
    "payload": {
        "status": "in_progress",
        "current_round": 1,
        "total_rounds": 10,
        "scores": {"ada": 0, "ben": 0},
        "game_mode": "FLAG",
        "room_type": "PRIVATE"
    }
}"#;

/// Wait until a watch value satisfies `pred`, or panic after 5 seconds.
async fn wait_for<T: Clone, F: Fn(&T) -> bool>(rx: &mut watch::Receiver<T>, pred: F) -> T {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let current = rx.borrow().clone();
            if pred(&current) {
                return current;
            }
            rx.changed().await.expect("watch sender alive");
        }
    })
    .await
    .expect("condition within deadline")
}

#[tokio::test]
async fn full_session_flow() {
    init_tracing();
    let (listener, base_url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(GAME_STARTED.to_owned()))
            .await
            .expect("send game_started");
        ws.send(Message::Text(
            r#"{"type":"score_update","payload":{"scores":{"ben":7}}}"#.to_owned(),
        ))
        .await
        .expect("send score_update");
        ws.send(Message::Text(
            r#"{"type":"chat_message","payload":{"player_name":"ben","message":"bonjour","timestamp":"2026-01-02T03:04:05Z"}}"#
                .to_owned(),
        ))
        .await
        .expect("send chat");

        // Wait for the client's chat line, then report a collision.
        let frame = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(_)) => continue,
                other => panic!("expected chat frame, got {other:?}"),
            }
        };
        ws.send(Message::Text(
            r#"{"type":"session_collision","payload":{"message":"dup tab"}}"#.to_owned(),
        ))
        .await
        .expect("send collision");
        frame
    });

    let runtime = GameRuntime::start(
        &base_url,
        config(Some("ROOM42")),
        fresh_store(),
        Arc::new(SystemClock),
    )
    .await
    .expect("start");

    assert_eq!(runtime.room_code(), "ROOM42");

    // Snapshot reconciled: full replace then key-by-key score patch.
    let mut snapshots = runtime.snapshot_watch();
    let snapshot = wait_for(&mut snapshots, |s| {
        s.as_ref()
            .is_some_and(|s| s.scores.get("ben") == Some(&7))
    })
    .await
    .expect("snapshot");
    assert_eq!(snapshot.scores.get("ada"), Some(&0));

    // Chat flowed to the independent stream.
    let mut chats = runtime.chat_watch();
    let chat = wait_for(&mut chats, |c| !c.is_empty()).await;
    assert_eq!(chat[0].sender, "ben");
    assert_eq!(chat[0].text, "bonjour");

    // Outgoing chat passes the throttle and reaches the server.
    let decision = runtime.send_chat("gg").await;
    assert_eq!(decision, SendDecision::Allowed);
    let frame = server.await.expect("server");
    let value: serde_json::Value = serde_json::from_str(&frame).expect("chat json");
    assert_eq!(value["type"], "chat_message");
    assert_eq!(value["payload"]["message"], "gg");

    // The collision notice demands a human decision; "stay" dismisses it.
    let mut recovery = runtime.recovery_watch();
    let pending = wait_for(&mut recovery, |r| {
        matches!(r, RecoveryState::CollisionPending { .. })
    })
    .await;
    assert_eq!(
        pending,
        RecoveryState::CollisionPending {
            message: "dup tab".to_owned()
        }
    );
    runtime.resolve_collision_stay();
    wait_for(&mut recovery, |r| *r == RecoveryState::Normal).await;

    runtime.shutdown().await;
    assert_eq!(runtime.connection().state(), ConnectionState::Closed);
    assert_eq!(runtime.notices().subscriber_count(), 0);
}

#[tokio::test]
async fn reload_with_running_game_restores_and_settles() {
    init_tracing();
    let (listener, base_url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(GAME_STARTED.to_owned()))
            .await
            .expect("send game_started");
        // Keep the socket open until the test finishes.
        while let Some(Ok(_)) = ws.next().await {}
    });

    // A prior mount left a footprint; the new mount navigates nowhere
    // explicitly (no room code): the reload signature.
    let store = fresh_store();
    store.save_footprint(&RoomFootprint {
        room_code: "OLDROOM".to_owned(),
        game_mode: GameMode::Flag,
        room_type: RoomType::Private,
        rounds: 10,
        map_mode: None,
    });

    let runtime = GameRuntime::start(&base_url, config(None), store, Arc::new(SystemClock))
        .await
        .expect("start");
    assert_eq!(runtime.room_code(), "OLDROOM");

    let mut recovery = runtime.recovery_watch();
    wait_for(&mut recovery, |r| {
        matches!(r, RecoveryState::Reconnecting { .. })
    })
    .await;
    // The settle delay expires on its own.
    wait_for(&mut recovery, |r| *r == RecoveryState::Normal).await;

    runtime.shutdown().await;
    server.abort();
}

#[tokio::test]
async fn explicit_mount_does_not_show_restore_affordance() {
    init_tracing();
    let (listener, base_url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(GAME_STARTED.to_owned()))
            .await
            .expect("send game_started");
        while let Some(Ok(_)) = ws.next().await {}
    });

    let runtime = GameRuntime::start(
        &base_url,
        config(Some("FRESH1")),
        fresh_store(),
        Arc::new(SystemClock),
    )
    .await
    .expect("start");

    let mut snapshots = runtime.snapshot_watch();
    wait_for(&mut snapshots, |s| s.is_some()).await;

    // The in-progress snapshot arrived on an explicit mount: no Reconnecting.
    assert_eq!(runtime.recovery_state(), RecoveryState::Normal);

    runtime.shutdown().await;
    server.abort();
}

#[tokio::test]
async fn room_closure_clears_persisted_claims() {
    init_tracing();
    let (listener, base_url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(GAME_STARTED.to_owned()))
            .await
            .expect("send game_started");
        // Close the room only once the client says it is watching, so the
        // test's notice subscription is in place first.
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(_))) => break,
                Some(Ok(_)) => continue,
                other => panic!("expected readiness frame, got {other:?}"),
            }
        }
        ws.send(Message::Text(
            r#"{"type":"room_closed","payload":{"message":"owner left"}}"#.to_owned(),
        ))
        .await
        .expect("send room_closed");
        while let Some(Ok(_)) = ws.next().await {}
    });

    let store = fresh_store();
    let runtime = GameRuntime::start(
        &base_url,
        config(Some("DOOMED")),
        store.clone(),
        Arc::new(SystemClock),
    )
    .await
    .expect("start");

    let closed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&closed);
    runtime.notices().subscribe(move |notice| {
        if let SessionNotice::RoomClosed { message } = notice {
            if let Ok(mut seen) = sink.lock() {
                seen.push(message);
            }
        }
    });

    let mut snapshots = runtime.snapshot_watch();
    wait_for(&mut snapshots, |s| s.is_some()).await;

    // Signal readiness; the server answers with room_closed, which discards
    // the snapshot and the persisted footprint.
    assert_eq!(runtime.send_chat("watching").await, SendDecision::Allowed);
    wait_for(&mut snapshots, |s| s.is_none()).await;

    assert_eq!(store.load_footprint(), None);
    assert_eq!(store.identity(), None);
    let closed = closed.lock().expect("notices");
    assert_eq!(closed.as_slice(), [Some("owner left".to_owned())]);

    runtime.shutdown().await;
    server.abort();
}

#[tokio::test]
async fn collision_exit_relinquishes_the_claim() {
    init_tracing();
    let (listener, base_url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Text(
            r#"{"type":"session_collision","payload":{"message":"elsewhere"}}"#.to_owned(),
        ))
        .await
        .expect("send collision");
        while let Some(Ok(_)) = ws.next().await {}
    });

    let store = fresh_store();
    let runtime = GameRuntime::start(
        &base_url,
        config(Some("SHARED")),
        store.clone(),
        Arc::new(SystemClock),
    )
    .await
    .expect("start");

    let left = Arc::new(Mutex::new(false));
    let sink = Arc::clone(&left);
    runtime.notices().subscribe(move |notice| {
        if notice == SessionNotice::LeaveRoom {
            if let Ok(mut left) = sink.lock() {
                *left = true;
            }
        }
    });

    let mut recovery = runtime.recovery_watch();
    wait_for(&mut recovery, |r| {
        matches!(r, RecoveryState::CollisionPending { .. })
    })
    .await;

    runtime.resolve_collision_exit().await;
    wait_for(&mut recovery, |r| *r == RecoveryState::Normal).await;

    assert_eq!(store.load_footprint(), None);
    assert_eq!(store.identity(), None);
    assert!(left.lock().map(|l| *l).unwrap_or(false));
    assert_eq!(runtime.connection().state(), ConnectionState::Closed);

    runtime.shutdown().await;
    server.abort();
}
