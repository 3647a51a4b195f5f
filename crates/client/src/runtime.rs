//! Session runtime: the composition root.
//!
//! Wires the socket, router, recovery detector and chat throttle together
//! for one mounted game view. Frames flow through a single consuming task
//! (single-writer: only that task touches the snapshot, the chat log and the
//! recovery machine); everything else reads through `watch` channels.
//!
//! Teardown is all-or-nothing: [`GameRuntime::shutdown`] cancels the settle
//! timer (it lives inside the router task), closes the socket and clears all
//! notice subscriptions. Anything less leaks callbacks into a dead view.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use geoclash_protocol::{ClientMessage, GameMode, MapPlayMode, RoomType};

use crate::chat::ChatMessageRecord;
use crate::messaging::{ConnectionStateObserver, EventBus, SessionNotice};
use crate::ports::TimeProvider;
use crate::recovery::{RecoveryDetector, RecoveryState};
use crate::router::MessageRouter;
use crate::session::{generate_room_code, RoomFootprint, SessionStore};
use crate::snapshot::GameSnapshot;
use crate::throttle::{ChatThrottle, SendDecision};
use crate::websocket::{ClientMessageBuilder, ConnectParams, GameClient};

/// What a mounting game view provides.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub display_name: String,
    pub game_mode: GameMode,
    pub room_type: RoomType,
    pub rounds: u32,
    pub round_timeout_secs: u32,
    /// Explicit room to join. `None` means a bare mount: either a brand new
    /// room, or (when a footprint is persisted) a reload of a prior one.
    pub room_code: Option<String>,
}

enum RouterCommand {
    Frame(String),
    Collision(String),
    CollisionStay,
    CollisionExit,
}

/// One live game session, from `start` to `shutdown`.
pub struct GameRuntime {
    client: GameClient,
    store: SessionStore,
    clock: Arc<dyn TimeProvider>,
    notices: EventBus,
    throttle: Mutex<ChatThrottle>,
    commands: mpsc::UnboundedSender<RouterCommand>,
    router_task: Mutex<Option<JoinHandle<()>>>,
    snapshot_rx: watch::Receiver<Option<GameSnapshot>>,
    chat_rx: watch::Receiver<Vec<ChatMessageRecord>>,
    recovery_rx: watch::Receiver<RecoveryState>,
    room_code: String,
    display_name: String,
}

impl GameRuntime {
    /// Open a session: restore or mint identity and room code, persist the
    /// footprint, connect, and begin routing frames.
    pub async fn start(
        base_url: &str,
        config: GameConfig,
        store: SessionStore,
        clock: Arc<dyn TimeProvider>,
    ) -> anyhow::Result<Self> {
        let session_id = store.ensure_session_id();
        store.set_display_name(&config.display_name);

        let footprint = store.load_footprint();
        // The reload signature: nothing was navigated here explicitly, yet a
        // footprint from a prior mount of this tab exists.
        let resumed_from_footprint = config.room_code.is_none() && footprint.is_some();

        let room_code = config
            .room_code
            .clone()
            .or_else(|| footprint.as_ref().map(|f| f.room_code.clone()))
            .unwrap_or_else(generate_room_code);

        store.save_footprint(&RoomFootprint {
            room_code: room_code.clone(),
            game_mode: config.game_mode,
            room_type: config.room_type,
            rounds: config.rounds,
            map_mode: footprint.as_ref().and_then(|f| f.map_mode),
        });

        let params = ConnectParams {
            base_url: base_url.to_owned(),
            room_code: room_code.clone(),
            display_name: config.display_name.clone(),
            session_id,
            auth_token: store.auth_token(),
            game_mode: config.game_mode,
            room_type: config.room_type,
            rounds: config.rounds,
            round_timeout_secs: config.round_timeout_secs,
        };

        let notices = EventBus::new();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(None);
        let (chat_tx, chat_rx) = watch::channel(Vec::new());
        let (recovery_tx, recovery_rx) = watch::channel(RecoveryState::Normal);

        // Collision notices feed the recovery machine.
        let collision_tx = cmd_tx.clone();
        notices.subscribe(move |notice| {
            if let SessionNotice::SessionCollision { message } = notice {
                let _ = collision_tx.send(RouterCommand::Collision(message));
            }
        });

        // Room closure destroys this tab's room and session claims.
        let closure_store = store.clone();
        notices.subscribe(move |notice| {
            if matches!(
                notice,
                SessionNotice::RoomClosed { .. } | SessionNotice::RoomExpired
            ) {
                closure_store.clear_footprint();
                closure_store.clear_session_id();
            }
        });

        let router_task = tokio::spawn(router_loop(
            cmd_rx,
            notices.clone(),
            Arc::clone(&clock),
            store.clone(),
            resumed_from_footprint,
            snapshot_tx,
            chat_tx,
            recovery_tx,
        ));

        let client = GameClient::new(params);
        let frame_tx = cmd_tx.clone();
        client
            .set_on_frame(move |raw| {
                let _ = frame_tx.send(RouterCommand::Frame(raw));
            })
            .await;
        client.connect().await?;

        Ok(Self {
            client,
            store,
            clock,
            notices,
            throttle: Mutex::new(ChatThrottle::new()),
            commands: cmd_tx,
            router_task: Mutex::new(Some(router_task)),
            snapshot_rx,
            chat_rx,
            recovery_rx,
            room_code,
            display_name: config.display_name,
        })
    }

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    /// Read-only connection state, for the connectivity indicator.
    pub fn connection(&self) -> ConnectionStateObserver {
        self.client.observer()
    }

    /// Notice bus for side-channel events (roster, collisions, teardown).
    pub fn notices(&self) -> &EventBus {
        &self.notices
    }

    // -------------------------------------------------------------------------
    // State reads
    // -------------------------------------------------------------------------

    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    pub fn snapshot_watch(&self) -> watch::Receiver<Option<GameSnapshot>> {
        self.snapshot_rx.clone()
    }

    pub fn chat_messages(&self) -> Vec<ChatMessageRecord> {
        self.chat_rx.borrow().clone()
    }

    pub fn chat_watch(&self) -> watch::Receiver<Vec<ChatMessageRecord>> {
        self.chat_rx.clone()
    }

    pub fn recovery_state(&self) -> RecoveryState {
        self.recovery_rx.borrow().clone()
    }

    pub fn recovery_watch(&self) -> watch::Receiver<RecoveryState> {
        self.recovery_rx.clone()
    }

    // -------------------------------------------------------------------------
    // Outgoing messages
    // -------------------------------------------------------------------------

    /// Send any gameplay message. Deliberately not gated on the recovery
    /// state: a pending collision notice is a notice, not a lockout.
    pub async fn send(&self, message: ClientMessage) {
        self.client.send(message).await;
    }

    pub async fn submit_answer(&self, answer: &str, response_time_ms: u64) {
        self.send(ClientMessageBuilder::submit_answer(answer, response_time_ms))
            .await;
    }

    pub async fn start_game(&self) {
        self.send(ClientMessageBuilder::start_game()).await;
    }

    /// Claim a color; remembered per room and player for the next visit.
    pub async fn select_color(&self, color: &str) {
        self.store
            .save_room_color(&self.room_code, &self.display_name, color);
        self.send(ClientMessageBuilder::color_selected(color)).await;
    }

    pub async fn set_map_mode(&self, mode: MapPlayMode) {
        if let Some(mut footprint) = self.store.load_footprint() {
            footprint.map_mode = Some(mode);
            self.store.save_footprint(&footprint);
        }
        self.send(ClientMessageBuilder::set_map_mode(mode)).await;
    }

    pub async fn set_rounds(&self, rounds: u32) {
        if let Some(mut footprint) = self.store.load_footprint() {
            footprint.rounds = rounds;
            self.store.save_footprint(&footprint);
        }
        self.send(ClientMessageBuilder::set_rounds(rounds)).await;
    }

    pub async fn restart_game(&self) {
        self.send(ClientMessageBuilder::restart_game()).await;
    }

    pub async fn close_room(&self) {
        self.send(ClientMessageBuilder::close_room()).await;
    }

    /// Send a chat line, subject to the abuse throttle. The caller surfaces
    /// the decision (warning toast, disabled input); it is not an error.
    pub async fn send_chat(&self, text: &str) -> SendDecision {
        let decision = {
            let mut throttle = self.throttle.lock().await;
            throttle.evaluate(self.clock.now_millis())
        };
        if decision == SendDecision::Allowed {
            self.send(ClientMessageBuilder::chat_message(text)).await;
        }
        decision
    }

    /// Toggle a reaction. Reactions are one tap on an existing message, so
    /// they bypass the chat throttle.
    pub async fn send_reaction(&self, message_id: &str, emoji: &str) {
        self.send(ClientMessageBuilder::reaction(message_id, emoji))
            .await;
    }

    // -------------------------------------------------------------------------
    // Collision resolution & teardown
    // -------------------------------------------------------------------------

    /// Human chose "stay": dismiss the collision notice, keep playing.
    pub fn resolve_collision_stay(&self) {
        let _ = self.commands.send(RouterCommand::CollisionStay);
    }

    /// Human chose "exit": end this tab's claim and leave the room.
    pub async fn resolve_collision_exit(&self) {
        let _ = self.commands.send(RouterCommand::CollisionExit);
        self.client.disconnect().await;
    }

    /// Explicitly leave the room, clearing this tab's room and session claims.
    pub async fn leave_room(&self) {
        self.store.clear_footprint();
        self.store.clear_session_id();
        self.notices.dispatch(SessionNotice::LeaveRoom);
        self.client.disconnect().await;
    }

    /// Tear the session down completely: settle timer cancelled (it lives in
    /// the router task), socket closed, notice subscriptions dropped.
    pub async fn shutdown(&self) {
        self.client.disconnect().await;
        if let Some(task) = self.router_task.lock().await.take() {
            task.abort();
        }
        self.notices.clear();
    }
}

/// The single consuming task: applies frames to the router state, drives the
/// recovery machine (including its settle timer), and publishes snapshots.
#[allow(clippy::too_many_arguments)]
async fn router_loop(
    mut commands: mpsc::UnboundedReceiver<RouterCommand>,
    notices: EventBus,
    clock: Arc<dyn TimeProvider>,
    store: SessionStore,
    resumed_from_footprint: bool,
    snapshot_tx: watch::Sender<Option<GameSnapshot>>,
    chat_tx: watch::Sender<Vec<ChatMessageRecord>>,
    recovery_tx: watch::Sender<RecoveryState>,
) {
    let mut router = MessageRouter::new(notices.clone(), Arc::clone(&clock));
    let mut recovery = RecoveryDetector::new(resumed_from_footprint);

    loop {
        let settle_in = recovery
            .settle_deadline()
            .map(|deadline| deadline.saturating_sub(clock.now_millis()));

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    RouterCommand::Frame(raw) => {
                        router.dispatch(&raw);
                        if let Some(snapshot) = router.snapshot() {
                            recovery.on_snapshot(snapshot.status, clock.now_millis());
                        }
                        snapshot_tx.send_replace(router.snapshot().cloned());
                        chat_tx.send_replace(router.chat().messages().to_vec());
                    }
                    RouterCommand::Collision(message) => {
                        recovery.on_collision(message);
                    }
                    RouterCommand::CollisionStay => {
                        recovery.resolve_stay();
                    }
                    RouterCommand::CollisionExit => {
                        recovery.resolve_exit();
                        store.clear_footprint();
                        store.clear_session_id();
                        router.reset();
                        snapshot_tx.send_replace(None);
                        chat_tx.send_replace(Vec::new());
                        notices.dispatch(SessionNotice::LeaveRoom);
                    }
                }
                recovery_tx.send_replace(recovery.state().clone());
            }

            _ = tokio::time::sleep(Duration::from_millis(settle_in.unwrap_or(0))),
                if settle_in.is_some() =>
            {
                if recovery.tick(clock.now_millis()) {
                    recovery_tx.send_replace(recovery.state().clone());
                }
            }
        }
    }
}
