//! WebSocket client for the game server connection.
//!
//! Owns the socket exclusively: at most one live connection exists per
//! client, and calling [`GameClient::connect`] again tears down any prior
//! socket before opening the next. Inbound frames and state transitions are
//! pushed to registered callbacks; nothing here blocks on consumers.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use geoclash_protocol::ClientMessage;

use crate::error::ClientError;
use crate::messaging::{set_connection_state, ConnectionState, ConnectionStateObserver};
use crate::websocket::url::ConnectParams;

type FrameCallback = Box<dyn Fn(String) + Send + Sync>;
type StateCallback = Box<dyn Fn(ConnectionState) + Send + Sync>;

/// WebSocket client for communicating with the game server.
pub struct GameClient {
    params: ConnectParams,
    state: Arc<AtomicU8>,
    /// Bumped on every teardown; a pump task only reports Closed while its
    /// own generation is still current, so a superseded socket cannot
    /// clobber the state of its replacement.
    generation: Arc<AtomicU64>,
    tx: Arc<Mutex<Option<mpsc::Sender<ClientMessage>>>>,
    on_frame: Arc<Mutex<Option<FrameCallback>>>,
    on_state_change: Arc<Mutex<Option<StateCallback>>>,
    disconnect_tx: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl GameClient {
    pub fn new(params: ConnectParams) -> Self {
        Self {
            params,
            state: Arc::new(AtomicU8::new(ConnectionState::Idle.to_u8())),
            generation: Arc::new(AtomicU64::new(0)),
            tx: Arc::new(Mutex::new(None)),
            on_frame: Arc::new(Mutex::new(None)),
            on_state_change: Arc::new(Mutex::new(None)),
            disconnect_tx: Arc::new(Mutex::new(None)),
        }
    }

    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Register the inbound frame callback (raw text; parsing is the
    /// router's job).
    pub async fn set_on_frame<F>(&self, callback: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let mut on_frame = self.on_frame.lock().await;
        *on_frame = Some(Box::new(callback));
    }

    pub async fn set_on_state_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let mut on_state_change = self.on_state_change.lock().await;
        *on_state_change = Some(Box::new(callback));
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Shareable read-only view of the connection state.
    pub fn observer(&self) -> ConnectionStateObserver {
        ConnectionStateObserver::new(Arc::clone(&self.state))
    }

    async fn set_state(&self, new_state: ConnectionState) {
        set_connection_state(&self.state, new_state);
        let callback = self.on_state_change.lock().await;
        if let Some(ref cb) = *callback {
            cb(new_state);
        }
    }

    /// Open the connection, tearing down any prior socket first.
    ///
    /// Returns once the handshake completes; the frame pump runs as a
    /// spawned task whose end is observable through the state callback.
    pub async fn connect(&self) -> Result<(), ClientError> {
        self.teardown_current().await;
        let my_generation = self.generation.load(Ordering::SeqCst);

        self.set_state(ConnectionState::Connecting).await;

        let url = match self.params.connect_url() {
            Ok(url) => url,
            Err(e) => {
                self.set_state(ConnectionState::Closed).await;
                return Err(e);
            }
        };

        let ws_stream = match connect_async(url.as_str()).await {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                tracing::warn!(error = %e, "failed to connect to game server");
                self.set_state(ConnectionState::Closed).await;
                return Err(e.into());
            }
        };

        tracing::info!(room = %self.params.room_code, "connected to game server");

        let (out_tx, out_rx) = mpsc::channel::<ClientMessage>(32);
        let (disconnect_tx, disconnect_rx) = oneshot::channel();
        {
            let mut tx = self.tx.lock().await;
            *tx = Some(out_tx);
        }
        {
            let mut disc = self.disconnect_tx.lock().await;
            *disc = Some(disconnect_tx);
        }

        self.set_state(ConnectionState::Open).await;

        tokio::spawn(pump(
            ws_stream,
            out_rx,
            disconnect_rx,
            Arc::clone(&self.on_frame),
            Arc::clone(&self.on_state_change),
            Arc::clone(&self.state),
            Arc::clone(&self.tx),
            Arc::clone(&self.generation),
            my_generation,
        ));

        Ok(())
    }

    /// Send a message to the server.
    ///
    /// A logged no-op when the socket is not open; callers are not required
    /// to pre-check connection state.
    pub async fn send(&self, message: ClientMessage) {
        if self.state() != ConnectionState::Open {
            tracing::warn!("dropping outgoing message: {}", ClientError::NotConnected);
            return;
        }
        let tx = {
            let tx = self.tx.lock().await;
            tx.clone()
        };
        match tx {
            Some(tx) => {
                if tx.send(message).await.is_err() {
                    tracing::warn!("dropping outgoing message: connection task gone");
                }
            }
            None => {
                tracing::warn!("dropping outgoing message: {}", ClientError::NotConnected);
            }
        }
    }

    /// Close the connection. Idempotent.
    pub async fn disconnect(&self) {
        self.teardown_current().await;
        self.set_state(ConnectionState::Closed).await;
    }

    /// Retire the current socket, if any. Bumping the generation first
    /// guarantees the retired pump cannot touch shared state afterwards.
    async fn teardown_current(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(disconnect) = self.disconnect_tx.lock().await.take() {
            let _ = disconnect.send(());
        }
        let mut tx = self.tx.lock().await;
        tx.take();
    }
}

impl Clone for GameClient {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
            tx: Arc::clone(&self.tx),
            on_frame: Arc::clone(&self.on_frame),
            on_state_change: Arc::clone(&self.on_state_change),
            disconnect_tx: Arc::clone(&self.disconnect_tx),
        }
    }
}

/// Per-connection read/write loop.
#[allow(clippy::too_many_arguments)]
async fn pump(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    mut out_rx: mpsc::Receiver<ClientMessage>,
    mut disconnect_rx: oneshot::Receiver<()>,
    on_frame: Arc<Mutex<Option<FrameCallback>>>,
    on_state_change: Arc<Mutex<Option<StateCallback>>>,
    state: Arc<AtomicU8>,
    tx: Arc<Mutex<Option<mpsc::Sender<ClientMessage>>>>,
    generation: Arc<AtomicU64>,
    my_generation: u64,
) {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = &mut disconnect_rx => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }

            outgoing = out_rx.recv() => {
                match outgoing {
                    Some(msg) => {
                        let json = match serde_json::to_string(&msg) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to serialize outgoing message");
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(json)).await {
                            tracing::warn!(error = %e, "failed to send message");
                            break;
                        }
                    }
                    None => break,
                }
            }

            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let callback = on_frame.lock().await;
                        if let Some(ref cb) = *callback {
                            cb(text);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("server closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "websocket error");
                        break;
                    }
                    _ => {} // ping/pong/binary ignored
                }
            }
        }
    }

    // Only the still-current socket reports Closed; a superseded one was
    // already replaced and must stay quiet.
    if generation.load(Ordering::SeqCst) == my_generation {
        set_connection_state(&state, ConnectionState::Closed);
        tx.lock().await.take();
        let callback = on_state_change.lock().await;
        if let Some(ref cb) = *callback {
            cb(ConnectionState::Closed);
        }
    }
}
