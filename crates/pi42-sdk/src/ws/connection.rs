/*
[INPUT]:  Stream base URL, audience (public / listen-key namespace), handler registry
[OUTPUT]: One Socket.IO session: state transitions, subscriptions, event dispatch
[POS]:    WebSocket layer - single connection lifecycle
[UPDATE]: When changing connection logic or the subscribe control message
*/

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, info, warn};
use url::Url;

use crate::http::{Pi42Error, Result};
use crate::ws::events::HandlerRegistry;
use crate::ws::protocol::{
    EnginePacket, ROOT_NAMESPACE, SocketPacket, decode_frame, encode_connect, encode_disconnect,
    encode_event, encode_pong, engine_io_url, heartbeat_window,
};

pub(crate) const DEFAULT_COMMAND_BUFFER: usize = 100;

/// Lifecycle of a stream connection. There is no automatic reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Audience of a stream connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamKind {
    Public,
    /// Account stream scoped to `/auth-stream/{listen_key}`
    Authenticated { listen_key: String },
}

impl StreamKind {
    pub fn namespace(&self) -> String {
        match self {
            StreamKind::Public => ROOT_NAMESPACE.to_string(),
            StreamKind::Authenticated { listen_key } => format!("/auth-stream/{listen_key}"),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StreamKind::Public => "public",
            StreamKind::Authenticated { .. } => "authenticated",
        }
    }
}

#[derive(Debug)]
enum Command {
    Send(String),
    Close,
}

/// A single Socket.IO-over-WebSocket session.
///
/// Socket I/O runs on a spawned tokio task; registered handlers are invoked
/// on that task, not on the caller's.
#[derive(Debug)]
pub struct StreamConnection {
    kind: StreamKind,
    url: Url,
    namespace: String,
    registry: HandlerRegistry,
    command_buffer: usize,
    state: Arc<watch::Sender<ConnectionState>>,
    command_tx: Option<mpsc::Sender<Command>>,
    task: Option<JoinHandle<()>>,
}

impl StreamConnection {
    /// `base_url` is the Socket.IO server base, e.g. `https://fawss.pi42.com/`
    pub fn new(kind: StreamKind, base_url: &str, registry: HandlerRegistry) -> Result<Self> {
        let (state, _rx) = watch::channel(ConnectionState::Disconnected);
        Ok(Self {
            url: engine_io_url(base_url)?,
            namespace: kind.namespace(),
            kind,
            registry,
            command_buffer: DEFAULT_COMMAND_BUFFER,
            state: Arc::new(state),
            command_tx: None,
            task: None,
        })
    }

    pub fn with_command_buffer(mut self, command_buffer: usize) -> Self {
        self.command_buffer = command_buffer.max(1);
        self
    }

    pub fn kind(&self) -> &StreamKind {
        &self.kind
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state transitions (e.g. to notice a remote disconnect)
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Whether the background session task is still running
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Start connecting; returns once the session task is scheduled.
    ///
    /// `topics`, if any, are subscribed as soon as the namespace handshake
    /// completes. Use [`wait_connected`](Self::wait_connected) to observe
    /// readiness.
    pub async fn connect<I, T>(&mut self, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if self.is_active() {
            return Err(Pi42Error::WebSocket(format!(
                "{} stream already connected",
                self.kind.label()
            )));
        }
        if let Some(finished) = self.task.take() {
            let _ = finished.await;
        }

        let (command_tx, command_rx) = mpsc::channel(self.command_buffer);
        let session = Session {
            url: self.url.clone(),
            namespace: self.namespace.clone(),
            label: self.kind.label(),
            registry: self.registry.clone(),
            state: self.state.clone(),
        };
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();

        self.state.send_replace(ConnectionState::Connecting);
        info!(stream = self.kind.label(), url = %self.url, "stream connecting");
        self.task = Some(tokio::spawn(session.run(topics, command_rx)));
        self.command_tx = Some(command_tx);
        Ok(())
    }

    /// Wait until the handshake completes or the attempt fails
    pub async fn wait_connected(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.state.subscribe();
        let settled = tokio::time::timeout(
            timeout,
            rx.wait_for(|state| *state != ConnectionState::Connecting),
        )
        .await
        .map_err(|_| Pi42Error::timeout(timeout))?
        .map(|state| *state);

        match settled {
            Ok(ConnectionState::Connected) => Ok(()),
            _ => Err(Pi42Error::NotConnected(format!(
                "{} stream closed before the handshake completed",
                self.kind.label()
            ))),
        }
    }

    /// Send a `subscribe` control message. Fails unless Connected.
    pub async fn subscribe<I, T>(&self, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let state = self.state();
        if state != ConnectionState::Connected {
            return Err(Pi42Error::NotConnected(format!(
                "{} stream is {state:?}",
                self.kind.label()
            )));
        }
        let sender = self.command_tx.as_ref().ok_or_else(|| {
            Pi42Error::NotConnected(format!("{} stream has no session", self.kind.label()))
        })?;

        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        let frame = subscribe_frame(&self.namespace, &topics)?;
        sender.send(Command::Send(frame)).await.map_err(|_| {
            Pi42Error::NotConnected(format!("{} stream session ended", self.kind.label()))
        })?;

        info!(stream = self.kind.label(), ?topics, "stream subscription sent");
        Ok(())
    }

    /// Close the session and wait for the socket to shut down.
    ///
    /// No handler runs after this returns. No-op when not connected.
    pub async fn close(&mut self) {
        let Some(task) = self.begin_close() else {
            return;
        };
        if let Err(err) = task.await {
            warn!(stream = self.kind.label(), error = %err, "stream task ended abnormally");
        }
        self.state.send_replace(ConnectionState::Disconnected);
        info!(stream = self.kind.label(), "stream closed");
    }

    /// Like [`close`](Self::close), but aborts the session if the transport
    /// does not shut down within `timeout`.
    pub async fn close_timeout(&mut self, timeout: Duration) -> Result<()> {
        let Some(mut task) = self.begin_close() else {
            return Ok(());
        };
        let result = match tokio::time::timeout(timeout, &mut task).await {
            Ok(_) => Ok(()),
            Err(_) => {
                warn!(stream = self.kind.label(), "stream close timed out, aborting session");
                task.abort();
                let _ = task.await;
                Err(Pi42Error::timeout(timeout))
            }
        };
        self.state.send_replace(ConnectionState::Disconnected);
        result
    }

    fn begin_close(&mut self) -> Option<JoinHandle<()>> {
        if let Some(command_tx) = self.command_tx.take() {
            // A full buffer is fine: dropping the sender also ends the session
            let _ = command_tx.try_send(Command::Close);
        }
        self.task.take()
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn subscribe_frame(namespace: &str, topics: &[String]) -> Result<String> {
    encode_event(namespace, "subscribe", &json!({ "params": topics }))
}

enum Flow {
    Continue,
    Reply(String),
    Stop,
}

struct Session {
    url: Url,
    namespace: String,
    label: &'static str,
    registry: HandlerRegistry,
    state: Arc<watch::Sender<ConnectionState>>,
}

/// Marks the stream Disconnected however the session task ends, including abort
struct DisconnectOnDrop(Arc<watch::Sender<ConnectionState>>);

impl Drop for DisconnectOnDrop {
    fn drop(&mut self) {
        self.0.send_replace(ConnectionState::Disconnected);
    }
}

impl Session {
    async fn run(self, topics: Vec<String>, mut commands: mpsc::Receiver<Command>) {
        let _disconnect = DisconnectOnDrop(self.state.clone());
        match self.drive(topics, &mut commands).await {
            Ok(()) => info!(stream = self.label, "stream disconnected"),
            Err(err) => warn!(stream = self.label, error = %err, "stream terminated"),
        }
    }

    async fn drive(&self, topics: Vec<String>, commands: &mut mpsc::Receiver<Command>) -> Result<()> {
        let (ws_stream, _response) = tokio::select! {
            connected = connect_async(self.url.as_str()) => connected.map_err(ws_error)?,
            // Only Close can arrive before the handshake
            _ = commands.recv() => return Ok(()),
        };
        let (mut write, mut read) = ws_stream.split();
        let mut pending_topics = Some(topics).filter(|topics| !topics.is_empty());
        // Armed by the open handshake, pushed back by every inbound frame
        let mut heartbeat: Option<Duration> = None;
        let mut deadline = Instant::now();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Send(frame)) => {
                        write.send(WsMessage::Text(frame.into())).await.map_err(ws_error)?;
                    }
                    Some(Command::Close) | None => {
                        let _ = write
                            .send(WsMessage::Text(encode_disconnect(&self.namespace).into()))
                            .await;
                        let _ = write.send(WsMessage::Close(None)).await;
                        return Ok(());
                    }
                },
                _ = sleep_until(deadline), if heartbeat.is_some() => {
                    let window = heartbeat.unwrap_or_default();
                    warn!(
                        stream = self.label,
                        window_ms = window.as_millis() as u64,
                        "stream heartbeat missed"
                    );
                    return Err(Pi42Error::timeout(window));
                }
                incoming = read.next() => match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        for packet in self.decode(text.as_str()) {
                            if let EnginePacket::Open(handshake) = &packet {
                                heartbeat = heartbeat_window(handshake);
                            }
                            match self.handle_packet(packet, &mut pending_topics)? {
                                Flow::Continue => {}
                                Flow::Reply(frame) => {
                                    write.send(WsMessage::Text(frame.into())).await.map_err(ws_error)?;
                                }
                                Flow::Stop => return Ok(()),
                            }
                        }
                        deadline = heartbeat.map_or(deadline, |window| Instant::now() + window);
                    }
                    Some(Ok(WsMessage::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {
                        deadline = heartbeat.map_or(deadline, |window| Instant::now() + window);
                    }
                    Some(Err(err)) => return Err(ws_error(err)),
                }
            }
        }
    }

    fn decode(&self, text: &str) -> Vec<EnginePacket> {
        decode_frame(text).unwrap_or_else(|err| {
            warn!(stream = self.label, error = %err, bytes = text.len(), "stream frame parse failed");
            Vec::new()
        })
    }

    fn handle_packet(
        &self,
        packet: EnginePacket,
        pending_topics: &mut Option<Vec<String>>,
    ) -> Result<Flow> {
        match packet {
            EnginePacket::Open(handshake) => {
                debug!(stream = self.label, sid = ?handshake.get("sid"), "engine handshake");
                Ok(Flow::Reply(encode_connect(&self.namespace)))
            }
            EnginePacket::Ping => Ok(Flow::Reply(encode_pong())),
            EnginePacket::Close => Ok(Flow::Stop),
            EnginePacket::Pong | EnginePacket::Noop => Ok(Flow::Continue),
            EnginePacket::Message(packet) => self.handle_socket_packet(packet, pending_topics),
        }
    }

    fn handle_socket_packet(
        &self,
        packet: SocketPacket,
        pending_topics: &mut Option<Vec<String>>,
    ) -> Result<Flow> {
        match packet {
            SocketPacket::Connect { namespace, .. } if namespace == self.namespace => {
                self.state.send_replace(ConnectionState::Connected);
                info!(stream = self.label, namespace = %namespace, "stream connected");
                match pending_topics.take() {
                    Some(topics) => {
                        info!(stream = self.label, ?topics, "stream subscription sent");
                        Ok(Flow::Reply(subscribe_frame(&self.namespace, &topics)?))
                    }
                    None => Ok(Flow::Continue),
                }
            }
            SocketPacket::ConnectError { namespace, message } if namespace == self.namespace => Err(
                Pi42Error::WebSocket(format!("namespace {namespace} refused: {message}")),
            ),
            SocketPacket::Disconnect { namespace } if namespace == self.namespace => Ok(Flow::Stop),
            SocketPacket::Event {
                namespace,
                event,
                data,
            } if namespace == self.namespace => {
                self.registry.dispatch_tag(&event, data);
                Ok(Flow::Continue)
            }
            other => {
                debug!(stream = self.label, packet = ?other, "packet ignored");
                Ok(Flow::Continue)
            }
        }
    }
}

fn ws_error(err: tokio_tungstenite::tungstenite::Error) -> Pi42Error {
    Pi42Error::WebSocket(err.to_string())
}
