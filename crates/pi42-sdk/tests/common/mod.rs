/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities: wiremock setup, fake Socket.IO server, stub listen keys
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for pi42-sdk tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use pi42_sdk::{ClientConfig, ListenKeyProvider, Pi42Client, Pi42Error, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_API_SECRET: &str = "test-api-secret";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Authenticated client pointed at the mock server for both REST bases
pub fn signed_client(server: &MockServer) -> Pi42Client {
    let mut client = public_client(server);
    client.set_credentials(pi42_sdk::Credentials::new(TEST_API_KEY, TEST_API_SECRET));
    client
}

pub fn public_client(server: &MockServer) -> Pi42Client {
    Pi42Client::with_config_and_base_urls(ClientConfig::default(), &server.uri(), &server.uri())
        .expect("client init")
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until<F>(timeout: Duration, condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[derive(Debug, Clone)]
enum ServerCommand {
    Frame(String),
    Close,
}

/// Minimal Socket.IO v5 server: answers the Engine.IO handshake, acks every
/// namespace connect and records every text frame a client sends.
pub struct FakeSocketServer {
    base_url: String,
    received: Arc<Mutex<Vec<String>>>,
    paths: Arc<Mutex<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    outbound: broadcast::Sender<ServerCommand>,
    task: JoinHandle<()>,
}

/// Engine.IO open packet sent on every accepted connection
pub const DEFAULT_OPEN_PACKET: &str =
    r#"0{"sid":"fake-sid","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;

impl FakeSocketServer {
    pub async fn start() -> Self {
        Self::start_with_open(DEFAULT_OPEN_PACKET).await
    }

    /// Same server, announcing a custom Engine.IO handshake
    pub async fn start_with_open(open: &str) -> Self {
        let open = open.to_string();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (outbound, _) = broadcast::channel(64);

        let received = Arc::new(Mutex::new(Vec::new()));
        let paths = Arc::new(Mutex::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));

        let task = tokio::spawn({
            let received = received.clone();
            let paths = paths.clone();
            let connections = connections.clone();
            let outbound = outbound.clone();
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve_connection(
                        stream,
                        received.clone(),
                        paths.clone(),
                        outbound.subscribe(),
                        open.clone(),
                    ));
                }
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            received,
            paths,
            connections,
            outbound,
            task,
        }
    }

    /// Stream base URL, e.g. `http://127.0.0.1:PORT`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }

    pub fn has_received(&self, frame: &str) -> bool {
        self.received.lock().unwrap().iter().any(|f| f == frame)
    }

    /// Request paths (with query) of every accepted websocket
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Push a raw text frame to every open connection
    pub fn send(&self, frame: impl Into<String>) {
        let _ = self.outbound.send(ServerCommand::Frame(frame.into()));
    }

    /// Close every open connection from the server side
    pub fn close_all(&self) {
        let _ = self.outbound.send(ServerCommand::Close);
    }
}

impl Drop for FakeSocketServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_connection(
    stream: TcpStream,
    received: Arc<Mutex<Vec<String>>>,
    paths: Arc<Mutex<Vec<String>>>,
    mut outbound: broadcast::Receiver<ServerCommand>,
    open: String,
) {
    let record_path =
        |req: &Request, resp: Response| -> std::result::Result<Response, ErrorResponse> {
            paths.lock().unwrap().push(req.uri().to_string());
            Ok(resp)
        };
    let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, record_path).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    if write.send(Message::Text(open.into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let text = text.as_str().to_string();
                    received.lock().unwrap().push(text.clone());
                    if text.starts_with("40") {
                        let ack = format!(r#"{text}{{"sid":"fake-ns-sid"}}"#);
                        if write.send(Message::Text(ack.into())).await.is_err() {
                            return;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            },
            command = outbound.recv() => match command {
                Ok(ServerCommand::Frame(frame)) => {
                    if write.send(Message::Text(frame.into())).await.is_err() {
                        return;
                    }
                }
                Ok(ServerCommand::Close) | Err(_) => {
                    let _ = write.send(Message::Close(None)).await;
                    return;
                }
            },
        }
    }
}

/// Listen key provider returning a fixed key and counting calls
#[derive(Debug, Default)]
pub struct StaticListenKeys {
    pub key: String,
    pub obtained: AtomicUsize,
    pub refreshed: AtomicUsize,
    pub revoked: AtomicUsize,
}

impl StaticListenKeys {
    pub fn new(key: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            key: key.into(),
            ..Self::default()
        })
    }
}

#[async_trait]
impl ListenKeyProvider for StaticListenKeys {
    async fn obtain(&self) -> Result<String> {
        self.obtained.fetch_add(1, Ordering::SeqCst);
        if self.key.is_empty() {
            return Err(Pi42Error::ListenKey("no listen key available".to_string()));
        }
        Ok(self.key.clone())
    }

    async fn keep_alive(&self) -> Result<()> {
        self.refreshed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn revoke(&self) -> Result<()> {
        self.revoked.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
