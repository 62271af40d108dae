/*
[INPUT]:  Stream configuration, listen key provider, user callbacks
[OUTPUT]: Public + authenticated stream connections sharing one handler registry
[POS]:    WebSocket layer - multi-connection lifecycle owner
[UPDATE]: When changing reconnect policy, close semantics or stream endpoints
*/

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use crate::http::{Pi42Error, Result};
use crate::ws::connection::{ConnectionState, DEFAULT_COMMAND_BUFFER, StreamConnection, StreamKind};
use crate::ws::events::{EventType, HandlerRegistry};
use crate::ws::listen_key::ListenKeyProvider;

/// Socket.IO server bases for Pi42 streams
pub const PUBLIC_STREAM_URL: &str = "https://fawss.pi42.com/";
pub const AUTH_STREAM_URL: &str = "https://fawss-uds.pi42.com/auth-stream";

/// Stream endpoint configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub public_url: String,
    pub auth_url: String,
    /// Outbound command queue depth per connection
    pub command_buffer: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            public_url: PUBLIC_STREAM_URL.to_string(),
            auth_url: AUTH_STREAM_URL.to_string(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

/// Owns at most one public and one authenticated stream connection.
///
/// Connecting a kind that is already connected closes the previous
/// connection first (replace-and-close-old). Handlers registered with
/// [`on`](Self::on) apply to both connections, including ones opened later,
/// and run on the connection's background task.
pub struct StreamSupervisor {
    config: StreamConfig,
    registry: HandlerRegistry,
    listen_keys: Option<Arc<dyn ListenKeyProvider>>,
    public: Option<StreamConnection>,
    authenticated: Option<StreamConnection>,
}

impl StreamSupervisor {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            registry: HandlerRegistry::new(),
            listen_keys: None,
            public: None,
            authenticated: None,
        }
    }

    /// Provider used when `connect_authenticated` gets no listen key
    pub fn with_listen_key_provider(mut self, provider: Arc<dyn ListenKeyProvider>) -> Self {
        self.set_listen_key_provider(provider);
        self
    }

    pub fn set_listen_key_provider(&mut self, provider: Arc<dyn ListenKeyProvider>) {
        self.listen_keys = Some(provider);
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Register (or replace) the handler for an event type
    pub fn on<F>(&self, event: EventType, handler: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        if self.registry.register(event, handler) {
            info!(event = event.as_str(), "stream handler replaced");
        } else {
            info!(event = event.as_str(), "stream handler registered");
        }
    }

    /// Connect the public market stream, subscribing `topics` once connected
    pub async fn connect_public<I, T>(&mut self, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if let Some(mut previous) = self.public.take() {
            info!("replacing active public stream");
            previous.close().await;
        }
        let mut connection = StreamConnection::new(
            StreamKind::Public,
            &self.config.public_url,
            self.registry.clone(),
        )?
        .with_command_buffer(self.config.command_buffer);
        connection.connect(topics).await?;
        self.public = Some(connection);
        Ok(())
    }

    /// Subscribe more topics on the public stream
    pub async fn subscribe_public<I, T>(&self, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        match &self.public {
            Some(connection) => connection.subscribe(topics).await,
            None => Err(Pi42Error::NotConnected(
                "public stream has not been connected".to_string(),
            )),
        }
    }

    /// Connect the account stream.
    ///
    /// Without `listen_key`, one is obtained from the listen key provider.
    pub async fn connect_authenticated(&mut self, listen_key: Option<String>) -> Result<()> {
        let listen_key = match listen_key.filter(|key| !key.is_empty()) {
            Some(key) => key,
            None => self.provider()?.obtain().await?,
        };

        if let Some(mut previous) = self.authenticated.take() {
            info!("replacing active authenticated stream");
            previous.close().await;
        }
        let mut connection = StreamConnection::new(
            StreamKind::Authenticated { listen_key },
            &self.config.auth_url,
            self.registry.clone(),
        )?
        .with_command_buffer(self.config.command_buffer);
        connection.connect(Vec::<String>::new()).await?;
        self.authenticated = Some(connection);
        Ok(())
    }

    /// Listen key of the current authenticated connection
    pub fn listen_key(&self) -> Option<&str> {
        match self.authenticated.as_ref().map(StreamConnection::kind) {
            Some(StreamKind::Authenticated { listen_key }) => Some(listen_key.as_str()),
            _ => None,
        }
    }

    /// Keep the account stream's listen key alive
    pub async fn refresh_listen_key(&self) -> Result<()> {
        self.provider()?.keep_alive().await
    }

    /// Invalidate the listen key server-side
    pub async fn revoke_listen_key(&self) -> Result<()> {
        self.provider()?.revoke().await
    }

    fn provider(&self) -> Result<&Arc<dyn ListenKeyProvider>> {
        self.listen_keys.as_ref().ok_or_else(|| {
            Pi42Error::Config(
                "a listen key or API credentials are required for the authenticated stream"
                    .to_string(),
            )
        })
    }

    pub fn public_state(&self) -> ConnectionState {
        self.public
            .as_ref()
            .map_or(ConnectionState::Disconnected, StreamConnection::state)
    }

    pub fn authenticated_state(&self) -> ConnectionState {
        self.authenticated
            .as_ref()
            .map_or(ConnectionState::Disconnected, StreamConnection::state)
    }

    pub fn public_connection(&self) -> Option<&StreamConnection> {
        self.public.as_ref()
    }

    pub fn authenticated_connection(&self) -> Option<&StreamConnection> {
        self.authenticated.as_ref()
    }

    /// Wait for the public handshake
    pub async fn wait_public_connected(&self, timeout: Duration) -> Result<()> {
        match &self.public {
            Some(connection) => connection.wait_connected(timeout).await,
            None => Err(Pi42Error::NotConnected("public stream has not been connected".into())),
        }
    }

    /// Wait for the authenticated handshake
    pub async fn wait_authenticated_connected(&self, timeout: Duration) -> Result<()> {
        match &self.authenticated {
            Some(connection) => connection.wait_connected(timeout).await,
            None => Err(Pi42Error::NotConnected(
                "authenticated stream has not been connected".into(),
            )),
        }
    }

    /// Close every connection and wait for all of them to shut down
    pub async fn close(&mut self) {
        let public = self.public.take();
        let authenticated = self.authenticated.take();
        if public.is_none() && authenticated.is_none() {
            return;
        }

        tokio::join!(close_connection(public), close_connection(authenticated));
        info!("stream supervisor closed");
    }

    /// Bounded variant of [`close`](Self::close); sessions still running at
    /// the deadline are aborted.
    pub async fn close_timeout(&mut self, timeout: Duration) -> Result<()> {
        let public = self.public.take();
        let authenticated = self.authenticated.take();

        let (public, authenticated) = tokio::join!(
            close_connection_timeout(public, timeout),
            close_connection_timeout(authenticated, timeout)
        );
        public.and(authenticated)
    }
}

async fn close_connection(connection: Option<StreamConnection>) {
    if let Some(mut connection) = connection {
        connection.close().await;
    }
}

async fn close_connection_timeout(
    connection: Option<StreamConnection>,
    timeout: Duration,
) -> Result<()> {
    match connection {
        Some(mut connection) => connection.close_timeout(timeout).await,
        None => Ok(()),
    }
}

impl Default for StreamSupervisor {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

impl std::fmt::Debug for StreamSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSupervisor")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("has_listen_key_provider", &self.listen_keys.is_some())
            .field("public", &self.public_state())
            .field("authenticated", &self.authenticated_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_close_with_nothing_connected() {
        let mut supervisor = StreamSupervisor::default();
        supervisor.close().await;
        assert!(supervisor.close_timeout(Duration::from_millis(10)).await.is_ok());
        assert_eq!(supervisor.public_state(), ConnectionState::Disconnected);
        assert_eq!(supervisor.authenticated_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_subscribe_public_before_connect() {
        let supervisor = StreamSupervisor::default();
        let err = supervisor.subscribe_public(["btcinr@ticker"]).await.unwrap_err();
        assert!(matches!(err, Pi42Error::NotConnected(_)));
    }

    #[tokio::test]
    async fn test_authenticated_without_key_or_provider() {
        let mut supervisor = StreamSupervisor::default();
        let err = supervisor.connect_authenticated(None).await.unwrap_err();
        assert!(err.is_config_error());
        assert!(supervisor.authenticated_connection().is_none());
    }

    #[test]
    fn test_default_stream_urls() {
        let config = StreamConfig::default();
        assert_eq!(config.public_url, "https://fawss.pi42.com/");
        assert_eq!(config.auth_url, "https://fawss-uds.pi42.com/auth-stream");
    }
}
