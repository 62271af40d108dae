/*
[INPUT]:  Synchronous callers (no async runtime of their own)
[OUTPUT]: Blocking facade over StreamSupervisor backed by a private runtime
[POS]:    WebSocket layer - sync bridge
[UPDATE]: When the async supervisor surface changes
*/

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime};
use tracing::warn;

use crate::http::{Pi42Error, Result};
use crate::ws::connection::ConnectionState;
use crate::ws::events::EventType;
use crate::ws::listen_key::ListenKeyProvider;
use crate::ws::supervisor::{StreamConfig, StreamSupervisor};

const DROP_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking wrapper around [`StreamSupervisor`].
///
/// Owns a dedicated multi-thread runtime; socket I/O and event handlers run on
/// its worker threads. Methods block the calling thread and must not be
/// called from inside an async context.
pub struct BlockingStreamSupervisor {
    runtime: Option<Runtime>,
    inner: StreamSupervisor,
}

impl BlockingStreamSupervisor {
    pub fn new(config: StreamConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("pi42-stream")
            .enable_all()
            .build()
            .map_err(|e| Pi42Error::Config(format!("failed to start stream runtime: {e}")))?;

        Ok(Self {
            runtime: Some(runtime),
            inner: StreamSupervisor::new(config),
        })
    }

    pub fn with_listen_key_provider(mut self, provider: Arc<dyn ListenKeyProvider>) -> Self {
        self.inner.set_listen_key_provider(provider);
        self
    }

    fn block_on<F: std::future::Future>(runtime: &Option<Runtime>, future: F) -> Result<F::Output> {
        if Handle::try_current().is_ok() {
            return Err(Pi42Error::Config(
                "blocking stream supervisor used from within an async runtime".to_string(),
            ));
        }
        let runtime = runtime
            .as_ref()
            .ok_or_else(|| Pi42Error::Config("stream runtime has shut down".to_string()))?;
        Ok(runtime.block_on(future))
    }

    /// Register (or replace) the handler for an event type
    pub fn on<F>(&self, event: EventType, handler: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.inner.on(event, handler);
    }

    pub fn connect_public<I, T>(&mut self, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        // `connect` spawns onto the ambient runtime, so it has to run inside ours
        Self::block_on(&self.runtime, self.inner.connect_public(topics))?
    }

    pub fn subscribe_public<I, T>(&self, topics: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let topics: Vec<String> = topics.into_iter().map(Into::into).collect();
        Self::block_on(&self.runtime, self.inner.subscribe_public(topics))?
    }

    pub fn connect_authenticated(&mut self, listen_key: Option<String>) -> Result<()> {
        Self::block_on(&self.runtime, self.inner.connect_authenticated(listen_key))?
    }

    pub fn refresh_listen_key(&self) -> Result<()> {
        Self::block_on(&self.runtime, self.inner.refresh_listen_key())?
    }

    pub fn revoke_listen_key(&self) -> Result<()> {
        Self::block_on(&self.runtime, self.inner.revoke_listen_key())?
    }

    pub fn wait_public_connected(&self, timeout: Duration) -> Result<()> {
        Self::block_on(&self.runtime, self.inner.wait_public_connected(timeout))?
    }

    pub fn wait_authenticated_connected(&self, timeout: Duration) -> Result<()> {
        Self::block_on(&self.runtime, self.inner.wait_authenticated_connected(timeout))?
    }

    pub fn public_state(&self) -> ConnectionState {
        self.inner.public_state()
    }

    pub fn authenticated_state(&self) -> ConnectionState {
        self.inner.authenticated_state()
    }

    /// Close every connection and wait for them to shut down
    pub fn close(&mut self) -> Result<()> {
        Self::block_on(&self.runtime, self.inner.close())
    }

    pub fn close_timeout(&mut self, timeout: Duration) -> Result<()> {
        Self::block_on(&self.runtime, self.inner.close_timeout(timeout))?
    }
}

impl Drop for BlockingStreamSupervisor {
    fn drop(&mut self) {
        // block_on is off limits when dropped from async code
        if Handle::try_current().is_err() {
            let closed = Self::block_on(&self.runtime, self.inner.close_timeout(DROP_CLOSE_TIMEOUT));
            if let Err(err) | Ok(Err(err)) = closed {
                warn!(error = %err, "stream supervisor close on drop failed");
            }
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for BlockingStreamSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingStreamSupervisor")
            .field("inner", &self.inner)
            .finish()
    }
}
