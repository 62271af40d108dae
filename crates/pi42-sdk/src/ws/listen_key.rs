/*
[INPUT]:  Authenticated REST client (or any token source)
[OUTPUT]: Listen keys for the account stream + keep-alive / revoke
[POS]:    WebSocket layer - account stream token provisioning seam
[UPDATE]: When the listen key lifecycle endpoints change
*/

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::http::{Pi42Client, Pi42Error, Result};

/// Source of listen keys for the authenticated stream.
///
/// Implementations return `Pi42Error::Config` when they lack the credentials
/// to talk to the server, and `Pi42Error::ListenKey` for any other failure.
#[async_trait]
pub trait ListenKeyProvider: Send + Sync {
    /// Create (or fetch the current) listen key
    async fn obtain(&self) -> Result<String>;

    /// Extend the validity of the active listen key
    async fn keep_alive(&self) -> Result<()>;

    /// Invalidate the active listen key
    async fn revoke(&self) -> Result<()>;
}

#[async_trait]
impl ListenKeyProvider for Pi42Client {
    async fn obtain(&self) -> Result<String> {
        require_credentials(self)?;
        let response = self.create_listen_key().await.map_err(into_listen_key_error)?;
        let listen_key = extract_listen_key(&response)?;
        info!("listen key created");
        Ok(listen_key)
    }

    async fn keep_alive(&self) -> Result<()> {
        require_credentials(self)?;
        self.update_listen_key()
            .await
            .map_err(into_listen_key_error)?;
        info!("listen key refreshed");
        Ok(())
    }

    async fn revoke(&self) -> Result<()> {
        require_credentials(self)?;
        self.delete_listen_key()
            .await
            .map_err(into_listen_key_error)?;
        info!("listen key revoked");
        Ok(())
    }
}

fn require_credentials(client: &Pi42Client) -> Result<()> {
    if client.has_credentials() {
        Ok(())
    } else {
        Err(Pi42Error::Config(
            "API key and secret are required for the authenticated stream".to_string(),
        ))
    }
}

fn into_listen_key_error(err: Pi42Error) -> Pi42Error {
    match err {
        Pi42Error::Config(_) => err,
        other => Pi42Error::ListenKey(other.to_string()),
    }
}

fn extract_listen_key(response: &Value) -> Result<String> {
    response
        .get("listenKey")
        .and_then(Value::as_str)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Pi42Error::ListenKey("response did not contain a listenKey".to_string()))
}
