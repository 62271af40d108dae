/*
[INPUT]:  HTTP configuration (base URLs, timeouts, credentials)
[OUTPUT]: Signed/public REST requests normalized into ApiOutcome
[POS]:    HTTP layer - core client implementation (request dispatch)
[UPDATE]: When adding connection options or changing signing/dispatch behavior
*/

use std::time::Duration;

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::http::signature::{API_KEY_HEADER, SIGNATURE_HEADER};
use crate::http::{ApiOutcome, Credentials, Params, Pi42Error, RequestSigner, Result};

/// Base URLs for Pi42 API
pub const TRADING_BASE_URL: &str = "https://fapi.pi42.com";
pub const PUBLIC_BASE_URL: &str = "https://api.pi42.com";

const API_KEY_ENV: &str = "PI42_API_KEY";
const API_SECRET_ENV: &str = "PI42_API_SECRET";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Base URL for authenticated endpoints
    pub base_url: String,
    /// Base URL for public endpoints
    pub public_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            base_url: TRADING_BASE_URL.to_string(),
            public_url: PUBLIC_BASE_URL.to_string(),
        }
    }
}

/// Main HTTP client for Pi42 API.
///
/// Holds only read-only configuration, so a single instance can be shared
/// (e.g. behind an `Arc`) by any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct Pi42Client {
    http_client: Client,
    base_url: Url,
    public_url: Url,
    signer: Option<RequestSigner>,
}

impl Pi42Client {
    /// Create a client for public endpoints only
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with API credentials and default configuration
    pub fn with_credentials(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Result<Self> {
        let mut client = Self::new()?;
        client.set_credentials(Credentials::new(api_key, api_secret));
        Ok(client)
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| Pi42Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: Url::parse(&config.base_url)?,
            public_url: Url::parse(&config.public_url)?,
            signer: None,
        })
    }

    /// Create a client pointed at custom base URLs (mock servers, testnets)
    pub fn with_config_and_base_urls(
        config: ClientConfig,
        base_url: &str,
        public_url: &str,
    ) -> Result<Self> {
        Self::with_config(ClientConfig {
            base_url: base_url.to_string(),
            public_url: public_url.to_string(),
            ..config
        })
    }

    /// Create a client with credentials read from `PI42_API_KEY` / `PI42_API_SECRET`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| Pi42Error::Config(format!("{API_KEY_ENV} is not set")))?;
        let api_secret = std::env::var(API_SECRET_ENV)
            .map_err(|_| Pi42Error::Config(format!("{API_SECRET_ENV} is not set")))?;
        Self::with_credentials(api_key, api_secret)
    }

    /// Set credentials for authenticated requests
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.signer = Some(RequestSigner::new(credentials));
    }

    /// Whether authenticated endpoints can be called
    pub fn has_credentials(&self) -> bool {
        self.signer.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn public_url(&self) -> &Url {
        &self.public_url
    }

    /// Append `path` to the selected base, keeping any path prefix the base carries
    fn endpoint_url(&self, path: &str, is_public: bool) -> Result<Url> {
        let base = if is_public {
            &self.public_url
        } else {
            &self.base_url
        };
        if base.cannot_be_a_base() {
            return Err(Pi42Error::Config(format!("base URL cannot carry a path: {base}")));
        }
        let mut url = base.clone();
        url.set_path(&format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        ));
        Ok(url)
    }

    /// Send one request and normalize the response.
    ///
    /// `Err` is returned only when the request cannot be built (missing
    /// credentials, bad URL); server rejections and network failures come back
    /// as `ApiOutcome` variants.
    pub async fn dispatch(
        &self,
        method: Method,
        path: &str,
        params: Params,
        is_public: bool,
    ) -> Result<ApiOutcome> {
        let url = self.endpoint_url(path, is_public)?;
        let builder = self.http_client.request(method.clone(), url);
        let builder = if is_public {
            attach_params(builder, &method, &params, None)?
        } else {
            self.sign_request(builder, &method, params)?
        };

        debug!(%method, path, is_public, "dispatching request");
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, path, error = %err, "request transport failure");
                return Ok(ApiOutcome::TransportFailure(err.to_string()));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!(%method, path, error = %err, "failed to read response body");
                return Ok(ApiOutcome::TransportFailure(err.to_string()));
            }
        };

        let outcome = ApiOutcome::from_response(status, &body);
        if !outcome.is_success() {
            debug!(%method, path, status = status.as_u16(), "request rejected");
        }
        Ok(outcome)
    }

    fn sign_request(
        &self,
        builder: RequestBuilder,
        method: &Method,
        mut params: Params,
    ) -> Result<RequestBuilder> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            Pi42Error::Config("API key and secret are required for authenticated endpoints".into())
        })?;

        params.insert("timestamp", Utc::now().timestamp_millis().to_string());
        let payload = if *method == Method::GET {
            params.to_query_string()
        } else {
            params.to_json_string()?
        };
        let signature = signer.sign(&payload)?;

        let builder = builder
            .header(API_KEY_HEADER, signer.api_key())
            .header(SIGNATURE_HEADER, signature);
        attach_params(builder, method, &params, Some(payload))
    }

    /// Authenticated GET
    pub async fn get(&self, path: &str, params: Params) -> Result<Value> {
        self.dispatch(Method::GET, path, params, false)
            .await?
            .into_result()
    }

    /// Public GET (no signature)
    pub async fn get_public(&self, path: &str, params: Params) -> Result<Value> {
        self.dispatch(Method::GET, path, params, true)
            .await?
            .into_result()
    }

    /// Authenticated POST
    pub async fn post(&self, path: &str, params: Params) -> Result<Value> {
        self.dispatch(Method::POST, path, params, false)
            .await?
            .into_result()
    }

    /// Public POST (no signature)
    pub async fn post_public(&self, path: &str, params: Params) -> Result<Value> {
        self.dispatch(Method::POST, path, params, true)
            .await?
            .into_result()
    }

    /// Authenticated PUT
    pub async fn put(&self, path: &str, params: Params) -> Result<Value> {
        self.dispatch(Method::PUT, path, params, false)
            .await?
            .into_result()
    }

    /// Authenticated DELETE
    pub async fn delete(&self, path: &str, params: Params) -> Result<Value> {
        self.dispatch(Method::DELETE, path, params, false)
            .await?
            .into_result()
    }
}

/// GET carries params as a query string, other verbs as a JSON body.
/// `signed_body` is the exact string that was signed, sent verbatim.
fn attach_params(
    builder: RequestBuilder,
    method: &Method,
    params: &Params,
    signed_body: Option<String>,
) -> Result<RequestBuilder> {
    if *method == Method::GET {
        if params.is_empty() {
            return Ok(builder);
        }
        return Ok(builder.query(&params.query_pairs()));
    }

    let body = match signed_body {
        Some(body) => body,
        None => params.to_json_string()?,
    };
    Ok(builder.header(CONTENT_TYPE, "application/json").body(body))
}
