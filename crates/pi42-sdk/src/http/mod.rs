/*
[INPUT]:  HTTP client configuration, credentials and API endpoints
[OUTPUT]: Normalized API outcomes and JSON payloads
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod exchange;
pub mod market;
pub mod order;
pub mod params;
pub mod position;
pub mod response;
pub mod signature;
pub mod user_data;
pub mod wallet;

pub use error::{Pi42Error, Result};
pub use params::Params;
pub use response::ApiOutcome;
pub use signature::{Credentials, RequestSigner, sign_payload};

pub use client::{ClientConfig, Pi42Client};
