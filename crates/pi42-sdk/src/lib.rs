/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Pi42 futures SDK surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;
pub mod ws;

// Re-export commonly used types from http
pub use http::{
    ApiOutcome,
    ClientConfig,
    Credentials,
    Params,
    Pi42Client,
    Pi42Error,
    RequestSigner,
    Result,
    sign_payload,
};

// Re-export all types
pub use types::*;

// Re-export commonly used types from ws
pub use ws::{
    BlockingStreamSupervisor,
    ConnectionState,
    EventType,
    HandlerRegistry,
    ListenKeyProvider,
    StreamConfig,
    StreamConnection,
    StreamKind,
    StreamSupervisor,
};
