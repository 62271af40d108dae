/*
[INPUT]:  Stream endpoints, listen keys, user event handlers
[OUTPUT]: Real-time market data and account updates over Socket.IO
[POS]:    WebSocket layer - real-time data streams
[UPDATE]: When adding event types or changing connection logic
*/

pub mod blocking;
pub mod connection;
pub mod events;
pub mod listen_key;
pub mod protocol;
pub mod supervisor;

pub use blocking::BlockingStreamSupervisor;
pub use connection::{ConnectionState, StreamConnection, StreamKind};
pub use events::{EventHandler, EventType, HandlerRegistry, UnknownEventType};
pub use listen_key::ListenKeyProvider;
pub use supervisor::{AUTH_STREAM_URL, PUBLIC_STREAM_URL, StreamConfig, StreamSupervisor};
