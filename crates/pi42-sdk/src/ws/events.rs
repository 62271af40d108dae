/*
[INPUT]:  Event tags from the stream + user-registered callbacks
[OUTPUT]: Typed event vocabulary and a shared handler registry
[POS]:    WebSocket layer - callback multiplexing across connections
[UPDATE]: When the server adds event types
*/

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Stream event types delivered by Pi42
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    // Public market data
    DepthUpdate,
    Kline,
    MarkPriceUpdate,
    AggTrade,
    Ticker24hr,
    MarketInfo,
    MarkPriceArr,
    TickerArr,
    AllContractDetails,
    // Account stream
    NewPosition,
    OrderFilled,
    OrderPartiallyFilled,
    OrderCancelled,
    OrderFailed,
    NewOrder,
    UpdateOrder,
    UpdatePosition,
    ClosePosition,
    BalanceUpdate,
    NewTrade,
    SessionExpired,
}

impl EventType {
    pub const PUBLIC: [EventType; 9] = [
        EventType::DepthUpdate,
        EventType::Kline,
        EventType::MarkPriceUpdate,
        EventType::AggTrade,
        EventType::Ticker24hr,
        EventType::MarketInfo,
        EventType::MarkPriceArr,
        EventType::TickerArr,
        EventType::AllContractDetails,
    ];

    pub const ACCOUNT: [EventType; 12] = [
        EventType::NewPosition,
        EventType::OrderFilled,
        EventType::OrderPartiallyFilled,
        EventType::OrderCancelled,
        EventType::OrderFailed,
        EventType::NewOrder,
        EventType::UpdateOrder,
        EventType::UpdatePosition,
        EventType::ClosePosition,
        EventType::BalanceUpdate,
        EventType::NewTrade,
        EventType::SessionExpired,
    ];

    /// Tag as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DepthUpdate => "depthUpdate",
            EventType::Kline => "kline",
            EventType::MarkPriceUpdate => "markPriceUpdate",
            EventType::AggTrade => "aggTrade",
            EventType::Ticker24hr => "24hrTicker",
            EventType::MarketInfo => "marketInfo",
            EventType::MarkPriceArr => "markPriceArr",
            EventType::TickerArr => "tickerArr",
            EventType::AllContractDetails => "allContractDetails",
            EventType::NewPosition => "newPosition",
            EventType::OrderFilled => "orderFilled",
            EventType::OrderPartiallyFilled => "orderPartiallyFilled",
            EventType::OrderCancelled => "orderCancelled",
            EventType::OrderFailed => "orderFailed",
            EventType::NewOrder => "newOrder",
            EventType::UpdateOrder => "updateOrder",
            EventType::UpdatePosition => "updatePosition",
            EventType::ClosePosition => "closePosition",
            EventType::BalanceUpdate => "balanceUpdate",
            EventType::NewTrade => "newTrade",
            EventType::SessionExpired => "sessionExpired",
        }
    }

    pub fn is_account_event(&self) -> bool {
        Self::ACCOUNT.contains(self)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag not in the known vocabulary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::PUBLIC
            .iter()
            .chain(Self::ACCOUNT.iter())
            .find(|event| event.as_str() == tag)
            .copied()
            .ok_or_else(|| UnknownEventType(tag.to_string()))
    }
}

/// Callback invoked with an event payload
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// One handler per event type, shared by every connection of a supervisor.
///
/// Registration and dispatch may happen concurrently from different threads;
/// handlers are cloned out of the lock before they run.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<RwLock<HashMap<EventType, EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one. Returns true on replace.
    pub fn register<F>(&self, event: EventType, handler: F) -> bool
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let mut guard = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(event, Arc::new(handler)).is_some()
    }

    pub fn unregister(&self, event: EventType) -> bool {
        let mut guard = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(&event).is_some()
    }

    pub fn is_registered(&self, event: EventType) -> bool {
        let guard = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        guard.contains_key(&event)
    }

    fn handler(&self, event: EventType) -> Option<EventHandler> {
        let guard = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(&event).cloned()
    }

    /// Invoke the handler for `event`. Returns false when none is registered.
    ///
    /// A panicking handler is logged and contained; it never unwinds into the
    /// connection that delivered the event.
    pub fn dispatch(&self, event: EventType, payload: Value) -> bool {
        match self.handler(event) {
            Some(handler) => {
                if catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
                    warn!(event = event.as_str(), "stream handler panicked");
                }
                true
            }
            None => {
                debug!(event = event.as_str(), "no handler registered, event dropped");
                false
            }
        }
    }

    /// Dispatch by wire tag; unknown tags are dropped
    pub fn dispatch_tag(&self, tag: &str, payload: Value) -> bool {
        match tag.parse::<EventType>() {
            Ok(event) => self.dispatch(event, payload),
            Err(_) => {
                debug!(event = tag, "unrecognized stream event dropped");
                false
            }
        }
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut events: Vec<&'static str> = guard.keys().map(EventType::as_str).collect();
        events.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("events", &events)
            .finish()
    }
}
