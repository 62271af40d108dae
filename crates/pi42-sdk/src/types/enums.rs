/*
[INPUT]:  API parameter vocabularies
[OUTPUT]: Typed Rust enums with wire-string rendering
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When API vocabularies change or new enums added
*/

use serde::{Deserialize, Serialize};

macro_rules! wire_str {
    ($ty:ty { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            /// Value as sent to the API
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<$ty> for serde_json::Value {
            fn from(value: $ty) -> Self {
                serde_json::Value::String(value.as_str().to_string())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

wire_str!(Side { Buy => "BUY", Sell => "SELL" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    StopMarket,
    StopLimit,
}

wire_str!(OrderType {
    Market => "MARKET",
    Limit => "LIMIT",
    StopMarket => "STOP_MARKET",
    StopLimit => "STOP_LIMIT",
});

/// Where an order is placed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceType {
    OrderForm,
    Position,
}

wire_str!(PlaceType { OrderForm => "ORDER_FORM", Position => "POSITION" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
    Liquidated,
}

wire_str!(PositionStatus {
    Open => "OPEN",
    Closed => "CLOSED",
    Liquidated => "LIQUIDATED",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarginMode {
    Cross,
    Isolated,
}

wire_str!(MarginMode { Cross => "CROSS", Isolated => "ISOLATED" });

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

wire_str!(SortOrder { Asc => "asc", Desc => "desc" });
