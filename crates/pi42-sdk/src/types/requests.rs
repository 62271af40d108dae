/*
[INPUT]:  Caller-supplied endpoint arguments
[OUTPUT]: Ordered request parameters (Params) in API field order
[POS]:    Data layer - request shaping for endpoint facades
[UPDATE]: When API request schema changes
*/

use rust_decimal::Decimal;

use crate::http::{Params, Result};
use crate::types::{OrderType, PlaceType, Side, SortOrder};

/// Order placement request
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub place_type: PlaceType,
    pub margin_asset: String,
    pub price: Option<Decimal>,
    pub reduce_only: bool,
    pub take_profit_price: Option<Decimal>,
    pub stop_loss_price: Option<Decimal>,
    /// Required for STOP_MARKET and STOP_LIMIT
    pub stop_price: Option<Decimal>,
    /// Required when `place_type` is `Position`
    pub position_id: Option<String>,
    pub device_type: String,
    pub user_category: String,
}

impl OrderRequest {
    /// Market order with default placement settings (INR margin, web order form)
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            place_type: PlaceType::OrderForm,
            margin_asset: "INR".to_string(),
            price: None,
            reduce_only: false,
            take_profit_price: None,
            stop_loss_price: None,
            stop_price: None,
            position_id: None,
            device_type: "WEB".to_string(),
            user_category: "EXTERNAL".to_string(),
        }
    }

    /// Limit order with default placement settings
    pub fn limit(symbol: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            order_type: OrderType::Limit,
            price: Some(price),
            ..Self::market(symbol, side, quantity)
        }
    }

    pub fn to_params(&self) -> Result<Params> {
        let mut params = Params::new()
            .with("placeType", self.place_type)
            .with("quantity", serde_json::to_value(self.quantity)?)
            .with("side", self.side)
            .with("symbol", self.symbol.as_str())
            .with("type", self.order_type)
            .with("reduceOnly", self.reduce_only)
            .with("marginAsset", self.margin_asset.as_str())
            .with("deviceType", self.device_type.as_str())
            .with("userCategory", self.user_category.as_str());

        let optional_prices = [
            ("price", self.price),
            ("takeProfitPrice", self.take_profit_price),
            ("stopLossPrice", self.stop_loss_price),
            ("stopPrice", self.stop_price),
        ];
        for (key, value) in optional_prices {
            if let Some(value) = value {
                params.insert_decimal(key, value)?;
            }
        }
        params.insert_opt("positionId", self.position_id.as_deref());
        Ok(params)
    }
}

/// Candlestick query for the public klines endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KlineQuery {
    pub pair: String,
    pub interval: String,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub limit: Option<u32>,
}

impl KlineQuery {
    pub fn new(pair: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            interval: interval.into(),
            start_time: None,
            end_time: None,
            limit: None,
        }
    }

    pub fn to_params(&self) -> Params {
        let mut params = Params::new()
            .with("pair", self.pair.to_uppercase())
            .with("interval", self.interval.to_lowercase());
        params
            .insert_opt("startTime", self.start_time)
            .insert_opt("endTime", self.end_time)
            .insert_opt("limit", self.limit);
        params
    }
}

/// Pagination/time-window filters shared by history endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub start_timestamp: Option<u64>,
    pub end_timestamp: Option<u64>,
    pub sort_order: Option<SortOrder>,
    pub page_size: Option<u32>,
    pub symbol: Option<String>,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn between(mut self, start_timestamp: u64, end_timestamp: u64) -> Self {
        self.start_timestamp = Some(start_timestamp);
        self.end_timestamp = Some(end_timestamp);
        self
    }

    /// Params in the order used by trade, transaction and position history
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert_opt("startTimestamp", self.start_timestamp)
            .insert_opt("endTimestamp", self.end_timestamp)
            .insert_opt("sortOrder", self.sort_order)
            .insert_opt("pageSize", self.page_size)
            .insert_opt("symbol", self.symbol.as_deref());
        params
    }

    /// Params in the order used by the open-order and order-history endpoints
    pub fn to_order_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert_opt("pageSize", self.page_size)
            .insert_opt("sortOrder", self.sort_order)
            .insert_opt("startTimestamp", self.start_timestamp)
            .insert_opt("endTimestamp", self.end_timestamp)
            .insert_opt("symbol", self.symbol.as_deref());
        params
    }

    /// Params in the order used by the margin-history endpoint
    pub fn to_margin_params(&self) -> Params {
        let mut params = Params::new();
        params
            .insert_opt("symbol", self.symbol.as_deref())
            .insert_opt("pageSize", self.page_size)
            .insert_opt("sortOrder", self.sort_order)
            .insert_opt("startTimestamp", self.start_timestamp)
            .insert_opt("endTimestamp", self.end_timestamp);
        params
    }
}
