/*
[INPUT]:  Order requests, margin adjustments and history filters
[OUTPUT]: Order placement/cancellation responses and order listings
[POS]:    HTTP layer - trading endpoints (require api-key + signature)
[UPDATE]: When adding new trading endpoints or changing order flow
*/

use rust_decimal::Decimal;
use serde_json::Value;

use crate::http::{Params, Pi42Client, Result};
use crate::types::{HistoryQuery, OrderRequest};

impl Pi42Client {
    /// Place a new order
    ///
    /// POST /v1/order/place-order
    pub async fn place_order(&self, req: &OrderRequest) -> Result<Value> {
        self.post("/v1/order/place-order", req.to_params()?).await
    }

    /// Add margin to a position
    ///
    /// POST /v1/order/add-margin
    pub async fn add_margin(&self, position_id: &str, amount: Decimal) -> Result<Value> {
        self.post("/v1/order/add-margin", margin_params(position_id, amount)?)
            .await
    }

    /// Reduce margin on a position
    ///
    /// POST /v1/order/reduce-margin
    pub async fn reduce_margin(&self, position_id: &str, amount: Decimal) -> Result<Value> {
        self.post("/v1/order/reduce-margin", margin_params(position_id, amount)?)
            .await
    }

    /// GET /v1/order/open-orders
    pub async fn open_orders(&self, query: &HistoryQuery) -> Result<Value> {
        self.get("/v1/order/open-orders", query.to_order_params())
            .await
    }

    /// GET /v1/order/order-history
    pub async fn order_history(&self, query: &HistoryQuery) -> Result<Value> {
        self.get("/v1/order/order-history", query.to_order_params())
            .await
    }

    /// Orders linked by a link id (e.g. TP/SL attached to an entry)
    ///
    /// GET /v1/order/linked-orders/{link_id}
    pub async fn linked_orders(&self, link_id: &str) -> Result<Value> {
        let endpoint = format!("/v1/order/linked-orders/{link_id}");
        self.get(&endpoint, Params::new()).await
    }

    /// GET /v1/order/fetch-margin-history
    pub async fn margin_history(&self, query: &HistoryQuery) -> Result<Value> {
        self.get("/v1/order/fetch-margin-history", query.to_margin_params())
            .await
    }

    /// Delete an order by client order id
    ///
    /// DELETE /v1/order/delete-order
    pub async fn delete_order(&self, client_order_id: &str) -> Result<Value> {
        let params = Params::new().with("clientOrderId", client_order_id);
        self.delete("/v1/order/delete-order", params).await
    }

    /// DELETE /v1/order/cancel-all-orders
    pub async fn cancel_all_orders(&self) -> Result<Value> {
        self.delete("/v1/order/cancel-all-orders", Params::new())
            .await
    }
}

fn margin_params(position_id: &str, amount: Decimal) -> Result<Params> {
    let mut params = Params::new().with("positionId", position_id);
    params.insert_decimal("amount", amount)?;
    Ok(params)
}
