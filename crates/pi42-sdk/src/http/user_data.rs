/*
[INPUT]:  History filters and listen key lifecycle calls
[OUTPUT]: Trade/transaction history and listen key tokens
[POS]:    HTTP layer - user data endpoints (require api-key + signature)
[UPDATE]: When adding new user endpoints or changing listen key flow
*/

use serde_json::Value;

use crate::http::{Params, Pi42Client, Result};
use crate::types::HistoryQuery;

const LISTEN_KEY_ENDPOINT: &str = "/v1/retail/listen-key";

impl Pi42Client {
    /// GET /v1/user-data/trade-history
    pub async fn trade_history(&self, query: &HistoryQuery) -> Result<Value> {
        self.get("/v1/user-data/trade-history", query.to_params())
            .await
    }

    /// GET /v1/user-data/transaction-history
    pub async fn transaction_history(
        &self,
        query: &HistoryQuery,
        trade_id: Option<u64>,
        position_id: Option<&str>,
    ) -> Result<Value> {
        let mut params = query.to_params();
        params
            .insert_opt("tradeId", trade_id)
            .insert_opt("positionId", position_id);
        self.get("/v1/user-data/transaction-history", params).await
    }

    /// Create a listen key for the authenticated stream
    ///
    /// POST /v1/retail/listen-key
    pub async fn create_listen_key(&self) -> Result<Value> {
        self.post(LISTEN_KEY_ENDPOINT, Params::new()).await
    }

    /// Extend the validity of the current listen key
    ///
    /// PUT /v1/retail/listen-key
    pub async fn update_listen_key(&self) -> Result<Value> {
        self.put(LISTEN_KEY_ENDPOINT, Params::new()).await
    }

    /// Invalidate the current listen key
    ///
    /// DELETE /v1/retail/listen-key
    pub async fn delete_listen_key(&self) -> Result<Value> {
        self.delete(LISTEN_KEY_ENDPOINT, Params::new()).await
    }
}
