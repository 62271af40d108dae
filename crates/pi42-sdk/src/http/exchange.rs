/*
[INPUT]:  Market filter, leverage and margin-mode preferences
[OUTPUT]: Exchange info and preference update confirmations
[POS]:    HTTP layer - exchange endpoints (require api-key + signature)
[UPDATE]: When adding new exchange endpoints
*/

use serde_json::Value;

use crate::http::{Params, Pi42Client, Result};
use crate::types::MarginMode;

impl Pi42Client {
    /// Contract specifications, optionally for one market ("INR", "USDT")
    ///
    /// GET /v1/exchange/exchangeInfo
    pub async fn exchange_info(&self, market: Option<&str>) -> Result<Value> {
        let mut params = Params::new();
        params.insert_opt("market", market);
        self.get("/v1/exchange/exchangeInfo", params).await
    }

    /// POST /v1/exchange/update/preference
    pub async fn update_preference(
        &self,
        leverage: u32,
        margin_mode: MarginMode,
        contract_name: &str,
    ) -> Result<Value> {
        let params = Params::new()
            .with("leverage", leverage)
            .with("marginMode", margin_mode)
            .with("contractName", contract_name);
        self.post("/v1/exchange/update/preference", params).await
    }

    /// POST /v1/exchange/update/leverage
    pub async fn update_leverage(&self, leverage: u32, contract_name: &str) -> Result<Value> {
        let params = Params::new()
            .with("leverage", leverage)
            .with("contractName", contract_name);
        self.post("/v1/exchange/update/leverage", params).await
    }
}
