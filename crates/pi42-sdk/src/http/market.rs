/*
[INPUT]:  Contract pairs and kline query parameters
[OUTPUT]: Market data (24h ticker, aggregated trades, depth, klines)
[POS]:    HTTP layer - public market data endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use serde_json::Value;

use crate::http::{Params, Pi42Client, Result};
use crate::types::KlineQuery;

impl Pi42Client {
    /// 24 hour ticker for a contract pair
    ///
    /// GET /v1/market/ticker24Hr/{pair}
    pub async fn ticker_24hr(&self, contract_pair: &str) -> Result<Value> {
        let endpoint = format!("/v1/market/ticker24Hr/{}", contract_pair.to_lowercase());
        self.get_public(&endpoint, Params::new()).await
    }

    /// Recent aggregated trades
    ///
    /// GET /v1/market/aggTrade/{pair}
    pub async fn agg_trades(&self, contract_pair: &str) -> Result<Value> {
        let endpoint = format!("/v1/market/aggTrade/{}", contract_pair.to_lowercase());
        self.get_public(&endpoint, Params::new()).await
    }

    /// Order book depth
    ///
    /// GET /v1/market/depth/{pair}
    pub async fn depth(&self, contract_pair: &str) -> Result<Value> {
        let endpoint = format!("/v1/market/depth/{}", contract_pair.to_lowercase());
        self.get_public(&endpoint, Params::new()).await
    }

    /// Candlestick history
    ///
    /// POST /v1/market/klines (public, JSON body)
    pub async fn klines(&self, query: &KlineQuery) -> Result<Value> {
        self.post_public("/v1/market/klines", query.to_params())
            .await
    }
}
