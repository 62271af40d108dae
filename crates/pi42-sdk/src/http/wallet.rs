/*
[INPUT]:  Margin asset filter
[OUTPUT]: Futures and funding wallet balances
[POS]:    HTTP layer - wallet endpoints (require api-key + signature)
[UPDATE]: When adding new wallet endpoints
*/

use serde_json::Value;

use crate::http::{Params, Pi42Client, Result};

impl Pi42Client {
    /// GET /v1/wallet/futures-wallet/details
    pub async fn futures_wallet_details(&self, margin_asset: Option<&str>) -> Result<Value> {
        let mut params = Params::new();
        params.insert_opt("marginAsset", margin_asset);
        self.get("/v1/wallet/futures-wallet/details", params).await
    }

    /// GET /v1/wallet/funding-wallet/details
    pub async fn funding_wallet_details(&self, margin_asset: Option<&str>) -> Result<Value> {
        let mut params = Params::new();
        params.insert_opt("marginAsset", margin_asset);
        self.get("/v1/wallet/funding-wallet/details", params).await
    }
}
