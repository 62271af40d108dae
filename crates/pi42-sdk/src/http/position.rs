/*
[INPUT]:  Position status / id and history filters
[OUTPUT]: Position listings, details and close-all confirmation
[POS]:    HTTP layer - position endpoints (require api-key + signature)
[UPDATE]: When adding new position endpoints
*/

use serde_json::Value;

use crate::http::{Params, Pi42Client, Result};
use crate::types::{HistoryQuery, PositionStatus};

impl Pi42Client {
    /// GET /v1/positions/{status}
    pub async fn positions(&self, status: PositionStatus, query: &HistoryQuery) -> Result<Value> {
        let endpoint = format!("/v1/positions/{}", status.as_str());
        self.get(&endpoint, query.to_params()).await
    }

    /// GET /v1/positions?positionId={position_id}
    pub async fn position(&self, position_id: &str) -> Result<Value> {
        let params = Params::new().with("positionId", position_id);
        self.get("/v1/positions", params).await
    }

    /// DELETE /v1/positions/close-all-positions
    pub async fn close_all_positions(&self) -> Result<Value> {
        self.delete("/v1/positions/close-all-positions", Params::new())
            .await
    }
}
