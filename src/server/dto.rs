use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::CodeStatus;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct IssueCodesRequest {
    #[serde(default = "default_quantity")]
    pub quantity: usize,
}

fn default_quantity() -> usize {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: CodeStatus,
}

#[derive(Debug, Deserialize)]
pub struct ExpireCodesRequest {
    pub created_before: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ExpireCodesResponse {
    pub expired: usize,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}
