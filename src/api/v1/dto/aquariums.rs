use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::repos::resource_repo::AquariumRow;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AquariumResponse {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<AquariumRow> for AquariumResponse {
    fn from(row: AquariumRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub id: i64,
}
