/*
 * Responsibility
 * - aquariums / inhabitants / accessories / ornaments 向け SQLx 操作
 * - ResourceOwnerLookup の Postgres 実装 (所有者確認用)
 * - テーブル名は ResourceKind から静的に決める (SQL に外部入力を混ぜない)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::RepoResult;
use crate::services::auth::ResourceKind;
use crate::services::auth::ownership::{OwnedResource, ResourceOwnerLookup};

#[derive(Debug, Clone, FromRow)]
pub struct AquariumRow {
    pub id: i64,
    pub owner_id: Option<i64>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OwnerColumn {
    id: i64,
    owner_id: Option<i64>,
}

fn find_owner_sql(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Aquarium => "SELECT id, owner_id FROM aquariums WHERE id = $1",
        ResourceKind::Inhabitant => "SELECT id, owner_id FROM inhabitants WHERE id = $1",
        ResourceKind::Accessory => "SELECT id, owner_id FROM accessories WHERE id = $1",
        ResourceKind::Ornament => "SELECT id, owner_id FROM ornaments WHERE id = $1",
    }
}

fn delete_sql(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Aquarium => "DELETE FROM aquariums WHERE id = $1",
        ResourceKind::Inhabitant => "DELETE FROM inhabitants WHERE id = $1",
        ResourceKind::Accessory => "DELETE FROM accessories WHERE id = $1",
        ResourceKind::Ornament => "DELETE FROM ornaments WHERE id = $1",
    }
}

/// `None` for aquariums: they are not placed inside anything.
fn detach_sql(kind: ResourceKind) -> Option<&'static str> {
    match kind {
        ResourceKind::Aquarium => None,
        ResourceKind::Inhabitant => Some(
            "UPDATE inhabitants SET aquarium_id = NULL WHERE id = $1 AND aquarium_id = $2",
        ),
        ResourceKind::Accessory => Some(
            "UPDATE accessories SET aquarium_id = NULL WHERE id = $1 AND aquarium_id = $2",
        ),
        ResourceKind::Ornament => Some(
            "UPDATE ornaments SET aquarium_id = NULL WHERE id = $1 AND aquarium_id = $2",
        ),
    }
}

/// Ownership lookup for one resource table.
#[derive(Debug, Clone)]
pub struct PgResourceLookup {
    db: PgPool,
    kind: ResourceKind,
}

impl PgResourceLookup {
    pub fn new(db: PgPool, kind: ResourceKind) -> Self {
        Self { db, kind }
    }
}

#[async_trait]
impl ResourceOwnerLookup for PgResourceLookup {
    async fn find_owned(&self, id: i64) -> RepoResult<Option<OwnedResource>> {
        let row = sqlx::query_as::<_, OwnerColumn>(find_owner_sql(self.kind))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|r| OwnedResource {
            kind: self.kind,
            id: r.id,
            owner_id: r.owner_id,
        }))
    }
}

pub async fn list_aquariums(db: &PgPool, owner_id: i64) -> RepoResult<Vec<AquariumRow>> {
    let rows = sqlx::query_as::<_, AquariumRow>(
        r#"
        SELECT id, owner_id, name, created_at
        FROM aquariums
        WHERE owner_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn get_aquarium(db: &PgPool, id: i64) -> RepoResult<Option<AquariumRow>> {
    let row = sqlx::query_as::<_, AquariumRow>(
        r#"
        SELECT id, owner_id, name, created_at
        FROM aquariums
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Returns the number of deleted rows (0 or 1).
pub async fn delete(db: &PgPool, kind: ResourceKind, id: i64) -> RepoResult<u64> {
    let res = sqlx::query(delete_sql(kind)).bind(id).execute(db).await?;
    Ok(res.rows_affected())
}

/// Clears `aquarium_id` on an item placed in `aquarium_id`. Returns the number of updated rows.
pub async fn detach(
    db: &PgPool,
    kind: ResourceKind,
    aquarium_id: i64,
    item_id: i64,
) -> RepoResult<u64> {
    let Some(sql) = detach_sql(kind) else {
        return Ok(0);
    };
    let res = sqlx::query(sql)
        .bind(item_id)
        .bind(aquarium_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected())
}
