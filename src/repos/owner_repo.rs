/*
 * Responsibility
 * - owners テーブル向け SQLx 操作 (登録・ログイン用)
 * - email の一意制約違反は RepoError::Conflict に変換
 */
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, FromRow)]
pub struct OwnerRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

pub struct NewOwner<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

pub async fn find_by_email(db: &PgPool, email: &str) -> RepoResult<Option<OwnerRow>> {
    let row = sqlx::query_as::<_, OwnerRow>(
        r#"
        SELECT id, email, password_hash
        FROM owners
        WHERE lower(email) = lower($1)
        "#,
    )
    .bind(email)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn insert(db: &PgPool, owner: NewOwner<'_>) -> RepoResult<OwnerRow> {
    let row = sqlx::query_as::<_, OwnerRow>(
        r#"
        INSERT INTO owners (first_name, last_name, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING id, email, password_hash
        "#,
    )
    .bind(owner.first_name)
    .bind(owner.last_name)
    .bind(owner.email)
    .bind(owner.password_hash)
    .fetch_one(db)
    .await
    .map_err(RepoError::from_sqlx)?;

    Ok(row)
}

pub async fn record_login(db: &PgPool, owner_id: i64) -> RepoResult<()> {
    sqlx::query(
        r#"
        UPDATE owners
        SET last_login_at = now()
        WHERE id = $1
        "#,
    )
    .bind(owner_id)
    .execute(db)
    .await?;

    Ok(())
}
