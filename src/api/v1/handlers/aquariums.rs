/*
 * Responsibility
 * - /aquariums と各アイテムの削除・取り外し handler
 * - 所有者確認は middleware::auth 側で済んでいる前提 (handler では再チェックしない)
 */
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    api::v1::{
        dto::{
            api_response::ApiResponse,
            aquariums::{AquariumResponse, DeletedResponse},
        },
        extractors::CurrentOwner,
    },
    error::AppError,
    repos::resource_repo,
    services::auth::ResourceKind,
    state::AppState,
};

type Reply<T> = Result<Json<ApiResponse<T>>, AppError>;

pub async fn list_aquariums(
    State(state): State<AppState>,
    CurrentOwner(identity): CurrentOwner,
) -> Reply<Vec<AquariumResponse>> {
    let rows = resource_repo::list_aquariums(&state.db, identity.owner_id()).await?;
    let res = rows.into_iter().map(AquariumResponse::from).collect();
    Ok(Json(ApiResponse::success(res, "Aquariums retrieved")))
}

pub async fn get_aquarium(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Reply<AquariumResponse> {
    let row = resource_repo::get_aquarium(&state.db, id)
        .await?
        .ok_or(AppError::not_found("aquarium"))?;
    Ok(Json(ApiResponse::success(row.into(), "Aquarium retrieved")))
}

async fn delete_resource(
    state: &AppState,
    kind: ResourceKind,
    id: i64,
) -> Reply<DeletedResponse> {
    if resource_repo::delete(&state.db, kind, id).await? == 0 {
        return Err(AppError::not_found(resource_name(kind)));
    }
    tracing::info!(resource_kind = %kind, resource_id = id, "resource deleted");
    Ok(Json(ApiResponse::success(
        DeletedResponse { id },
        format!("{} deleted", resource_name(kind)),
    )))
}

async fn detach_item(
    state: &AppState,
    kind: ResourceKind,
    aquarium_id: i64,
    item_id: i64,
) -> Reply<DeletedResponse> {
    if resource_repo::detach(&state.db, kind, aquarium_id, item_id).await? == 0 {
        return Err(AppError::not_found(resource_name(kind)));
    }
    tracing::info!(
        resource_kind = %kind,
        resource_id = item_id,
        aquarium_id,
        "item detached from aquarium"
    );
    Ok(Json(ApiResponse::success(
        DeletedResponse { id: item_id },
        format!("{} removed from aquarium", resource_name(kind)),
    )))
}

fn resource_name(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Aquarium => "aquarium",
        ResourceKind::Inhabitant => "inhabitant",
        ResourceKind::Accessory => "accessory",
        ResourceKind::Ornament => "ornament",
    }
}

pub async fn delete_aquarium(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Reply<DeletedResponse> {
    delete_resource(&state, ResourceKind::Aquarium, id).await
}

pub async fn delete_inhabitant(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Reply<DeletedResponse> {
    delete_resource(&state, ResourceKind::Inhabitant, id).await
}

pub async fn delete_accessory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Reply<DeletedResponse> {
    delete_resource(&state, ResourceKind::Accessory, id).await
}

pub async fn delete_ornament(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Reply<DeletedResponse> {
    delete_resource(&state, ResourceKind::Ornament, id).await
}

pub async fn detach_inhabitant(
    State(state): State<AppState>,
    Path((aquarium_id, item_id)): Path<(i64, i64)>,
) -> Reply<DeletedResponse> {
    detach_item(&state, ResourceKind::Inhabitant, aquarium_id, item_id).await
}

pub async fn detach_accessory(
    State(state): State<AppState>,
    Path((aquarium_id, item_id)): Path<(i64, i64)>,
) -> Reply<DeletedResponse> {
    detach_item(&state, ResourceKind::Accessory, aquarium_id, item_id).await
}

pub async fn detach_ornament(
    State(state): State<AppState>,
    Path((aquarium_id, item_id)): Path<(i64, i64)>,
) -> Reply<DeletedResponse> {
    detach_item(&state, ResourceKind::Ornament, aquarium_id, item_id).await
}
