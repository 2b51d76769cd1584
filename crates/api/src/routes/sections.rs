use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use folio_core::model::{NewSection, NewSubItem, Section, SectionPatch, SubItem};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::auth::AdminSession;
use crate::state::AppState;

/// Section management plus creation of sub-items inside a section.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sections", get(list_sections).post(create_section))
        .route(
            "/v1/sections/{id}",
            get(get_section).patch(update_section).delete(delete_section),
        )
        .route(
            "/v1/sections/{id}/items",
            get(list_items).post(create_item),
        )
}

async fn list_sections(
    State(state): State<AppState>,
    _session: AdminSession,
) -> ApiResult<Json<Vec<Section>>> {
    Ok(Json(state.content().list_sections().await?))
}

async fn create_section(
    State(state): State<AppState>,
    _session: AdminSession,
    Json(section): Json<NewSection>,
) -> ApiResult<(StatusCode, Json<Section>)> {
    let created = state.content().create_section(section).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_section(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Section>> {
    Ok(Json(state.content().get_section(id).await?))
}

async fn update_section(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    Json(patch): Json<SectionPatch>,
) -> ApiResult<Json<Section>> {
    Ok(Json(state.content().update_section(id, patch).await?))
}

/// Removes the section, its sub-items and every uploaded file they reference.
async fn delete_section(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.content().delete_section(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_items(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<SubItem>>> {
    Ok(Json(state.content().list_items(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateItemRequest {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    order_index: i32,
}

async fn create_item(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(section_id): Path<Uuid>,
    Json(request): Json<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<SubItem>)> {
    let item = NewSubItem {
        section_id,
        title: request.title,
        description: request.description,
        order_index: request.order_index,
    };
    let created = state.content().create_item(item).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
