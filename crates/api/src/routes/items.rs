use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use folio_core::model::{SubItem, SubItemPatch};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::auth::AdminSession;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/v1/items/{id}",
        get(get_item).patch(update_item).delete(delete_item),
    )
}

async fn get_item(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SubItem>> {
    Ok(Json(state.content().get_item(id).await?))
}

/// Text fields only; media is changed through the media routes.
async fn update_item(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    Json(patch): Json<SubItemPatch>,
) -> ApiResult<Json<SubItem>> {
    Ok(Json(state.content().update_item(id, patch).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.content().delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
