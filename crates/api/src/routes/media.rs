use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use folio_core::media::{FileUpload, MediaInput};
use folio_core::model::{MediaCollection, MediaMetadata};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AdminSession;
use crate::state::AppState;

/// Media collection of a single sub-item.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/items/{id}/media", get(list_media).post(upload_media))
        .route("/v1/items/{id}/media/youtube", post(add_youtube))
        .route("/v1/items/{id}/media/{index}", delete(remove_media))
}

async fn list_media(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MediaCollection>> {
    Ok(Json(state.media().load(id).await?))
}

/// Multipart upload: a `file` part plus `title`, `description` and `altText`
/// text parts.
async fn upload_media(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MediaCollection>)> {
    let mut file = None;
    let mut metadata = MediaMetadata::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                file = Some(FileUpload {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "title" => metadata.title = field.text().await?,
            "description" => metadata.description = non_empty(field.text().await?),
            "altText" => metadata.alt_text = non_empty(field.text().await?),
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let upload = file.ok_or_else(|| ApiError::BadRequest("a file part is required".into()))?;
    let media = state.embed().validate(MediaInput::file(upload, metadata))?;
    let collection = state.media().add(id, media).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YoutubeRequest {
    url: String,
    title: String,
    description: Option<String>,
    alt_text: Option<String>,
}

async fn add_youtube(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
    Json(request): Json<YoutubeRequest>,
) -> ApiResult<(StatusCode, Json<MediaCollection>)> {
    let metadata = MediaMetadata {
        title: request.title,
        description: request.description.and_then(non_empty),
        thumbnail: None,
        alt_text: request.alt_text.and_then(non_empty),
    };
    let media = state
        .embed()
        .validate(MediaInput::youtube(request.url, metadata))?;
    let collection = state.media().add(id, media).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

/// Out-of-range indexes leave the collection unchanged.
async fn remove_media(
    State(state): State<AppState>,
    _session: AdminSession,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<MediaCollection>> {
    Ok(Json(state.media().remove(id, index).await?))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
