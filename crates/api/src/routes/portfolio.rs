use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use folio_core::content::PortfolioSection;
use folio_core::media::{to_embed_url, youtube_thumbnail_url, youtube_video_id};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::state::AppState;

/// Public read-only routes for rendering the portfolio.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/portfolio", get(portfolio))
        .route("/v1/embed", get(embed))
}

async fn portfolio(State(state): State<AppState>) -> ApiResult<Json<Vec<PortfolioSection>>> {
    Ok(Json(state.content().portfolio().await?))
}

#[derive(Debug, Deserialize)]
struct EmbedQuery {
    url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedResponse {
    embed_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
}

/// Convert a share URL into its embeddable form.
async fn embed(Query(query): Query<EmbedQuery>) -> Json<EmbedResponse> {
    let video_id = youtube_video_id(&query.url).map(str::to_string);
    Json(EmbedResponse {
        embed_url: to_embed_url(&query.url),
        thumbnail: video_id.as_deref().map(youtube_thumbnail_url),
        video_id,
    })
}
