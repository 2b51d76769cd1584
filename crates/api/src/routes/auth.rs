use std::convert::Infallible;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use folio_core::auth::Session;
use folio_core::events::FolioEvent;
use futures::stream::Stream;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::error::ApiResult;
use crate::middleware::auth::AdminSession;
use crate::state::AppState;

/// Operator sign-in, sign-out and auth-state notifications.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/session", get(session))
        .route("/v1/auth/events", get(events))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.auth().sign_in(&request.email, &request.password)?))
}

async fn logout(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> ApiResult<StatusCode> {
    state.auth().sign_out(&session.token)?;
    Ok(StatusCode::NO_CONTENT)
}

/// The caller's session, or `null` when the token is missing or no longer valid.
async fn session(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Json<Option<Session>> {
    Json(bearer.and_then(|TypedHeader(Authorization(bearer))| {
        state.auth().get_session(bearer.token())
    }))
}

/// Server-sent stream of every event published after the subscription.
async fn events(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.event_bus().subscribe();

    let stream = BroadcastStream::new(rx)
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Event stream lagged: {e}");
                None
            }
        })
        .map(|event: FolioEvent| {
            Ok(Event::default()
                .event(event.name())
                .data(serde_json::to_string(&event).unwrap_or_default()))
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
