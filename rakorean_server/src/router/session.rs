use axum::{extract::State, response::Json, routing::get, Router};

use rakorean_core::{identity::Identity, sync::LoadSummary};

use crate::{
    error::Result,
    payload::{SessionRequest, SessionResponse},
    state::AppState,
};

pub fn session_router() -> Router<AppState> {
    Router::new().route("/session", get(get_session).put(start_session).delete(end_session))
}

async fn get_session(State(app_state): State<AppState>) -> Json<SessionResponse> {
    let engine = app_state.engine().await;
    let identity = engine.identity();
    Json(SessionResponse {
        signed_in: identity.is_authenticated(),
        principal: identity.principal().cloned(),
    })
}

async fn start_session(
    State(app_state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<Json<LoadSummary>> {
    let identity = Identity::authenticated(request.into());
    let summary = app_state.start_session(identity).await?;
    Ok(Json(summary))
}

async fn end_session(State(app_state): State<AppState>) -> Result<Json<LoadSummary>> {
    let summary = app_state.start_session(Identity::anonymous()).await?;
    Ok(Json(summary))
}
