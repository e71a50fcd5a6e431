use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};

use rakorean_core::{model::Category, view::RenderTree, view::View};

use crate::{error::Result, state::AppState};

pub fn view_router() -> Router<AppState> {
    Router::new()
        .route("/view/home", get(home))
        .route("/view/category/:category", get(category_feed))
}

async fn home(State(app_state): State<AppState>) -> Json<RenderTree> {
    let engine = app_state.engine().await;
    Json(engine.render(&View::Home).await)
}

async fn category_feed(State(app_state): State<AppState>, Path(category): Path<String>) -> Result<Json<RenderTree>> {
    let category = category.parse::<Category>()?;
    let engine = app_state.engine().await;
    Ok(Json(engine.render(&View::Category(category)).await))
}
