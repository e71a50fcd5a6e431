use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};

use rakorean_core::{
    model::{Category, Comment},
    sync::{LikeState, LoadSummary, PostCreated},
    view::{RenderTree, View},
};

use crate::{
    error::Result,
    payload::{NewCommentRequest, NewPostRequest},
    state::AppState,
};

pub fn post_router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync))
        .route("/post", post(create_post))
        .route("/post/:id", get(get_post))
        .route("/post/:id/like", post(toggle_like))
        .route("/post/:id/comment", post(add_comment))
        .route("/post/:id/comments", post(reload_comments))
}

async fn sync(State(app_state): State<AppState>) -> Result<Json<LoadSummary>> {
    let engine = app_state.engine().await;
    Ok(Json(engine.load_all().await?))
}

async fn get_post(State(app_state): State<AppState>, Path(id): Path<String>) -> Json<RenderTree> {
    let engine = app_state.engine().await;

    // Comments are pulled when a post is opened without any
    let needs_comments = engine
        .state()
        .await
        .cache
        .get(&id)
        .map_or(false, |post| post.comments.is_empty());
    if needs_comments {
        if let Err(err) = engine.load_comments(&id).await {
            tracing::warn!("Cannot load comments of post {}: {}", id, err);
        }
    }

    Json(engine.render(&View::PostDetail(id)).await)
}

async fn create_post(
    State(app_state): State<AppState>,
    Json(request): Json<NewPostRequest>,
) -> Result<Json<PostCreated>> {
    let category = request.category.parse::<Category>()?;
    let engine = app_state.engine().await;
    let created = engine.create_post(category, &request.title, &request.content).await?;
    Ok(Json(created))
}

async fn toggle_like(State(app_state): State<AppState>, Path(id): Path<String>) -> Result<Json<LikeState>> {
    let engine = app_state.engine().await;
    Ok(Json(engine.toggle_like(&id).await?))
}

async fn add_comment(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<NewCommentRequest>,
) -> Result<Json<Comment>> {
    let engine = app_state.engine().await;
    Ok(Json(engine.add_comment(&id, &request.content).await?))
}

async fn reload_comments(State(app_state): State<AppState>, Path(id): Path<String>) -> Result<Json<RenderTree>> {
    let engine = app_state.engine().await;
    engine.load_comments(&id).await?;
    Ok(Json(engine.render(&View::PostDetail(id)).await))
}
