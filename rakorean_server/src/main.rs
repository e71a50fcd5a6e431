mod config;
mod error;
mod payload;
mod router;
mod state;

use axum::Router;
use dotenvy::dotenv;
use tower_http::trace::TraceLayer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use crate::{config::ServerConfig, state::AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Initialize logger
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env()
        .unwrap()
        .add_directive("hyper::proto=info".parse().unwrap())
        .add_directive("hyper::client=info".parse().unwrap())
        .add_directive("reqwest=info".parse().unwrap());
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    // 2. Read config and open the session
    let config = ServerConfig::from_env().expect("cannot read server config");
    let app_state = AppState::new(config.supabase).expect("cannot connect to Supabase");
    match app_state.start_session(config.identity).await {
        Ok(summary) => tracing::info!("Loaded {} posts", summary.posts),
        Err(err) => tracing::warn!("Initial load failed, starting with an empty forum: {}", err),
    }

    // 3. Setup router
    let app = Router::new()
        .merge(router::session::session_router())
        .merge(router::view::view_router())
        .merge(router::post::post_router())
        .layer(TraceLayer::new_for_http().on_request(()))
        .with_state(app_state);

    // 4. Start server
    tracing::info!("Server starting at {}", config.address);
    axum::Server::bind(&config.address.parse().unwrap())
        .serve(app.into_make_service())
        .await
        .unwrap();
}
