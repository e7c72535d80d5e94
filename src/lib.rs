pub mod config;
pub mod db;
pub mod logging;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::recommendation::RecommendationAssembler;
use crate::state::AppState;

pub async fn create_app() -> axum::Router {
    let database = match db::Database::from_env().await {
        Ok(database) => Some(database),
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized");
            None
        }
    };

    let state = AppState::new(database, RecommendationAssembler::from_env());

    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
