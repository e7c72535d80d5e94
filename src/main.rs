use std::net::SocketAddr;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use tutorwise_analytics::config::Config;
use tutorwise_analytics::services::recommendation::RecommendationAssembler;
use tutorwise_analytics::state::AppState;
use tutorwise_analytics::{db, logging, routes};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config.log_level);

    let database = match db::Database::from_env().await {
        Ok(database) => Some(database),
        Err(err) => {
            tracing::warn!(error = %err, "database not initialized, analytics endpoints disabled");
            None
        }
    };

    let state = AppState::new(database, RecommendationAssembler::from_env());

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_addr();
    tracing::info!(%addr, "analytics engine listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind listener failed");

    let server = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        tracing::error!(error = %err, "server error");
    }

    tracing::info!("shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
