mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gradebook_api::{AppState, AppStateInner, Storage};
use gradebook_db::Database;
use gradebook_gateway::Dispatcher;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradebook=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.has_placeholder_secret() {
        warn!("GRADEBOOK_JWT_SECRET is unset or a placeholder; set a real secret outside development");
    }

    let db = Database::open(&config.db_path)?;
    let uploads = Storage::new(config.upload_dir.clone()).await?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        dispatcher: Dispatcher::new(),
        uploads,
        jwt_secret: config.jwt_secret.as_str().into(),
        default_student_password: config.default_student_password.clone(),
    });

    let app = gradebook_api::router(state, config.max_upload_bytes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Gradebook server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gradebook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
