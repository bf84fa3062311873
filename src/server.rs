use axum::middleware;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::cache_invalidation_middleware;
use crate::config::Config;
use crate::db::{create_pool, migrations, DbPool};
use crate::error_pages::{error_page_middleware, fallback_handler};
use crate::handlers;
use crate::state::AppState;

/// Build the application state and Axum router from a [`Config`].
///
/// Creates the database pool and runs migrations before assembling the
/// router.
pub fn build_app(config: Config) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    let db = create_pool(&config.database_path)?;
    build_app_with_pool(db, config)
}

/// Like [`build_app`], but over an existing pool (tests use an in-memory one).
pub fn build_app_with_pool(
    db: DbPool,
    config: Config,
) -> Result<(AppState, Router), Box<dyn std::error::Error>> {
    {
        let conn = db.get()?;
        migrations::run_migrations(&conn, &config.migrations_path)?;
    }

    let static_path = config.static_path.clone();
    let state = AppState::new(db, config);
    let app = router(state.clone())
        .nest_service("/static", ServeDir::new(static_path))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http());

    Ok((state, app))
}

/// Routes plus the middleware every request passes through.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::routes())
        .fallback(fallback_handler)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            cache_invalidation_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_page_middleware,
        ))
        .with_state(state)
}

/// Bind the router to `host:port` and spawn the server as a tokio task.
///
/// Returns the actual port the server bound to (useful when `port` is 0 for
/// OS-assigned ports) and a [`JoinHandle`] for the server task.
pub async fn serve(
    app: Router,
    host: &str,
    port: u16,
) -> Result<(u16, JoinHandle<()>), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    let actual_port = listener.local_addr()?.port();

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Server error");
        }
    });

    Ok((actual_port, handle))
}
