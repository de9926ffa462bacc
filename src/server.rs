//! Gateway Server
//!
//! Binds the API router to a listener with request tracing and permissive
//! CORS. All state is constructed by the caller and handed in; nothing here
//! reads the environment.

use crate::api::{self, ApiState};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub async fn run_server(state: Arc<ApiState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Lingua Gateway listening on {}", addr);
    info!("  POST /translate/chinese    - Translate Chinese text");
    info!("  POST /correct/english      - Correct English grammar");
    info!("  POST /tasks/prepare        - Register an input payload");
    info!("  POST /tasks/claim          - Bind an on-chain task id (internal)");
    info!("  GET  /tasks/input/:hash    - Fetch a prepared input (internal)");
    info!("  POST /tasks/:id/result     - Store a task result (internal)");
    info!("  POST /tasks/:id/status     - Force a terminal status (internal)");
    info!("  GET  /tasks/:id            - Public task view");
    info!("  GET  /health               - Liveness check");

    axum::serve(listener, app).await?;

    Ok(())
}
