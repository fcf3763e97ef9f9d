//! HTTP transport: REST search endpoints plus MCP over SSE.
//!
//! Compiled behind the `http-server` feature. The REST surface mirrors
//! the MCP tools for non-MCP clients:
//!    - `GET  /`        service banner
//!    - `GET  /health`  liveness probe
//!    - `GET  /stats`   corpus counts
//!    - `POST /search`  hybrid search
//! MCP clients connect at `/mcp/sse` (SSE) and `/mcp/message` (POST).

#[cfg(feature = "http-server")]
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

#[cfg(feature = "http-server")]
use crate::error::SearchError;
#[cfg(feature = "http-server")]
use crate::mcp::ListingSearchServer;
use crate::search::SearchEngine;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[cfg(feature = "http-server")]
pub async fn serve_http(engine: SearchEngine, bind: String) -> anyhow::Result<()> {
    use std::time::Duration;

    use axum::Router;
    use axum::routing::{get, post};
    use rmcp::transport::{SseServer, sse_server::SseServerConfig};
    use tokio_util::sync::CancellationToken;
    use tower_http::cors::CorsLayer;

    let ct = CancellationToken::new();
    let addr: std::net::SocketAddr = bind.parse()?;

    let sse_config = SseServerConfig {
        bind: addr,
        sse_path: "/mcp/sse".to_string(),
        post_path: "/mcp/message".to_string(),
        ct: ct.clone(),
        sse_keep_alive: Some(Duration::from_secs(15)),
    };
    let (sse_server, sse_router) = SseServer::new(sse_config);

    // Each SSE connection gets its own handler over the shared engine.
    let engine_for_service = engine.clone();
    sse_server.with_service(move || ListingSearchServer::new(engine_for_service.clone()));

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/search", post(search))
        .with_state(engine)
        .merge(sse_router)
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "HTTP server listening");
    tracing::info!("SSE endpoint: http://{bind}/mcp/sse");

    let server = axum::serve(listener, router);
    tokio::select! {
        result = server => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down HTTP server");
            ct.cancel();
        }
    }
    Ok(())
}

#[cfg(feature = "http-server")]
async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "mieszko",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/stats", "/search", "/mcp/sse"],
    }))
}

#[cfg(feature = "http-server")]
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(feature = "http-server")]
async fn stats(State(engine): State<SearchEngine>) -> Response {
    match engine.stats() {
        Ok(stats) => Json(serde_json::json!({
            "total_listings": stats.total_listings,
            "rent_listings": stats.rent_listings,
            "sale_listings": stats.sale_listings,
            "status": "ok",
        }))
        .into_response(),
        Err(error) => error_response(&error),
    }
}

#[cfg(feature = "http-server")]
async fn search(
    State(engine): State<SearchEngine>,
    Json(request): Json<SearchRequest>,
) -> Response {
    match engine.search(&request.query, request.max_results).await {
        Ok(outcome) => Json(serde_json::json!({
            "results": outcome.results,
            "total": outcome.results.len(),
            "status": outcome.status,
        }))
        .into_response(),
        Err(error) => error_response(&error),
    }
}

#[cfg(feature = "http-server")]
fn error_response(error: &SearchError) -> Response {
    tracing::error!(%error, "request failed");
    let status = match error {
        SearchError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({
            "error": error.to_string(),
            "code": error.status_code(),
        })),
    )
        .into_response()
}

#[cfg(not(feature = "http-server"))]
pub async fn serve_http(_engine: SearchEngine, _bind: String) -> anyhow::Result<()> {
    eprintln!("HTTP server support is not compiled in.");
    eprintln!("Please rebuild with: cargo build --features http-server");
    std::process::exit(1);
}
