use std::collections::HashMap;

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::SETTINGS;
use crate::core::standings;
use crate::core::store::SharedStore;
use crate::error::BoardResult;

/// The leaderboard API router: CORS on the outside, `/api` prefix
/// stripping inside it, JSON handlers at the core.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/leaderboard", get(leaderboard))
        .route("/search", get(search))
        .fallback(not_found)
        .with_state(store)
        .layer(middleware::from_fn(strip_api_prefix))
        .layer(middleware::from_fn(cors))
}

/// Bind the configured port and serve until ctrl-c. Bind failures
/// propagate to the caller, which exits the process.
pub async fn serve(store: SharedStore) -> BoardResult<()> {
    let listener = TcpListener::bind(("0.0.0.0", SETTINGS.port)).await?;
    info!(
        "leaderboard server running on :{} (users={})",
        SETTINGS.port,
        store.user_count()
    );
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn root() -> Response {
    json_response(StatusCode::OK, &json!({ "status": "backend running" }))
}

async fn health() -> Response {
    json_response(StatusCode::OK, &json!({ "status": "ok" }))
}

async fn leaderboard(
    State(store): State<SharedStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let page = query_int(&params, "page", 1);
    let limit = query_int(&params, "limit", 20);
    json_response(
        StatusCode::OK,
        &standings::leaderboard_page(&store, page, limit),
    )
}

async fn search(
    State(store): State<SharedStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let query = params
        .get("query")
        .filter(|q| !q.is_empty())
        .or_else(|| params.get("q"))
        .map(String::as_str)
        .unwrap_or("");
    let page = query_int(&params, "page", 1);
    let limit = query_int(&params, "limit", 20);
    json_response(
        StatusCode::OK,
        &standings::search_page(&store, query, page, limit),
    )
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 page not found\n").into_response()
}

/// Query parameters never fail a request: anything unparseable falls back
/// to its default.
fn query_int(params: &HashMap<String, String>, key: &str, fallback: i64) -> i64 {
    params
        .get(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(fallback)
}

fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    match serde_json::to_string_pretty(payload) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Wide-open CORS: every response advertises `*`, and preflights echo the
/// requested headers and methods back before short-circuiting with 204.
async fn cors(req: Request, next: Next) -> Response {
    let allow_headers = header_or(&req, "access-control-request-headers", "*");
    let allow_methods = header_or(&req, "access-control-request-method", "GET, OPTIONS");
    let preflight = req.method() == Method::OPTIONS;

    let mut response = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if let Ok(value) = HeaderValue::from_str(&allow_headers) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, value);
    }
    if let Ok(value) = HeaderValue::from_str(&allow_methods) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, value);
    }
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("600"));
    response
}

fn header_or(req: &Request, name: &str, fallback: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Requests arriving under an `/api` base path are rewritten before
/// routing so the service can sit behind a path-prefixed proxy.
async fn strip_api_prefix(mut req: Request, next: Next) -> Response {
    if let Some(rest) = req.uri().path().strip_prefix("/api") {
        if rest.is_empty() || rest.starts_with('/') {
            let path = if rest.is_empty() { "/" } else { rest };
            let path_and_query = match req.uri().query() {
                Some(query) => format!("{path}?{query}"),
                None => path.to_string(),
            };
            if let Ok(uri) = path_and_query.parse::<Uri>() {
                *req.uri_mut() = uri;
            }
        }
    }
    next.run(req).await
}
