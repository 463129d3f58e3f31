//! REST API surface: the HTTP side of the bridge.
//!
//! `GET /write-url` and `GET /validate-token` each turn into one command on
//! the serial link. `/status` and `/discover` expose the link lifecycle so an
//! operator can reconnect without restarting the process.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use tokio::net::TcpListener;

use crate::{
    error::{AppError, AppResult},
    link::LinkStatus,
    service::LinkService,
};

#[derive(Clone)]
pub struct RestContext {
    pub service: LinkService,
}

// ---------- Query DTOs ----------
#[derive(Debug, Deserialize)]
pub struct WriteUrlParams {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateTokenParams {
    pub token: Option<String>,
}

// ---------- Router Builder ----------
pub fn build_router(ctx: RestContext) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/discover", post(discover))
        .route("/write-url", get(write_url))
        .route("/validate-token", get(validate_token))
        .with_state(ctx)
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, ctx: RestContext, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown)
        .await
}

// ---------- Handlers ----------
async fn health() -> &'static str {
    "ok"
}

async fn status(State(ctx): State<RestContext>) -> AppResult<Json<LinkStatus>> {
    Ok(Json(ctx.service.status().await?))
}

async fn discover(State(ctx): State<RestContext>) -> AppResult<Json<Value>> {
    let port_name = ctx.service.connect().await?;
    Ok(Json(json!({"status": "success", "port_name": port_name})))
}

async fn write_url(
    State(ctx): State<RestContext>,
    Query(params): Query<WriteUrlParams>,
) -> AppResult<Json<Value>> {
    let url = required(params.url, "url")?;
    let response = ctx.service.write_url(url).await?;
    Ok(Json(json!({"status": "success", "response": response})))
}

async fn validate_token(
    State(ctx): State<RestContext>,
    Query(params): Query<ValidateTokenParams>,
) -> AppResult<Json<Value>> {
    // An empty token still goes to the device, which decides.
    let token = params.token.ok_or(AppError::MissingParameter("token"))?;
    if !ctx.service.validate_token(token).await? {
        return Err(AppError::InvalidToken);
    }
    Ok(Json(json!({"status": "ok", "token_validated": true})))
}

fn required(value: Option<String>, name: &'static str) -> AppResult<String> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(AppError::MissingParameter(name))
}
