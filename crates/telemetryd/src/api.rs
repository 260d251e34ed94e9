//! HTTP API
//!
//! Thin axum glue over the poller and the trap store. Handlers validate
//! the path address, call into the core and map the error taxonomy onto
//! status codes.

use crate::error::TelemetryError;
use crate::polling::poller::{PollRequest, Poller};
use crate::polling::strategy::DeviceSnapshot;
use crate::trapping::store::{TrapEvent, TrapStore};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use snmp_types::epoch_secs;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub poller: Arc<Poller>,
    pub store: Arc<TrapStore>,
}

/// Subscription operation result.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriptionResponse {
    pub ip_address: String,
    pub timestamp: i64,
    pub message: String,
}

/// Accumulated traps for one device.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetTrapsResponse {
    pub timestamp: i64,
    pub traps: Vec<TrapEvent>,
}

/// Optional poll overrides; unset fields use the configured defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PollParams {
    pub port: Option<u16>,
    pub community: Option<String>,
    pub strategy: Option<String>,
}

impl IntoResponse for TelemetryError {
    fn into_response(self) -> Response {
        let status = match self {
            TelemetryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TelemetryError::DeviceUnreachable(_) => StatusCode::BAD_GATEWAY,
            TelemetryError::NoSubscription(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "Detail": self.to_string() }));
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/debug", get(debug_dump))
        .route("/poll/{ip}", get(poll_device))
        .route(
            "/subscription/{ip}",
            put(create_subscription)
                .get(get_subscription)
                .delete(delete_subscription),
        )
        .route("/traps/{ip}", get(get_traps))
        .with_state(state)
}

async fn ping() -> &'static str {
    "pong"
}

/// Raw dump of the trap store, for troubleshooting.
async fn debug_dump(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "data": state.store.dump() }))
}

async fn poll_device(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Query(params): Query<PollParams>,
) -> Result<Json<DeviceSnapshot>, TelemetryError> {
    let request = PollRequest {
        ip,
        port: params.port,
        community: params.community,
        strategy: params.strategy,
    };
    let snapshot = state.poller.poll(&request).await?;
    Ok(Json(snapshot))
}

fn validate_ip(ip: &str) -> Result<(), TelemetryError> {
    ip.parse::<std::net::IpAddr>().map(|_| ()).map_err(|_| {
        TelemetryError::InvalidInput(format!("'{}' is not a valid IP address", ip))
    })
}

async fn create_subscription(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), TelemetryError> {
    validate_ip(&ip)?;
    let created = state.store.create_subscription(&ip);
    let message = if created {
        "subscription created".to_string()
    } else {
        "subscription already exists".to_string()
    };
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse {
            ip_address: ip,
            timestamp: epoch_secs(),
            message,
        }),
    ))
}

async fn get_subscription(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<SubscriptionResponse>, TelemetryError> {
    validate_ip(&ip)?;
    if !state.store.has_subscription(&ip) {
        return Err(TelemetryError::NoSubscription(ip));
    }
    Ok(Json(SubscriptionResponse {
        ip_address: ip,
        timestamp: epoch_secs(),
        message: "subscription active".to_string(),
    }))
}

async fn delete_subscription(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<SubscriptionResponse>, TelemetryError> {
    validate_ip(&ip)?;
    if !state.store.delete_subscription(&ip) {
        return Err(TelemetryError::NoSubscription(ip));
    }
    Ok(Json(SubscriptionResponse {
        ip_address: ip,
        timestamp: epoch_secs(),
        message: "subscription deleted".to_string(),
    }))
}

async fn get_traps(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<GetTrapsResponse>, TelemetryError> {
    validate_ip(&ip)?;
    let traps = state.store.get_traps(&ip)?;
    Ok(Json(GetTrapsResponse {
        timestamp: epoch_secs(),
        traps,
    }))
}
