use crate::config::format_duration;
use crate::limiter::LimiterStats;
use crate::server::error::ApiError;
use crate::server::AppState;
use crate::store::FetchResponse;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Body of `POST /fetch`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchRequest {
    pub urls: Vec<String>,
}

/// Body of an accepted `POST /fetch`
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: &'static str,
    pub total_urls: usize,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FetchStats {
    pub total_urls: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub pending_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CleanupReport {
    pub last_cleanup: Option<DateTime<Utc>>,
    pub total_cleaned: u64,
    pub cleanup_count: u64,
    pub results_in_memory: usize,
    pub ttl: String,
    pub max_results: usize,
    pub cleanup_interval: String,
}

/// Body of `GET /stats`
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub rate_limiter: LimiterStats,
    pub fetch_stats: FetchStats,
    pub cleanup: CleanupReport,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: &'static str,
    pub results_cleared: usize,
}

/// Identifies the caller for admission limiting
///
/// Order: first `X-Forwarded-For` entry, `X-Real-IP`, peer address, `unknown`.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    if let Some(first) = header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn submit_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<FetchRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let key = client_key(&headers, peer.map(|ConnectInfo(addr)| addr));

    if !state.service.allow(&key) {
        tracing::warn!("Rate limit exceeded for client: {}", key);
        return Err(ApiError::RateLimited {
            limit: state.config.rate_limit.requests,
            window: format_duration(state.config.rate_limit_window()),
        });
    }

    let Json(request) = payload.map_err(|e| ApiError::InvalidJson(e.body_text()))?;
    tracing::info!(
        "Received request to fetch {} URLs from client: {}",
        request.urls.len(),
        key
    );

    let batch = state.service.submit(request.urls)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            message: "URLs submitted for fetching",
            total_urls: batch.len(),
            status: "processing",
        }),
    ))
}

pub async fn results_handler(State(state): State<AppState>) -> Json<FetchResponse> {
    Json(state.service.snapshot())
}

pub async fn health_handler() -> &'static str {
    "OK"
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let snapshot = state.service.snapshot();
    let cleanup = state.service.cleanup_stats();
    let retention = &state.config.retention;

    Json(StatsResponse {
        rate_limiter: state.service.limiter_stats(),
        fetch_stats: FetchStats {
            total_urls: snapshot.total_urls,
            success_count: snapshot.success_count,
            failed_count: snapshot.failed_count,
            pending_count: snapshot.pending_count,
        },
        cleanup: CleanupReport {
            last_cleanup: cleanup.last_cleanup,
            total_cleaned: cleanup.total_cleaned,
            cleanup_count: cleanup.cleanup_count,
            results_in_memory: cleanup.results_in_memory,
            ttl: format_duration(state.config.retention_policy().ttl),
            max_results: retention.max_results,
            cleanup_interval: format_duration(state.config.cleanup_interval()),
        },
    })
}

pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let results_cleared = state.service.clear_all();
    tracing::info!("Cleared {} results", results_cleared);

    Json(ClearResponse {
        message: "All results cleared",
        results_cleared,
    })
}
