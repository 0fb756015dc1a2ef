use crate::HarvestError;
use axum::{
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const RATE_LIMIT_WINDOW: HeaderName = HeaderName::from_static("x-ratelimit-window");

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Errors surfaced by the HTTP layer
#[derive(Debug)]
pub enum ApiError {
    /// Admission denied for the client key
    RateLimited { limit: u32, window: String },

    /// Request body was not a valid `{"urls": [...]}` document
    InvalidJson(String),

    /// Service-level failure of a submission
    Service(HarvestError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::Service(HarvestError::EmptyBatch) => StatusCode::BAD_REQUEST,
            Self::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::RateLimited { limit, window } => ErrorBody {
                error: "Rate limit exceeded".to_string(),
                message: format!("Maximum {} requests per {} allowed", limit, window),
            },
            Self::InvalidJson(detail) => ErrorBody {
                error: "Invalid JSON payload".to_string(),
                message: detail.clone(),
            },
            Self::Service(e @ HarvestError::EmptyBatch) => ErrorBody {
                error: "Invalid request".to_string(),
                message: e.to_string(),
            },
            Self::Service(e) => ErrorBody {
                error: "Internal error".to_string(),
                message: e.to_string(),
            },
        }
    }
}

impl From<HarvestError> for ApiError {
    fn from(err: HarvestError) -> Self {
        Self::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();

        if let Self::RateLimited { limit, window } = &self {
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(*limit));
            if let Ok(value) = HeaderValue::from_str(window) {
                headers.insert(RATE_LIMIT_WINDOW, value);
            }
        }

        response
    }
}
