// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::error::DashboardError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub status: StatusCode,
}

impl ApiError {
    pub fn external_error(message: impl Into<String>) -> Self {
        ApiError {
            message: message.into(),
            status: StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        let status = match err {
            DashboardError::InvalidRange { .. } | DashboardError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            DashboardError::UnknownTicker { .. } => StatusCode::NOT_FOUND,
            DashboardError::Fetch { .. } => StatusCode::BAD_GATEWAY,
            DashboardError::InsufficientData { .. } | DashboardError::InvalidBaseline { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError {
            message: err.to_string(),
            status,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
