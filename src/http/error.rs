//! API error type and its HTTP mapping.
//!
//! Every variant knows its status code and the security event tag recorded
//! for it. The tag travels to the audit layer as a response extension.

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::roms::RejectReason;
use crate::store::SecurityEventKind;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by API handlers and middleware.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", .0.message())]
    InvalidRomName(RejectReason),

    #[error("Invalid request format.")]
    InvalidRequestFormat,

    #[error("Request structure too complex.")]
    RequestTooComplex,

    #[error("{0}")]
    MalformedBody(String),

    #[error("Request body too large.")]
    PayloadTooLarge,

    #[error("Too many requests. Please try again later.")]
    RateLimited { limit: u32, retry_after_secs: u64 },

    #[error("Route {0} not found")]
    NotFound(String),

    #[error("Method not allowed.")]
    MethodNotAllowed,

    /// `message` goes to the client; `detail` only to the log.
    #[error("{message}")]
    Internal { message: &'static str, detail: String },
}

impl ApiError {
    pub fn internal(message: &'static str, detail: impl ToString) -> Self {
        Self::Internal {
            message,
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRomName(_)
            | Self::InvalidRequestFormat
            | Self::RequestTooComplex
            | Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Security event tag recorded for this rejection.
    pub fn kind(&self) -> SecurityEventKind {
        match self {
            Self::InvalidRomName(reason) => (*reason).into(),
            Self::InvalidRequestFormat => SecurityEventKind::InvalidRequestFormat,
            Self::RequestTooComplex => SecurityEventKind::RequestTooComplex,
            Self::MalformedBody(_) => SecurityEventKind::MalformedBody,
            Self::PayloadTooLarge => SecurityEventKind::PayloadTooLarge,
            Self::RateLimited { .. } => SecurityEventKind::RateLimited,
            Self::NotFound(_) => SecurityEventKind::NotFound,
            Self::MethodNotAllowed | Self::Internal { .. } => SecurityEventKind::HttpError,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::MalformedBody(rejection.body_text())
        }
    }
}

/// Marker left on error responses for the audit layer.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub kind: SecurityEventKind,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal { message, detail } = &self {
            tracing::error!(error = %detail, "{message}");
        }

        let status = self.status();
        let message = self.to_string();
        let rejection = Rejection {
            kind: self.kind(),
            message: message.clone(),
        };

        let mut response = (status, Json(ErrorBody { error: message })).into_response();
        if let ApiError::RateLimited {
            limit,
            retry_after_secs,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
            headers.insert("ratelimit-limit", HeaderValue::from(limit));
            headers.insert("ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert("ratelimit-reset", HeaderValue::from(retry_after_secs));
        }
        response.extensions_mut().insert(rejection);
        response
    }
}
