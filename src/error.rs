// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error responses for the informational endpoints.
//!
//! The log and games endpoints answer failures with the
//! `{code, status: "error", message}` shape. Callback endpoints use the
//! callback envelope from `models` instead; their numeric error codes
//! live in [`codes`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Numeric error codes of the callback protocol.
pub mod codes {
    /// Unexpected failure in the lookup/compute path.
    pub const UNKNOWN_ERROR: u32 = 1000;
    /// Signature mismatch.
    pub const INVALID_SIGNATURE: u32 = 1001;
    /// A required field is absent or malformed.
    pub const INVALID_PARAMETERS: u32 = 1003;
    /// The player does not exist.
    pub const PLAYER_NOT_FOUND: u32 = 1004;
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    status: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            code: self.status.as_u16(),
            status: "error",
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("Invalid page number");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "Invalid page number");

        let internal = ApiError::internal("boom");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn into_response_returns_wire_shape() {
        let response = ApiError::bad_request("No logs found").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["code"], 400);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "No logs found");
    }
}
