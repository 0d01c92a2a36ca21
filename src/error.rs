// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::config::ConfigError;
use crate::db::DataError;

/// Message shown for failures whose details are for operators only.
const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
    }

    pub fn bad_gateway() -> Self {
        Self::new(StatusCode::BAD_GATEWAY, GENERIC_FAILURE)
    }
}

/// Configuration problems surface to users as a generic failure.
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        error!(error = %err, "Action aborted by configuration error");
        Self::internal()
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        warn!(error = %err, "Database request failed");
        Self::bad_gateway()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}
