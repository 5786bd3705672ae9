//! HTTP mapping for the pipeline error taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::core::ExecError;

impl IntoResponse for ExecError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ExecError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ExecError::HostNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ExecError::HostNotOnline { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            ExecError::Internal(e) => {
                // Detail stays server-side; the caller gets a category only
                tracing::error!(error = format!("{:#}", e), "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
