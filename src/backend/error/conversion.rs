/**
 * Error Conversion
 *
 * Renders a `BackendError` as an HTTP response:
 * ```json
 * {
 *   "error": "board 6f1c... not found",
 *   "status": 404
 * }
 * ```
 * Server-side failures are logged here so handlers can simply use `?`.
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use crate::backend::error::types::BackendError;

impl BackendError {
    /// JSON body shared by HTTP responses and socket acknowledgements
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.message(),
            "status": self.status_code().as_u16(),
        })
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }

        (status, Json(self.to_json())).into_response()
    }
}
