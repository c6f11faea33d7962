//! Response envelope shared by every JSON endpoint.
//!
//! Success: `{"ok": true, "data": ...}`. Failure (see [`super::errors`]):
//! `{"ok": false, "error": {"message": ..., "details": ...}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use super::errors::ApiError;

pub type ApiResult = Result<Response, ApiError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult {
    respond(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> ApiResult {
    respond(StatusCode::CREATED, data)
}

fn respond<T: Serialize>(status: StatusCode, data: T) -> ApiResult {
    let data = serde_json::to_value(data).map_err(|e| ApiError::Internal(format!("response encoding failed: {e}")))?;
    Ok((status, Json(json!({ "ok": true, "data": data }))).into_response())
}
