//! Diagnostic message API
//!
//! POST /api/message/emit pushes a notification through the bus so the
//! dashboards' connectivity can be checked from the back office.

use axum::{Extension, Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use shared::message::{NotificationLevel, NotificationPayload};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;
use crate::utils::validation::{MAX_NAME_LEN, MAX_NOTE_LEN, validate_required_text};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/message/emit", post(emit))
}

#[derive(Debug, Deserialize)]
pub struct EmitRequest {
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub level: Option<NotificationLevel>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct EmitResponse {
    /// 收到消息的看板数量
    pub receivers: usize,
}

/// POST /api/message/emit
pub async fn emit(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<EmitRequest>,
) -> AppResult<Json<EmitResponse>> {
    validate_required_text(&req.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&req.message, "message", MAX_NOTE_LEN)?;

    let level = req.level.unwrap_or(NotificationLevel::Info);
    let mut payload = NotificationPayload::new(level, req.title, req.message);
    if let Some(data) = req.data {
        payload = payload.with_data(data);
    }

    let receivers = state.notifier.notification(&payload)?;
    tracing::info!(operator = %current_user.username, receivers, "Diagnostic message emitted");
    Ok(Json(EmitResponse { receivers }))
}
