//! Dashboard WebSocket endpoint
//!
//! GET /api/ws?token=<JWT>
//! 浏览器 WebSocket 不支持自定义 header，令牌走 query 参数，升级前校验。
//!
//! 服务端 → 看板: 总线消息原样转发为 `{"type", "request_id", "data"}` 文本帧。
//! 落后时发送 `{"type":"resync"}`，看板应重新轮询。

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::AppError;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::{CurrentUser, authenticate};
use crate::core::ServerState;

const PING_INTERVAL: Duration = Duration::from_secs(30);
const RESYNC_FRAME: &str = r#"{"type":"resync"}"#;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/ws", get(handle_ws))
}

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// GET /api/ws?token=<JWT>
pub async fn handle_ws(
    State(state): State<ServerState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate(&state.jwt_service, &query.token).inspect_err(|e| {
        crate::security_log!("WARN", "ws_auth_failed", reason = e.message.clone());
    })?;
    Ok(ws.on_upgrade(move |socket| ws_session(socket, state, user)))
}

async fn ws_session(socket: WebSocket, state: ServerState, user: CurrentUser) {
    let (mut sink, mut stream) = socket.split();
    let mut bus_rx = state.message_bus.subscribe();
    let shutdown = state.message_bus.shutdown_token().clone();

    tracing::info!(user = %user.username, role = %user.role, "Dashboard WS connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = bus_rx.recv() => {
                match event {
                    Ok(msg) => {
                        let frame = match msg.to_ws_frame() {
                            Ok(frame) => frame,
                            Err(e) => {
                                tracing::error!(event = %msg.event_type, error = %e, "Failed to encode WS frame");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(user = %user.username, lagged = n, "Dashboard subscriber lagged, requesting resync");
                        bus_rx = state.message_bus.subscribe();
                        if sink.send(Message::Text(RESYNC_FRAME.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // 看板只读，其余帧忽略
                    _ => {}
                }
            }
        }
    }

    tracing::info!(user = %user.username, "Dashboard WS disconnected");
}
