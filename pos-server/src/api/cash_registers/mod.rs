//! Cash Register API 模块 (caja)

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::permissions::CASH_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cash-registers", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/current", get(handler::current))
        .route("/open", post(handler::open))
        .route("/{id}/close", post(handler::close))
        .route(
            "/{id}/movements",
            get(handler::movements).post(handler::record_movement),
        )
        .layer(middleware::from_fn(require_permission(CASH_MANAGE)))
}
