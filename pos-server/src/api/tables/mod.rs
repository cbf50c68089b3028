//! Dining Table API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::{TABLES_MANAGE, TABLES_READ};
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/active-order", get(handler::active_order))
        .layer(middleware::from_fn(require_permission(TABLES_READ)));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/status", put(handler::set_status))
        .layer(middleware::from_fn(require_permission(TABLES_MANAGE)));

    read_routes.merge(manage_routes)
}
