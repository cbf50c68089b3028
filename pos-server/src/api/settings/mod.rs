//! Settings API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::permissions::SETTINGS_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/settings", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{key}", get(handler::get_by_key));

    let manage_routes = Router::new()
        .route("/{key}", put(handler::update))
        .layer(middleware::from_fn(require_permission(SETTINGS_MANAGE)));

    read_routes.merge(manage_routes)
}
