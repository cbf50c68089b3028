//! Inventory API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::INVENTORY_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/inventory", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/movements", get(handler::movements))
        .route("/{product_id}", get(handler::get_by_product));

    let manage_routes = Router::new()
        .route("/movements", post(handler::record_movement))
        .route("/{product_id}", put(handler::set_thresholds))
        .layer(middleware::from_fn(require_permission(INVENTORY_MANAGE)));

    read_routes.merge(manage_routes)
}
