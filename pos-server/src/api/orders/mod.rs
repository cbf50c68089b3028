//! Order API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::{
    ORDERS_CHECKOUT, ORDERS_CREATE, ORDERS_DESTROY, ORDERS_READ, ORDERS_UPDATE,
};
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/active", get(handler::active))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/history", get(handler::history))
        .layer(middleware::from_fn(require_permission(ORDERS_READ)));

    let create_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission(ORDERS_CREATE)));

    let update_routes = Router::new()
        .route("/{id}/status", put(handler::update_status))
        .route("/{id}/recalculate", post(handler::recalculate))
        .layer(middleware::from_fn(require_permission(ORDERS_UPDATE)));

    let checkout_routes = Router::new()
        .route("/{id}/pay", post(handler::pay))
        .layer(middleware::from_fn(require_permission(ORDERS_CHECKOUT)));

    let destroy_routes = Router::new()
        .route("/{id}", axum::routing::delete(handler::destroy))
        .layer(middleware::from_fn(require_permission(ORDERS_DESTROY)));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(checkout_routes)
        .merge(destroy_routes)
}
