//! Product API 模块
//!
//! 包含菜单视图、库存可用性、套餐组件与配品。

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::permissions::MENU_MANAGE;
use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/menu", get(handler::menu))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/availability", get(handler::availability))
        .route("/{id}/components", get(handler::components))
        .route("/{id}/complements", get(handler::complements));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/components", put(handler::replace_components))
        .route("/{id}/complements", put(handler::replace_complements))
        .layer(middleware::from_fn(require_permission(MENU_MANAGE)));

    read_routes.merge(manage_routes)
}
