//! 订单全流程 (HTTP)
//!
//! 建单占桌、状态推进释放桌台、套餐扣减组件库存、结账记入现金流水、
//! 版本冲突与背靠背的终态写入。

mod common;

use common::{TestApp, error_code, line};
use http::StatusCode;
use pos_server::ErrorCode;
use serde_json::json;
use shared::message::EventType;
use shared::models::OrderSnapshot;

#[tokio::test]
async fn delivered_order_frees_its_table_and_is_broadcast() {
    let app = TestApp::new().await;
    let table = app.create_table(5).await;
    let beer = app.create_product("CERVEZA", 60.0, false).await;
    let mut rx = app.state.message_bus.subscribe();

    let (status, order) = app
        .post("/api/orders", json!({ "table_id": table, "items": [line(beer, 2)] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["status"], "pendiente");
    assert_eq!(order["total"], 120.0);
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(app.table_status(table).await, "ocupada");

    let id = order["id"].as_i64().unwrap();
    let (status, snapshot) = app
        .put(&format!("/api/orders/{id}/status"), json!({ "status": "entregada" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{snapshot}");
    assert_eq!(snapshot["estado"], "entregada");
    assert_eq!(app.table_status(table).await, "disponible");

    // created + status change, both full snapshots
    let mut published = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if msg.event_type == EventType::OrderUpdated {
            published.push(msg.parse_payload::<OrderSnapshot>().unwrap());
        }
    }
    assert_eq!(published.len(), 2);
    assert_eq!(published[1].estado.as_str(), "entregada");
    assert_eq!(published[1].mesa_numero, Some(5));
    assert_eq!(published[1].productos[0].color, "#6c757d");

    let (_, active) = app.get("/api/orders/active").await;
    assert!(active.as_array().unwrap().is_empty());

    let (_, history) = app.get(&format!("/api/orders/{id}/history")).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn occupied_table_rejects_a_second_order() {
    let app = TestApp::new().await;
    let table = app.create_table(3).await;
    let beer = app.create_product("CERVEZA", 60.0, false).await;

    let (status, _) = app
        .post("/api/orders", json!({ "table_id": table, "items": [line(beer, 1)] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post("/api/orders", json!({ "table_id": table, "items": [line(beer, 1)] }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), u64::from(ErrorCode::TableOccupied.code()));

    let (_, overview) = app.get(&format!("/api/tables/{table}")).await;
    assert_eq!(overview["can_accept_orders"], false);
    assert!(overview["active_order_id"].is_i64());
}

#[tokio::test]
async fn combo_sale_consumes_component_stock() {
    let app = TestApp::new().await;
    let beer = app.create_product("CERVEZA", 60.0, false).await;
    let cubeta = app.create_product("CUBETA", 300.0, true).await;
    app.restock(beer, 8).await;

    let (status, body) = app
        .put(
            &format!("/api/products/{cubeta}/components"),
            json!([{ "component_id": beer, "quantity": 6 }]),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, availability) = app.get(&format!("/api/products/{cubeta}/availability")).await;
    assert_eq!(availability["is_available"], true);
    assert_eq!(availability["current_stock"], 1);

    let (status, order) = app
        .post("/api/orders", json!({ "items": [line(cubeta, 1)] }))
        .await;
    assert_eq!(status, StatusCode::OK, "{order}");
    assert_eq!(order["total"], 300.0);

    let (_, stock) = app.get(&format!("/api/inventory/{beer}")).await;
    assert_eq!(stock["quantity"], 2);

    // 2 beers left, the cubeta needs 6
    let (_, availability) = app.get(&format!("/api/products/{cubeta}/availability")).await;
    assert_eq!(availability["is_available"], false);

    let (status, body) = app
        .post("/api/orders", json!({ "items": [line(cubeta, 1)] }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), u64::from(ErrorCode::ProductOutOfStock.code()));
    assert!(body["details"]["shortages"].is_array());
}

#[tokio::test]
async fn combo_blocked_by_one_empty_component() {
    let app = TestApp::new().await;
    let p = app.create_product("P", 40.0, false).await;
    let q = app.create_product("Q", 40.0, false).await;
    let combo = app.create_product("COMBO", 100.0, true).await;
    app.restock(p, 5).await;
    let (status, _) = app
        .post(
            "/api/inventory/movements",
            json!({ "product_id": q, "movement_type": "ajuste", "quantity": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    app.put(
        &format!("/api/products/{combo}/components"),
        json!([{ "component_id": p, "quantity": 2 }, { "component_id": q, "quantity": 1 }]),
    )
    .await;

    let (_, availability) = app.get(&format!("/api/products/{combo}/availability")).await;
    assert_eq!(availability["is_available"], false);
    let shortages = availability["shortages"].as_array().unwrap();
    assert_eq!(shortages.len(), 1);
    assert_eq!(shortages[0]["component_id"], q);
}

#[tokio::test]
async fn illegal_jump_and_stale_version_are_rejected() {
    let app = TestApp::new().await;
    let beer = app.create_product("CERVEZA", 60.0, false).await;
    let (_, order) = app.post("/api/orders", json!({ "items": [line(beer, 1)] })).await;
    let id = order["id"].as_i64().unwrap();
    let version = order["version"].as_i64().unwrap();

    let (status, _) = app
        .put(
            &format!("/api/orders/{id}/status"),
            json!({ "status": "en_proceso", "expected_version": version }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .put(
            &format!("/api/orders/{id}/status"),
            json!({ "status": "lista", "expected_version": version }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), u64::from(ErrorCode::OrderVersionConflict.code()));

    app.put(&format!("/api/orders/{id}/status"), json!({ "status": "cancelada" }))
        .await;
    let (status, body) = app
        .put(&format!("/api/orders/{id}/status"), json!({ "status": "pendiente" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&body), u64::from(ErrorCode::OrderInvalidTransition.code()));
    assert_eq!(body["details"]["from"], "cancelada");
}

#[tokio::test]
async fn back_to_back_terminal_writes_keep_the_first() {
    let app = TestApp::new().await;
    let table = app.create_table(9).await;
    let beer = app.create_product("CERVEZA", 60.0, false).await;
    let (_, order) = app
        .post("/api/orders", json!({ "table_id": table, "items": [line(beer, 1)] }))
        .await;
    let id = order["id"].as_i64().unwrap();
    let version = order["version"].as_i64().unwrap();
    let uri = format!("/api/orders/{id}/status");

    let (a, b) = tokio::join!(
        app.put(&uri, json!({ "status": "entregada", "expected_version": version })),
        app.put(&uri, json!({ "status": "cancelada", "expected_version": version })),
    );
    // The loser sees either the terminal state or the bumped version
    let statuses = [a.0, b.0];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert!(statuses.iter().any(|s| {
        *s == StatusCode::CONFLICT || *s == StatusCode::UNPROCESSABLE_ENTITY
    }));

    let (_, detail) = app.get(&format!("/api/orders/{id}")).await;
    let winner = if a.0 == StatusCode::OK { "entregada" } else { "cancelada" };
    assert_eq!(detail["status"], winner);
    assert_eq!(app.table_status(table).await, "disponible");
}

#[tokio::test]
async fn cash_checkout_lands_in_the_open_register() {
    let app = TestApp::new().await;
    let beer = app.create_product("CERVEZA", 60.0, false).await;

    let (status, register) = app
        .post("/api/cash-registers/open", json!({ "opening_amount": 500.0 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{register}");
    let register_id = register["id"].as_i64().unwrap();

    let (_, order) = app.post("/api/orders", json!({ "items": [line(beer, 3)] })).await;
    let id = order["id"].as_i64().unwrap();

    let (status, paid) = app
        .post(&format!("/api/orders/{id}/pay"), json!({ "payment_method": "efectivo" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{paid}");
    assert_eq!(paid["is_paid"], true);

    let (status, body) = app
        .post(&format!("/api/orders/{id}/pay"), json!({ "payment_method": "tarjeta" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), u64::from(ErrorCode::OrderAlreadyPaid.code()));

    let (_, movements) = app
        .get(&format!("/api/cash-registers/{register_id}/movements"))
        .await;
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["amount"], 180.0);
    assert_eq!(movements[0]["order_id"], id);
}

#[tokio::test]
async fn empty_cart_and_unknown_product() {
    let app = TestApp::new().await;

    let (status, body) = app.post("/api/orders", json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), u64::from(ErrorCode::OrderEmpty.code()));

    let (status, body) = app.post("/api/orders", json!({ "items": [line(999, 1)] })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), u64::from(ErrorCode::ProductNotFound.code()));
}

#[tokio::test]
async fn destroying_an_active_order_frees_the_table() {
    let app = TestApp::new().await;
    let table = app.create_table(2).await;
    let beer = app.create_product("CERVEZA", 60.0, false).await;
    let (_, order) = app
        .post("/api/orders", json!({ "table_id": table, "items": [line(beer, 1)] }))
        .await;
    let id = order["id"].as_i64().unwrap();

    let (status, _) = app.delete(&format!("/api/orders/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.table_status(table).await, "disponible");

    let (status, _) = app.get(&format!("/api/orders/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
