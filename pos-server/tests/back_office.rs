//! 后台配置：币种、设置、角色与用户，以及文件数据库

mod common;

use common::{TestApp, error_code, line};
use http::StatusCode;
use pos_server::{Config, ErrorCode};
use serde_json::json;

#[tokio::test]
async fn currency_conversion_and_default_switch() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/api/currencies/convert", json!({ "amount": 100.0, "from": "MXN", "to": "USD" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["converted"], 5.5);

    let (status, eur) = app
        .post(
            "/api/currencies",
            json!({ "code": "EUR", "name": "Euro", "symbol": "€", "exchange_rate": 0.05 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{eur}");

    let (status, body) = app
        .post(
            "/api/currencies",
            json!({ "code": "EUR", "name": "Euro", "symbol": "€", "exchange_rate": 0.05 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), u64::from(ErrorCode::CurrencyCodeExists.code()));

    let eur_id = eur["id"].as_i64().unwrap();
    let (status, _) = app.put(&format!("/api/currencies/{eur_id}/default"), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = app.get("/api/currencies").await;
    let defaults: Vec<_> = all
        .as_array()
        .unwrap()
        .iter()
        .filter(|c| c["is_default"] == true)
        .map(|c| c["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(defaults, vec!["EUR"]);

    let (status, body) = app
        .post("/api/currencies/convert", json!({ "amount": 1.0, "from": "XXX", "to": "USD" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), u64::from(ErrorCode::CurrencyNotFound.code()));
}

#[tokio::test]
async fn settings_are_typed() {
    let app = TestApp::new().await;

    let (status, theme) = app.put("/api/settings/theme", json!({ "value": "dark" })).await;
    assert_eq!(status, StatusCode::OK, "{theme}");
    assert_eq!(theme["value"], "dark");

    let (status, body) = app.put("/api/settings/theme", json!({ "value": 3 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), u64::from(ErrorCode::SettingTypeMismatch.code()));

    let (status, body) = app
        .put("/api/settings/default_currency", json!({ "value": "JPY" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), u64::from(ErrorCode::CurrencyNotFound.code()));

    let (status, body) = app.get("/api/settings/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), u64::from(ErrorCode::SettingNotFound.code()));
}

#[tokio::test]
async fn roles_and_users() {
    let app = TestApp::new().await;

    let (status, role) = app
        .post(
            "/api/roles",
            json!({ "name": "Hostess", "slug": "hostess", "permissions": ["tables:*"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{role}");
    let role_id = role["id"].as_i64().unwrap();

    let (status, _) = app
        .post(
            "/api/roles",
            json!({ "name": "Bad", "slug": "bad", "permissions": ["kitchen:cook"] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, user) = app
        .post("/api/users", json!({ "name": "Lucía", "username": "lucia", "role_id": role_id }))
        .await;
    assert_eq!(status, StatusCode::OK, "{user}");

    let (status, body) = app
        .post("/api/users", json!({ "name": "Otra", "username": "lucia", "role_id": role_id }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), u64::from(ErrorCode::UsernameExists.code()));

    let (status, body) = app.delete(&format!("/api/roles/{role_id}")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error_code(&body), u64::from(ErrorCode::RoleInUse.code()));

    // seeded admin role
    let (status, _) = app.delete("/api/roles/1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // the admin token belongs to user 1
    let (status, _) = app.delete("/api/users/1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn granting_all_requires_an_admin() {
    let app = TestApp::new().await;
    let manager = app.token_for(5, "gerente", &["users:manage"]);
    let (status, body) = app
        .request(
            http::Method::POST,
            "/api/roles",
            Some(&manager),
            Some(json!({ "name": "Dueño", "slug": "owner", "permissions": ["all"] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(error_code(&body), u64::from(ErrorCode::AdminRequired.code()));

    let (status, body) = app
        .request(
            http::Method::POST,
            "/api/users",
            Some(&manager),
            Some(json!({ "name": "Root", "username": "root2", "role_id": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(error_code(&body), u64::from(ErrorCode::AdminRequired.code()));
}

#[tokio::test]
async fn file_database_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        work_dir: dir.path().to_string_lossy().into_owned(),
        database_path: Some(dir.path().join("pos.db").to_string_lossy().into_owned()),
        ..Config::for_tests()
    };

    let order_id = {
        let app = TestApp::with_config(config.clone()).await;
        let table = app.create_table(7).await;
        let beer = app.create_product("CERVEZA", 60.0, false).await;
        let (status, order) = app
            .post("/api/orders", json!({ "table_id": table, "items": [line(beer, 2)] }))
            .await;
        assert_eq!(status, StatusCode::OK, "{order}");
        app.state.pool.close().await;
        order["id"].as_i64().unwrap()
    };

    let app = TestApp::with_config(config).await;
    let (status, order) = app.get(&format!("/api/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["total"], 120.0);

    let (_, active) = app.get("/api/orders/active").await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    assert_eq!(active[0]["mesa_numero"], 7);
}
