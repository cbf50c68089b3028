//! 集成测试公共工具
//!
//! 每个测试一份内存数据库 + 完整路由，通过 `tower::ServiceExt::oneshot` 发请求。

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use pos_server::api::build_app;
use pos_server::{Config, ServerState};
use serde_json::{Value, json};
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub state: ServerState,
    pub admin: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(Config::for_tests()).await
    }

    pub async fn with_config(config: Config) -> Self {
        let state = ServerState::initialize(&config)
            .await
            .expect("server state should initialize");
        let app = build_app(state.clone());
        let admin = token(&state, 1, "admin", "admin", &["all"]);
        Self { app, state, admin }
    }

    /// Token for an arbitrary role and permission set
    pub fn token_for(&self, user_id: i64, role: &str, permissions: &[&str]) -> String {
        token(&self.state, user_id, role, role, permissions)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(&self.admin), None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(&self.admin), Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(&self.admin), Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, Some(&self.admin), None).await
    }

    // ========== Fixtures ==========

    pub async fn create_table(&self, number: i64) -> i64 {
        let (status, body) = self
            .post("/api/tables", json!({ "number": number, "capacity": 4 }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn create_product(&self, code: &str, price: f64, is_combo: bool) -> i64 {
        let (status, body) = self
            .post(
                "/api/products",
                json!({ "name": code, "code": code, "price": price, "is_combo": is_combo }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["id"].as_i64().unwrap()
    }

    pub async fn restock(&self, product_id: i64, quantity: i64) {
        let (status, body) = self
            .post(
                "/api/inventory/movements",
                json!({ "product_id": product_id, "movement_type": "entrada", "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    pub async fn table_status(&self, table_id: i64) -> String {
        let (status, body) = self.get(&format!("/api/tables/{table_id}")).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["status"].as_str().unwrap().to_string()
    }
}

fn token(state: &ServerState, user_id: i64, username: &str, role: &str, permissions: &[&str]) -> String {
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
    state
        .jwt_service
        .generate_token(user_id, username, role, &permissions)
        .unwrap()
}

/// `code` field of an error envelope
pub fn error_code(body: &Value) -> u64 {
    body["code"].as_u64().unwrap_or_default()
}

pub fn line(product_id: i64, quantity: i64) -> Value {
    json!({ "product_id": product_id, "quantity": quantity })
}
