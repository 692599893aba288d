//! End-to-end HTTP tests through the full middleware stack

use std::net::SocketAddr;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::models::Role;
use tempfile::TempDir;
use tower::ServiceExt;
use warehouse_server::api::build_app;
use warehouse_server::auth::password::hash_password;
use warehouse_server::db::{DbService, users};
use warehouse_server::{Config, ServerState};

struct TestApp {
    _dir: TempDir,
    state: ServerState,
    app: Router,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warehouse.db");
        let path = path.to_str().unwrap();
        let db = DbService::new(path).await.unwrap();
        let state = ServerState::new(Config::for_tests(path), db);

        for (username, role) in [
            ("supervisor", Role::Supervisor),
            ("admin.inbound", Role::AdminInbound),
        ] {
            let hash = hash_password("secret-pass").unwrap();
            users::create(state.pool(), username, &hash, role).await.unwrap();
        }

        let app = build_app(&state).with_state(state.clone());
        Self {
            _dir: dir,
            state,
            app,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn login(&self, username: &str) -> String {
        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/auth/login",
                None,
                json!({ "username": username, "password": "secret-pass" }),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn user_id(&self, username: &str) -> i64 {
        users::find_by_username(self.state.pool(), username)
            .await
            .unwrap()
            .unwrap()
            .id
    }
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_login_and_me() {
    let app = TestApp::new().await;
    let token = app.login("admin.inbound").await;

    let (status, body) = app.send(get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin.inbound");
    assert_eq!(body["role"], "admin_inbound");
}

#[tokio::test]
async fn test_bad_password_is_rejected() {
    let app = TestApp::new().await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "supervisor", "password": "wrong" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn test_api_requires_token() {
    let app = TestApp::new().await;

    let (status, _) = app.send(get("/api/arrivals", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.send(get("/api/arrivals", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_resource_crud_roundtrip() {
    let app = TestApp::new().await;
    let token = app.login("admin.inbound").await;

    let (status, created) = app
        .send(json_request(
            "POST",
            "/api/arrivals",
            Some(&token),
            json!({ "date": "25/12/2024", "receipt_no": "RCV-1", "po_qty": 4 }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["date"], "2024-12-25");
    assert_eq!(created["item_type"], "Barang Jual");
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = app
        .send(json_request(
            "PUT",
            &format!("/api/arrivals/{id}"),
            Some(&token),
            json!({ "po_qty": 9 }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["po_qty"], 9);
    assert_eq!(updated["receipt_no"], "RCV-1");

    let (status, _) = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/arrivals/{id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.send(get(&format!("/api/arrivals/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_missing_required_field() {
    let app = TestApp::new().await;
    let token = app.login("admin.inbound").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/locations",
            Some(&token),
            json!({ "zone": "A" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("location"));
}

fn raw_request(uri: &str, token: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_malformed_requests_are_validation_errors() {
    let app = TestApp::new().await;
    let token = app.login("admin.inbound").await;

    let cases = [
        raw_request("/api/arrivals", &token, Some("application/json"), "{bad json"),
        raw_request("/api/arrivals", &token, None, r#"{"receipt_no":"R1"}"#),
        raw_request(
            "/api/arrivals/bulk-delete",
            &token,
            Some("application/json"),
            r#"{"ids":"x"}"#,
        ),
        get("/api/arrivals/abc", Some(&token)),
    ];

    for request in cases {
        let uri = request.uri().to_string();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
        assert_eq!(body["code"], 2, "{uri}");
        assert!(!body["message"].as_str().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_sync_requires_confirmation() {
    let app = TestApp::new().await;
    let token = app.login("supervisor").await;
    let rows = json!([
        { "location": "A-01-01" },
        { "location": "A-01-02" },
    ]);

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/locations/sync",
            Some(&token),
            json!({ "data": rows }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 3001);
    assert_eq!(body["details"]["existing_count"], 0);
    assert_eq!(body["details"]["new_count"], 2);

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/locations/sync",
            Some(&token),
            json!({ "data": rows, "confirm": true }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "synced": 2, "total": 2, "replaced": 0 }));
}

#[tokio::test]
async fn test_import_and_bulk_delete() {
    let app = TestApp::new().await;
    let token = app.login("admin.inbound").await;

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/qc-returns/import",
            Some(&token),
            json!({ "data": [
                { "qc_date": "2024-06-01", "sku": "A" },
                { "qc_date": "2024-06-02", "sku": "B" },
                { "qc_date": "2024-06-03", "sku": "C" },
            ]}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["imported"], 3);

    let (_, rows) = app.send(get("/api/qc-returns", Some(&token))).await;
    let ids: Vec<i64> = rows
        .as_array()
        .unwrap()
        .iter()
        .take(2)
        .map(|r| r["id"].as_i64().unwrap())
        .collect();

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/qc-returns/bulk-delete",
            Some(&token),
            json!({ "ids": ids }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (_, rows) = app.send(get("/api/qc-returns", Some(&token))).await;
    assert_eq!(rows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_clock_reads_are_public() {
    let app = TestApp::new().await;
    let (status, body) = app.send(get("/api/clock/employees", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_clock_writes_need_warehouse_network() {
    let app = TestApp::new().await;
    let attendance = json!({ "date": "2024-07-01", "nik": "E-001", "clock_in": "08:00" });

    let outside = from_peer(
        json_request("POST", "/api/clock/attendances", None, attendance.clone()),
        "203.0.113.7:5000",
    );
    let (status, body) = app.send(outside).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2003);

    let inside = from_peer(
        json_request("POST", "/api/clock/attendances", None, attendance),
        "192.168.6.20:5000",
    );
    let (status, body) = app.send(inside).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["nik"], "E-001");
}

#[tokio::test]
async fn test_login_rate_limited_after_five_attempts() {
    let app = TestApp::new().await;
    let attempt = || {
        let mut request = json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "supervisor", "password": "wrong" }),
        );
        request
            .headers_mut()
            .insert("x-forwarded-for", "198.51.100.4".parse().unwrap());
        request
    };

    for _ in 0..5 {
        let (status, _) = app.send(attempt()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (status, body) = app.send(attempt()).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["details"]["retry_after"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn test_user_management_rules() {
    let app = TestApp::new().await;
    let admin = app.login("admin.inbound").await;
    let supervisor = app.login("supervisor").await;
    let supervisor_id = app.user_id("supervisor").await;
    let admin_id = app.user_id("admin.inbound").await;

    // Non-super roles cannot manage accounts
    let (status, _) = app.send(get("/api/users", Some(&admin))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(json_request(
            "POST",
            "/api/users",
            Some(&supervisor),
            json!({ "username": "admin.inbound", "password": "x", "role": "leader" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = app
        .send(json_request(
            "POST",
            "/api/users",
            Some(&supervisor),
            json!({ "username": "night.shift", "password": "x", "role": "wizard" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/users/{supervisor_id}"))
                .header(header::AUTHORIZATION, format!("Bearer {supervisor}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Own password change needs the current password
    let (status, _) = app
        .send(json_request(
            "PUT",
            &format!("/api/users/{admin_id}/password"),
            Some(&admin),
            json!({ "current_password": "wrong", "new_password": "next-pass" }),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(json_request(
            "PUT",
            &format!("/api/users/{admin_id}/password"),
            Some(&admin),
            json!({ "current_password": "secret-pass", "new_password": "next-pass" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(json_request(
            "PUT",
            &format!("/api/users/{admin_id}/role"),
            Some(&supervisor),
            json!({ "role": "admin_inventory" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, listed) = app.send(get("/api/users", Some(&supervisor))).await;
    let admin_row = listed
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "admin.inbound")
        .unwrap();
    assert_eq!(admin_row["role"], "admin_inventory");
    assert!(admin_row.get("password_hash").is_none());
}
