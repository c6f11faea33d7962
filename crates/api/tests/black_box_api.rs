use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use neurocore_api::config::ApiConfig;
use neurocore_auth::{JwtClaims, Role};
use neurocore_core::{RecordId, TenantId, UserId};
use neurocore_reporting::ExportLimit;
use reqwest::StatusCode;
use serde_json::{Value, json};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(ApiConfig {
            jwt_secret: JWT_SECRET.to_string(),
            ..ApiConfig::default()
        })
        .await
    }

    async fn spawn_with(config: ApiConfig) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = neurocore_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    async fn post(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn put(&self, token: &str, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn delete(&self, token: &str, path: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).bearer_auth(token).send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Caller {
    user_id: UserId,
    token: String,
}

fn mint(tenant_id: TenantId, roles: Vec<Role>) -> Caller {
    let now = Utc::now();
    let user_id = UserId::new();
    let claims = JwtClaims {
        sub: user_id,
        tenant_id,
        roles,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt");
    Caller { user_id, token }
}

fn admin(tenant_id: TenantId) -> Caller {
    mint(tenant_id, vec![Role::client_admin()])
}

fn viewer(tenant_id: TenantId) -> Caller {
    mint(tenant_id, vec![Role::new("viewer")])
}

fn item(sku: &str, stock: i64, min_stock_threshold: i64) -> Value {
    json!({
        "item": {
            "sku": sku,
            "name": format!("item {sku}"),
            "category": "tools",
            "warehouse": "main",
            "status": "active",
            "stock": stock,
            "min_stock_threshold": min_stock_threshold
        }
    })
}

async fn data(res: reqwest::Response) -> Value {
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], true, "unexpected envelope: {body}");
    body["data"].clone()
}

async fn create_item(srv: &TestServer, token: &str, sku: &str, stock: i64, min: i64) -> String {
    let res = srv.post(token, "/neurocore/inventory/items", item(sku, stock, min)).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    data(res).await["item"]["id"].as_str().unwrap().to_string()
}

async fn audit_entries_eventually(srv: &TestServer, token: &str, expected: usize) -> Vec<Value> {
    // Audit records are written by a background task after the file is returned.
    for _ in 0..50 {
        let entries = data(srv.get(token, "/audit/exports").await).await;
        let entries = entries.as_array().unwrap().clone();
        if entries.len() >= expected {
            return entries;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("audit entries did not appear within timeout");
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(body["error"]["message"].is_string());

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn tokens_signed_with_another_secret_are_rejected() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(),
        tenant_id: TenantId::new(),
        roles: vec![Role::client_admin()],
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };
    let forged = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    assert_eq!(srv.get(&forged, "/whoami").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tenant_context_is_derived_from_token() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let caller = admin(tenant_id);

    let res = srv.get(&caller.token, "/whoami").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = data(res).await;
    assert_eq!(body["tenant_id"].as_str().unwrap(), tenant_id.to_string());
    assert_eq!(body["user_id"].as_str().unwrap(), caller.user_id.to_string());
    assert_eq!(body["privileged"], true);
}

#[tokio::test]
async fn item_lifecycle_and_criticality_view() {
    let srv = TestServer::spawn().await;
    let caller = viewer(TenantId::new());
    let token = caller.token.as_str();

    let healthy = create_item(&srv, token, "A-1", 50, 10).await;
    let critical = create_item(&srv, token, "B-2", 1, 20).await;

    // Duplicate sku within the tenant.
    let res = srv.post(token, "/neurocore/inventory/items", item("A-1", 1, 1)).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let view = data(srv.get(token, "/neurocore/inventory/view").await).await;
    let rows = view["items"].as_array().unwrap();
    assert_eq!(rows[0]["id"], critical.as_str());
    assert_eq!(rows[0]["criticality"], 19);
    assert_eq!(rows[1]["criticality"], -40);
    assert_eq!(view["kpis"]["total_stock"], 51);
    assert_eq!(view["kpis"]["low_stock_count"], 1);

    // Update moves the item to the top of the order.
    let res = srv
        .put(token, &format!("/neurocore/inventory/items/{healthy}"), json!({ "item": { "stock": 0, "min_stock_threshold": 100 } }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let view = data(srv.get(token, "/neurocore/inventory/view").await).await;
    assert_eq!(view["items"][0]["id"], healthy.as_str());

    let res = srv.delete(token, &format!("/neurocore/inventory/items/{critical}")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = srv.delete(token, &format!("/neurocore/inventory/items/{critical}")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let items = data(srv.get(token, "/neurocore/inventory/items").await).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn view_filters_by_category() {
    let srv = TestServer::spawn().await;
    let token = viewer(TenantId::new()).token;

    create_item(&srv, &token, "A-1", 5, 1).await;
    let mut other = item("C-3", 5, 1);
    other["item"]["category"] = json!("paint");
    assert_eq!(
        srv.post(&token, "/neurocore/inventory/items", other).await.status(),
        StatusCode::CREATED
    );

    let view = data(srv.get(&token, "/neurocore/inventory/view?category=paint&status=").await).await;
    let rows = view["items"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sku"], "C-3");
    // KPIs cover the whole catalog.
    assert_eq!(view["kpis"]["total_stock"], 10);
}

#[tokio::test]
async fn invalid_payloads_get_field_level_422() {
    let srv = TestServer::spawn().await;
    let token = viewer(TenantId::new()).token;

    let res = srv.post(&token, "/neurocore/inventory/items", item("  ", -1, 0)).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(body["error"]["details"]["sku"].is_array());
    assert!(body["error"]["details"]["stock"].is_array());

    // Shape mismatch (unknown field) fails loudly as well.
    let mut body = item("A-1", 1, 1);
    body["item"]["colour"] = json!("red");
    let res = srv.post(&token, "/neurocore/inventory/items", body).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let mut body = item("A-1", 1, 1);
    body["image"] = json!({ "file_name": "a.png", "content_base64": "%%%" });
    let res = srv.post(&token, "/neurocore/inventory/items", body).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let token = viewer(TenantId::new()).token;
    let res = srv
        .put(&token, "/neurocore/inventory/items/not-a-uuid", json!({ "item": {} }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn item_image_is_stored_and_linked() {
    let srv = TestServer::spawn().await;
    let token = viewer(TenantId::new()).token;

    let mut body = item("IMG-1", 1, 1);
    body["image"] = json!({ "file_name": "photo.png", "content_base64": "aGVsbG8=" });
    let res = srv.post(&token, "/neurocore/inventory/items", body).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let saved = data(res).await;
    let url = saved["item"]["image_url"].as_str().unwrap();
    assert!(url.contains("inventory/IMG-1_"));
    assert!(url.ends_with(".png"));
    assert!(saved.get("image_error").is_none());
}

#[tokio::test]
async fn tenant_isolation_blocks_cross_tenant_reads_and_writes() {
    let srv = TestServer::spawn().await;
    let token1 = admin(TenantId::new()).token;
    let token2 = admin(TenantId::new()).token;

    let id = create_item(&srv, &token1, "A-1", 5, 1).await;

    let items = data(srv.get(&token2, "/neurocore/inventory/items").await).await;
    assert!(items.as_array().unwrap().is_empty());

    let res = srv
        .put(&token2, &format!("/neurocore/inventory/items/{id}"), json!({ "item": { "stock": 1 } }))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Same sku in another tenant is fine.
    create_item(&srv, &token2, "A-1", 5, 1).await;
}

#[tokio::test]
async fn combos_are_gated_by_feature_flag() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let admin = admin(tenant_id);
    let viewer = viewer(tenant_id);

    let res = srv.get(&viewer.token, "/neurocore/inventory/combos").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let flags = data(srv.get(&viewer.token, "/neurocore/features").await).await;
    assert_eq!(flags["NC_INVENTORY_COMBOS"], false);

    // Only admins manage flags.
    let res = srv
        .put(&viewer.token, "/neurocore/features/NC_INVENTORY_COMBOS", json!({ "enabled": true }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let res = srv
        .put(&admin.token, "/neurocore/features/NC_INVENTORY_COMBOS", json!({ "enabled": true }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let base = create_item(&srv, &viewer.token, "BASE", 10, 1).await;
    let res = srv
        .post(
            &viewer.token,
            "/neurocore/inventory/combos",
            json!({
                "combo_name": "Starter kit",
                "combo_price": 25.0,
                "components": [{ "component_item_id": base, "component_qty": 2 }]
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let combo = data(res).await;
    let combo_id = combo["id"].as_str().unwrap().to_string();
    assert_eq!(combo["components"].as_array().unwrap().len(), 1);

    // A referenced item cannot be deleted.
    let res = srv.delete(&viewer.token, &format!("/neurocore/inventory/items/{base}")).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .delete(&viewer.token, &format!("/neurocore/inventory/combos/{combo_id}"))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let combos = data(srv.get(&viewer.token, "/neurocore/inventory/combos").await).await;
    assert!(combos.as_array().unwrap().is_empty());

    let res = srv.delete(&viewer.token, &format!("/neurocore/inventory/items/{base}")).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn package_with_unknown_base_item_is_rejected() {
    let srv = TestServer::spawn().await;
    let admin = admin(TenantId::new());
    srv.put(&admin.token, "/neurocore/features/NC_INVENTORY_COMBOS", json!({ "enabled": true }))
        .await;

    let res = srv
        .post(
            &admin.token,
            "/neurocore/inventory/packages",
            json!({
                "base_item_id": RecordId::new().to_string(),
                "quantity_included": 6,
                "package_price": 12.0
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert!(body["error"]["details"]["base_item_id"].is_array());
}

#[tokio::test]
async fn inventory_export_returns_csv_and_is_audited() {
    let srv = TestServer::spawn().await;
    let caller = viewer(TenantId::new());

    create_item(&srv, &caller.token, "A-1", 50, 10).await;
    create_item(&srv, &caller.token, "B-2", 1, 20).await;

    let res = srv.get(&caller.token, "/neurocore/inventory/export?status=active").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv;charset=utf-8"
    );
    let disposition = res.headers()[reqwest::header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.contains("inventory_"));

    let body = res.text().await.unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(
        lines[0],
        "sku,name,category,warehouse,status,stock,min_stock_threshold,rotation_rate,criticality"
    );
    assert!(lines[1].starts_with("B-2,"));
    assert!(lines[1].ends_with(",19"));
    assert_eq!(lines.len(), 3);

    let entries = audit_entries_eventually(&srv, &caller.token, 1).await;
    assert_eq!(entries[0]["module_code"], "MOD-NC-INV");
    assert_eq!(entries[0]["format"], "CSV");
    assert_eq!(entries[0]["record_count"], 2);
    assert_eq!(entries[0]["user_id"], caller.user_id.to_string());
    assert_eq!(entries[0]["filters"]["status"], "active");
}

#[tokio::test]
async fn export_over_limit_is_rejected_without_audit() {
    let srv = TestServer::spawn_with(ApiConfig {
        jwt_secret: JWT_SECRET.to_string(),
        export_limit: ExportLimit::new(1),
        ..ApiConfig::default()
    })
    .await;
    let token = admin(TenantId::new()).token;

    create_item(&srv, &token, "A-1", 5, 1).await;
    create_item(&srv, &token, "B-2", 5, 1).await;

    let res = srv.get(&token, "/neurocore/inventory/export").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["details"]["rows"], 2);
    assert_eq!(body["error"]["details"]["limit"], 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let entries = data(srv.get(&token, "/audit/exports").await).await;
    assert!(entries.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn customers_are_redacted_for_non_admins() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let admin = admin(tenant_id);
    let viewer = viewer(tenant_id);

    let res = srv
        .post(
            &admin.token,
            "/neurocore/customers",
            json!({
                "name": "Ana",
                "email": "abcdef@example.com",
                "phone": "5551234567",
                "segment": "activo",
                "ltv": 100.0
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    // Ingestion is admin only.
    let res = srv
        .post(&viewer.token, "/neurocore/customers", json!({ "name": "Bo", "segment": "new" }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let seen = data(srv.get(&viewer.token, "/neurocore/customers").await).await;
    assert_eq!(seen["rows"][0]["email"], "ab****@example.com");
    assert_eq!(seen["rows"][0]["phone"], "555****");
    assert_eq!(seen["segments"]["active"], 1);
    assert_eq!(seen["kpis"]["ltv_average"], 100.0);

    let seen = data(srv.get(&admin.token, "/neurocore/customers?segment=active").await).await;
    assert_eq!(seen["rows"][0]["email"], "abcdef@example.com");

    let seen = data(srv.get(&admin.token, "/neurocore/customers?segment=inactive").await).await;
    assert!(seen["rows"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn customer_export_is_admin_only() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let admin = admin(tenant_id);
    let viewer = viewer(tenant_id);

    srv.post(
        &admin.token,
        "/neurocore/customers",
        json!({ "name": "Ana", "email": "ana@example.com", "segment": "new" }),
    )
    .await;

    let res = srv.get(&viewer.token, "/neurocore/customers/export").await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.get(&admin.token, "/neurocore/customers/export?segment=new").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.starts_with("id,name,email,phone,segment,last_purchase_at,ltv,churn_rate,purchase_frequency\n"));
    assert!(body.contains("ana@example.com"));

    let entries = audit_entries_eventually(&srv, &admin.token, 1).await;
    assert_eq!(entries[0]["module_code"], "MOD-NC-CLI");
}

#[tokio::test]
async fn sales_view_filters_series_and_redacts_customer_refs() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let admin = admin(tenant_id);
    let viewer = viewer(tenant_id);

    for (date, channel, total) in [
        ("2025-03-01T10:00:00Z", "web", 10.0),
        ("2025-03-01T15:00:00Z", "web", 5.0),
        ("2025-03-02T09:00:00Z", "store", 7.0),
        ("2025-02-27T09:00:00Z", "web", 3.0),
    ] {
        let res = srv
            .post(
                &admin.token,
                "/neurocore/sales",
                json!({
                    "date": date,
                    "channel": channel,
                    "product_id": "P-1",
                    "qty": 1,
                    "total_amount": total,
                    "currency": "USD",
                    "customer_id": "CUST-12345"
                }),
            )
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let view = data(
        srv.get(&viewer.token, "/neurocore/sales?start=2025-03-01&end=2025-03-03&channel=web")
            .await,
    )
    .await;
    let rows = view["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["customer_id"], "CUST****");
    assert_eq!(view["series"], json!([{ "date": "2025-03-01", "total": 15.0 }]));
    assert_eq!(view["previous_series"], json!([{ "date": "2025-02-27", "total": 3.0 }]));
    assert_eq!(view["kpis"]["average_ticket"], 6.25);
    assert_eq!(view["kpis"]["top_products"][0]["qty"], 4);

    let view = data(srv.get(&admin.token, "/neurocore/sales").await).await;
    assert_eq!(view["rows"][0]["customer_id"], "CUST-12345");

    let res = srv.get(&viewer.token, "/neurocore/sales/export?channel=store").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert_eq!(
        body,
        "date,channel,product_id,qty,total_amount,currency\n2025-03-02T09:00:00+00:00,store,P-1,1,7,USD"
    );
}

#[tokio::test]
async fn user_data_batches_every_source() {
    let srv = TestServer::spawn().await;
    let caller = admin(TenantId::new());
    create_item(&srv, &caller.token, "A-1", 5, 1).await;

    let body = data(srv.get(&caller.token, "/user-data").await).await;
    assert_eq!(body["roles"][0]["role"], "Admin Cliente");
    assert_eq!(body["inventoryItems"].as_array().unwrap().len(), 1);
    for key in ["services", "exports", "notifications", "inventoryAlerts", "syncStatus", "salesOrders", "customers"] {
        assert!(body[key].is_array(), "missing {key}");
    }
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn alerts_are_admin_only_and_validated() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let admin = admin(tenant_id);
    let viewer = viewer(tenant_id);

    let alert = json!({ "threshold": 5, "channel": "email" });
    let res = srv.post(&viewer.token, "/neurocore/inventory/alerts", alert.clone()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .post(&admin.token, "/neurocore/inventory/alerts", json!({ "threshold": -1, "channel": "portal" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = srv.post(&admin.token, "/neurocore/inventory/alerts", alert).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = data(res).await;
    assert_eq!(created["created_by"], admin.user_id.to_string());
}

#[tokio::test]
async fn audit_submissions_are_validated() {
    let srv = TestServer::spawn().await;
    let caller = viewer(TenantId::new());

    let res = srv
        .post(
            &caller.token,
            "/audit/exports",
            json!({ "module_code": "MOD-NC-VTA", "format": "CSV", "record_count": -1 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = srv
        .post(
            &caller.token,
            "/audit/exports",
            json!({ "module_code": "MOD-NC-VTA", "format": "CSV", "filters": { "channel": "web" }, "record_count": 3 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let entry = data(res).await;
    assert_eq!(entry["user_id"], caller.user_id.to_string());
}

#[tokio::test]
async fn selected_service_is_pushed_over_sse() {
    let srv = TestServer::spawn().await;
    let tenant_id = TenantId::new();
    let admin = admin(tenant_id);
    let viewer = viewer(tenant_id);

    // Without an active subscription the selection is refused.
    let res = srv
        .post(&viewer.token, "/services/selected", json!({ "service": "neurocore" }))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .put(
            &admin.token,
            "/services/neurocore/subscriptions",
            json!({ "user_id": viewer.user_id.to_string(), "active": true }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let services = data(srv.get(&viewer.token, "/services").await).await;
    assert_eq!(services, json!(["neurocore"]));

    let mut stream = srv.get(&viewer.token, "/stream").await;
    assert_eq!(stream.status(), StatusCode::OK);

    let res = srv
        .post(&viewer.token, "/services/selected", json!({ "service": "neurocore" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let received = tokio::time::timeout(Duration::from_secs(5), async {
        let mut buf = String::new();
        while let Some(chunk) = stream.chunk().await.unwrap() {
            buf.push_str(&String::from_utf8_lossy(&chunk));
            if buf.contains("event: service.selected") && buf.contains("\"neurocore\"") {
                return buf;
            }
        }
        buf
    })
    .await
    .expect("no service.selected event within timeout");

    assert!(received.contains(&viewer.user_id.to_string()));
}
