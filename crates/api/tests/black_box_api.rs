use chrono::Utc;
use reqwest::StatusCode;
use serde_json::json;

use stocky_auth::{Hs256TokenCodec, NewUser, Role, UserAccount};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = stocky_api::app::build_app(jwt_secret.to_string());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Mint an admin bearer token directly with the server's codec. Admin
/// accounts are provisioned out of band, so tests mint rather than register.
fn mint_admin_token(jwt_secret: &str) -> String {
    let account = UserAccount::register(
        NewUser {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password: "irrelevant".to_string(),
            role: Some(Role::Admin),
        },
        "not-a-real-hash".to_string(),
        Utc::now(),
    )
    .expect("failed to build admin account");

    Hs256TokenCodec::new(jwt_secret.as_bytes())
        .issue_pair(&account, Utc::now())
        .expect("failed to mint admin token")
        .access
}

async fn register_and_login(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
) -> (String, serde_json::Value) {
    let res = client
        .post(format!("{}/api/auth/register", base_url))
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "s3cret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "username": username, "password": "s3cret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (token, body)
}

async fn create_category(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> String {
    let res = client
        .post(format!("{}/api/categories", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

async fn create_product(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    category_id: &str,
    sku: &str,
    stock: u32,
    min_stock: u32,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/api/products", base_url))
        .bearer_auth(token)
        .json(&json!({
            "name": format!("Product {sku}"),
            "category_id": category_id,
            "price": 250,
            "stock": stock,
            "min_stock": min_stock,
            "max_stock": 1000,
            "sku": sku,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/whoami", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .get(format!("{}/api/products", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Health stays public.
    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_login_whoami_round_trip() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token, login_body) = register_and_login(&client, &srv.base_url, "ana").await;
    assert_eq!(login_body["user"]["username"], "ana");
    assert_eq!(login_body["user"]["role"], "user");
    assert!(login_body["user"].get("password_hash").is_none());

    let res = client
        .get(format!("{}/api/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["username"], "ana");
    assert_eq!(body["role"], "user");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    register_and_login(&client, &srv.base_url, "ana").await;
    let res = client
        .post(format!("{}/api/auth/register", srv.base_url))
        .json(&json!({
            "username": "ana",
            "email": "other@example.com",
            "password": "s3cret",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn refresh_token_mints_working_access_token() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (_, login_body) = register_and_login(&client, &srv.base_url, "ana").await;
    let refresh_token = login_body["refresh_token"].as_str().unwrap();

    let res = client
        .post(format!("{}/api/auth/refresh", srv.base_url))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    let new_token = body["token"].as_str().unwrap();

    let res = client
        .get(format!("{}/api/whoami", srv.base_url))
        .bearer_auth(new_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_crud_with_search_and_duplicate_sku() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &srv.base_url, "ana").await;

    let category_id = create_category(&client, &srv.base_url, &token, "Bebidas").await;
    let product =
        create_product(&client, &srv.base_url, &token, &category_id, "COLA-1L", 10, 2).await;
    let product_id = product["id"].as_str().unwrap();
    assert_eq!(product["status"], "active");

    // Same SKU again is rejected.
    let res = client
        .post(format!("{}/api/products", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Clone",
            "category_id": category_id,
            "price": 100,
            "stock": 0,
            "min_stock": 0,
            "max_stock": 10,
            "sku": "COLA-1L",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Search finds it by SKU fragment.
    let res = client
        .get(format!("{}/api/products?search=cola", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["products"][0]["id"], product_id);

    // Update renames; status cannot be forced to low-stock (unknown value).
    let res = client
        .put(format!("{}/api/products/{}", srv.base_url, product_id))
        .bearer_auth(&token)
        .json(&json!({ "name": "Cola 1L" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Cola 1L");

    let res = client
        .put(format!("{}/api/products/{}", srv.base_url, product_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "low-stock" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Delete, then 404.
    let res = client
        .delete(format!("{}/api/products/{}", srv.base_url, product_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = client
        .get(format!("{}/api/products/{}", srv.base_url, product_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn movement_lifecycle_updates_stock_and_ledger() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &srv.base_url, "ana").await;

    let category_id = create_category(&client, &srv.base_url, &token, "Bebidas").await;
    let product =
        create_product(&client, &srv.base_url, &token, &category_id, "COLA-1L", 10, 2).await;
    let product_id = product["id"].as_str().unwrap();

    // Entrada 5: 10 -> 15.
    let res = client
        .post(format!("{}/api/movements", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "product_id": product_id,
            "type": "entrada",
            "quantity": 5,
            "reason": "restock",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let movement: serde_json::Value = res.json().await.unwrap();
    assert_eq!(movement["previous_stock"], 10);
    assert_eq!(movement["new_stock"], 15);
    assert_eq!(movement["category"], "Bebidas");
    assert_eq!(movement["user"], "ana");
    assert_eq!(movement["product"]["sku"], "COLA-1L");

    let res = client
        .get(format!("{}/api/products/{}", srv.base_url, product_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["stock"], 15);

    // Salida beyond stock: rejected, nothing changes.
    let res = client
        .post(format!("{}/api/movements", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "product_id": product_id,
            "type": "salida",
            "quantity": 100,
            "reason": "oversell",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");

    let res = client
        .get(format!("{}/api/products/{}", srv.base_url, product_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["stock"], 15);

    // Unknown movement type is a 400 before any write.
    let res = client
        .post(format!("{}/api/movements", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "product_id": product_id,
            "type": "transfer",
            "quantity": 1,
            "reason": "nope",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Ledger lists exactly the one recorded movement.
    let res = client
        .get(format!("{}/api/movements", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 1);

    // Stats reflect the same single entrada.
    let res = client
        .get(format!("{}/api/movements/stats", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["total_movements"], 1);
    assert_eq!(body["total_entradas"], 5);
}

#[tokio::test]
async fn direct_stock_adjustment_records_a_movement() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();
    let (token, _) = register_and_login(&client, &srv.base_url, "ana").await;

    let category_id = create_category(&client, &srv.base_url, &token, "Bebidas").await;
    let product =
        create_product(&client, &srv.base_url, &token, &category_id, "COLA-1L", 6, 5).await;
    let product_id = product["id"].as_str().unwrap();

    // Salida 2: 6 -> 4, crossing the threshold.
    let res = client
        .patch(format!("{}/api/products/{}/stock", srv.base_url, product_id))
        .bearer_auth(&token)
        .json(&json!({ "type": "salida", "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["previous_stock"], 6);
    assert_eq!(body["new_stock"], 4);
    assert_eq!(body["product"]["status"], "low-stock");
    assert_eq!(body["movement"]["type"], "salida");

    // The direct path writes the same ledger entry as movement creation.
    let res = client
        .get(format!(
            "{}/api/movements/product/{}",
            srv.base_url, product_id
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["movements"][0]["user"], "ana");
}

#[tokio::test]
async fn user_management_requires_admin_role() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let client = reqwest::Client::new();

    let (token, _) = register_and_login(&client, &srv.base_url, "ana").await;
    let res = client
        .get(format!("{}/api/users", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin_token = mint_admin_token(jwt_secret);
    let res = client
        .get(format!("{}/api/users", srv.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["username"], "ana");
}

#[tokio::test]
async fn tasks_are_owner_scoped() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let (token_ana, _) = register_and_login(&client, &srv.base_url, "ana").await;
    let (token_ben, _) = register_and_login(&client, &srv.base_url, "ben").await;

    let res = client
        .post(format!("{}/api/tasks", srv.base_url))
        .bearer_auth(&token_ana)
        .json(&json!({ "description": "count the shelves", "priority": "alta" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let task: serde_json::Value = res.json().await.unwrap();
    let task_id = task["id"].as_str().unwrap();

    // Ben sees nothing and cannot touch Ana's task.
    let res = client
        .get(format!("{}/api/tasks", srv.base_url))
        .bearer_auth(&token_ben)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert!(body.as_array().unwrap().is_empty());

    let res = client
        .put(format!("{}/api/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&token_ben)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Ana completes it.
    let res = client
        .put(format!("{}/api/tasks/{}", srv.base_url, task_id))
        .bearer_auth(&token_ana)
        .json(&json!({ "completed": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["completed"], true);
}
