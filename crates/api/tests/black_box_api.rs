use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use letmebuy_auth::{JwtClaims, Role};
use letmebuy_core::UserId;
use letmebuy_infra::Repositories;
use reqwest::StatusCode;
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over in-memory tables, bound to an ephemeral port.
        let app = letmebuy_api::app::build_app(JWT_SECRET, Repositories::in_memory());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, client: reqwest::Client::new(), handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client.post(self.url(path)).bearer_auth(token).json(&body).send().await.unwrap()
    }

    async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client.put(self.url(path)).bearer_auth(token).json(&body).send().await.unwrap()
    }

    async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client.delete(self.url(path)).bearer_auth(token).send().await.unwrap()
    }

    /// POST that must succeed; returns the created body.
    async fn create(&self, path: &str, token: &str, body: Value) -> Value {
        let res = self.post(path, token, body).await;
        let status = res.status();
        if status != StatusCode::CREATED {
            let body = res.text().await.unwrap_or_default();
            panic!("expected 201 from POST {path}, got {status} body={body}");
        }
        res.json().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user_id: i64, roles: &[&str]) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(user_id),
        roles: roles.iter().map(|r| Role::new(r.to_string())).collect(),
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn admin() -> String {
    mint_jwt(100, &["ADMIN"])
}

fn operator() -> String {
    mint_jwt(101, &["OPERATOR"])
}

async fn error_code(res: reqwest::Response) -> String {
    let body: Value = res.json().await.unwrap();
    body["error"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn health_is_public_and_tagged_with_request_id() {
    let srv = TestServer::spawn().await;
    let res = srv.get("/health", None).await;

    assert_eq!(res.status(), StatusCode::OK);
    let request_id = res.headers().get("x-request-id").expect("request id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36);
}

#[tokio::test]
async fn whoami_requires_a_token_and_reports_roles() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/whoami", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.get("/whoami", Some(&mint_jwt(7, &["operator"]))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], 7);
    assert_eq!(body["roles"], json!(["OPERATOR"]));
    assert_eq!(body["admin"], false);
}

#[tokio::test]
async fn bad_tokens_are_rejected_even_on_public_routes() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/products", Some("not-a-jwt")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_token");

    let now = Utc::now();
    let expired = JwtClaims {
        sub: UserId::new(1),
        roles: vec![Role::ADMIN],
        issued_at: now - ChronoDuration::hours(2),
        expires_at: now - ChronoDuration::hours(1),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &expired,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();
    let res = srv.get("/categories", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn catalog_is_public_to_read_and_staff_only_to_write() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/products", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["content"], json!([]));
    assert_eq!(page["total_elements"], 0);
    assert_eq!(page["size"], 12);

    let res = srv
        .client
        .post(srv.url("/categories"))
        .json(&json!({ "name": "Books" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let client = mint_jwt(5, &["CLIENT"]);
    let res = srv.post("/categories", &client, json!({ "name": "Books" })).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "access_denied");
}

#[tokio::test]
async fn category_with_products_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let token = operator();

    let res = srv.post("/categories", &token, json!({ "name": "Books" })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.headers().get("location").unwrap(), "/categories/1");
    let category: Value = res.json().await.unwrap();
    assert_eq!(category["id"], 1);

    let product = srv
        .create(
            "/products",
            &token,
            json!({ "name": "The Rust Book", "price_cents": 4990, "category_id": 1 }),
        )
        .await;
    let product_path = format!("/products/{}", product["id"]);

    let res = srv.get(&product_path, None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let fetched: Value = res.json().await.unwrap();
    assert_eq!(fetched["name"], "The Rust Book");
    assert_eq!(fetched["price_cents"], 4990);

    let res = srv.delete("/categories/1", &token).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "integrity_violation");

    assert_eq!(srv.delete(&product_path, &token).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(srv.delete(&product_path, &token).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.delete("/categories/1", &token).await.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn product_for_missing_category_is_an_integrity_violation() {
    let srv = TestServer::spawn().await;
    let res = srv
        .post(
            "/products",
            &operator(),
            json!({ "name": "Phone", "price_cents": 100, "category_id": 9 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "integrity_violation");
}

#[tokio::test]
async fn product_listing_filters_sorts_and_pages() {
    let srv = TestServer::spawn().await;
    let token = operator();

    srv.create("/categories", &token, json!({ "name": "Books" })).await;
    srv.create("/categories", &token, json!({ "name": "Electronics" })).await;
    for (name, price, category) in [
        ("Smart TV", 219_000, 2),
        ("Macbook Pro", 1_250_000, 2),
        ("The Lord of the Rings", 9_050, 1),
        ("PC Gamer", 120_000, 2),
    ] {
        srv.create(
            "/products",
            &token,
            json!({ "name": name, "price_cents": price, "category_id": category }),
        )
        .await;
    }

    let res = srv.get("/products?category_id=2&sort=price,desc&size=2", None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total_elements"], 3);
    assert_eq!(page["total_pages"], 2);
    let names: Vec<&str> = page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Macbook Pro", "Smart TV"]);

    let res = srv.get("/products?name=pc", None).await;
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["name"], "PC Gamer");

    let res = srv.get("/products?sort=weight", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "validation_error");
}

#[tokio::test]
async fn malformed_ids_and_missing_records() {
    let srv = TestServer::spawn().await;
    let token = operator();

    let res = srv.get("/categories/abc", None).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "invalid_id");

    let res = srv.get("/categories/2", None).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(res).await, "not_found");

    let res = srv.put("/categories/2", &token, json!({ "name": "Games" })).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv.post("/categories", &token, json!({ "name": "  " })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "validation_error");
}

#[tokio::test]
async fn users_see_and_edit_only_themselves() {
    let srv = TestServer::spawn().await;
    let admin = admin();

    for (first, email) in [("Maria", "maria@gmail.com"), ("Alex", "alex@gmail.com")] {
        let user = srv
            .create(
                "/users",
                &admin,
                json!({
                    "first_name": first,
                    "last_name": "Brown",
                    "email": email,
                    "password": "123456",
                    "roles": ["OPERATOR"],
                }),
            )
            .await;
        assert!(user.get("password").is_none());
        assert!(user.get("password_hash").is_none());
    }

    let maria = mint_jwt(1, &["OPERATOR"]);

    let res = srv.get("/users/1", Some(&maria)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["email"], "maria@gmail.com");

    let res = srv.get("/users/2", Some(&maria)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(srv.get("/users/1", None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(srv.get("/users", Some(&maria)).await.status(), StatusCode::FORBIDDEN);

    let res = srv
        .put(
            "/users/1",
            &maria,
            json!({
                "first_name": "Mary",
                "last_name": "Brown",
                "email": "maria@gmail.com",
                "roles": ["ADMIN"],
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["first_name"], "Mary");
    assert_eq!(updated["roles"], json!(["OPERATOR"]));

    let res = srv.get("/users?email=ALEX@gmail.com", Some(&admin)).await;
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["id"], 2);
}

#[tokio::test]
async fn duplicate_email_is_an_integrity_violation() {
    let srv = TestServer::spawn().await;
    let admin = admin();
    let body = json!({
        "first_name": "Maria",
        "last_name": "Brown",
        "email": "maria@gmail.com",
        "password": "123456",
    });

    srv.create("/users", &admin, body.clone()).await;
    let res = srv.post("/users", &admin, body).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "integrity_violation");

    let res = srv
        .post(
            "/users",
            &admin,
            json!({ "first_name": "Ana", "last_name": "Lima", "email": "ana@gmail.com", "password": "123" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_and_payment_flow() {
    let srv = TestServer::spawn().await;
    let token = operator();

    let costumer = srv
        .create(
            "/costumers",
            &token,
            json!({ "name": "Maria Brown", "cpf": "529.982.247-25", "phone": "11987654321" }),
        )
        .await;
    assert_eq!(costumer["id"], 1);

    srv.create(
        "/addresses",
        &token,
        json!({
            "costumer_id": 1,
            "street": "Avenida Paulista",
            "number": "1000",
            "district": "Bela Vista",
            "city": "Sao Paulo",
            "state": "SP",
            "cep": "01310-100",
        }),
    )
    .await;

    srv.create("/categories", &token, json!({ "name": "Books" })).await;
    srv.create(
        "/products",
        &token,
        json!({ "name": "The Rust Book", "price_cents": 4990, "category_id": 1 }),
    )
    .await;

    // Client prices are ignored; the line is priced from the product.
    let order = srv
        .create(
            "/orders",
            &token,
            json!({
                "costumer_id": 1,
                "status": "delivered",
                "items": [{ "product_id": 1, "quantity": 2, "unit_price_cents": 1 }],
            }),
        )
        .await;
    assert_eq!(order["status"], "waiting_payment");
    assert_eq!(order["items"][0]["unit_price_cents"], 4990);
    assert_eq!(order["total_cents"], 9980);

    assert_eq!(srv.get("/orders", None).await.status(), StatusCode::UNAUTHORIZED);
    let res = srv.get("/orders?status=waiting_payment", Some(&mint_jwt(9, &[]))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = res.json().await.unwrap();
    assert_eq!(page["total_elements"], 1);

    let payment = srv
        .create(
            "/payments",
            &token,
            json!({ "order_id": 1, "method": { "type": "card", "installments": 3 } }),
        )
        .await;
    assert_eq!(payment["status"], "pending");
    assert_eq!(payment["method"]["installments"], 3);

    let res = srv
        .post(
            "/payments",
            &token,
            json!({ "order_id": 1, "method": { "type": "card", "installments": 1 } }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "integrity_violation");

    let res = srv.delete("/costumers/1", &token).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_cpf_is_rejected_before_storage() {
    let srv = TestServer::spawn().await;
    let res = srv
        .post(
            "/costumers",
            &operator(),
            json!({ "name": "Alex", "cpf": "123.456.789-00", "phone": "11987654321" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "validation_error");
}

/// Costumer 1, category 1 and product 1 (price 2500).
async fn seed_order_prerequisites(srv: &TestServer, token: &str) {
    srv.create(
        "/costumers",
        token,
        json!({ "name": "Maria Brown", "cpf": "529.982.247-25", "phone": "11987654321" }),
    )
    .await;
    srv.create("/categories", token, json!({ "name": "Games" })).await;
    srv.create(
        "/products",
        token,
        json!({ "name": "Chess set", "price_cents": 2500, "category_id": 1 }),
    )
    .await;
}

#[tokio::test]
async fn order_for_missing_product_is_an_integrity_violation() {
    let srv = TestServer::spawn().await;
    let token = operator();
    seed_order_prerequisites(&srv, &token).await;

    let res = srv
        .post(
            "/orders",
            &token,
            json!({ "costumer_id": 1, "items": [{ "product_id": 999, "quantity": 5 }] }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "integrity_violation");

    let page: Value = srv.get("/orders", Some(&token)).await.json().await.unwrap();
    assert_eq!(page["total_elements"], 0);
}

#[tokio::test]
async fn delivered_order_cannot_go_back() {
    let srv = TestServer::spawn().await;
    let token = operator();
    seed_order_prerequisites(&srv, &token).await;

    let items = json!([{ "product_id": 1, "quantity": 1 }]);
    srv.create("/orders", &token, json!({ "costumer_id": 1, "items": items })).await;

    let res = srv
        .put("/orders/1", &token, json!({ "costumer_id": 1, "status": "delivered", "items": items }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["status"], "delivered");

    for status in ["waiting_payment", "canceled"] {
        let res = srv
            .put("/orders/1", &token, json!({ "costumer_id": 1, "status": status, "items": items }))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(res).await, "validation_error");
    }

    let order: Value = srv.get("/orders/1", Some(&token)).await.json().await.unwrap();
    assert_eq!(order["status"], "delivered");
}

#[tokio::test]
async fn cors_preflight_echoes_the_origin_with_credentials() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .request(reqwest::Method::OPTIONS, srv.url("/products"))
        .header("origin", "https://shop.example")
        .header("access-control-request-method", "PUT")
        .header("access-control-request-headers", "authorization,content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(headers["access-control-allow-origin"], "https://shop.example");
    assert_eq!(headers["access-control-allow-credentials"], "true");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    assert!(methods.contains("PUT") && methods.contains("PATCH"));
    let allowed = headers["access-control-allow-headers"].to_str().unwrap().to_ascii_lowercase();
    assert!(allowed.contains("authorization") && allowed.contains("content-type"));

    let res = srv
        .client
        .get(srv.url("/products"))
        .header("origin", "https://shop.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["access-control-allow-origin"], "https://shop.example");
}

#[tokio::test]
async fn products_carry_their_review_summary() {
    let srv = TestServer::spawn().await;
    let token = operator();
    seed_order_prerequisites(&srv, &token).await;

    let res = srv.get("/products/1", None).await;
    let product: Value = res.json().await.unwrap();
    assert_eq!(product["feedback"], json!({ "count": 0, "average_rating": null }));

    for (first, email) in [("Maria", "maria@gmail.com"), ("Alex", "alex@gmail.com")] {
        srv.create(
            "/users",
            &admin(),
            json!({ "first_name": first, "last_name": "Brown", "email": email, "password": "123456" }),
        )
        .await;
    }
    for (user_id, rating) in [(1, 5), (2, 4)] {
        srv.create(
            "/feedbacks",
            &mint_jwt(user_id, &["OPERATOR"]),
            json!({ "product_id": 1, "rating": rating, "comment": "nice" }),
        )
        .await;
    }

    let page: Value = srv.get("/products", None).await.json().await.unwrap();
    assert_eq!(page["content"][0]["feedback"]["count"], 2);
    assert_eq!(page["content"][0]["feedback"]["average_rating"], 4.5);

    let product: Value = srv.get("/products/1", None).await.json().await.unwrap();
    assert_eq!(product["feedback"]["count"], 2);
}
