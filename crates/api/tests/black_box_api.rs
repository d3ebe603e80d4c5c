use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, COOKIE, LOCATION, SET_COOKIE};
use serde_json::{Value, json};

use shopfront_auth::{IdentityClaims, Role};
use shopfront_core::UserId;
use shopfront_infra::AppConfig;

const SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = shopfront_api::app::build_app(&AppConfig::for_tests(jwt_secret))
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let router = app.router;
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn mint_jwt(jwt_secret: &str, role: Role, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = IdentityClaims {
        sub: UserId::new(),
        email: "minted@example.com".to_string(),
        name: "Minted".to_string(),
        role,
        iat: issued_at,
        exp: issued_at + ttl,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn address() -> Value {
    json!({
        "firstName": "Alice",
        "lastName": "Liddell",
        "street": "1 Rabbit Hole",
        "city": "Oxford",
        "state": "Oxon",
        "postalCode": "OX1",
        "country": "UK",
        "email": "alice@example.com"
    })
}

async fn sign_up(client: &reqwest::Client, server: &TestServer, name: &str, email: &str) -> String {
    let res = client
        .post(server.url("/auth/signup"))
        .json(&json!({ "name": name, "email": email, "password": "wonderland" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn place_cod_order(client: &reqwest::Client, server: &TestServer, token: &str) -> Value {
    let res = client
        .post(server.url("/orders"))
        .bearer_auth(token)
        .json(&json!({
            "items": [
                { "productId": 1, "quantity": 1 },
                { "productId": 3, "quantity": 1 }
            ],
            "shippingAddress": address(),
            "paymentMethod": "cash_on_delivery"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["order"].clone()
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn(SECRET).await;
    let res = client().get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn products_are_public_and_unknown_product_is_404() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();

    let res = client.get(server.url("/products")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["products"].as_array().unwrap().len(), 8);

    let res = client.get(server.url("/products/999")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn customer_signs_up_signs_in_and_places_an_order() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();

    sign_up(&client, &server, "Alice", "alice@example.com").await;

    let res = client
        .post(server.url("/auth/signin"))
        .json(&json!({ "email": "alice@example.com", "password": "wonderland" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth_token="));
    assert!(cookie.contains("HttpOnly"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["role"], "customer");
    let token = body["token"].as_str().unwrap().to_string();

    let order = place_cod_order(&client, &server, &token).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(order["totalAmount"], 5998);

    // The session cookie alone is enough to authenticate.
    let session = cookie.split(';').next().unwrap().to_string();
    let res = client
        .get(server.url("/orders"))
        .header(COOKIE, session)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["id"], order["id"]);
    assert_eq!(orders[0]["status"], "pending");
}

#[tokio::test]
async fn admin_advances_status_and_only_the_owner_sees_the_order() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();

    let alice = sign_up(&client, &server, "Alice", "alice@example.com").await;
    let admin = sign_up(&client, &server, "Admin", "admin@example.com").await;
    let bob = sign_up(&client, &server, "Bob", "bob@example.com").await;

    let order = place_cod_order(&client, &server, &alice).await;
    let path = format!("/orders/{}", order["id"].as_str().unwrap());

    let res = client
        .patch(server.url(&path))
        .bearer_auth(&admin)
        .json(&json!({ "status": "shipped" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&path)).bearer_auth(&alice).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["order"]["status"], "shipped");

    let res = client.get(server.url(&path)).bearer_auth(&bob).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // A customer cannot change status, even on their own order.
    let res = client
        .patch(server.url(&path))
        .bearer_auth(&alice)
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn empty_cart_is_rejected_and_nothing_is_stored() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    let alice = sign_up(&client, &server, "Alice", "alice@example.com").await;

    let res = client
        .post(server.url("/orders"))
        .bearer_auth(&alice)
        .json(&json!({
            "items": [],
            "shippingAddress": address(),
            "paymentMethod": "cod"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_items");

    let res = client.get(server.url("/orders")).bearer_auth(&alice).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body["orders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn customer_is_forbidden_from_admin_routes() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    let token = mint_jwt(SECRET, Role::Customer, Utc::now(), ChronoDuration::minutes(10));

    let res = client
        .get(server.url("/admin/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = mint_jwt(SECRET, Role::Admin, Utc::now(), ChronoDuration::minutes(10));
    let res = client
        .get(server.url("/admin/orders"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_cookie_is_rejected_and_cleared() {
    let server = TestServer::spawn(SECRET).await;
    let issued = Utc::now() - ChronoDuration::days(2);
    let token = mint_jwt(SECRET, Role::Customer, issued, ChronoDuration::days(1));

    let res = client()
        .get(server.url("/orders"))
        .header(COOKIE, format!("auth_token={token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let cleared = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("auth_token=") && v.contains("Max-Age=0"));
    assert!(cleared);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_unauthorized() {
    let server = TestServer::spawn(SECRET).await;
    let token = mint_jwt("other-secret", Role::Admin, Utc::now(), ChronoDuration::minutes(10));

    let res = client()
        .get(server.url("/admin/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn browser_navigation_is_redirected_to_sign_in() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();

    let res = client
        .get(server.url("/orders?page=2"))
        .header(ACCEPT, "text/html,application/xhtml+xml")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let location = res.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, "/auth/signin?callbackUrl=%2Forders%3Fpage%3D2");

    let token = mint_jwt(SECRET, Role::Customer, Utc::now(), ChronoDuration::minutes(10));
    let res = client
        .get(server.url("/admin/orders"))
        .header(ACCEPT, "text/html")
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers().get(LOCATION).unwrap(), "/");
}

#[tokio::test]
async fn card_payment_backs_exactly_one_order() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    let alice = sign_up(&client, &server, "Alice", "alice@example.com").await;

    let res = client
        .post(server.url("/payments"))
        .bearer_auth(&alice)
        .json(&json!({
            "amount": 1999,
            "paymentMethod": "credit_card",
            "paymentDetails": {
                "cardNumber": "4111 1111 1111 1111",
                "cardHolder": "Alice Liddell",
                "expiryDate": "12/30",
                "cvv": "123"
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["payment"]["status"], "completed");
    let payment_id = body["payment"]["id"].as_str().unwrap().to_string();
    assert!(payment_id.starts_with("PP-"));

    let order = json!({
        "items": [{ "productId": 1, "quantity": 1 }],
        "shippingAddress": address(),
        "paymentMethod": "credit_card",
        "paymentId": payment_id
    });

    let res = client
        .post(server.url("/orders"))
        .bearer_auth(&alice)
        .json(&order)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(server.url("/orders"))
        .bearer_auth(&alice)
        .json(&order)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn wishlist_add_is_idempotent_and_remove_empties_it() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    let alice = sign_up(&client, &server, "Alice", "alice@example.com").await;

    for expected in [true, false] {
        let res = client
            .post(server.url("/wishlist"))
            .bearer_auth(&alice)
            .json(&json!({ "productId": 3 }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["added"], expected);
        assert_eq!(body["wishlist"].as_array().unwrap().len(), 1);
    }

    let res = client
        .post(server.url("/wishlist"))
        .bearer_auth(&alice)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .delete(server.url("/wishlist/3"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert!(body["wishlist"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn contact_submissions_reach_the_admin_inbox() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();

    let res = client
        .post(server.url("/contact"))
        .json(&json!({ "name": "", "email": "x@example.com", "message": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(server.url("/contact"))
        .json(&json!({ "name": "Carol", "email": "carol@example.com", "message": "Where is my parcel?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    let id = body["submission"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["submission"]["isRead"], false);

    let admin = mint_jwt(SECRET, Role::Admin, Utc::now(), ChronoDuration::minutes(10));
    let res = client
        .patch(server.url(&format!("/admin/contact/{id}")))
        .bearer_auth(&admin)
        .json(&json!({ "isRead": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(server.url("/admin/contact"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    let submissions = body["submissions"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["isRead"], true);
}

#[tokio::test]
async fn owner_is_notified_when_an_order_is_placed() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    let alice = sign_up(&client, &server, "Alice", "alice@example.com").await;
    place_cod_order(&client, &server, &alice).await;

    // Notifications are delivered by a background worker; poll briefly.
    for _ in 0..100 {
        let res = client
            .get(server.url("/notifications"))
            .bearer_auth(&alice)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        if let Some(first) = body["notifications"].as_array().and_then(|n| n.first()) {
            assert_eq!(first["title"], "Order placed");
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }

    panic!("notification did not arrive within timeout");
}

#[tokio::test]
async fn signing_in_over_a_stale_cookie_keeps_the_new_session() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    sign_up(&client, &server, "Alice", "alice@example.com").await;

    let res = client
        .post(server.url("/auth/signin"))
        .header(COOKIE, "auth_token=garbage")
        .json(&json!({ "email": "alice@example.com", "password": "wonderland" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let cookies: Vec<&str> = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert_eq!(cookies.len(), 1);
    assert!(!cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn expired_bearer_token_is_rejected_and_session_cookie_cleared() {
    let server = TestServer::spawn(SECRET).await;
    let issued = Utc::now() - ChronoDuration::days(2);
    let token = mint_jwt(SECRET, Role::Customer, issued, ChronoDuration::days(1));

    let res = client()
        .get(server.url("/orders"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let cleared = res
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with("auth_token=") && v.contains("Max-Age=0"));
    assert!(cleared);
}

#[tokio::test]
async fn malformed_cart_lines_are_invalid_items() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    let alice = sign_up(&client, &server, "Alice", "alice@example.com").await;

    for line in [json!({ "productId": 1 }), json!({ "productId": 1, "quantity": -1 }), json!({ "quantity": 1 })] {
        let res = client
            .post(server.url("/orders"))
            .bearer_auth(&alice)
            .json(&json!({
                "items": [line],
                "shippingAddress": address(),
                "paymentMethod": "cod"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "invalid_items");
    }

    let res = client.get(server.url("/orders")).bearer_auth(&alice).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    assert!(body["orders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unparsable_bodies_get_structured_errors() {
    let server = TestServer::spawn(SECRET).await;
    let client = client();
    let alice = sign_up(&client, &server, "Alice", "alice@example.com").await;

    let res = client
        .post(server.url("/orders"))
        .bearer_auth(&alice)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{\"items\": [")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    assert!(body["message"].is_string());

    let res = client
        .post(server.url("/contact"))
        .json(&json!({ "name": 7, "email": "x@example.com", "message": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}
