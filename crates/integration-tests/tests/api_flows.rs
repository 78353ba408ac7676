//! End-to-end flows against a running API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (fb-cli migrate)
//! - The API running with `SEED_ADMIN_USERNAME`/`SEED_ADMIN_PASSWORD` set
//! - `FB_ADMIN_USERNAME`/`FB_ADMIN_PASSWORD` matching those credentials

#![allow(clippy::expect_used, clippy::unwrap_used)]

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use freshbasket_integration_tests::{TestClient, json_body, unique_name};

fn decimal(value: &Value) -> Decimal {
    value.as_str().expect("decimal as string").parse().unwrap()
}

async fn create_product(admin: &TestClient, price: &str, unit: &str) -> Value {
    let response = admin
        .post("/api/products")
        .json(&json!({
            "name": unique_name("Test Produce"),
            "category": "Integration",
            "price": price,
            "quantityUnit": unit,
        }))
        .send()
        .await
        .expect("Failed to create product");
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

async fn delete_product(admin: &TestClient, id: &Value) {
    let _ = admin.delete(&format!("/api/products/{id}")).send().await;
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_health_and_readiness() {
    let client = TestClient::anonymous();

    let response = client.get("/health").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");

    let response = client.get("/health/ready").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_login_with_wrong_password() {
    let client = TestClient::anonymous();
    let username = std::env::var("FB_ADMIN_USERNAME").unwrap_or_else(|_| "owner".to_string());

    let response = client
        .post("/api/auth/login")
        .json(&json!({ "username": username, "password": "definitely-not-it" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["error"], "Invalid credentials");
}

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_admin_token_verifies() {
    let admin = TestClient::admin().await;

    let response = admin.get("/api/auth/verify").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["user"]["isAdmin"], true);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_product_crud() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "120", "kg").await;
    let id = &product["id"];

    // Category lookup is case-insensitive
    let response = admin.get("/api/products/INTEGRATION").send().await.unwrap();
    let listed = json_body(response).await;
    assert!(listed.as_array().unwrap().iter().any(|p| p["id"] == *id));

    let response = admin
        .put(&format!("/api/products/{id}"))
        .json(&json!({ "price": "135.50" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(decimal(&updated["price"]), Decimal::new(13550, 2));
    assert_eq!(updated["name"], product["name"]);

    let response = admin
        .delete(&format!("/api/products/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = admin
        .delete(&format!("/api/products/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_search_finds_new_product() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "40", "piece").await;
    let name = product["name"].as_str().unwrap();

    let response = admin
        .get(&format!("/api/products/search/{}", name.replace(' ', "%20")))
        .send()
        .await
        .unwrap();
    let found = json_body(response).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    delete_product(&admin, &product["id"]).await;
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_cart_merges_lines_and_converts_units() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "80", "kg").await;
    let shopper = TestClient::anonymous();

    for amount in ["250", "500"] {
        let response = shopper
            .post("/api/cart")
            .json(&json!({ "productId": product["id"], "quantity": amount, "unit": "g" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let cart = json_body(shopper.get("/api/cart").send().await.unwrap()).await;
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    // 750 g at 80/kg
    assert_eq!(decimal(&cart["total"]), Decimal::new(60, 0));

    let response = shopper.delete("/api/cart").send().await.unwrap();
    assert_eq!(json_body(response).await["removed"], 1);

    delete_product(&admin, &product["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_cart_rejects_incompatible_unit() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "60", "dozen").await;
    let shopper = TestClient::anonymous();

    let response = shopper
        .post("/api/cart")
        .json(&json!({ "productId": product["id"], "quantity": "1", "unit": "kg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    delete_product(&admin, &product["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running API and database"]
async fn test_carts_are_isolated_by_client() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "30", "piece").await;
    let first = TestClient::anonymous();
    let second = TestClient::anonymous();

    let response = first
        .post("/api/cart")
        .json(&json!({ "productId": product["id"] }))
        .send()
        .await
        .unwrap();
    let item = json_body(response).await;

    let response = second
        .delete(&format!("/api/cart/{}", item["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let cart = json_body(second.get("/api/cart").send().await.unwrap()).await;
    assert!(cart["items"].as_array().unwrap().is_empty());

    delete_product(&admin, &product["id"]).await;
}

#[tokio::test]
#[ignore = "Requires running API, database and WHATSAPP_NUMBER"]
async fn test_checkout_builds_whatsapp_link() {
    let admin = TestClient::admin().await;
    let product = create_product(&admin, "60", "dozen").await;
    let shopper = TestClient::anonymous();

    let response = shopper
        .post("/api/cart/checkout")
        .json(&json!({ "name": "Asha", "phone": "98765 43210", "address": "12 MG Road" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    shopper
        .post("/api/cart")
        .json(&json!({ "productId": product["id"], "quantity": "6", "unit": "piece" }))
        .send()
        .await
        .unwrap();

    let response = shopper
        .post("/api/cart/checkout")
        .json(&json!({ "name": "Asha", "phone": "98765 43210", "address": "12 MG Road" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(decimal(&body["total"]), Decimal::new(30, 0));
    assert!(body["whatsappUrl"].as_str().unwrap().starts_with("https://wa.me/"));

    delete_product(&admin, &product["id"]).await;
}
