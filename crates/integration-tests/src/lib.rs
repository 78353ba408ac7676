//! End-to-end tests for the Fresh Basket API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and apply migrations
//! fb-cli migrate
//!
//! # Start the API with seed credentials, then
//! FB_BASE_URL=http://localhost:5000 \
//! FB_ADMIN_USERNAME=owner FB_ADMIN_PASSWORD='...' \
//!     cargo test -p freshbasket-integration-tests -- --ignored
//! ```
//!
//! Every test is `#[ignore]`d so the default test run stays offline.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the API under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("FB_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// HTTP client bound to one anonymous cart.
pub struct TestClient {
    pub client: Client,
    pub base_url: String,
    pub client_id: Uuid,
    pub token: Option<String>,
}

impl TestClient {
    /// A fresh anonymous client with its own cart.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn anonymous() -> Self {
        Self {
            client: Client::builder()
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url(),
            client_id: Uuid::new_v4(),
            token: None,
        }
    }

    /// Log in with the admin credentials from `FB_ADMIN_USERNAME` and
    /// `FB_ADMIN_PASSWORD`, seeding the first admin if needed.
    ///
    /// # Panics
    ///
    /// Panics if the credentials are missing or rejected.
    #[allow(clippy::expect_used)]
    pub async fn admin() -> Self {
        let username = std::env::var("FB_ADMIN_USERNAME").expect("FB_ADMIN_USERNAME not set");
        let password = std::env::var("FB_ADMIN_PASSWORD").expect("FB_ADMIN_PASSWORD not set");

        let mut client = Self::anonymous();
        let _ = client.get("/api/auth/seed-admin").send().await;

        let response = client
            .post("/api/auth/login")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login request failed");
        assert_eq!(response.status(), StatusCode::OK, "admin login rejected");

        let body = json_body(response).await;
        client.token = body["token"].as_str().map(str::to_string);
        client
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("x-client-id", self.client_id.to_string());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(self.client.get(format!("{}{path}", self.base_url)))
    }

    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(self.client.post(format!("{}{path}", self.base_url)))
    }

    #[must_use]
    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(self.client.put(format!("{}{path}", self.base_url)))
    }

    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(self.client.delete(format!("{}{path}", self.base_url)))
    }
}

/// Read a response body as JSON.
///
/// # Panics
///
/// Panics if the body is not JSON.
#[allow(clippy::expect_used)]
pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("Response body is not JSON")
}

/// A product name unique to this test run.
#[must_use]
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}
