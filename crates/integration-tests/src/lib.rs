//! Integration tests for Fernwood.
//!
//! Tests spawn the full storefront router in-process on an ephemeral port
//! and drive it over real HTTP with a cookie-holding client, so the whole
//! stack is exercised: routing, session layer, cart store, and JSON
//! serialization.
//!
//! The hosted backend is not contacted: cart routes are backend-
//! independent by design, and the test context points the backend client
//! at an unroutable address to make any accidental catalog call fail
//! loudly.

use reqwest::Client;
use secrecy::SecretString;

use fernwood_storefront::config::{BackendConfig, StorefrontConfig};
use fernwood_storefront::state::AppState;

/// A running storefront instance plus a client with a cookie store, so
/// consecutive requests share one session (one visitor's cart).
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
}

impl TestContext {
    /// Spawn the app on an ephemeral port and return a context bound to it.
    ///
    /// # Panics
    ///
    /// Panics if the listener or client cannot be created; tests cannot
    /// proceed without either.
    pub async fn spawn() -> Self {
        let config = test_config();
        let state = AppState::new(config);
        let app = fernwood_storefront::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind ephemeral port");
        let addr = listener.local_addr().expect("Listener has no local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for a path on the spawned instance.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Configuration for a test instance. The backend URL is unroutable on
/// purpose.
fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().expect("valid host"),
        port: 0,
        base_url: "http://localhost:0".to_string(),
        session_secret: SecretString::from("kQ4x!vR8#mZ2@pW6$tY0%jD5^bN3&fH9".to_string()),
        backend: BackendConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            anon_key: "anon-key-for-tests".to_string(),
            storage_bucket: "product-images".to_string(),
        },
    }
}
