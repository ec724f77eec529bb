#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{json, Value};

use edge_api::config::{AppConfig, KvBackend};
use edge_api::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Start the router on a free port inside the current test runtime.
    /// Every server gets its own in-memory database and KV namespace.
    async fn spawn(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::bootstrap(config).await?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/healthz", self.base_url);
            if let Ok(resp) = self.client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(valid_token())
    }

    pub fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(valid_token())
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(valid_token())
    }

    pub fn delete(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(valid_token())
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = "sqlite::memory:".to_string();
    config.database.auto_migrate = true;
    config.kv.backend = KvBackend::Memory;
    config
}

pub async fn start_server() -> Result<TestServer> {
    start_server_with(test_config()).await
}

pub async fn start_server_with(config: AppConfig) -> Result<TestServer> {
    let server = TestServer::spawn(config).await?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Real HS256 token; the server reads the claims without checking the
/// signature.
pub fn signed_token(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("encode test token")
}

/// `header.<base64 payload>.signature`, the shape hand-rolled clients send.
pub fn raw_token(payload: &Value) -> String {
    format!("header.{}.signature", STANDARD.encode(payload.to_string()))
}

pub fn valid_token() -> String {
    signed_token(&json!({
        "sub": "user123",
        "email": "test@example.com",
        "roles": ["user"],
        "iat": now(),
        "exp": now() + 3600,
    }))
}
