#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

use todo_api_rust::auth::password::MIN_COST;
use todo_api_rust::auth::Identity;
use todo_api_rust::config::AppConfig;
use todo_api_rust::server::{app, AppState};
use todo_api_rust::services::UserService;
use todo_api_rust::store::MemoryStore;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const PASSWORD: &str = "s3cret-password";

/// A server bound to a free local port, backed by a fresh memory store.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    pub client: Client,
}

pub async fn spawn_app() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let mut config = AppConfig::development();
    config.security.password_cost = MIN_COST;
    let store = Arc::new(MemoryStore::new());
    UserService::new(store.as_ref(), config.security.password_cost)
        .ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await?;

    let state = AppState::new(&config, store);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let router = app(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        base_url,
        state,
        client: Client::new(),
    })
}

/// A signed-up user together with a login token.
pub struct Account {
    pub id: i64,
    pub email: String,
    pub token: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn patch(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.patch(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    pub async fn sign_up(&self, first_name: &str) -> Result<Account> {
        let email = format!("{}@example.com", first_name.to_lowercase());
        let res = self
            .client
            .post(self.url("/user/signUp"))
            .json(&json!({
                "firstName": first_name,
                "lastName": "Tester",
                "email": email,
                "password": PASSWORD
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "sign-up failed: {}", res.status());

        let body: Value = res.json().await?;
        let id = body["id"].as_i64().context("user has no id")?;
        let token = self.login(&email, PASSWORD).await?;
        Ok(Account { id, email, token })
    }

    pub async fn admin_token(&self) -> Result<String> {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// A correctly signed token whose validity window has already closed.
    pub async fn expired_token(&self, token: &str) -> Result<String> {
        let identity: Identity = self.state.tokens.decode(token)?;
        let issued_at = Utc::now() - self.state.tokens.ttl() - Duration::minutes(1);
        Ok(self.state.tokens.issue_at(&identity, issued_at)?)
    }

    pub async fn create_todo(&self, account: &Account, title: &str) -> Result<Value> {
        let res = self
            .post(&format!("/todo/{}", account.id), &account.token)
            .json(&json!({ "title": title }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create todo failed: {}", res.status());
        Ok(res.json().await?)
    }

    pub async fn create_task(&self, account: &Account, todo_id: i64, body: Value) -> Result<Value> {
        let res = self
            .post(&format!("/task/{}", todo_id), &account.token)
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create task failed: {}", res.status());
        Ok(res.json().await?)
    }
}
