#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use devhub_api::config::AppConfig;
use devhub_api::database::MemoryStore;
use devhub_api::{app, AppState};

/// A server running the real router over a fresh in-memory store. Each
/// test gets its own instance, so tests never see each other's data.
pub struct TestServer {
    pub base_url: String,
    client: reqwest::Client,
}

/// A registered user and a bearer token for them
pub struct Session {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

pub async fn spawn_server() -> Result<TestServer> {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.security.password_hash_cost = 4;
    let state = AppState::new(Arc::new(MemoryStore::new()), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("failed to bind test listener")?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app(state)).await {
            eprintln!("test server stopped: {e}");
        }
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        client: reqwest::Client::new(),
    })
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let request = match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let res = request.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.get(self.url(path)), Some(token)).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.post(self.url(path)).json(&body), Some(token)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.put(self.url(path)).json(&body), Some(token)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.delete(self.url(path)), Some(token)).await
    }

    pub async fn post_public(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(self.client.post(self.url(path)).json(&body), None).await
    }

    pub async fn get_public(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(self.client.get(self.url(path)), None).await
    }

    /// Sign up `username` and log in
    pub async fn session(&self, username: &str) -> Result<Session> {
        let (status, body) = self
            .post_public(
                "/auth/signup",
                json!({
                    "email": format!("{}@example.com", username),
                    "username": username,
                    "password": "correct-horse",
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "signup failed: {} {}", status, body);
        let user_id = uuid_at(&body, "/data/id")?;

        let (status, body) = self
            .post_public(
                "/auth/token",
                json!({ "username": username, "password": "correct-horse" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
        let token = body
            .pointer("/data/access_token")
            .and_then(Value::as_str)
            .context("token missing from login response")?
            .to_string();

        Ok(Session {
            user_id,
            username: username.to_string(),
            token,
        })
    }

    /// Create a project owned by `owner`, returning its id
    pub async fn project(&self, owner: &Session, name: &str) -> Result<Uuid> {
        let (status, body) = self.post("/projects", &owner.token, json!({ "name": name })).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "project create failed: {} {}", status, body);
        uuid_at(&body, "/data/id")
    }

    pub async fn add_member(&self, owner: &Session, project_id: Uuid, user: &Session, role: &str) -> Result<()> {
        let (status, body) = self
            .post(
                &format!("/projects/{}/members", project_id),
                &owner.token,
                json!({ "user_id": user.user_id, "role": role }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "add member failed: {} {}", status, body);
        Ok(())
    }

    pub async fn task(&self, session: &Session, project_id: Uuid, title: &str) -> Result<Uuid> {
        let (status, body) = self
            .post("/tasks", &session.token, json!({ "title": title, "project_id": project_id }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "task create failed: {} {}", status, body);
        uuid_at(&body, "/data/id")
    }
}

pub fn uuid_at(body: &Value, pointer: &str) -> Result<Uuid> {
    let raw = body
        .pointer(pointer)
        .and_then(Value::as_str)
        .with_context(|| format!("no string at {} in {}", pointer, body))?;
    Ok(raw.parse()?)
}

pub fn error_code(body: &Value) -> Option<&str> {
    body.get("code").and_then(Value::as_str)
}
