mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;

    let (status, body) = server.get_public("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("ok"));
    Ok(())
}

#[tokio::test]
async fn signup_login_and_me() -> Result<()> {
    let server = common::spawn_server().await?;
    let alice = server.session("alice").await?;

    let (status, body) = server.get("/auth/me", &alice.token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], json!("alice"));
    assert_eq!(body["data"]["email"], json!("alice@example.com"));
    assert!(body["data"].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn login_returns_bearer_token_details() -> Result<()> {
    let server = common::spawn_server().await?;
    server.session("alice").await?;

    let (status, body) = server
        .post_public("/auth/token", json!({"username": "alice", "password": "correct-horse"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], json!("bearer"));
    assert!(body["data"]["expires_in"].as_u64().unwrap_or(0) > 0);
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_is_conflict() -> Result<()> {
    let server = common::spawn_server().await?;
    server.session("alice").await?;

    let (status, body) = server
        .post_public(
            "/auth/signup",
            json!({"email": "alice@example.com", "username": "alice2", "password": "correct-horse"}),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
    assert_eq!(common::error_code(&body), Some("CONFLICT"));
    Ok(())
}

#[tokio::test]
async fn bad_password_is_unauthorized() -> Result<()> {
    let server = common::spawn_server().await?;
    server.session("alice").await?;

    let (status, body) = server
        .post_public("/auth/token", json!({"username": "alice", "password": "nope-nope"}))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(common::error_code(&body), Some("UNAUTHORIZED"));
    Ok(())
}

#[tokio::test]
async fn protected_routes_reject_missing_and_bad_tokens() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::get(format!("{}/projects", server.base_url)).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(common::error_code(&body), Some("UNAUTHORIZED"));

    let (status, _) = server.get("/projects", "not.a.token").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn malformed_signup_body_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;

    let (status, body) = server.post_public("/auth/signup", json!({"username": "alice"})).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));
    Ok(())
}
