mod common;

use anyhow::{ensure, Result};
use common::{can_bind_localhost, detail, user_json, Harness};
use optika::{
    api::{types::Role, ApiError},
    session::{guard, Guard, MemoryTokenStore, Route},
};
use secrecy::SecretString;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

#[tokio::test]
async fn login_stores_tokens_and_publishes_user() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "username": "alice",
            "password": "Secret123",
            "totp_token": "123456"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "user": user_json(1, "alice", "staff"),
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(1, "alice", "staff")))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(&server.uri(), MemoryTokenStore::new(), "/login")?;
    let auth = harness.auth();

    let user = auth
        .login("alice", &SecretString::from("Secret123"), Some(" 123456 "))
        .await?;

    ensure!(user.role == Role::Staff);
    ensure!(harness.access_token().as_deref() == Some("access-1"));
    ensure!(harness.refresh_token().as_deref() == Some("refresh-1"));

    let state = auth.snapshot();
    ensure!(!state.loading);
    ensure!(state.is_staff());
    ensure!(guard::evaluate(Route::AdminLogs, &state) == Guard::Render);
    ensure!(guard::evaluate(Route::Login, &state) == Guard::Redirect("/profile"));

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn incomplete_login_response_leaves_no_session() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "user": user_json(1, "alice", "user"),
            "access_token": "access-1"
        })))
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("old-access", "old-refresh"),
        "/login",
    )?;
    let auth = harness.auth();

    let result = auth
        .login("alice", &SecretString::from("Secret123"), None)
        .await;

    ensure!(matches!(result, Err(ApiError::IncompleteLogin)));
    ensure!(harness.access_token().is_none());
    ensure!(harness.refresh_token().is_none());
    ensure!(auth.snapshot().user.is_none());
    ensure!(!auth.snapshot().loading);
    Ok(())
}

#[tokio::test]
async fn two_factor_required_is_reported() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "username": "alice", "password": "Secret123" })))
        .respond_with(ResponseTemplate::new(400).set_body_json(detail("2FA code required")))
        .mount(&server)
        .await;

    let harness = Harness::new(&server.uri(), MemoryTokenStore::new(), "/login")?;
    let result = harness
        .auth()
        .login("alice", &SecretString::from("Secret123"), None)
        .await;

    ensure!(result.as_ref().is_err_and(ApiError::is_two_factor_required));
    ensure!(harness.access_token().is_none());
    Ok(())
}

#[tokio::test]
async fn check_auth_restores_user_from_stored_token() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(2, "bob", "user")))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/profile",
    )?;
    let auth = harness.auth();
    ensure!(guard::evaluate(Route::Profile, &auth.snapshot()) == Guard::Loading);

    let user = auth.check_auth().await;
    ensure!(user.as_ref().map(|user| user.username.as_str()) == Some("bob"));

    let state = auth.ready().await;
    ensure!(guard::evaluate(Route::Profile, &state) == Guard::Render);
    ensure!(guard::evaluate(Route::Admin, &state) == Guard::Redirect("/"));

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn check_auth_signs_out_on_unauthorized() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(detail("Token expired")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(detail("Invalid refresh token")))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/profile",
    )?;
    let auth = harness.auth();

    ensure!(auth.check_auth().await.is_none());
    ensure!(harness.access_token().is_none());
    ensure!(harness.refresh_token().is_none());

    let state = auth.snapshot();
    ensure!(!state.loading);
    ensure!(guard::evaluate(Route::Profile, &state) == Guard::Redirect("/login"));

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn logout_clears_session_when_backend_fails() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(1, "alice", "admin")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/profile",
    )?;
    let auth = harness.auth();
    ensure!(auth.check_auth().await.is_some());

    let result = auth.logout().await;

    ensure!(result.as_ref().err().and_then(ApiError::status) == Some(500));
    ensure!(harness.access_token().is_none());
    ensure!(harness.refresh_token().is_none());
    ensure!(auth.snapshot().user.is_none());

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn set_tokens_loads_the_user() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", "Bearer google-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(5, "gina", "user")))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new(&server.uri(), MemoryTokenStore::new(), "/auth/google/success")?;
    let auth = harness.auth();

    let tokens = optika::api::auth::parse_oauth_callback(
        "/auth/google/success?access_token=google-access&refresh_token=google-refresh",
    )?;
    let user = auth.set_tokens(tokens.access, tokens.refresh).await?;

    ensure!(user.map(|user| user.username) == Some("gina".to_string()));
    ensure!(harness.refresh_token().as_deref() == Some("google-refresh"));
    ensure!(auth.snapshot().is_authenticated());

    server.verify().await;
    Ok(())
}

#[tokio::test]
async fn refresh_user_publishes_two_factor_change() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    let mut enrolled = user_json(1, "alice", "user");
    enrolled["is_2fa_enabled"] = json!(true);

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(enrolled))
        .mount(&server)
        .await;

    let harness = Harness::new(
        &server.uri(),
        MemoryTokenStore::with_tokens("access-1", "refresh-1"),
        "/profile",
    )?;
    let auth = harness.auth();
    let mut updates = auth.subscribe();

    let user = auth.refresh_user().await?;
    ensure!(user.is_2fa_enabled);
    ensure!(updates.has_changed()?);
    ensure!(updates.borrow_and_update().user.as_ref().is_some_and(|u| u.is_2fa_enabled));
    Ok(())
}
