#![allow(dead_code)]

use anyhow::Result;
use optika::{
    api::{ApiClient, ClientConfig},
    session::{AuthContext, MemoryTokenStore, SessionNavigator, TokenStore},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use std::{net::TcpListener, sync::Arc, time::Duration};

pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

pub struct Harness {
    pub client: ApiClient,
    pub tokens: Arc<MemoryTokenStore>,
    pub navigator: Arc<SessionNavigator>,
}

impl Harness {
    pub fn new(base_url: &str, tokens: MemoryTokenStore, page: &str) -> Result<Self> {
        let tokens = Arc::new(tokens);
        let navigator = Arc::new(SessionNavigator::new(page));
        let client = ApiClient::new(
            &ClientConfig::new(base_url).with_timeout(Duration::from_secs(5)),
            tokens.clone(),
            navigator.clone(),
        )?;
        Ok(Self {
            client,
            tokens,
            navigator,
        })
    }

    pub fn auth(&self) -> AuthContext {
        AuthContext::new(self.client.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        exposed(self.tokens.access_token())
    }

    pub fn refresh_token(&self) -> Option<String> {
        exposed(self.tokens.refresh_token())
    }
}

fn exposed(secret: Option<SecretString>) -> Option<String> {
    secret.map(|value| value.expose_secret().to_string())
}

pub fn user_json(id: i64, username: &str, role: &str) -> Value {
    json!({
        "id": id,
        "username": username,
        "email": format!("{username}@example.com"),
        "role": role,
        "is_2fa_enabled": false,
        "is_active": true,
        "is_blocked": false,
        "created_at": "2024-05-01T10:00:00",
        "last_login": null
    })
}

pub fn detail(message: &str) -> Value {
    json!({ "detail": message })
}
