//! Account endpoints: registration, login, logout, current user and the Google
//! sign-in handshake. Tokens are never logged; request bodies carrying
//! passwords are skipped from spans.

use super::{
    types::{LoginRequest, LoginResponse, Message, RegisterRequest, User},
    ApiClient, ApiError, ApiRequest,
};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{instrument, warn};
use url::Url;

pub const GOOGLE_LOGIN_PATH: &str = "/auth/google/login";

/// Creates an account. The backend answers with the new user.
#[instrument(skip_all, fields(username = %request.username))]
pub async fn register(client: &ApiClient, request: &RegisterRequest) -> Result<User, ApiError> {
    client
        .json(ApiRequest::post("/auth/register").json(request)?)
        .await
}

/// Authenticates with username, password and an optional TOTP code.
///
/// Returns the raw response; storing the tokens is up to the caller (see
/// [`crate::session::context::AuthContext::login`]).
#[instrument(skip_all, fields(username = %request.username))]
pub async fn login(client: &ApiClient, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
    client.json(ApiRequest::post("/auth/login").json(request)?).await
}

/// Ends the session on the backend, then clears local tokens whatever the
/// outcome of that call.
///
/// # Errors
/// Returns the backend error after the tokens have been cleared.
#[instrument(skip_all)]
pub async fn logout(client: &ApiClient) -> Result<Message, ApiError> {
    let result = client.json::<Message>(ApiRequest::post("/auth/logout")).await;
    client.tokens().clear()?;

    if let Err(err) = &result {
        warn!("logout request failed, local session cleared anyway: {err}");
    }
    result
}

/// Fetches the user the stored access token belongs to.
#[instrument(skip_all)]
pub async fn me(client: &ApiClient) -> Result<User, ApiError> {
    client.json(ApiRequest::get("/auth/me")).await
}

/// Exchanges the stored refresh token for a new access token.
#[instrument(skip_all)]
pub async fn refresh(client: &ApiClient) -> Result<(), ApiError> {
    client.refresh_access_token().await
}

/// URL the user opens in a browser to sign in with Google.
#[must_use]
pub fn google_login_url(client: &ApiClient) -> String {
    client.url(GOOGLE_LOGIN_PATH)
}

/// Tokens delivered together, by a login response or the OAuth callback.
pub struct TokenPair {
    pub access: SecretString,
    pub refresh: SecretString,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"***")
            .field("refresh", &"***")
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OAuthError {
    #[error("Invalid callback URL: {0}")]
    InvalidUrl(String),
    #[error("Google sign-in failed ({error}){}", detail_suffix(.message))]
    Provider {
        error: String,
        message: Option<String>,
    },
    #[error("Callback URL did not include both tokens")]
    MissingTokens,
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|message| format!(": {message}"))
        .unwrap_or_default()
}

/// Extracts the token pair from the URL the backend redirected the browser to
/// after Google sign-in (`.../auth/google/success?access_token=..&refresh_token=..`).
///
/// Failed sign-ins land on `/login?error=..&message=..` instead.
///
/// # Errors
/// Returns [`OAuthError`] when the URL cannot be parsed, reports a provider
/// error, or lacks either token.
pub fn parse_oauth_callback(callback: &str) -> Result<TokenPair, OAuthError> {
    let callback = callback.trim();
    let url = match Url::parse(callback) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse("http://localhost/")
            .and_then(|base| base.join(callback))
            .map_err(|err| OAuthError::InvalidUrl(err.to_string()))?,
        Err(err) => return Err(OAuthError::InvalidUrl(err.to_string())),
    };

    let mut access = None;
    let mut refresh = None;
    let mut error = None;
    let mut message = None;
    for (key, value) in url.query_pairs() {
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "access_token" => access = Some(value),
            "refresh_token" => refresh = Some(value),
            "error" => error = Some(value),
            "message" => message = Some(value),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Err(OAuthError::Provider { error, message });
    }

    match (access, refresh) {
        (Some(access), Some(refresh)) => Ok(TokenPair {
            access: SecretString::from(access),
            refresh: SecretString::from(refresh),
        }),
        _ => Err(OAuthError::MissingTokens),
    }
}
