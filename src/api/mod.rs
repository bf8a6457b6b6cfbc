//! REST client for the shop backend.
//!
//! Every request goes through [`ApiClient::execute`], which attaches the stored
//! access token, tags the request with an `X-Request-Id` and applies the
//! configured timeout. A 401/403 on a protected endpoint is recovered once by
//! refreshing the access token (see [`refresh`]) and replaying the request.
//!
//! Endpoint wrappers live in the per-resource modules and only build requests;
//! none of them touch tokens directly except [`auth`].

pub mod admin;
pub mod auth;
pub mod errors;
pub mod logs;
pub mod products;
mod refresh;
pub mod twofa;
pub mod types;

pub use errors::ApiError;

use crate::{
    session::{navigator::Navigator, store::TokenStore},
    APP_USER_AGENT,
};
use refresh::RefreshGate;
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info_span, Instrument};
use uuid::Uuid;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints whose 401/403 answers are final: they never trigger a refresh.
const PUBLIC_ENDPOINTS: [&str; 4] = ["/auth/login", "/auth/register", "/auth/refresh", "/products"];

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

/// A request that can be replayed after a token refresh.
#[derive(Clone, Debug)]
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    retried: bool,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub(crate) fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub(crate) fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub(crate) fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub(crate) fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub(crate) fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query = pairs;
        self
    }

    pub(crate) fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|err| ApiError::Serialization(format!("Failed to encode request: {err}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Cloneable handle to the backend. Clones share the token store, the
/// navigator and the refresh slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshGate,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|err| ApiError::Config(format!("Invalid API URL {base_url}: {err}")))?;

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                tokens,
                navigator,
                refresh: RefreshGate::default(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.inner.tokens
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.inner.navigator
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.inner.base_url, path)
    }

    /// True while a token refresh is in flight.
    #[must_use]
    pub fn refresh_in_flight(&self) -> bool {
        self.inner.refresh.in_flight()
    }

    /// Exchanges the refresh token for a new access token, sharing any refresh
    /// already in flight.
    ///
    /// # Errors
    /// Returns [`ApiError::SessionExpired`] if there is no refresh token or the
    /// backend rejects it; the session is cleared in that case.
    pub async fn refresh_access_token(&self) -> Result<(), ApiError> {
        self.inner.refresh.refresh(self).await
    }

    /// Clears both tokens and redirects to the login page.
    pub(crate) fn end_session(&self) {
        if let Err(err) = self.inner.tokens.clear() {
            error!("Failed to clear tokens: {err}");
        }
        self.inner.navigator.redirect_to_login();
    }

    /// Sends `request`, recovering once from an expired access token.
    pub(crate) async fn execute(&self, mut request: ApiRequest) -> Result<Response, ApiError> {
        loop {
            let token = self.inner.tokens.access_token();
            let response = self.dispatch(&request, token.as_ref()).await?;
            let status = response.status();

            if status.is_success() {
                return Ok(response);
            }

            if requires_refresh(status) && !request.retried && !is_public_endpoint(&request.path) {
                debug!(path = %request.path, %status, "access token rejected");
                request.retried = true;
                self.inner.refresh.recover(self, token.as_ref()).await?;
                continue;
            }

            return Err(http_error(response).await);
        }
    }

    /// One HTTP round trip, without any refresh handling.
    pub(crate) async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&SecretString>,
    ) -> Result<Response, ApiError> {
        let url = self.url(&request.path);
        let request_id = Uuid::new_v4().to_string();

        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .header("X-Request-Id", &request_id);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let span = info_span!(
            "api.request",
            http.method = %request.method,
            url = %url,
            request_id = %request_id,
            retried = request.retried,
        );

        let response = builder
            .send()
            .instrument(span)
            .await
            .map_err(map_request_error)?;
        debug!(path = %request.path, status = %response.status(), "response received");
        Ok(response)
    }

    pub(crate) async fn json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    }
}

fn requires_refresh(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// True for paths that never trigger a token refresh.
#[must_use]
pub fn is_public_endpoint(path: &str) -> bool {
    let path = path.split('?').next().unwrap_or_default();
    PUBLIC_ENDPOINTS.iter().any(|prefix| path.starts_with(prefix))
}

/// Builds a URL from an explicit base URL and the provided path.
#[must_use]
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        ApiError::Serialization(format!("Failed to build request: {err}"))
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn http_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ApiError::Http {
        status,
        message: errors::error_message(&body),
    }
}
