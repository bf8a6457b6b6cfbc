//! TOTP enrollment for the signed-in user.

use super::{
    types::{DisableTwoFactorRequest, Message, TotpRequest, TwoFactorEnrollment},
    ApiClient, ApiError, ApiRequest,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

/// Starts enrollment. The returned secret and QR code are shown once; 2FA is
/// not active until [`verify`] succeeds.
#[instrument(skip_all)]
pub async fn enable(client: &ApiClient) -> Result<TwoFactorEnrollment, ApiError> {
    client.json(ApiRequest::post("/2fa/enable")).await
}

/// Confirms enrollment with a code from the authenticator app.
#[instrument(skip_all)]
pub async fn verify(client: &ApiClient, code: &str) -> Result<Message, ApiError> {
    let request = ApiRequest::post("/2fa/verify").json(&TotpRequest { totp_token: code })?;
    client.json(request).await
}

/// Turns 2FA off; the backend asks for the account password.
#[instrument(skip_all)]
pub async fn disable(client: &ApiClient, password: &SecretString) -> Result<Message, ApiError> {
    let request = ApiRequest::post("/2fa/disable").json(&DisableTwoFactorRequest {
        password: password.expose_secret(),
    })?;
    client.json(request).await
}
