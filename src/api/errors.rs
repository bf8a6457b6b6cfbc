use crate::session::store::StoreError;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of error body characters surfaced to the user.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, Error)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Session expired: {0}")]
    SessionExpired(String),
    #[error("Login response did not include a complete session")]
    IncompleteLogin,
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403 responses and for sessions that could not be refreshed.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(status, 401 | 403),
            Self::SessionExpired(_) => true,
            _ => false,
        }
    }

    /// The backend answers a login without a TOTP code for a 2FA account with a
    /// 400 whose detail mentions 2FA.
    #[must_use]
    pub fn is_two_factor_required(&self) -> bool {
        match self {
            Self::Http { status, message } => *status == 400 && message.contains("2FA"),
            _ => false,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Turns an error body into a user-facing message: the backend `detail` string
/// when there is one, otherwise the trimmed and truncated body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        match json.get("detail") {
            Some(Value::String(detail)) if !detail.trim().is_empty() => {
                return truncate(detail.trim());
            }
            // Validation errors carry a list of `{loc, msg}` objects.
            Some(Value::Array(items)) => {
                let messages: Vec<&str> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(Value::as_str))
                    .collect();
                if !messages.is_empty() {
                    return truncate(&messages.join("; "));
                }
            }
            _ => {}
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        truncate(trimmed)
    }
}

fn truncate(message: &str) -> String {
    message.chars().take(MAX_ERROR_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Неверный username или пароль"}"#),
            "Неверный username или пароль"
        );
    }

    #[test]
    fn error_message_joins_validation_errors() {
        let body = r#"{"detail": [{"loc": ["body", "email"], "msg": "bad email"}, {"loc": ["body", "password"], "msg": "too short"}]}"#;
        assert_eq!(error_message(body), "bad email; too short");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(error_message("   "), "Request failed.");
        assert_eq!(error_message(" upstream down "), "upstream down");

        let long = "x".repeat(500);
        assert_eq!(error_message(&long).chars().count(), MAX_ERROR_CHARS);
    }

    #[test]
    fn unauthorized_covers_401_403_and_expired_sessions() {
        let unauthorized = ApiError::Http {
            status: 401,
            message: "expired".to_string(),
        };
        let forbidden = ApiError::Http {
            status: 403,
            message: "forbidden".to_string(),
        };
        let not_found = ApiError::Http {
            status: 404,
            message: "missing".to_string(),
        };

        assert!(unauthorized.is_unauthorized());
        assert!(forbidden.is_unauthorized());
        assert!(!not_found.is_unauthorized());
        assert!(ApiError::SessionExpired("no refresh token".to_string()).is_unauthorized());
        assert!(!ApiError::Network("down".to_string()).is_unauthorized());
    }

    #[test]
    fn two_factor_required_is_detected_from_detail() {
        let err = ApiError::Http {
            status: 400,
            message: "Требуется 2FA код".to_string(),
        };
        assert!(err.is_two_factor_required());

        let other = ApiError::Http {
            status: 400,
            message: "Пользователь уже существует".to_string(),
        };
        assert!(!other.is_two_factor_required());
    }
}
