//! Request and response payloads for the shop API. Login and registration
//! payloads carry passwords and tokens, so their `Debug` output is redacted and
//! they must never be logged.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    User,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Staff, Self::User];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::User => "user",
        }
    }

    /// Admins and staff may open the admin console.
    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "user" => Ok(Self::User),
            other => Err(format!("unknown role: {other} (expected admin, staff or user)")),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_2fa_enabled: bool,
    pub is_active: bool,
    pub is_blocked: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

/// Audited operation tags. Tags this client does not know decode as
/// `UnknownAction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    LoginSuccess,
    LoginFailed,
    Logout,
    #[serde(rename = "2fa_enabled")]
    TwoFaEnabled,
    #[serde(rename = "2fa_disabled")]
    TwoFaDisabled,
    #[serde(rename = "2fa_failed")]
    TwoFaFailed,
    UserCreated,
    UserUpdated,
    UserDeleted,
    UserBlocked,
    UserUnblocked,
    RoleChanged,
    PasswordResetAdmin,
    ForbiddenAccess,
    ProductView,
    DataCreated,
    DataUpdated,
    DataDeleted,
    LogsViewed,
    Registration,
    #[serde(other)]
    UnknownAction,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoginSuccess => "login_success",
            Self::LoginFailed => "login_failed",
            Self::Logout => "logout",
            Self::TwoFaEnabled => "2fa_enabled",
            Self::TwoFaDisabled => "2fa_disabled",
            Self::TwoFaFailed => "2fa_failed",
            Self::UserCreated => "user_created",
            Self::UserUpdated => "user_updated",
            Self::UserDeleted => "user_deleted",
            Self::UserBlocked => "user_blocked",
            Self::UserUnblocked => "user_unblocked",
            Self::RoleChanged => "role_changed",
            Self::PasswordResetAdmin => "password_reset_admin",
            Self::ForbiddenAccess => "forbidden_access",
            Self::ProductView => "product_view",
            Self::DataCreated => "data_created",
            Self::DataUpdated => "data_updated",
            Self::DataDeleted => "data_deleted",
            Self::LogsViewed => "logs_viewed",
            Self::Registration => "registration",
            Self::UnknownAction => "unknown_action",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Failed,
    Warning,
}

impl LogStatus {
    pub const ALL: [Self; 3] = [Self::Success, Self::Failed, Self::Warning];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Warning => "warning",
        }
    }
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "warning" => Ok(Self::Warning),
            other => Err(format!(
                "unknown status: {other} (expected success, failed or warning)"
            )),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    pub id: i64,
    pub timestamp: String,
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub operation: Operation,
    pub target_table: Option<String>,
    pub target_id: Option<i64>,
    pub status: LogStatus,
    pub ip_address: Option<String>,
    pub details: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LogsPage {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub logs: Vec<AuditLogEntry>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogStats {
    pub total_events: u64,
    #[serde(default)]
    pub by_status: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_operations: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_users: BTreeMap<String, u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TwoFactorEnrollment {
    pub secret: String,
    /// PNG data URL of the provisioning QR code.
    pub qr_code: String,
    pub message: String,
}

impl fmt::Debug for TwoFactorEnrollment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoFactorEnrollment")
            .field("secret", &"***")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_token: Option<String>,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .field("totp_token", &self.totp_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Raw login response. Tokens are optional here so an incomplete response can
/// be rejected explicitly instead of failing to decode.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("message", &self.message)
            .field("user", &self.user)
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[derive(Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct RefreshResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for CreateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateUserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .field("role", &self.role)
            .finish()
    }
}

/// Partial user update; absent fields are left unchanged.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_blocked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UpdateUserRequest {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct RoleUpdateRequest {
    pub role: Role,
}

#[derive(Serialize)]
pub(crate) struct TotpRequest<'a> {
    pub totp_token: &'a str,
}

#[derive(Serialize)]
pub(crate) struct DisableTwoFactorRequest<'a> {
    pub password: &'a str,
}
