//! Auth endpoints. Login, register, and refresh also own persisting the
//! token pair and user snapshot, so the session holder never writes
//! tokens itself.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::http::{ApiError, HttpClient};
use crate::models::{AuthTokens, LoginRequest, ProfileUpdate, RegisterRequest, User};
use crate::storage::{Storage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};

/// Register response; the backend may auto-login the new account by
/// including a token pair.
#[derive(Debug, Deserialize)]
pub struct Registered {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    pub user: User,
}

pub async fn login(http: &HttpClient, email: &str, password: &str) -> Result<AuthTokens, ApiError> {
    let body = LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    };
    let tokens: AuthTokens = http.post("auth/login/", &body).await?;
    persist_tokens(http, &tokens.access, &tokens.refresh);
    persist_user(http, &tokens.user);
    Ok(tokens)
}

pub async fn register(
    http: &HttpClient,
    email: &str,
    password: &str,
    name: &str,
    phone: Option<&str>,
) -> Result<Registered, ApiError> {
    let body = RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        name: name.to_string(),
        phone: phone.map(str::to_string),
    };
    let registered: Registered = http.post("auth/register/", &body).await?;
    if let (Some(access), Some(refresh)) = (&registered.access, &registered.refresh) {
        persist_tokens(http, access, refresh);
        persist_user(http, &registered.user);
    }
    Ok(registered)
}

/// Best-effort server-side invalidation of the refresh token. Local
/// cleanup happens unconditionally; a failed invalidation is logged and
/// swallowed, logout always succeeds from the caller's perspective.
pub async fn logout(http: &HttpClient) {
    if let Some(refresh) = http.storage().get(REFRESH_TOKEN_KEY) {
        let result: Result<serde_json::Value, _> = http
            .post("auth/logout/", &json!({ "refresh": refresh }))
            .await;
        if let Err(err) = result {
            debug!(%err, "Server-side logout failed, clearing local session anyway");
        }
    }
    http.storage().remove(ACCESS_TOKEN_KEY);
    http.storage().remove(REFRESH_TOKEN_KEY);
    http.storage().remove(USER_KEY);
}

pub async fn current_user(http: &HttpClient) -> Result<User, ApiError> {
    http.get("auth/me/").await
}

/// PATCH the profile; on success the server's snapshot is persisted.
pub async fn update_profile(http: &HttpClient, update: &ProfileUpdate) -> Result<User, ApiError> {
    let user: User = http.patch("auth/me/", update).await?;
    persist_user(http, &user);
    Ok(user)
}

pub async fn request_password_reset(http: &HttpClient, email: &str) -> Result<(), ApiError> {
    let _: serde_json::Value = http
        .post("auth/password/reset/", &json!({ "email": email }))
        .await?;
    Ok(())
}

pub async fn validate_reset_code(
    http: &HttpClient,
    email: &str,
    code: &str,
) -> Result<(), ApiError> {
    let _: serde_json::Value = http
        .post(
            "auth/password/reset/validate/",
            &json!({ "email": email, "code": code }),
        )
        .await?;
    Ok(())
}

pub async fn confirm_password_reset(
    http: &HttpClient,
    email: &str,
    code: &str,
    new_password: &str,
) -> Result<(), ApiError> {
    let _: serde_json::Value = http
        .post(
            "auth/password/reset/confirm/",
            &json!({ "email": email, "code": code, "new_password": new_password }),
        )
        .await?;
    Ok(())
}

pub(crate) fn persist_tokens(http: &HttpClient, access: &str, refresh: &str) {
    http.storage().set(ACCESS_TOKEN_KEY, access);
    http.storage().set(REFRESH_TOKEN_KEY, refresh);
}

pub(crate) fn persist_user(http: &HttpClient, user: &User) {
    if let Ok(snapshot) = serde_json::to_string(user) {
        http.storage().set(USER_KEY, &snapshot);
    }
}
