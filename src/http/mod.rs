//! HTTP client adapter for the backend REST API.
//!
//! Owns base-URL resolution, bearer-token attachment, the single
//! refresh-then-retry pass on 401, and normalization of every failure
//! into [`ApiError`]. Domain services call through this adapter and never
//! touch reqwest directly.

use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{normalize_base_url, ApiConfig};
use crate::shell::Shell;
use crate::storage::{Storage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY};

/// User-facing message when no response reached the server.
pub const NETWORK_ERROR_MESSAGE: &str =
    "No se pudo conectar con el servidor. Verifica tu conexión.";
/// Fallback message for an error response without `message`/`detail`.
pub const SERVER_ERROR_MESSAGE: &str = "Error del servidor";

/// Normalized request failure. `status` is the HTTP code, `0` when no
/// response arrived (network failure or timeout), `-1` when the request
/// could not even be constructed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("[{status}] {message}")]
pub struct ApiError {
    pub status: i32,
    pub message: String,
    pub errors: Option<Value>,
    pub data: Option<Value>,
}

/// Coarse classification used by callers that branch on failure class
/// rather than exact status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response reached the server; retry is up to the user.
    Network,
    /// The request could not be built or its response not decoded.
    RequestSetup,
    /// Rejected credentials or expired session.
    Auth,
    /// 4xx with server-provided field errors; never retried.
    Validation,
    /// 5xx.
    Server,
    Other,
}

impl ApiError {
    pub fn network() -> Self {
        Self {
            status: 0,
            message: NETWORK_ERROR_MESSAGE.to_string(),
            errors: None,
            data: None,
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self {
            status: -1,
            message: message.into(),
            errors: None,
            data: None,
        }
    }

    /// Build from an error response body, pulling the message out of
    /// `message` then `detail`, with a generic fallback.
    pub fn from_response(status: StatusCode, data: Option<Value>) -> Self {
        let message = data
            .as_ref()
            .and_then(|d| {
                d.get("message")
                    .or_else(|| d.get("detail"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| SERVER_ERROR_MESSAGE.to_string());
        let errors = data.as_ref().and_then(|d| d.get("errors")).cloned();
        Self {
            status: status.as_u16() as i32,
            message,
            errors: errors.filter(|e| !e.is_null()),
            data,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self.status {
            0 => ErrorKind::Network,
            -1 => ErrorKind::RequestSetup,
            401 | 403 => ErrorKind::Auth,
            400 | 422 => ErrorKind::Validation,
            s if s >= 500 => ErrorKind::Server,
            _ => ErrorKind::Other,
        }
    }
}

/// Shared adapter over the backend API.
pub struct HttpClient {
    base_url: String,
    client: reqwest::Client,
    storage: Arc<dyn Storage>,
    shell: Arc<dyn Shell>,
}

impl HttpClient {
    pub fn new(
        config: &ApiConfig,
        storage: Arc<dyn Storage>,
        shell: Arc<dyn Shell>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: normalize_base_url(&config.base_url),
            client,
            storage,
            shell,
        })
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn shell(&self) -> &Arc<dyn Shell> {
        &self.shell
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::setup(e.to_string()))?;
        self.request(Method::POST, path, Some(value)).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::setup(e.to_string()))?;
        self.request(Method::PATCH, path, Some(value)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        let _: Value = self.request(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let value = self.request_value(method, path, body).await?;
        serde_json::from_value(value).map_err(|e| ApiError::setup(e.to_string()))
    }

    /// One request through the adapter, with at most one refresh-and-retry
    /// pass when an expired access token is the likely cause.
    async fn request_value(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.endpoint(path);
        let response = self
            .send(method.clone(), &url, body.as_ref(), self.access_token())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED && !is_auth_entry_point(path) {
            let original = Self::error_from(response).await;
            return match self.refresh_access_token().await {
                Ok(access) => {
                    debug!(path, "Access token refreshed, retrying request");
                    let retried = self.send(method, &url, body.as_ref(), Some(access)).await?;
                    Self::decode(retried).await
                }
                Err(refresh_err) => {
                    // Refresh impossible or rejected: terminate the session
                    // and hand the browser back to the anonymous landing.
                    self.force_logout();
                    if refresh_err.status > 0 {
                        Err(refresh_err)
                    } else {
                        Err(original)
                    }
                }
            };
        }

        Self::decode(response).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        token: Option<String>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await.map_err(|e| {
            if e.is_builder() {
                ApiError::setup(e.to_string())
            } else {
                ApiError::network()
            }
        })
    }

    async fn decode(response: reqwest::Response) -> Result<Value, ApiError> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::setup(e.to_string()))?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::setup(e.to_string()))
    }

    async fn error_from(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let data = response.text().await.ok().and_then(|text| {
            if text.is_empty() {
                None
            } else {
                serde_json::from_str(&text).ok()
            }
        });
        ApiError::from_response(status, data)
    }

    /// Exchange the stored refresh token for a new access token. Called
    /// directly against the auth endpoint so it cannot recurse into the
    /// 401 handling above.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let refresh = self
            .storage
            .get(REFRESH_TOKEN_KEY)
            .ok_or_else(|| ApiError::setup("No refresh token available"))?;

        let url = self.endpoint("auth/token/refresh/");
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(|_| ApiError::network())?;

        let value = Self::decode(response).await?;
        let access = value
            .get("access")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::setup("Refresh response missing access token"))?
            .to_string();
        self.storage.set(ACCESS_TOKEN_KEY, &access);
        Ok(access)
    }

    /// Clear the persisted session and force the anonymous landing state.
    /// This is the only session-terminating path in the adapter.
    fn force_logout(&self) {
        warn!("Session refresh failed, clearing tokens");
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(USER_KEY);
        self.shell.navigate("/");
    }

    fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Login, register, and password-reset requests must surface their 401s
/// untouched instead of triggering a token refresh.
fn is_auth_entry_point(path: &str) -> bool {
    path.contains("auth/login") || path.contains("auth/register") || path.contains("auth/password")
}
