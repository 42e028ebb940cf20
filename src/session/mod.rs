//! Session and authorization state holder.
//!
//! Single owner of the logged-in user and the derived block flag. The
//! state machine is `Anonymous → Authenticated(role) →
//! Authenticated+Blocked`; every transition goes through one of the
//! operations below, never through direct field writes. `&mut self`
//! enforces the single-writer discipline the rest of the app relies on.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api;
use crate::http::HttpClient;
use crate::models::{DebtConfig, ProfileUpdate, User, UserRole};
use crate::storage::{Storage, ACCESS_TOKEN_KEY, DEBT_CONFIG_KEY};

/// Default overdue-days threshold before an account is blocked.
pub const DEFAULT_BLOCK_DAYS: i64 = 30;
/// Configured thresholds are clamped to at least this many days.
pub const MIN_BLOCK_DAYS: i64 = 4;

/// Result of a login attempt. `message` is populated only on failure,
/// already mapped to a user-facing string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    pub message: Option<String>,
}

impl LoginOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

pub struct Session {
    http: Arc<HttpClient>,
    user: Option<User>,
    is_blocked: bool,
}

impl Session {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self {
            http,
            user: None,
            is_blocked: false,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn role(&self) -> Option<UserRole> {
        self.user.as_ref().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_blocked(&self) -> bool {
        self.is_blocked
    }

    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    /// Silent restore at process start: if a token pair survived the last
    /// visit, re-fetch the profile. No-op for anonymous visitors.
    pub async fn restore(&mut self) {
        if self.http.storage().get(ACCESS_TOKEN_KEY).is_none() {
            return;
        }
        self.refresh_user().await;
    }

    /// Authenticate. On failure the session state is untouched and the
    /// server's message is mapped to a small fixed set of user-facing
    /// strings; unrecognized messages pass through verbatim.
    pub async fn login(&mut self, email: &str, password: &str) -> LoginOutcome {
        match api::auth::login(&self.http, email, password).await {
            Ok(tokens) => {
                info!(email, "Login successful");
                self.user = Some(tokens.user);
                self.evaluate_block().await;
                LoginOutcome::ok()
            }
            Err(err) => {
                debug!(email, status = err.status, "Login rejected");
                let raw = err.message.trim().to_string();
                let normalized = raw.to_lowercase();
                let friendly = if raw.is_empty() || normalized.contains("no active account") {
                    "Credenciales incorrectas".to_string()
                } else if normalized.contains("disabled") {
                    "La cuenta está deshabilitada".to_string()
                } else {
                    raw
                };
                LoginOutcome::failed(friendly)
            }
        }
    }

    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
        phone: Option<&str>,
    ) -> bool {
        match api::auth::register(&self.http, email, password, name, phone).await {
            Ok(registered) => {
                self.user = Some(registered.user);
                self.evaluate_block().await;
                true
            }
            Err(err) => {
                debug!(email, status = err.status, "Registration rejected");
                false
            }
        }
    }

    /// Log out. Server-side invalidation is best-effort; local state is
    /// cleared unconditionally and this never fails.
    pub async fn logout(&mut self) {
        api::auth::logout(&self.http).await;
        self.user = None;
        self.is_blocked = false;
        info!("Session closed");
    }

    /// Re-fetch the current profile. On failure the previous state stays
    /// as-is; only the adapter's 401 handling ever logs the user out.
    pub async fn refresh_user(&mut self) {
        match api::auth::current_user(&self.http).await {
            Ok(user) => {
                api::auth::persist_user(&self.http, &user);
                self.user = Some(user);
                self.evaluate_block().await;
            }
            Err(err) => {
                debug!(status = err.status, "Profile refresh failed, keeping cached user");
            }
        }
    }

    /// Recompute the block flag from outstanding debts. Admin accounts
    /// are never blocked. A fetch failure leaves the account unblocked:
    /// a transient network error must not lock anyone out.
    pub async fn evaluate_block(&mut self) {
        if self.role().map(|r| r.is_admin()).unwrap_or(false) {
            self.is_blocked = false;
            return;
        }

        let threshold = block_threshold(&self.http);
        match api::payments::my_debts(&self.http).await {
            Ok(debts) => {
                let today = Utc::now().date_naive();
                let max_overdue = debts
                    .iter()
                    .filter(|d| !d.is_paid())
                    .filter_map(|d| d.fecha_vencimiento)
                    .map(|due| (today - due).num_days().max(0))
                    .max()
                    .unwrap_or(0);
                self.is_blocked = max_overdue >= threshold;
                if self.is_blocked {
                    warn!(max_overdue, threshold, "Account blocked by overdue debt");
                }
            }
            Err(err) => {
                debug!(status = err.status, "Debt check failed, leaving account unblocked");
                self.is_blocked = false;
            }
        }
    }

    /// Request a server-side role change, fire-and-forget. When the
    /// affected user is the session user the cached role updates
    /// immediately, so a server-side rejection leaves the cache stale
    /// until the next `refresh_user`.
    pub fn update_user_role(&mut self, user_id: &str, new_role: UserRole) -> bool {
        let http = self.http.clone();
        let id = user_id.to_string();
        tokio::spawn(async move {
            if let Err(err) = api::users::change_role(&http, &id, new_role).await {
                warn!(user_id = %id, %err, "Role change request failed");
            }
        });

        if let Some(user) = self.user.as_mut() {
            if user.id == user_id {
                user.role = new_role;
                api::auth::persist_user(&self.http, user);
            }
        }
        true
    }

    /// Issue a profile update and merge it into the cache without
    /// waiting for the server. Returns `false` only when nobody is
    /// logged in; a failed request still leaves the optimistic merge in
    /// place until the next `refresh_user`.
    pub fn update_user_profile(&mut self, update: ProfileUpdate) -> bool {
        let Some(user) = self.user.as_mut() else {
            return false;
        };

        let http = self.http.clone();
        let payload = update.clone();
        tokio::spawn(async move {
            if let Err(err) = api::auth::update_profile(&http, &payload).await {
                warn!(%err, "Profile update request failed");
            }
        });

        update.apply_to(user);
        api::auth::persist_user(&self.http, user);
        true
    }

    /// Local-only `public → apoderado` promotion. The backend promotes
    /// authoritatively once the matriculation payment is confirmed; this
    /// keeps the UI consistent in the meantime.
    pub fn upgrade_to_apoderado(&mut self) {
        if let Some(user) = self.user.as_mut() {
            if user.role == UserRole::Public {
                user.role = UserRole::Apoderado;
                api::auth::persist_user(&self.http, user);
            }
        }
    }

    pub async fn request_password_reset(&self, email: &str) -> bool {
        api::auth::request_password_reset(&self.http, email)
            .await
            .is_ok()
    }

    pub async fn validate_reset_code(&self, email: &str, code: &str) -> bool {
        api::auth::validate_reset_code(&self.http, email, code)
            .await
            .is_ok()
    }

    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> bool {
        api::auth::confirm_password_reset(&self.http, email, code, new_password)
            .await
            .is_ok()
    }
}

/// Read the block threshold from the local `configuracionDeuda` override,
/// clamped to [`MIN_BLOCK_DAYS`]. Malformed JSON is ignored.
fn block_threshold(http: &HttpClient) -> i64 {
    http.storage()
        .get(DEBT_CONFIG_KEY)
        .and_then(|raw| serde_json::from_str::<DebtConfig>(&raw).ok())
        .map(|cfg| cfg.dias_bloqueo.max(MIN_BLOCK_DAYS))
        .unwrap_or(DEFAULT_BLOCK_DAYS)
}
