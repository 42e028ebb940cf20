//! User-administration endpoints consumed by the session holder.

use serde_json::json;

use crate::http::{ApiError, HttpClient};
use crate::models::{User, UserRole};

pub async fn change_role(
    http: &HttpClient,
    user_id: &str,
    role: UserRole,
) -> Result<User, ApiError> {
    http.patch(
        &format!("usuarios/{}/cambiar-rol/", user_id),
        &json!({ "role": role.as_str() }),
    )
    .await
}
