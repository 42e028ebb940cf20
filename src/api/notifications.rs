//! Notification endpoints.

use serde::Deserialize;
use serde_json::json;

use crate::http::{ApiError, HttpClient};
use crate::models::Notification;

#[derive(Debug, Deserialize)]
pub struct UnreadCount {
    #[serde(default)]
    pub count: u32,
}

pub async fn my_notifications(http: &HttpClient) -> Result<Vec<Notification>, ApiError> {
    http.get("notificaciones/").await
}

pub async fn mark_read(http: &HttpClient, notification_id: i64) -> Result<(), ApiError> {
    let _: serde_json::Value = http
        .patch(
            &format!("notificaciones/{}/marcar-leida/", notification_id),
            &json!({}),
        )
        .await?;
    Ok(())
}

pub async fn unread_count(http: &HttpClient) -> Result<UnreadCount, ApiError> {
    http.get("notificaciones/no-leidas/count/").await
}
