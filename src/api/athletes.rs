//! Athlete endpoints consumed by the client core (store access checks
//! and post-payment refreshes read the caller's own athletes).

use crate::http::{ApiError, HttpClient};
use crate::models::Athlete;

pub async fn my_athletes(http: &HttpClient) -> Result<Vec<Athlete>, ApiError> {
    http.get("atletas/mis-atletas/").await
}
