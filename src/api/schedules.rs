//! Schedule endpoints.

use crate::http::{ApiError, HttpClient};
use crate::models::ScheduleEntry;

pub async fn my_schedule(http: &HttpClient) -> Result<Vec<ScheduleEntry>, ApiError> {
    http.get("horarios/mis-horarios/").await
}
