use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Per-student absence-notification settings. One row per student.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct NotificationPreference {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub student_id: u64,

    #[schema(example = "parent@example.com")]
    pub email: String,

    #[schema(example = true)]
    pub notify_on_absent: bool,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A queued absence notification awaiting delivery by the dispatcher.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct OutboxEntry {
    pub id: u64,
    pub student_id: u64,
    pub date: NaiveDate,
    pub attempts: u32,
}
