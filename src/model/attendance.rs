use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Daily attendance status. Stored as a lowercase string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "student_id": 1,
        "date": "2024-03-01",
        "status": "absent",
        "note": "Parent called in",
        "created_at": "2024-03-01T08:15:00Z"
    })
)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub student_id: u64,

    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "absent")]
    pub status: String,

    #[schema(example = "Parent called in", nullable = true)]
    pub note: Option<String>,

    #[schema(example = "2024-03-01T08:15:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_serde() {
        let status: AttendanceStatus = serde_json::from_str("\"absent\"").unwrap();
        assert_eq!(status, AttendanceStatus::Absent);
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"absent\"");
    }

    #[test]
    fn status_as_str_matches_stored_column_values() {
        assert_eq!(AttendanceStatus::Present.as_str(), "present");
        assert_eq!(AttendanceStatus::Absent.as_str(), "absent");
        assert_eq!(AttendanceStatus::Late.as_str(), "late");
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(serde_json::from_str::<AttendanceStatus>("\"excused\"").is_err());
    }
}
