use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "student_code": "2020-4535",
        "first_name": "Daxton",
        "last_name": "Farmer",
        "email": "daxton.farmer@example.com",
        "branch_id": 2,
        "branch_name": "North Campus",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
)]
pub struct Student {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "2020-4535")]
    pub student_code: String,

    #[schema(example = "Daxton")]
    pub first_name: String,

    #[schema(example = "Farmer")]
    pub last_name: String,

    #[schema(example = "daxton.farmer@example.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = 2)]
    pub branch_id: u64,

    /// Resolved from the branch reference on reads.
    #[schema(example = "North Campus", nullable = true)]
    pub branch_name: Option<String>,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}
