use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(sqlx::FromRow)]
struct StatisticsRow {
    student_id: u64,
    student_code: String,
    first_name: String,
    last_name: String,
    present_count: i64,
    absent_count: i64,
    late_count: i64,
    total_days: i64,
}

#[derive(Serialize, ToSchema)]
pub struct StudentStatistics {
    #[schema(example = 1)]
    pub student_id: u64,
    #[schema(example = "2020-4535")]
    pub student_code: String,
    #[schema(example = "Daxton")]
    pub first_name: String,
    #[schema(example = "Farmer")]
    pub last_name: String,
    #[schema(example = 13)]
    pub present_count: i64,
    #[schema(example = 2)]
    pub absent_count: i64,
    #[schema(example = 7)]
    pub late_count: i64,
    #[schema(example = 22)]
    pub total_days: i64,
    /// Share of recorded days the student attended (present or late), in percent
    #[schema(example = 90.9)]
    pub attendance_rate: f64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportRangeQuery {
    #[schema(example = "2024-02-01", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-03-01", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct DailyCounts {
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 21)]
    pub present_count: i64,
    #[schema(example = 2)]
    pub absent_count: i64,
    #[schema(example = 1)]
    pub late_count: i64,
    #[schema(example = 24)]
    pub total: i64,
}

/// Attended share of recorded days, rounded to one decimal place.
pub fn attendance_rate(present: i64, late: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    ((present + late) as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Per-student attendance statistics across all recorded days
#[utoipa::path(
    get,
    path = "/api/v1/reports/statistics",
    responses(
        (status = 200, description = "Per-student totals and attendance rate", body = [StudentStatistics]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn statistics(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let rows = sqlx::query_as::<_, StatisticsRow>(
        r#"
        SELECT s.id AS student_id,
               s.student_code,
               s.first_name,
               s.last_name,
               CAST(SUM(CASE WHEN a.status = 'present' THEN 1 ELSE 0 END) AS SIGNED) AS present_count,
               CAST(SUM(CASE WHEN a.status = 'absent' THEN 1 ELSE 0 END) AS SIGNED) AS absent_count,
               CAST(SUM(CASE WHEN a.status = 'late' THEN 1 ELSE 0 END) AS SIGNED) AS late_count,
               COUNT(a.id) AS total_days
        FROM students s
        LEFT JOIN attendance a ON a.student_id = s.id
        GROUP BY s.id, s.student_code, s.first_name, s.last_name
        ORDER BY s.student_code ASC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to compute attendance statistics");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let stats: Vec<StudentStatistics> = rows
        .into_iter()
        .map(|r| StudentStatistics {
            attendance_rate: attendance_rate(r.present_count, r.late_count, r.total_days),
            student_id: r.student_id,
            student_code: r.student_code,
            first_name: r.first_name,
            last_name: r.last_name,
            present_count: r.present_count,
            absent_count: r.absent_count,
            late_count: r.late_count,
            total_days: r.total_days,
        })
        .collect();

    Ok(HttpResponse::Ok().json(stats))
}

/// Daily attendance counts over a date range
#[utoipa::path(
    get,
    path = "/api/v1/reports/by-date",
    params(ReportRangeQuery),
    responses(
        (status = 200, description = "Per-day counts, oldest first", body = [DailyCounts]),
        (status = 400, description = "start_date after end_date"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Report"
)]
pub async fn by_date(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<ReportRangeQuery>,
) -> actix_web::Result<impl Responder> {
    if query.start_date > query.end_date {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "start_date cannot be after end_date"
        })));
    }

    let rows = sqlx::query_as::<_, DailyCounts>(
        r#"
        SELECT a.date,
               CAST(SUM(CASE WHEN a.status = 'present' THEN 1 ELSE 0 END) AS SIGNED) AS present_count,
               CAST(SUM(CASE WHEN a.status = 'absent' THEN 1 ELSE 0 END) AS SIGNED) AS absent_count,
               CAST(SUM(CASE WHEN a.status = 'late' THEN 1 ELSE 0 END) AS SIGNED) AS late_count,
               COUNT(*) AS total
        FROM attendance a
        WHERE a.date BETWEEN ? AND ?
        GROUP BY a.date
        ORDER BY a.date ASC
        "#,
    )
    .bind(query.start_date)
    .bind(query.end_date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to compute daily counts");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_counts_present_and_late_as_attended() {
        assert_eq!(attendance_rate(13, 7, 22), 90.9);
    }

    #[test]
    fn rate_is_zero_with_no_recorded_days() {
        assert_eq!(attendance_rate(0, 0, 0), 0.0);
    }

    #[test]
    fn full_attendance_is_one_hundred_percent() {
        assert_eq!(attendance_rate(10, 0, 10), 100.0);
    }
}
