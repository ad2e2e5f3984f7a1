use crate::auth::auth::AuthUser;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::notify::outbox;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct RecordAttendance {
    #[schema(example = 1)]
    pub student_id: u64,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "absent")]
    pub status: AttendanceStatus,
    #[schema(example = "Parent called in")]
    pub note: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// Calendar day to list records for
    #[schema(example = "2024-03-01", value_type = String)]
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceRecord>,
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// List attendance for one calendar day
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Records for the requested day, most recent action first", body = AttendanceListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, student_id, date, status, note, created_at
        FROM attendance
        WHERE date = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(query.date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, date = %query.date, "Failed to fetch attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse { data: records }))
}

/// Record attendance (strict insert)
///
/// Rejects a second submission for the same (student, date): the store's
/// unique key on that pair is the source of truth, so two racing submissions
/// cannot both insert.
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = RecordAttendance,
    responses(
        (status = 200, description = "Attendance recorded", body = Object, example = json!({
            "message": "Attendance recorded"
        })),
        (status = 400, description = "Missing student or unknown student"),
        (status = 409, description = "Already recorded for this student and date", body = Object, example = json!({
            "message": "Attendance already recorded for this student on this date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RecordAttendance>,
) -> actix_web::Result<impl Responder> {
    if payload.student_id == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "student_id is required"
        })));
    }

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (student_id, date, status, note)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(payload.student_id)
    .bind(payload.date)
    .bind(payload.status.as_str())
    .bind(&payload.note)
    .execute(&mut *tx)
    .await;

    if let Err(e) = result {
        if is_unique_violation(&e) {
            return Ok(HttpResponse::Conflict().json(serde_json::json!({
                "message": "Attendance already recorded for this student on this date"
            })));
        }
        if is_foreign_key_violation(&e) {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "message": "Unknown student"
            })));
        }
        tracing::error!(error = %e, student_id = payload.student_id, "Failed to record attendance");
        return Err(ErrorInternalServerError("Internal Server Error"));
    }

    // Queue the absence notice in the same transaction as the write, so the
    // event exists iff the record does. Delivery runs in the dispatcher and
    // can never fail this request.
    if payload.status == AttendanceStatus::Absent {
        outbox::enqueue(&mut *tx, payload.student_id, payload.date)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, student_id = payload.student_id, "Failed to queue absence notice");
                ErrorInternalServerError("Internal Server Error")
            })?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to commit attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance recorded"
    })))
}

/// Mark attendance (toggle upsert)
///
/// Repeated calls for one (student, date) converge to a single record holding
/// the last submitted status. Re-applying the current status changes nothing
/// and queues nothing; a genuine transition to absent queues exactly one
/// notice.
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    request_body = RecordAttendance,
    responses(
        (status = 200, description = "Attendance saved", body = Object, example = json!({
            "message": "Attendance saved"
        })),
        (status = 400, description = "Missing student or unknown student"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<RecordAttendance>,
) -> actix_web::Result<impl Responder> {
    if payload.student_id == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "student_id is required"
        })));
    }

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to open transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (student_id, date, status, note)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE status = ?
        "#,
    )
    .bind(payload.student_id)
    .bind(payload.date)
    .bind(payload.status.as_str())
    .bind(&payload.note)
    .bind(payload.status.as_str())
    .execute(&mut *tx)
    .await;

    let result = match result {
        Ok(r) => r,
        Err(e) => {
            if is_foreign_key_violation(&e) {
                return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                    "message": "Unknown student"
                })));
            }
            tracing::error!(error = %e, student_id = payload.student_id, "Failed to mark attendance");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    };

    // rows_affected: 1 = inserted, 2 = status changed, 0 = no-op re-apply
    if payload.status == AttendanceStatus::Absent && result.rows_affected() > 0 {
        outbox::enqueue(&mut *tx, payload.student_id, payload.date)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, student_id = payload.student_id, "Failed to queue absence notice");
                ErrorInternalServerError("Internal Server Error")
            })?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to commit attendance");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance saved"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_payload_parses_with_optional_note() {
        let payload: RecordAttendance = serde_json::from_str(
            r#"{"student_id": 1, "date": "2024-03-01", "status": "absent"}"#,
        )
        .unwrap();
        assert_eq!(payload.status, AttendanceStatus::Absent);
        assert_eq!(payload.note, None);
        assert_eq!(payload.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn record_payload_rejects_bad_status() {
        let result = serde_json::from_str::<RecordAttendance>(
            r#"{"student_id": 1, "date": "2024-03-01", "status": "holiday"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn record_payload_rejects_missing_date() {
        let result =
            serde_json::from_str::<RecordAttendance>(r#"{"student_id": 1, "status": "late"}"#);
        assert!(result.is_err());
    }
}
