use crate::api::attendance::is_foreign_key_violation;
use crate::auth::auth::AuthUser;
use crate::model::notification::NotificationPreference;
use crate::notify::outbox;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpsertNotification {
    #[schema(example = "parent@example.com", format = "email")]
    pub email: String,
    #[schema(example = true)]
    pub notify_on_absent: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct DispatchRequest {
    #[schema(example = 1)]
    pub student_id: u64,
    #[schema(example = "2024-03-01", format = "date", value_type = String)]
    pub date: NaiveDate,
}

/// Get a student's notification settings
///
/// Absence of a settings row is expected and returns `null`, not an error.
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}/notification",
    params(
        ("student_id" = u64, Path, description = "Student row ID")
    ),
    responses(
        (status = 200, description = "Settings row, or null when none exists", body = NotificationPreference),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn get_notification_settings(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let settings = sqlx::query_as::<_, NotificationPreference>(
        r#"
        SELECT id, student_id, email, notify_on_absent, created_at, updated_at
        FROM email_notifications
        WHERE student_id = ?
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to fetch notification settings");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(settings))
}

/// Create or update a student's notification settings
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}/notification",
    params(
        ("student_id" = u64, Path, description = "Student row ID")
    ),
    request_body = UpsertNotification,
    responses(
        (status = 200, description = "Settings saved", body = Object, example = json!({
            "message": "Email notification settings updated successfully"
        })),
        (status = 400, description = "Empty email"),
        (status = 404, description = "Student not found"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn upsert_notification_settings(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpsertNotification>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let email = payload.email.trim();
    if email.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "email is required"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO email_notifications (student_id, email, notify_on_absent)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE email = ?, notify_on_absent = ?
        "#,
    )
    .bind(student_id)
    .bind(email)
    .bind(payload.notify_on_absent)
    .bind(email)
    .bind(payload.notify_on_absent)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "Email notification settings updated successfully"
        }))),
        Err(e) if is_foreign_key_violation(&e) => Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        }))),
        Err(e) => {
            error!(error = %e, student_id, "Failed to save notification settings");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}

/// Queue an absence notification by hand
///
/// The external trigger for the dispatcher; the attendance workflow queues
/// the same event automatically when a student is marked absent.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/dispatch",
    request_body = DispatchRequest,
    responses(
        (status = 202, description = "Notification queued", body = Object, example = json!({
            "message": "Notification queued"
        })),
        (status = 400, description = "Unknown student"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Notification"
)]
pub async fn dispatch_notification(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<DispatchRequest>,
) -> actix_web::Result<impl Responder> {
    match outbox::enqueue(pool.get_ref(), payload.student_id, payload.date).await {
        Ok(()) => Ok(HttpResponse::Accepted().json(json!({
            "message": "Notification queued"
        }))),
        Err(e) if is_foreign_key_violation(&e) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Unknown student"
        }))),
        Err(e) => {
            error!(error = %e, student_id = payload.student_id, "Failed to queue notification");
            Err(ErrorInternalServerError("Internal Server Error"))
        }
    }
}
