use crate::{
    api::attendance::{is_foreign_key_violation, is_unique_violation},
    auth::auth::AuthUser,
    model::student::Student,
    utils::db_utils::{build_update_sql, execute_update},
    utils::roster_io::{self, RosterRow},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

/// Columns a partial update may touch.
const STUDENT_UPDATE_COLUMNS: &[&str] =
    &["student_code", "first_name", "last_name", "email", "branch_id"];

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateStudent {
    #[schema(example = "2020-4535", value_type = String)]
    pub student_code: String,
    #[schema(example = "Daxton", value_type = String)]
    pub first_name: String,
    #[schema(example = "Farmer", value_type = String)]
    pub last_name: String,
    #[schema(example = "daxton.farmer@example.com", format = "email", value_type = String)]
    pub email: Option<String>,
    #[schema(example = 1, value_type = u64)]
    pub branch_id: u64,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StudentQuery {
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    #[schema(example = 20)]
    /// Items per page
    pub per_page: Option<u32>,
    #[schema(example = 1)]
    /// Filter by branch
    pub branch_id: Option<u64>,
    #[schema(example = "farmer")]
    /// Free-text match against name, student code, or email
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Like(String),
}

fn roster_filters(query: &StudentQuery) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(branch_id) = query.branch_id {
        where_sql.push_str(" AND s.branch_id = ?");
        args.push(FilterValue::U64(branch_id));
    }

    if let Some(search) = query.search.as_deref() {
        if !search.is_empty() {
            where_sql.push_str(
                " AND (s.first_name LIKE ? OR s.last_name LIKE ? OR s.student_code LIKE ? OR s.email LIKE ?)",
            );
            let like = format!("%{}%", search);
            for _ in 0..4 {
                args.push(FilterValue::Like(like.clone()));
            }
        }
    }

    (where_sql, args)
}

fn bind_filters<'q, O>(
    mut query: sqlx::query::QueryAs<'q, sqlx::MySql, O, sqlx::mysql::MySqlArguments>,
    args: &'q [FilterValue],
) -> sqlx::query::QueryAs<'q, sqlx::MySql, O, sqlx::mysql::MySqlArguments> {
    for arg in args {
        query = match arg {
            FilterValue::U64(v) => query.bind(*v),
            FilterValue::Like(s) => query.bind(s.as_str()),
        };
    }
    query
}

/// Create Student
#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = CreateStudent,
    responses(
        (status = 200, description = "Student created successfully", body = Object, example = json!({
            "message": "Student added successfully"
        })),
        (status = 400, description = "Validation failure or unknown branch"),
        (status = 409, description = "Student code already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student"
)]
pub async fn create_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.student_code.trim().is_empty()
        || payload.first_name.trim().is_empty()
        || payload.last_name.trim().is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "student_code, first_name and last_name are required"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO students (student_code, first_name, last_name, email, branch_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.student_code.trim())
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(&payload.email)
    .bind(payload.branch_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({
            "message": "Student added successfully"
        }))),
        Err(e) if is_unique_violation(&e) => Ok(HttpResponse::Conflict().json(json!({
            "message": "Student code already exists"
        }))),
        Err(e) if is_foreign_key_violation(&e) => Ok(HttpResponse::BadRequest().json(json!({
            "message": "Unknown branch"
        }))),
        Err(e) => {
            error!(error = %e, "Failed to create student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// List the roster, optionally filtered by branch and free-text search
#[utoipa::path(
    get,
    path = "/api/v1/students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Paginated roster", body = StudentListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student"
)]
pub async fn list_students(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let (where_sql, args) = roster_filters(&query);

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM students s{}", where_sql);
    debug!(sql = %count_sql, "Counting students");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_query = match arg {
            FilterValue::U64(v) => count_query.bind(*v),
            FilterValue::Like(s) => count_query.bind(s.as_str()),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count students");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        r#"
        SELECT s.id, s.student_code, s.first_name, s.last_name, s.email,
               s.branch_id, b.name AS branch_name, s.created_at, s.updated_at
        FROM students s
        LEFT JOIN branches b ON b.id = s.branch_id
        {}
        ORDER BY s.student_code ASC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );
    debug!(sql = %data_sql, page, per_page, offset, "Fetching students");

    let data_query = sqlx::query_as::<_, Student>(&data_sql);
    let data_query = bind_filters(data_query, &args)
        .bind(per_page as i64)
        .bind(offset as i64);

    let students = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch students");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(StudentListResponse {
        data: students,
        page,
        per_page,
        total,
    }))
}

/// Get Student by ID
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student row ID")
    ),
    responses(
        (status = 200, description = "Student found", body = Student),
        (status = 404, description = "Student not found", body = Object, example = json!({
            "message": "Student not found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student"
)]
pub async fn get_student(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let student_id = path.into_inner();

    let student = sqlx::query_as::<_, Student>(
        r#"
        SELECT s.id, s.student_code, s.first_name, s.last_name, s.email,
               s.branch_id, b.name AS branch_name, s.created_at, s.updated_at
        FROM students s
        LEFT JOIN branches b ON b.id = s.branch_id
        WHERE s.id = ?
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to fetch student");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match student {
        Some(s) => Ok(HttpResponse::Ok().json(s)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        }))),
    }
}

/// Update Student
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}",
    params(
        ("student_id" = u64, Path, description = "Student row ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Student updated successfully"),
        (status = 400, description = "Unknown field in payload"),
        (status = 404, description = "Student not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student"
)]
pub async fn update_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let student_id = path.into_inner();

    let update = build_update_sql("students", &body, STUDENT_UPDATE_COLUMNS, "id", student_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Student not found"));
    }

    Ok(HttpResponse::Ok().body("Student updated successfully"))
}

/// Bulk-import students from CSV
///
/// Columns: `student_id, first_name, last_name, email, branch_id`. Rows are
/// inserted as new students with no duplicate pre-check; the whole batch is
/// one transaction, so a rejected row imports nothing.
#[utoipa::path(
    post,
    path = "/api/v1/students/import",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Students imported", body = Object, example = json!({
            "message": "Students imported successfully",
            "imported": 25
        })),
        (status = 400, description = "Malformed CSV"),
        (status = 409, description = "Student code collision"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student"
)]
pub async fn import_students(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Bytes,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let rows = match roster_io::read_roster(&body) {
        Ok(rows) => rows,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Invalid CSV: {e}")
            })));
        }
    };

    if rows.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No rows to import"
        })));
    }

    let mut tx = pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        ErrorInternalServerError("Internal Server Error")
    })?;

    for row in &rows {
        let result = sqlx::query(
            r#"
            INSERT INTO students (student_code, first_name, last_name, email, branch_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.student_code)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.email)
        .bind(row.branch_id)
        .execute(&mut *tx)
        .await;

        if let Err(e) = result {
            if is_unique_violation(&e) {
                return Ok(HttpResponse::Conflict().json(json!({
                    "message": format!("Student code already exists: {}", row.student_code)
                })));
            }
            if is_foreign_key_violation(&e) {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": format!("Unknown branch for student {}", row.student_code)
                })));
            }
            error!(error = %e, student_code = %row.student_code, "Import insert failed");
            return Err(ErrorInternalServerError("Internal Server Error"));
        }
    }

    let imported = rows.len();

    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit import");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Students imported successfully",
        "imported": imported
    })))
}

/// Export the current filtered roster as CSV
#[utoipa::path(
    get,
    path = "/api/v1/students/export",
    params(StudentQuery),
    responses(
        (status = 200, description = "Roster CSV", content_type = "text/csv"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student"
)]
pub async fn export_students(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    let (where_sql, args) = roster_filters(&query);

    let data_sql = format!(
        r#"
        SELECT s.student_code, s.first_name, s.last_name, s.email, s.branch_id
        FROM students s
        {}
        ORDER BY s.student_code ASC
        "#,
        where_sql
    );

    let data_query = sqlx::query_as::<_, RosterRow>(&data_sql);
    let rows = bind_filters(data_query, &args)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch roster for export");
            ErrorInternalServerError("Database error")
        })?;

    let csv = roster_io::write_roster(&rows).map_err(|e| {
        error!(error = %e, "Failed to encode roster CSV");
        ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            "attachment; filename=\"students.csv\"",
        ))
        .body(csv))
}
