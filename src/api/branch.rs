use crate::auth::auth::AuthUser;
use crate::model::branch::Branch;
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateBranch {
    #[schema(example = "North Campus")]
    pub name: String,
}

/// List branches
#[utoipa::path(
    get,
    path = "/api/v1/branches",
    responses(
        (status = 200, description = "All branches, ordered by name", body = [Branch]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Branch"
)]
pub async fn list_branches(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let branches =
        sqlx::query_as::<_, Branch>("SELECT id, name, created_at FROM branches ORDER BY name")
            .fetch_all(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch branches");
                ErrorInternalServerError("Internal Server Error")
            })?;

    Ok(HttpResponse::Ok().json(branches))
}

/// Create Branch
///
/// Branches are immutable once created; there is no update or delete.
#[utoipa::path(
    post,
    path = "/api/v1/branches",
    request_body = CreateBranch,
    responses(
        (status = 200, description = "Branch created", body = Object, example = json!({
            "message": "Branch added successfully"
        })),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Branch"
)]
pub async fn create_branch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateBranch>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Branch name is required"
        })));
    }

    sqlx::query("INSERT INTO branches (name) VALUES (?)")
        .bind(name)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create branch");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Branch added successfully"
    })))
}
