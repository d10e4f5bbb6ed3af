use crate::{
    auth::auth::AuthUser,
    error::AppError,
    leave::{DepartmentFilter, LeaveService, OverlapReport},
    model::leave_request::{LeaveWithOwner, StatusCounts},
};
use actix_web::{HttpResponse, web};
use chrono::Local;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct OverviewQuery {
    /// Department to report on; "All" or absent for every department
    #[param(example = "Front Desk")]
    pub department: Option<String>,
}

/// Every leave request with its owner
#[utoipa::path(
    get,
    path = "/api/hr/leave",
    responses(
        (status = 200, description = "All leave requests", body = [LeaveWithOwner]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "HR"
)]
pub async fn leave_panel(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> Result<web::Json<Vec<LeaveWithOwner>>, AppError> {
    Ok(web::Json(service.panel(&auth).await?))
}

/* =========================
Approve leave (manager)
========================= */
/// Approve a pending leave request and charge the owner's balance
#[utoipa::path(
    put,
    path = "/api/hr/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved", body = crate::leave::Transition),
        (status = 400, description = "Owner no longer has enough balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed", body = Object, example = json!({
            "error": "already_processed",
            "message": "leave request 4 has already been processed (Approved)",
            "level": "warning"
        })),
        (status = 503, description = "Did not complete, try again")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "HR"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let transition = service.approve(&auth, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave approved",
        "transition": transition
    })))
}

/* =========================
Reject leave (manager)
========================= */
/// Reject a pending leave request
#[utoipa::path(
    put,
    path = "/api/hr/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = crate::leave::Transition),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already processed"),
        (status = 503, description = "Did not complete, try again")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "HR"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let transition = service.reject(&auth, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave rejected",
        "transition": transition
    })))
}

/// Request counts by status
#[utoipa::path(
    get,
    path = "/api/hr/dashboard",
    responses(
        (status = 200, description = "Status counts", body = StatusCounts),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "HR"
)]
pub async fn dashboard(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> Result<web::Json<StatusCounts>, AppError> {
    Ok(web::Json(service.dashboard(&auth).await?))
}

/// Approved leaves split into current and upcoming, with department overlaps
#[utoipa::path(
    get,
    path = "/api/hr/overview",
    params(OverviewQuery),
    responses(
        (status = 200, description = "Leave overview", body = OverlapReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "HR"
)]
pub async fn leave_overview(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<OverviewQuery>,
) -> Result<web::Json<OverlapReport>, AppError> {
    let department = DepartmentFilter::from_query(query.department.as_deref());
    let today = Local::now().date_naive();

    Ok(web::Json(service.overview(&auth, department, today).await?))
}
