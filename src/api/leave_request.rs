use crate::{
    auth::auth::AuthUser,
    error::AppError,
    leave::LeaveService,
    model::leave_request::LeaveRequest,
};
use actix_web::{HttpResponse, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-03-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family visit")]
    pub reason: String,
}

/* =========================
Apply for leave
========================= */
/// Submit a leave request for the acting user
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates, missing reason or insufficient balance", body = Object, example = json!({
            "error": "insufficient_balance",
            "message": "insufficient leave balance: 31 day(s) requested, 10 left",
            "balance": 10,
            "requested": 31
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let today = Local::now().date_naive();

    let leave = service
        .apply(&auth, payload.start_date, payload.end_date, &payload.reason, today)
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": format!("Leave request submitted for {} day(s).", leave.days),
        "leave": leave
    })))
}

/// The acting user's leave requests, latest first
#[utoipa::path(
    get,
    path = "/api/leave",
    responses(
        (status = 200, description = "Own leave requests", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> Result<web::Json<Vec<LeaveRequest>>, AppError> {
    Ok(web::Json(service.my_leaves(&auth).await?))
}
