use crate::{
    auth::{auth::AuthUser, password::hash_password},
    config::Config,
    error::AppError,
    model::{role::Role, user::{NewUser, User}},
    store::{LeaveStore, StoreError, UserChanges},
    utils::email_index::EmailIndex,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "John Doe")]
    pub username: String,
    #[schema(example = "john@example.com", format = "email")]
    pub email: String,
    #[schema(example = "johnpassword")]
    pub password: String,
    pub role: Role,
    #[schema(example = "Front Desk")]
    pub department: String,
    /// defaults to the configured balance (21)
    #[schema(example = 21)]
    pub leave_balance: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateUser {
    pub username: Option<String>,
    #[schema(format = "email")]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub leave_balance: Option<i32>,
}

fn check_balance(balance: Option<i32>) -> Result<(), AppError> {
    match balance {
        Some(b) if b < 0 => Err(AppError::BadRequest("leave_balance cannot be negative".to_string())),
        _ => Ok(()),
    }
}

fn non_empty(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

/// All users ordered by department, then name
#[utoipa::path(
    get,
    path = "/api/hr/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<dyn LeaveStore>,
) -> Result<web::Json<Vec<User>>, AppError> {
    auth.require_manager()?;
    Ok(web::Json(store.list_users().await?))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/hr/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Email already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn create_user(
    auth: AuthUser,
    store: web::Data<dyn LeaveStore>,
    emails: web::Data<EmailIndex>,
    config: web::Data<Config>,
    payload: web::Json<CreateUser>,
) -> Result<HttpResponse, AppError> {
    auth.require_manager()?;
    let payload = payload.into_inner();

    let username = non_empty("username", &payload.username)?;
    let email = non_empty("email", &payload.email)?.to_lowercase();
    if payload.password.is_empty() {
        return Err(AppError::BadRequest("password must not be empty".to_string()));
    }
    check_balance(payload.leave_balance)?;

    if !emails.is_available(&email, store.get_ref()).await? {
        return Err(AppError::Store(StoreError::Conflict(format!(
            "email {email} already exists"
        ))));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        AppError::Internal(e.to_string())
    })?;

    let user = store
        .insert_user(NewUser {
            username,
            email,
            password_hash,
            role: payload.role,
            department: payload.department.trim().to_string(),
            leave_balance: payload.leave_balance.unwrap_or(config.default_leave_balance),
        })
        .await?;
    emails.insert(&user.email).await;

    info!(user_id = user.id, created_by = auth.user_id, "User added");
    Ok(HttpResponse::Created().json(user))
}

/// Edit a user's profile, role, department or balance
#[utoipa::path(
    put,
    path = "/api/hr/users/{user_id}",
    params(
        ("user_id" = u64, Path, description = "ID of the user to edit")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn update_user(
    auth: AuthUser,
    store: web::Data<dyn LeaveStore>,
    emails: web::Data<EmailIndex>,
    path: web::Path<u64>,
    payload: web::Json<UpdateUser>,
) -> Result<web::Json<User>, AppError> {
    auth.require_manager()?;
    let user_id = path.into_inner();
    let payload = payload.into_inner();
    check_balance(payload.leave_balance)?;

    let existing = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let email = match payload.email.as_deref() {
        Some(raw) => {
            let email = non_empty("email", raw)?.to_lowercase();
            if !email.eq_ignore_ascii_case(&existing.email)
                && !emails.is_available(&email, store.get_ref()).await?
            {
                return Err(AppError::Store(StoreError::Conflict(format!(
                    "email {email} already exists"
                ))));
            }
            Some(email)
        }
        None => None,
    };

    let changes = UserChanges {
        username: payload.username.as_deref().map(|u| non_empty("username", u)).transpose()?,
        email,
        role: payload.role,
        department: payload.department.map(|d| d.trim().to_string()),
        leave_balance: payload.leave_balance,
    };

    let user = store.update_user(user_id, changes).await?;
    if !user.email.eq_ignore_ascii_case(&existing.email) {
        emails.release(&existing.email).await;
        emails.insert(&user.email).await;
    }

    info!(user_id, updated_by = auth.user_id, "User updated");
    Ok(web::Json(user))
}

async fn set_active(
    auth: AuthUser,
    store: web::Data<dyn LeaveStore>,
    user_id: u64,
    active: bool,
) -> Result<web::Json<User>, AppError> {
    auth.require_manager()?;
    let user = store.set_user_active(user_id, active).await?;

    info!(user_id, active, changed_by = auth.user_id, "User activation changed");
    Ok(web::Json(user))
}

/// Re-enable a deactivated user
#[utoipa::path(
    put,
    path = "/api/hr/users/{user_id}/activate",
    params(
        ("user_id" = u64, Path, description = "ID of the user to activate")
    ),
    responses(
        (status = 200, description = "User activated", body = User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn activate_user(
    auth: AuthUser,
    store: web::Data<dyn LeaveStore>,
    path: web::Path<u64>,
) -> Result<web::Json<User>, AppError> {
    set_active(auth, store, path.into_inner(), true).await
}

/// Deactivate a user; they can no longer log in
#[utoipa::path(
    put,
    path = "/api/hr/users/{user_id}/deactivate",
    params(
        ("user_id" = u64, Path, description = "ID of the user to deactivate")
    ),
    responses(
        (status = 200, description = "User deactivated", body = User),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Users"
)]
pub async fn deactivate_user(
    auth: AuthUser,
    store: web::Data<dyn LeaveStore>,
    path: web::Path<u64>,
) -> Result<web::Json<User>, AppError> {
    set_active(auth, store, path.into_inner(), false).await
}
