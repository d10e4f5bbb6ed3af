use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token, password::verify_password},
    config::Config,
    error::AppError,
    model::user::User,
    models::{LoginReqDto, LoginResponse},
    store::LeaveStore,
};
use actix_web::{HttpResponse, web};
use tracing::{debug, error, info, instrument};

/// Exchange email and password for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials or inactive account")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<dyn LeaveStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(AppError::BadRequest("Email and password are required".to_string()));
    }

    debug!("Fetching user");

    let db_user = match store.find_user_by_email(user.email.trim()).await? {
        Some(u) => u,
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::Unauthenticated("Invalid credentials"));
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthenticated("Invalid credentials"));
    }

    if !db_user.active {
        info!(user_id = db_user.id, "Login refused: account deactivated");
        return Err(AppError::Unauthenticated("Account is deactivated"));
    }

    let access_token = generate_access_token(
        db_user.id,
        db_user.email.clone(),
        db_user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        AppError::Internal(e.to_string())
    })?;

    info!(user_id = db_user.id, role = %db_user.role, "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
        role: db_user.role,
    }))
}

/// Profile and remaining leave balance of the acting user
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(
    auth: AuthUser,
    store: web::Data<dyn LeaveStore>,
) -> Result<web::Json<User>, AppError> {
    let user = store
        .find_user(auth.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(web::Json(user))
}
