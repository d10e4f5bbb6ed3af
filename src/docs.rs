use crate::api::leave_request::CreateLeave;
use crate::api::users::{CreateUser, UpdateUser};
use crate::leave::{OverlapReport, Transition};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveWithOwner, StatusCounts};
use crate::model::role::Role;
use crate::model::user::User;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Desk API",
        version = "0.1.0",
        description = r#"
## Leave management

Staff submit leave requests; managers approve or reject them and follow
leave activity across departments.

### Key features
- **Leave requests**: apply, list your own requests
- **Review**: approve (charges the owner's balance once) or reject pending requests
- **Overview**: current and upcoming approved leave, with same-department overlaps flagged
- **Users**: add, edit, activate and deactivate accounts

### Security
All `/api` endpoints expect a **JWT Bearer** token from `/auth/login`.
Review, overview and user endpoints are limited to the **manager** role.

### Errors
Errors are JSON: `{"error": "<kind>", "message": "..."}`. Re-deciding a
request that was already processed answers `409` with `"level": "warning"`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::my_leaves,

        crate::api::hr::leave_panel,
        crate::api::hr::approve_leave,
        crate::api::hr::reject_leave,
        crate::api::hr::dashboard,
        crate::api::hr::leave_overview,

        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::update_user,
        crate::api::users::activate_user,
        crate::api::users::deactivate_user
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            Role,
            User,
            CreateUser,
            UpdateUser,
            LeaveStatus,
            LeaveRequest,
            LeaveWithOwner,
            CreateLeave,
            StatusCounts,
            Transition,
            OverlapReport
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and current user"),
        (name = "Leave", description = "Leave requests of the acting user"),
        (name = "HR", description = "Manager review and reporting"),
        (name = "Users", description = "User management"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
