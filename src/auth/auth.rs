use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// The acting user, installed into request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or(AppError::Unauthenticated("Missing token")),
        )
    }
}

impl AuthUser {
    /// The one gate in front of every manager-only action.
    ///
    /// The role is the one signed into the access token, so a demotion or
    /// deactivation takes effect when that token expires.
    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.role.is_manager() {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.user_id,
                email = %self.email,
                role = %self.role,
                "Manager-only action refused"
            );
            Err(AppError::Forbidden("managers only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_managers_pass_the_gate() {
        let manager = AuthUser {
            user_id: 1,
            email: "hr@example.com".to_string(),
            role: Role::Manager,
        };
        let staff = AuthUser {
            role: Role::Staff,
            ..manager.clone()
        };

        assert!(manager.require_manager().is_ok());
        assert!(matches!(staff.require_manager(), Err(AppError::Forbidden(_))));
    }
}
