use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::leave::lifecycle::LifecycleError;
use crate::leave::validator::ValidationError;
use crate::store::{StoreError, TransitionError};

/// Every failure a handler can answer with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("access denied: {0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TransitionError> for AppError {
    fn from(value: TransitionError) -> Self {
        match value {
            TransitionError::NotFound(_) => AppError::NotFound("leave request"),
            TransitionError::Lifecycle(err) => AppError::Lifecycle(err),
            TransitionError::Store(err) => AppError::Store(err),
        }
    }
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(ValidationError::InvalidDateRange { .. }) => "invalid_date_range",
            AppError::Validation(ValidationError::InsufficientBalance { .. })
            | AppError::Lifecycle(LifecycleError::InsufficientBalance { .. }) => {
                "insufficient_balance"
            }
            AppError::Validation(_) => "invalid_request",
            AppError::Lifecycle(LifecycleError::AlreadyProcessed { .. }) => "already_processed",
            AppError::Forbidden(_) => "access_denied",
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::Store(StoreError::Conflict(_)) => "conflict",
            AppError::Store(StoreError::Transient(_)) => "try_again",
            AppError::Store(_) | AppError::Internal(_) => "internal",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Lifecycle(LifecycleError::InsufficientBalance { .. }) => StatusCode::BAD_REQUEST,
            AppError::Lifecycle(LifecycleError::AlreadyProcessed { .. }) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) | AppError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Store(StoreError::Transient(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Store(StoreError::Transient(_)) => {
                "The action did not complete, please try again".to_string()
            }
            AppError::Store(StoreError::Unavailable(_) | StoreError::Corrupt(_))
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "error": self.kind(),
            "message": message,
        });

        match self {
            AppError::Validation(ValidationError::InsufficientBalance { balance, requested })
            | AppError::Lifecycle(LifecycleError::InsufficientBalance { balance, requested }) => {
                body["balance"] = json!(balance);
                body["requested"] = json!(requested);
            }
            AppError::Lifecycle(LifecycleError::AlreadyProcessed { .. }) => {
                body["level"] = json!("warning");
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveStatus;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn already_processed_is_a_warning() {
        let err = AppError::from(LifecycleError::AlreadyProcessed {
            id: 4,
            status: LeaveStatus::Approved,
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "already_processed");
        assert_eq!(body["level"], "warning");
    }

    #[actix_web::test]
    async fn insufficient_balance_carries_the_balance() {
        let err = AppError::from(ValidationError::InsufficientBalance {
            requested: 31,
            balance: 10,
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["balance"], 10);
        assert_eq!(body["requested"], 31);
    }

    #[actix_web::test]
    async fn storage_details_are_not_leaked() {
        let err = AppError::from(StoreError::Unavailable("password=hunter2".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.kind(), "internal");

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Internal Server Error");
        assert!(!body.to_string().contains("hunter2"));
    }
}
