use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "hr@example.com")]
    pub email: String,
    #[schema(example = "hrpassword")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// seconds until the access token expires
    #[schema(example = 900)]
    pub expires_in: usize,
    pub role: Role,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// email of the account
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}
