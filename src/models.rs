use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "admin@iset.tn")]
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "teacher")]
    pub role: String,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64, // 👈 matches BIGINT UNSIGNED,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    /// teacher profile linked to this account, absent for administrators
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
    /// Present only if this user is linked to a teacher profile
    pub requester_id: Option<u64>,
}
