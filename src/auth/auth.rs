use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::leave_request::LeaveRequest;
use crate::model::role::Role;
use crate::models::Claims;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to a teacher profile
    pub requester_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // already decoded by the auth middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        ready(AuthUser::from_claims(claims).ok_or_else(|| ErrorUnauthorized("Invalid role")))
    }
}

impl AuthUser {
    /// `None` when the token carries a role this service does not know.
    pub fn from_claims(claims: Claims) -> Option<Self> {
        Some(Self {
            role: Role::from_id(claims.role)?,
            user_id: claims.user_id,
            username: claims.sub,
            requester_id: claims.requester_id,
        })
    }

    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// The teacher profile id, required for anything acting on one's own leave.
    pub fn require_requester(&self) -> actix_web::Result<u64> {
        self.requester_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No teacher profile"))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins see every request, teachers only their own.
    pub fn can_view(&self, request: &LeaveRequest) -> bool {
        self.is_admin() || self.requester_id == Some(request.requester_id)
    }
}
