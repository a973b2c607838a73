use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::{Value, json};
use tracing::debug;

fn reject(req: ServiceRequest, body: Value) -> ServiceResponse<BoxBody> {
    req.into_response(HttpResponse::Unauthorized().json(body).map_into_boxed_body())
}

fn bearer_token(req: &ServiceRequest) -> Result<String, &'static str> {
    let value = req
        .headers()
        .get("Authorization")
        .ok_or("Missing Authorization header")?
        .to_str()
        .map_err(|_| "Invalid Authorization header encoding")?;
    value
        .strip_prefix("Bearer ")
        .map(str::to_owned)
        .ok_or("Authorization header must start with Bearer")
}

/// Resolves the bearer token to an [`AuthUser`] stored in the request
/// extensions; anything else ends the request with 401.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let token = match bearer_token(&req) {
        Ok(token) => token,
        Err(message) => return Ok(reject(req, json!({ "error": message }))),
    };

    let claims = match verify_token(&token, &config.jwt_secret) {
        Ok(claims) => claims,
        Err(e) => {
            debug!(error = %e, path = req.path(), "Rejected bearer token");
            return Ok(reject(req, json!({"error": "Invalid or expired token"})));
        }
    };

    let Some(auth_user) = AuthUser::from_claims(claims) else {
        return Ok(reject(req, json!({"error": "Invalid role"})));
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
