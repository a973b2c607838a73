use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token, password::verify_password},
    config::Config,
    model::role::Role,
    models::{LoginReqDto, LoginResponse, UserSql},
};
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

/// Login endpoint
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body(content = LoginReqDto, content_type = "application/json"),
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().body("Username or password required");
    }

    debug!("Fetching user from database");

    let db_user = match sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, role_id, employee_id
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(&user.username)
    .fetch_optional(pool.get_ref())
    .await
    {
        Ok(Some(user)) => {
            debug!(user_id = user.id, "User found");
            user
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().body("Invalid credentials");
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    }

    // the profile decides the role; unknown roles cannot log in
    let Some(role) = Role::from_id(db_user.role_id) else {
        info!(role_id = db_user.role_id, "Unknown role on user profile");
        return HttpResponse::Unauthorized().body("Invalid credentials");
    };

    let requester_id = match role {
        Role::Teacher => db_user.employee_id,
        Role::Admin => None,
    };

    let access_token = match generate_access_token(
        db_user.id,
        db_user.username,
        role.id(),
        requester_id,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        role: role.as_str().to_string(),
    })
}

/// Current principal as seen by the API
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Authenticated principal", body = AuthUser),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> impl Responder {
    HttpResponse::Ok().json(auth)
}
