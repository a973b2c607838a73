use crate::api::leave_request::{LeaveListQuery, LeaveListResponse, RejectLeave};
use crate::auth::auth::AuthUser;
use crate::error::FieldError;
use crate::leave::stats::DepartmentStats;
use crate::leave::{LeaveFilter, LeaveReview, LeaveSubmission, RequesterBalance};
use crate::model::leave_request::{
    LeaveBalance, LeaveCategory, LeaveRequest, LeaveStats, LeaveStatus,
};
use crate::model::role::Role;
use crate::models::{LoginReqDto, LoginResponse};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ISET Jendouba Leave API",
        version = "1.0.0",
        description = r#"
## Leave (congé) management for ISET Jendouba

Teachers submit leave requests and follow their yearly balance;
administrators review, approve or reject them.

### 🔹 Key Features
- **Submission** with field-level validation (dates, category, 30-day cap)
- **Approval workflow**: pending → approved | rejected, decided once
- **Balances**: 30 days per calendar year, recomputed on every read
- **Statistics**: counts per status, approval rate, per-department view

### 🔐 Security
Every `/api` endpoint requires a **JWT Bearer** token from `/auth/login`.
Decisions and global views are restricted to the **admin** role.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::pending_leaves,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::withdraw_leave,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::leave_balances,
        crate::api::leave_request::leave_stats,
        crate::api::leave_request::leave_stats_by_department
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            AuthUser,
            Role,
            LeaveSubmission,
            LeaveRequest,
            LeaveCategory,
            LeaveStatus,
            LeaveFilter,
            LeaveListQuery,
            LeaveListResponse,
            LeaveReview,
            RejectLeave,
            LeaveBalance,
            RequesterBalance,
            LeaveStats,
            DepartmentStats,
            FieldError
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication"),
        (name = "Leave", description = "Leave management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
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
