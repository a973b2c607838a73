use crate::auth::auth::AuthUser;
use crate::error::LeaveError;
use crate::leave::stats::DepartmentStats;
use crate::leave::{LeaveFilter, LeaveReview, LeaveService, LeaveSubmission, RequesterBalance};
use crate::model::leave_request::{
    LeaveBalance, LeaveCategory, LeaveRequest, LeaveStats, LeaveStatus,
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: u64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveListQuery {
    /// Filter by requester (teacher) id, admin only
    #[schema(example = 1000)]
    pub requester_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<LeaveStatus>,
    /// Filter by leave category
    #[schema(example = "annual")]
    pub category: Option<LeaveCategory>,
    /// Keep requests starting on or after this date
    #[param(value_type = Option<String>)]
    #[schema(example = "2026-01-01", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Keep requests ending on or before this date
    #[param(value_type = Option<String>)]
    #[schema(example = "2026-12-31", value_type = Option<String>)]
    pub to: Option<NaiveDate>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

impl LeaveListQuery {
    fn filter(&self) -> LeaveFilter {
        LeaveFilter {
            requester_id: self.requester_id,
            status: self.status,
            category: self.category,
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "Exam period, please pick other dates")]
    #[serde(default)]
    pub reason: String,
}

#[derive(Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Calendar year, defaults to the current one
    pub year: Option<i32>,
    /// Requester to look up, admin only
    pub requester_id: Option<u64>,
}

#[derive(Deserialize, IntoParams)]
pub struct YearQuery {
    /// Calendar year, defaults to the current one
    pub year: Option<i32>,
}

fn current_year() -> i32 {
    Utc::now().year()
}

/// Teachers only ever see their own requests, whatever they asked for.
fn scoped_filter(auth: &AuthUser, mut filter: LeaveFilter) -> actix_web::Result<LeaveFilter> {
    if !auth.is_admin() {
        filter.requester_id = Some(auth.require_requester()?);
    }
    Ok(filter)
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveSubmission,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid fields", body = Object, example = json!({
            "message": "Validation failed",
            "errors": [{ "field": "end_date", "message": "end date must not be before start date" }]
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No teacher profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<LeaveSubmission>,
) -> actix_web::Result<impl Responder> {
    let requester_id = auth.require_requester()?;

    let created = service.submit(requester_id, payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(created))
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveListQuery),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<LeaveListQuery>,
) -> actix_web::Result<impl Responder> {
    let filter = scoped_filter(&auth, query.filter())?;

    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).clamp(1, u64::from(u32::MAX));
    let offset = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);

    let leaves = service.list(&filter).await;
    let total = leaves.len() as u64;
    let data = leaves
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// Pending requests, oldest first
#[utoipa::path(
    get,
    path = "/api/leave/pending",
    responses(
        (status = 200, description = "Requests waiting for a decision", body = Vec<LeaveRequest>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    Ok(HttpResponse::Ok().json(service.pending_queue().await))
}

/// Leave request details with the requester's balance
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveReview),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "leave request 1 not found"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let review = service.review(leave_id).await?;
    if !auth.can_view(&review.request) {
        return Err(LeaveError::NotFound(leave_id).into());
    }

    Ok(HttpResponse::Ok().json(review))
}

/* =========================
Approve leave (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved, with the requester's balance after approval", body = LeaveReview),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "message": "leave request 1 is already rejected"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let decided = service.approve(path.into_inner(), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(decided))
}

/* =========================
Reject leave (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = RejectLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveReview),
        (status = 400, description = "Rejection reason missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: Option<web::Json<RejectLeave>>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    // a missing or unreadable body is a missing reason
    let reason = payload.map(|p| p.into_inner().reason).unwrap_or_default();
    let decided = service
        .reject(path.into_inner(), auth.user_id, &reason)
        .await?;

    Ok(HttpResponse::Ok().json(decided))
}

/// Withdraw one's own pending request
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to withdraw")
    ),
    responses(
        (status = 200, description = "Leave request withdrawn", body = Object, example = json!({
            "message": "Leave request withdrawn"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let requester_id = auth.require_requester()?;

    service.withdraw(path.into_inner(), requester_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request withdrawn"
    })))
}

/// Yearly balance of one requester
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Leave balance", body = LeaveBalance),
        (status = 400, description = "requester_id missing"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let requester_id = match (auth.is_admin(), query.requester_id) {
        (true, Some(requester_id)) => requester_id,
        (true, None) => auth.requester_id.ok_or_else(|| {
            LeaveError::invalid("requester_id", "requester_id is required")
        })?,
        (false, _) => auth.require_requester()?,
    };
    let year = query.year.unwrap_or_else(current_year);

    Ok(HttpResponse::Ok().json(service.balance(requester_id, year).await))
}

/// Balance of every teacher for a year
#[utoipa::path(
    get,
    path = "/api/leave/balances",
    params(YearQuery),
    responses(
        (status = 200, description = "Balances per teacher", body = Vec<RequesterBalance>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_balances(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let year = query.year.unwrap_or_else(current_year);
    Ok(HttpResponse::Ok().json(service.balance_overview(year).await))
}

/// Counts per status and approval rate
#[utoipa::path(
    get,
    path = "/api/leave/stats",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave statistics", body = LeaveStats),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_stats(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    Ok(HttpResponse::Ok().json(service.stats(&query).await))
}

/// Leave statistics grouped by department
#[utoipa::path(
    get,
    path = "/api/leave/stats/departments",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Statistics per department", body = Vec<DepartmentStats>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_stats_by_department(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    Ok(HttpResponse::Ok().json(service.stats_by_department(&query).await))
}
