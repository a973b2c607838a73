use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Kind of leave a teacher can ask for.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveCategory {
    Annual,
    Sick,
    Maternity,
    Paternity,
    Exceptional,
    Unpaid,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Approved and rejected requests never change again.
    pub fn is_decided(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// A stored leave request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    /// teacher who asked for the leave
    #[schema(example = 1000)]
    pub requester_id: u64,
    /// display name copied from the teacher profile at submission
    #[schema(example = "Amal Ben Salah")]
    pub requester_name: String,
    pub category: LeaveCategory,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family event")]
    pub reason: String,
    #[schema(example = 3)]
    pub days_requested: u32,
    pub status: LeaveStatus,
    #[schema(example = "2026-01-01T08:00:00Z", format = "date-time", value_type = String)]
    pub submitted_at: DateTime<Utc>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub processed_at: Option<DateTime<Utc>>,
    /// user id of the approver
    pub processed_by: Option<u64>,
    pub rejection_reason: Option<String>,
}

/// A validated request ready to be persisted. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub requester_id: u64,
    pub requester_name: String,
    pub category: LeaveCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub days_requested: u32,
    pub submitted_at: DateTime<Utc>,
}

impl NewLeaveRequest {
    pub fn into_request(self, id: u64) -> LeaveRequest {
        LeaveRequest {
            id,
            requester_id: self.requester_id,
            requester_name: self.requester_name,
            category: self.category,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            days_requested: self.days_requested,
            status: LeaveStatus::Pending,
            submitted_at: self.submitted_at,
            processed_at: None,
            processed_by: None,
            rejection_reason: None,
        }
    }
}

/// Fields written when a pending request is decided.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveTransition {
    pub status: LeaveStatus,
    pub processed_at: DateTime<Utc>,
    pub processed_by: u64,
    pub rejection_reason: Option<String>,
}

impl LeaveTransition {
    pub fn apply(&self, request: &mut LeaveRequest) {
        request.status = self.status;
        request.processed_at = Some(self.processed_at);
        request.processed_by = Some(self.processed_by);
        request.rejection_reason = self.rejection_reason.clone();
    }
}

/// Yearly leave balance of one requester. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveBalance {
    #[schema(example = 30)]
    pub base_allowance: u32,
    #[schema(example = 8)]
    pub days_used: u32,
    /// negative when approvals went past the allowance
    #[schema(example = 22)]
    pub days_remaining: i64,
    #[schema(example = 2)]
    pub approved_count: u32,
}

impl LeaveBalance {
    /// Balance of someone with nothing approved yet.
    pub fn untouched(base_allowance: u32) -> Self {
        Self {
            base_allowance,
            days_used: 0,
            days_remaining: i64::from(base_allowance),
            approved_count: 0,
        }
    }

    pub fn is_overdrawn(&self) -> bool {
        self.days_remaining < 0
    }
}

/// Counts per status over a set of requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveStats {
    pub total: u32,
    pub pending: u32,
    pub approved: u32,
    pub rejected: u32,
    /// rounded percentage of approved requests, 0 for an empty set
    #[schema(example = 75)]
    pub approval_rate: u32,
}
