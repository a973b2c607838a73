use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::model::leave_request::{LeaveCategory, LeaveRequest, LeaveStatus};
use crate::store::{LeaveQuery, SubmissionOrder};

/// Criteria for listing leave requests. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by requester (teacher) id
    #[schema(example = 1000)]
    pub requester_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<LeaveStatus>,
    /// Filter by leave category
    #[schema(example = "annual")]
    pub category: Option<LeaveCategory>,
    /// Keep requests starting on or after this date
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Keep requests ending on or before this date
    #[schema(example = "2026-12-31", format = "date", value_type = Option<String>)]
    #[param(value_type = Option<String>)]
    pub to: Option<NaiveDate>,
}

impl LeaveFilter {
    pub fn for_requester(requester_id: u64) -> Self {
        Self {
            requester_id: Some(requester_id),
            ..Self::default()
        }
    }

    /// Part of the filter the store evaluates.
    pub fn store_query(&self, order: SubmissionOrder) -> LeaveQuery {
        LeaveQuery {
            requester_id: self.requester_id,
            status: self.status,
            order,
        }
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.requester_id.is_none_or(|id| request.requester_id == id)
            && self.status.is_none_or(|status| request.status == status)
            && self.category.is_none_or(|category| request.category == category)
            && self.from.is_none_or(|from| request.start_date >= from)
            && self.to.is_none_or(|to| request.end_date <= to)
    }
}
