use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::leave_request::{LeaveRequest, LeaveStats, LeaveStatus};
use crate::model::requester::RequesterProfile;

pub const UNASSIGNED_DEPARTMENT: &str = "unassigned";

impl LeaveStats {
    pub fn from_requests<'a>(requests: impl IntoIterator<Item = &'a LeaveRequest>) -> Self {
        let mut stats = LeaveStats::default();
        for request in requests {
            stats.total += 1;
            match request.status {
                LeaveStatus::Pending => stats.pending += 1,
                LeaveStatus::Approved => stats.approved += 1,
                LeaveStatus::Rejected => stats.rejected += 1,
            }
        }
        stats.approval_rate = approval_rate(stats.approved, stats.total);
        stats
    }
}

/// `round(approved / total * 100)`, rounding halves up; 0 for an empty set.
pub fn approval_rate(approved: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let approved = u64::from(approved);
    let total = u64::from(total);
    u32::try_from((approved * 200 + total) / (total * 2)).unwrap_or(100)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DepartmentStats {
    #[schema(example = "Informatique")]
    pub department: String,
    pub stats: LeaveStats,
}

/// Groups requests by the requester's department.
///
/// Requesters missing from `profiles`, or without a department, fall under
/// [`UNASSIGNED_DEPARTMENT`].
pub fn stats_by_department(
    requests: &[LeaveRequest],
    profiles: &[RequesterProfile],
) -> Vec<DepartmentStats> {
    let departments: BTreeMap<u64, &str> = profiles
        .iter()
        .filter_map(|p| p.department.as_deref().map(|d| (p.id, d)))
        .collect();

    let mut grouped: BTreeMap<&str, Vec<&LeaveRequest>> = BTreeMap::new();
    for request in requests {
        let department = departments
            .get(&request.requester_id)
            .copied()
            .unwrap_or(UNASSIGNED_DEPARTMENT);
        grouped.entry(department).or_default().push(request);
    }

    grouped
        .into_iter()
        .map(|(department, requests)| DepartmentStats {
            department: department.to_string(),
            stats: LeaveStats::from_requests(requests),
        })
        .collect()
}
