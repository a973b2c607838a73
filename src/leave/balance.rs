use chrono::Datelike;

use crate::leave::dates::inclusive_span;
use crate::model::leave_request::{LeaveBalance, LeaveRequest, LeaveStatus};

/// Yearly balance of one requester from their requests.
///
/// Only approved requests whose start date falls in `year` count; the days
/// are recomputed from the dates rather than trusted from the record.
pub fn compute_balance<'a>(
    requests: impl IntoIterator<Item = &'a LeaveRequest>,
    year: i32,
    base_allowance: u32,
) -> LeaveBalance {
    let mut balance = LeaveBalance::untouched(base_allowance);
    let mut days_used: i64 = 0;

    for request in requests {
        if request.status != LeaveStatus::Approved || request.start_date.year() != year {
            continue;
        }
        days_used += inclusive_span(request.start_date, request.end_date).max(0);
        balance.approved_count += 1;
    }

    balance.days_used = u32::try_from(days_used).unwrap_or(u32::MAX);
    balance.days_remaining = i64::from(base_allowance) - days_used;
    balance
}
