//! Storage ports for the leave workflow.
//!
//! The service only talks to [`LeaveStore`] and [`RequesterDirectory`]; the
//! MySQL adapters back the running server and the in-memory adapters back
//! tests and local runs.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveTransition, NewLeaveRequest};
use crate::model::requester::RequesterProfile;

pub mod memory;
pub mod mysql;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filters a store is expected to evaluate itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveQuery {
    pub requester_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub order: SubmissionOrder,
}

impl LeaveQuery {
    pub fn is_filtered(&self) -> bool {
        self.requester_id.is_some() || self.status.is_some()
    }
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    /// Records matching `query`, ordered by submission time then id.
    async fn query(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Writes `transition` only if the request is still pending.
    /// Returns `false` when nothing was updated.
    async fn decide_pending(
        &self,
        id: u64,
        transition: &LeaveTransition,
    ) -> Result<bool, StoreError>;

    /// Deletes the request only if it is pending and owned by `requester_id`.
    async fn delete_pending(&self, id: u64, requester_id: u64) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait RequesterDirectory: Send + Sync {
    async fn find(&self, id: u64) -> Result<Option<RequesterProfile>, StoreError>;

    async fn list(&self) -> Result<Vec<RequesterProfile>, StoreError>;
}

/// Orders records the way every store path must return them.
pub fn sort_by_submission(records: &mut [LeaveRequest], order: SubmissionOrder) {
    match order {
        SubmissionOrder::NewestFirst => records.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        SubmissionOrder::OldestFirst => records.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
}
