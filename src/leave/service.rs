use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::error::LeaveError;
use crate::leave::balance::compute_balance;
use crate::leave::filter::LeaveFilter;
use crate::leave::notify::{LeaveEvent, LeaveEventKind, LeaveListener, LeaveNotifier, SubscriptionId};
use crate::leave::stats::{DepartmentStats, stats_by_department};
use crate::leave::validation::{LeaveSubmission, validate_rejection_reason, validate_submission};
use crate::model::leave_request::{
    LeaveBalance, LeaveRequest, LeaveStats, LeaveStatus, LeaveTransition, NewLeaveRequest,
};
use crate::store::{
    LeaveQuery, LeaveStore, RequesterDirectory, SubmissionOrder, sort_by_submission,
};

/// Limits applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeavePolicy {
    /// yearly days per requester
    pub base_allowance: u32,
    /// longest single request, in days
    pub max_span_days: u32,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            base_allowance: 30,
            max_span_days: 30,
        }
    }
}

/// A request together with its requester's balance for the request's year.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveReview {
    pub request: LeaveRequest,
    pub balance: LeaveBalance,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RequesterBalance {
    #[schema(example = 1000)]
    pub requester_id: u64,
    #[schema(example = "Amal Ben Salah")]
    pub display_name: String,
    pub balance: LeaveBalance,
}

/// Marker used by the periodic refresh to notice changes from other sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveSnapshot {
    pub total: usize,
    pub pending: usize,
    pub latest_activity: Option<DateTime<Utc>>,
}

impl LeaveSnapshot {
    fn of(requests: &[LeaveRequest]) -> Self {
        Self {
            total: requests.len(),
            pending: requests
                .iter()
                .filter(|r| r.status == LeaveStatus::Pending)
                .count(),
            latest_activity: requests
                .iter()
                .map(|r| r.processed_at.unwrap_or(r.submitted_at).max(r.submitted_at))
                .max(),
        }
    }
}

enum Decision {
    Approve,
    Reject(String),
}

pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    directory: Arc<dyn RequesterDirectory>,
    policy: LeavePolicy,
    notifier: LeaveNotifier,
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        directory: Arc<dyn RequesterDirectory>,
        policy: LeavePolicy,
    ) -> Self {
        Self {
            store,
            directory,
            policy,
            notifier: LeaveNotifier::default(),
        }
    }

    pub fn policy(&self) -> LeavePolicy {
        self.policy
    }

    /// Registers a callback run after every successful change.
    pub fn subscribe(&self, listener: LeaveListener) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    #[instrument(name = "leave_submit", skip(self, submission))]
    pub async fn submit(
        &self,
        requester_id: u64,
        submission: LeaveSubmission,
    ) -> Result<LeaveRequest, LeaveError> {
        let valid = validate_submission(&submission, self.policy.max_span_days).inspect_err(
            |e| info!(error = %e, "Leave submission rejected"),
        )?;

        let profile = self
            .directory
            .find(requester_id)
            .await?
            .ok_or_else(|| LeaveError::Forbidden("No teacher profile".to_string()))?;

        let stored = self
            .store
            .insert(NewLeaveRequest {
                requester_id,
                requester_name: profile.display_name,
                category: valid.category,
                start_date: valid.start_date,
                end_date: valid.end_date,
                reason: valid.reason,
                days_requested: valid.days_requested,
                submitted_at: Utc::now(),
            })
            .await
            .inspect_err(|e| error!(error = %e, "Failed to create leave request"))?;

        info!(leave_id = stored.id, days = stored.days_requested, "Leave request submitted");
        self.notifier.publish(&LeaveEvent::for_request(
            LeaveEventKind::Submitted,
            stored.id,
            requester_id,
        ));
        Ok(stored)
    }

    pub async fn get(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        self.store
            .get(id)
            .await
            .inspect_err(|e| error!(error = %e, leave_id = id, "Failed to fetch leave request"))?
            .ok_or(LeaveError::NotFound(id))
    }

    /// The request plus what is left of the requester's allowance that year.
    pub async fn review(&self, id: u64) -> Result<LeaveReview, LeaveError> {
        let request = self.get(id).await?;
        let balance = self
            .balance(request.requester_id, request.start_date.year())
            .await;
        Ok(LeaveReview { request, balance })
    }

    /// Matching requests, newest submission first. Never fails.
    ///
    /// Requester and status go to the store. When the store cannot answer
    /// that query the whole collection is read and filtered here instead.
    pub async fn list(&self, filter: &LeaveFilter) -> Vec<LeaveRequest> {
        self.fetch(filter, SubmissionOrder::NewestFirst).await
    }

    /// Pending requests, oldest first.
    pub async fn pending_queue(&self) -> Vec<LeaveRequest> {
        let filter = LeaveFilter {
            status: Some(LeaveStatus::Pending),
            ..LeaveFilter::default()
        };
        self.fetch(&filter, SubmissionOrder::OldestFirst).await
    }

    async fn fetch(&self, filter: &LeaveFilter, order: SubmissionOrder) -> Vec<LeaveRequest> {
        let query = filter.store_query(order);
        let records = match self.store.query(&query).await {
            Ok(records) => records,
            Err(e) if query.is_filtered() => {
                warn!(error = %e, "Filtered leave query failed, scanning all requests");
                let broad = LeaveQuery {
                    order,
                    ..LeaveQuery::default()
                };
                match self.store.query(&broad).await {
                    Ok(records) => records,
                    Err(e) => {
                        error!(error = %e, "Failed to fetch leave list");
                        return Vec::new();
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to fetch leave list");
                return Vec::new();
            }
        };

        let mut matching: Vec<LeaveRequest> =
            records.into_iter().filter(|r| filter.matches(r)).collect();
        sort_by_submission(&mut matching, order);
        debug!(count = matching.len(), "Leave list fetched");
        matching
    }

    #[instrument(name = "leave_approve", skip(self))]
    pub async fn approve(&self, id: u64, approver_id: u64) -> Result<LeaveReview, LeaveError> {
        self.decide(id, approver_id, Decision::Approve).await
    }

    #[instrument(name = "leave_reject", skip(self, reason))]
    pub async fn reject(
        &self,
        id: u64,
        approver_id: u64,
        reason: &str,
    ) -> Result<LeaveReview, LeaveError> {
        validate_rejection_reason(reason)?;
        self.decide(id, approver_id, Decision::Reject(reason.to_string()))
            .await
    }

    async fn decide(
        &self,
        id: u64,
        approver_id: u64,
        decision: Decision,
    ) -> Result<LeaveReview, LeaveError> {
        let mut request = self.get(id).await?;
        if request.status.is_decided() {
            return Err(LeaveError::Conflict {
                id,
                status: request.status,
            });
        }

        let (status, rejection_reason, kind) = match decision {
            Decision::Approve => (LeaveStatus::Approved, None, LeaveEventKind::Approved),
            Decision::Reject(reason) => {
                (LeaveStatus::Rejected, Some(reason), LeaveEventKind::Rejected)
            }
        };
        let transition = LeaveTransition {
            status,
            processed_at: Utc::now(),
            processed_by: approver_id,
            rejection_reason,
        };

        let applied = self
            .store
            .decide_pending(id, &transition)
            .await
            .inspect_err(|e| error!(error = %e, leave_id = id, "Leave decision failed"))?;

        if !applied {
            // someone else decided or removed it since we read it
            return match self.store.get(id).await? {
                Some(current) => Err(LeaveError::Conflict {
                    id,
                    status: current.status,
                }),
                None => Err(LeaveError::NotFound(id)),
            };
        }

        transition.apply(&mut request);
        info!(leave_id = id, status = %request.status, "Leave request decided");
        self.notifier.publish(&LeaveEvent::for_request(
            kind,
            id,
            request.requester_id,
        ));

        let balance = self
            .balance(request.requester_id, request.start_date.year())
            .await;
        if status == LeaveStatus::Approved && balance.is_overdrawn() {
            warn!(
                leave_id = id,
                requester_id = request.requester_id,
                days_remaining = balance.days_remaining,
                "Approval exceeds the yearly allowance"
            );
        }

        Ok(LeaveReview { request, balance })
    }

    /// Owner-only removal of a request nobody has decided yet.
    #[instrument(name = "leave_withdraw", skip(self))]
    pub async fn withdraw(&self, id: u64, requester_id: u64) -> Result<(), LeaveError> {
        let request = self.get(id).await?;
        if request.requester_id != requester_id {
            return Err(LeaveError::Forbidden(
                "Only the requester can withdraw a leave request".to_string(),
            ));
        }
        if request.status.is_decided() {
            return Err(LeaveError::Conflict {
                id,
                status: request.status,
            });
        }

        let removed = self
            .store
            .delete_pending(id, requester_id)
            .await
            .inspect_err(|e| error!(error = %e, leave_id = id, "Leave withdrawal failed"))?;
        if !removed {
            return match self.store.get(id).await? {
                Some(current) => Err(LeaveError::Conflict {
                    id,
                    status: current.status,
                }),
                None => Err(LeaveError::NotFound(id)),
            };
        }

        info!(leave_id = id, "Leave request withdrawn");
        self.notifier.publish(&LeaveEvent::for_request(
            LeaveEventKind::Withdrawn,
            id,
            requester_id,
        ));
        Ok(())
    }

    /// Balance for `year`. Read failures yield the untouched allowance.
    pub async fn balance(&self, requester_id: u64, year: i32) -> LeaveBalance {
        let requests = self.list(&LeaveFilter::for_requester(requester_id)).await;
        compute_balance(&requests, year, self.policy.base_allowance)
    }

    /// Balance of every known requester.
    pub async fn balance_overview(&self, year: i32) -> Vec<RequesterBalance> {
        let profiles = match self.directory.list().await {
            Ok(profiles) => profiles,
            Err(e) => {
                error!(error = %e, "Failed to list requesters");
                return Vec::new();
            }
        };
        let requests = self.list(&LeaveFilter::default()).await;

        profiles
            .into_iter()
            .map(|profile| {
                let own = requests.iter().filter(|r| r.requester_id == profile.id);
                RequesterBalance {
                    requester_id: profile.id,
                    display_name: profile.display_name,
                    balance: compute_balance(own, year, self.policy.base_allowance),
                }
            })
            .collect()
    }

    pub async fn stats(&self, filter: &LeaveFilter) -> LeaveStats {
        LeaveStats::from_requests(&self.list(filter).await)
    }

    pub async fn stats_by_department(&self, filter: &LeaveFilter) -> Vec<DepartmentStats> {
        let requests = self.list(filter).await;
        let profiles = self.directory.list().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list requesters, grouping without departments");
            Vec::new()
        });
        stats_by_department(&requests, &profiles)
    }

    /// Re-reads the store and notifies listeners when it changed since `seen`.
    ///
    /// Returns `true` when a `Refreshed` event was published.
    pub async fn refresh(&self, seen: &mut Option<LeaveSnapshot>) -> bool {
        let current = LeaveSnapshot::of(&self.list(&LeaveFilter::default()).await);
        let changed = seen.is_some_and(|previous| previous != current);
        *seen = Some(current);
        if changed {
            debug!(total = current.total, pending = current.pending, "Leave data changed elsewhere");
            self.notifier.publish(&LeaveEvent::refreshed());
        }
        changed
    }
}
