//! In-process adapters used by tests and local runs.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use super::{LeaveQuery, LeaveStore, RequesterDirectory, sort_by_submission};
use crate::error::StoreError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveTransition, NewLeaveRequest};
use crate::model::requester::RequesterProfile;

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".to_string())
}

/// Leave requests kept in a map keyed by id.
///
/// `without_composite_index` makes every filtered query fail the way a
/// document store does when the matching index is missing.
#[derive(Debug)]
pub struct MemoryLeaveStore {
    records: RwLock<BTreeMap<u64, LeaveRequest>>,
    next_id: AtomicU64,
    filtered_queries: bool,
    offline: AtomicBool,
}

impl Default for MemoryLeaveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            filtered_queries: true,
            offline: AtomicBool::new(false),
        }
    }

    pub fn without_composite_index() -> Self {
        Self {
            filtered_queries: false,
            ..Self::new()
        }
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Puts a record in place as-is, keeping its id.
    pub fn seed(&self, request: LeaveRequest) -> Result<(), StoreError> {
        self.next_id.fetch_max(request.id + 1, Ordering::SeqCst);
        self.records
            .write()
            .map_err(|_| poisoned())?
            .insert(request.id, request);
        Ok(())
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn insert(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        self.check_online()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let stored = request.into_request(id);
        self.records
            .write()
            .map_err(|_| poisoned())?
            .insert(id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        self.check_online()?;
        Ok(self.records.read().map_err(|_| poisoned())?.get(&id).cloned())
    }

    async fn query(&self, query: &LeaveQuery) -> Result<Vec<LeaveRequest>, StoreError> {
        self.check_online()?;
        if query.is_filtered() && !self.filtered_queries {
            return Err(StoreError::Query(
                "the query requires an index on (requester_id, status, submitted_at)".to_string(),
            ));
        }

        let mut matching: Vec<LeaveRequest> = self
            .records
            .read()
            .map_err(|_| poisoned())?
            .values()
            .filter(|r| query.requester_id.is_none_or(|id| r.requester_id == id))
            .filter(|r| query.status.is_none_or(|status| r.status == status))
            .cloned()
            .collect();
        sort_by_submission(&mut matching, query.order);
        Ok(matching)
    }

    async fn decide_pending(
        &self,
        id: u64,
        transition: &LeaveTransition,
    ) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut records = self.records.write().map_err(|_| poisoned())?;
        match records.get_mut(&id) {
            Some(request) if request.status == LeaveStatus::Pending => {
                transition.apply(request);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_pending(&self, id: u64, requester_id: u64) -> Result<bool, StoreError> {
        self.check_online()?;
        let mut records = self.records.write().map_err(|_| poisoned())?;
        let removable = records
            .get(&id)
            .is_some_and(|r| r.requester_id == requester_id && r.status == LeaveStatus::Pending);
        if removable {
            records.remove(&id);
        }
        Ok(removable)
    }
}

#[derive(Debug, Default)]
pub struct MemoryRequesterDirectory {
    profiles: RwLock<BTreeMap<u64, RequesterProfile>>,
}

impl MemoryRequesterDirectory {
    pub fn new(profiles: impl IntoIterator<Item = RequesterProfile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    pub fn add(&self, profile: RequesterProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .map_err(|_| poisoned())?
            .insert(profile.id, profile);
        Ok(())
    }
}

#[async_trait]
impl RequesterDirectory for MemoryRequesterDirectory {
    async fn find(&self, id: u64) -> Result<Option<RequesterProfile>, StoreError> {
        Ok(self.profiles.read().map_err(|_| poisoned())?.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<RequesterProfile>, StoreError> {
        Ok(self
            .profiles
            .read()
            .map_err(|_| poisoned())?
            .values()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveCategory;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn new_request(requester_id: u64, hour: u32) -> NewLeaveRequest {
        NewLeaveRequest {
            requester_id,
            requester_name: format!("Teacher {requester_id}"),
            category: LeaveCategory::Annual,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
            reason: "Family event".to_string(),
            days_requested: 3,
            submitted_at: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    fn approval() -> LeaveTransition {
        LeaveTransition {
            status: LeaveStatus::Approved,
            processed_at: Utc::now(),
            processed_by: 1,
            rejection_reason: None,
        }
    }

    #[actix_web::test]
    async fn insert_assigns_increasing_ids() {
        let store = MemoryLeaveStore::new();
        let first = store.insert(new_request(10, 8)).await.unwrap();
        let second = store.insert(new_request(10, 9)).await.unwrap();

        assert!(second.id > first.id);
        assert_eq!(first.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn decide_pending_only_applies_once() {
        let store = MemoryLeaveStore::new();
        let stored = store.insert(new_request(10, 8)).await.unwrap();

        assert!(store.decide_pending(stored.id, &approval()).await.unwrap());
        assert!(!store.decide_pending(stored.id, &approval()).await.unwrap());
        assert!(!store.decide_pending(999, &approval()).await.unwrap());
    }

    #[actix_web::test]
    async fn filtered_query_fails_without_index() {
        let store = MemoryLeaveStore::without_composite_index();
        store.insert(new_request(10, 8)).await.unwrap();

        let filtered = LeaveQuery {
            requester_id: Some(10),
            ..LeaveQuery::default()
        };
        assert!(matches!(
            store.query(&filtered).await,
            Err(StoreError::Query(_))
        ));
        assert_eq!(store.query(&LeaveQuery::default()).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn delete_pending_checks_owner() {
        let store = MemoryLeaveStore::new();
        let stored = store.insert(new_request(10, 8)).await.unwrap();

        assert!(!store.delete_pending(stored.id, 11).await.unwrap());
        assert!(store.delete_pending(stored.id, 10).await.unwrap());
        assert!(store.get(stored.id).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn offline_store_fails_every_call() {
        let store = MemoryLeaveStore::new();
        store.set_offline(true);

        assert!(matches!(
            store.insert(new_request(10, 8)).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.get(1).await.is_err());
    }
}
