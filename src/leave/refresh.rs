use std::sync::Arc;
use std::time::Duration;

use actix_web::rt::task::JoinHandle;
use actix_web::rt::time::interval;
use tracing::info;

use crate::leave::service::LeaveService;

/// Background task re-reading leave data at a fixed period.
///
/// Picks up changes made by other sessions, which the in-process
/// notifications never see. Stops when dropped.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns the refresh loop on the current actix runtime.
pub fn spawn_refresh(service: Arc<LeaveService>, period: Duration) -> RefreshTask {
    info!(period_secs = period.as_secs(), "Leave refresh task started");
    let handle = actix_web::rt::spawn(async move {
        let mut ticker = interval(period);
        let mut seen = None;
        loop {
            ticker.tick().await;
            service.refresh(&mut seen).await;
        }
    });
    RefreshTask { handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::LeavePolicy;
    use crate::leave::notify::{LeaveEvent, LeaveEventKind};
    use crate::model::leave_request::{LeaveCategory, LeaveRequest, LeaveStatus};
    use crate::store::memory::{MemoryLeaveStore, MemoryRequesterDirectory};
    use actix_web::rt::time::sleep;
    use chrono::Utc;
    use std::sync::Mutex;

    #[actix_web::test]
    async fn picks_up_changes_made_behind_the_service() {
        let store = Arc::new(MemoryLeaveStore::new());
        let service = Arc::new(LeaveService::new(
            store.clone(),
            Arc::new(MemoryRequesterDirectory::default()),
            LeavePolicy::default(),
        ));
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&kinds);
        service.subscribe(Arc::new(move |event: &LeaveEvent| {
            sink.lock().unwrap().push(event.kind);
        }));

        let task = spawn_refresh(Arc::clone(&service), Duration::from_millis(10));
        sleep(Duration::from_millis(50)).await;

        store
            .seed(LeaveRequest {
                id: 1,
                requester_id: 1000,
                requester_name: "Amal Ben Salah".to_string(),
                category: LeaveCategory::Annual,
                start_date: "2025-03-10".parse().unwrap(),
                end_date: "2025-03-12".parse().unwrap(),
                reason: "Family event".to_string(),
                days_requested: 3,
                status: LeaveStatus::Pending,
                submitted_at: Utc::now(),
                processed_at: None,
                processed_by: None,
                rejection_reason: None,
            })
            .unwrap();
        sleep(Duration::from_millis(100)).await;

        assert!(!task.is_finished());
        task.stop();
        assert_eq!(*kinds.lock().unwrap(), vec![LeaveEventKind::Refreshed]);
    }
}
