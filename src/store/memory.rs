use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{LeaveFilter, LeaveMutation, LeavePage, LeaveRequestStore, StoreError};
use crate::model::leave_request::{EmployeeId, LeaveRequest, LeaveRequestId, NewLeaveRequest};

/// Process-local store, selected with `LEAVE_STORE=memory`.
#[derive(Default)]
pub struct InMemoryLeaveStore {
    rows: RwLock<BTreeMap<LeaveRequestId, LeaveRequest>>,
    next_id: AtomicU64,
    outages: AtomicU32,
}

impl InMemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `calls` operations fail with `Unavailable`.
    #[cfg(test)]
    pub fn fail_next(&self, calls: u32) {
        self.outages.store(calls, Ordering::SeqCst);
    }

    fn trip(&self) -> Result<(), StoreError> {
        let tripped = self
            .outages
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            Err(StoreError::Unavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }
}

fn newest_first(a: &LeaveRequest, b: &LeaveRequest) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

#[async_trait]
impl LeaveRequestStore for InMemoryLeaveStore {
    async fn create(&self, request: NewLeaveRequest) -> Result<LeaveRequestId, StoreError> {
        self.trip()?;
        let id = LeaveRequestId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.rows.write().await.insert(id, request.into_request(id));
        Ok(id)
    }

    async fn get(&self, id: LeaveRequestId) -> Result<LeaveRequest, StoreError> {
        self.trip()?;
        self.rows
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn list_by_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        self.trip()?;
        let mut out: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        out.sort_by(newest_first);
        Ok(out)
    }

    async fn update(&self, id: LeaveRequestId, mutation: LeaveMutation) -> Result<(), StoreError> {
        self.trip()?;
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !row.is_pending() {
            return Err(StoreError::Conflict {
                id,
                status: row.status,
            });
        }
        match mutation {
            LeaveMutation::Decide {
                status,
                decided_by,
                comment,
                decided_at,
            } => {
                row.status = status;
                row.decided_by = Some(decided_by);
                row.decision_comment = comment;
                row.decided_at = Some(decided_at);
            }
        }
        Ok(())
    }

    async fn list(&self, filter: &LeaveFilter) -> Result<LeavePage, StoreError> {
        self.trip()?;
        let (page, per_page, offset) = filter.window();
        let mut matching: Vec<_> = self
            .rows
            .read()
            .await
            .values()
            .filter(|r| filter.employee_id.is_none_or(|e| r.employee_id.0 == e))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .cloned()
            .collect();
        matching.sort_by(newest_first);
        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(per_page as usize)
            .collect();
        Ok(LeavePage {
            data,
            page,
            per_page,
            total,
        })
    }
}
