//! Persistence seam for leave requests.
//!
//! The core only talks to [`LeaveRequestStore`]; `mysql` is the production
//! backend and `memory` serves tests and single-node demos.

pub mod documents;
pub mod memory;
pub mod mysql;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::leave::error::LeaveError;
use crate::model::leave_request::{
    EmployeeId, LeaveRequest, LeaveRequestId, LeaveStatus, NewLeaveRequest, UserId,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("leave request {0} not found")]
    NotFound(LeaveRequestId),

    /// A conditional write found the request already decided.
    #[error("leave request {id} is no longer pending ({status})")]
    Conflict {
        id: LeaveRequestId,
        status: LeaveStatus,
    },
}

impl From<StoreError> for LeaveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => LeaveError::StoreUnavailable(msg),
            StoreError::NotFound(id) => LeaveError::NotFound(id),
            StoreError::Conflict { id, status } => LeaveError::NotPending { id, status },
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// The only mutation a stored request accepts after creation.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveMutation {
    Decide {
        status: LeaveStatus,
        decided_by: UserId,
        comment: Option<String>,
        decided_at: DateTime<Utc>,
    },
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    #[schema(example = 1000)]
    /// Filter by employee ID
    pub employee_id: Option<u64>,
    #[schema(example = "pending", value_type = Option<String>)]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

impl LeaveFilter {
    /// `(page, per_page, offset)` clamped like the other list endpoints.
    pub fn window(&self) -> (u64, u64, u64) {
        let per_page = self.per_page.unwrap_or(10).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (page, per_page, (page - 1).saturating_mul(per_page))
    }
}

#[derive(Debug, Clone)]
pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

#[async_trait]
pub trait LeaveRequestStore: Send + Sync {
    /// Persist a new Pending request and return its id.
    async fn create(&self, request: NewLeaveRequest) -> Result<LeaveRequestId, StoreError>;

    async fn get(&self, id: LeaveRequestId) -> Result<LeaveRequest, StoreError>;

    /// All requests of one employee, newest first by `created_at`.
    async fn list_by_employee(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Applies `mutation` only while the request is still Pending.
    async fn update(&self, id: LeaveRequestId, mutation: LeaveMutation) -> Result<(), StoreError>;

    async fn list(&self, filter: &LeaveFilter) -> Result<LeavePage, StoreError>;
}

/// Retry `op` while it fails with [`StoreError::Unavailable`].
///
/// Only for idempotent calls; `create` is never retried here.
pub async fn with_retry<T, F, Fut>(attempts: u32, what: &'static str, mut op: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(StoreError::Unavailable(msg)) if attempt < attempts => {
                warn!(operation = what, attempt, error = %msg, "Store unavailable, retrying");
                tokio::time::sleep(Duration::from_millis(25 * u64::from(attempt))).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[actix_web::test]
    async fn retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, "get", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(StoreError::Unavailable("connection reset".into()))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[actix_web::test]
    async fn gives_up_after_bounded_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(2, "get", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("down".into()))
        })
        .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[actix_web::test]
    async fn does_not_retry_not_found() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(5, "get", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::NotFound(LeaveRequestId(4)))
        })
        .await;
        assert_eq!(result, Err(StoreError::NotFound(LeaveRequestId(4))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn conflict_maps_to_not_pending() {
        let err: LeaveError = StoreError::Conflict {
            id: LeaveRequestId(2),
            status: LeaveStatus::Rejected,
        }
        .into();
        assert_eq!(
            err,
            LeaveError::NotPending {
                id: LeaveRequestId(2),
                status: LeaveStatus::Rejected
            }
        );
    }

    #[test]
    fn filter_window_is_clamped() {
        let f = LeaveFilter {
            page: Some(0),
            per_page: Some(1000),
            ..Default::default()
        };
        assert_eq!(f.window(), (1, 100, 0));
        let f = LeaveFilter {
            page: Some(3),
            per_page: Some(5),
            ..Default::default()
        };
        assert_eq!(f.window(), (3, 5, 10));
    }

    #[test]
    fn filter_window_saturates_on_huge_pages() {
        let f = LeaveFilter {
            page: Some(u64::MAX),
            per_page: Some(100),
            ..Default::default()
        };
        assert_eq!(f.window(), (u64::MAX, 100, u64::MAX));
    }
}
