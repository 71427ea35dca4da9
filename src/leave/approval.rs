//! Chef decisions on Pending requests.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{error, info, warn};

use crate::leave::balance::BalanceAccounting;
use crate::leave::error::{LeaveError, Result};
use crate::model::leave_request::{LeaveRequest, LeaveRequestId, LeaveStatus, UserId};
use crate::store::{LeaveMutation, LeaveRequestStore, StoreError, with_retry};
use crate::utils::employee_locks::EmployeeLocks;

pub struct ApprovalWorkflow {
    store: Arc<dyn LeaveRequestStore>,
    accounting: Arc<BalanceAccounting>,
    locks: EmployeeLocks,
    retry_attempts: u32,
}

impl ApprovalWorkflow {
    pub fn new(
        store: Arc<dyn LeaveRequestStore>,
        accounting: Arc<BalanceAccounting>,
        locks: EmployeeLocks,
        retry_attempts: u32,
    ) -> Self {
        Self {
            store,
            accounting,
            locks,
            retry_attempts,
        }
    }

    pub fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    /// Pending -> Approved, deducting from the balance when the category does.
    ///
    /// The balance check and the status write run under the employee's lock,
    /// so two approvals for one employee can never both pass the check.
    pub async fn approve(
        &self,
        id: LeaveRequestId,
        decided_by: UserId,
        comment: Option<String>,
    ) -> Result<LeaveRequest> {
        let request = self.load_pending(id).await?;
        let _guard = self.locks.lock(request.employee_id).await;

        // another decision may have landed while waiting for the lock
        let request = self.load_pending(id).await?;
        let projected = self.accounting.commit_approval(&request).await?;

        let decided_at = self.accounting.clock().now();
        let mutation = LeaveMutation::Decide {
            status: LeaveStatus::Approved,
            decided_by,
            comment: comment.clone(),
            decided_at,
        };

        match self.store.update(id, mutation).await {
            Ok(()) => {}
            Err(StoreError::Unavailable(msg)) => {
                // outcome unknown, drop the cached balance and let the caller retry
                self.accounting
                    .invalidate(request.employee_id, request.start_date.year())
                    .await;
                error!(leave_id = %id, error = %msg, "Approval write failed");
                return Err(LeaveError::StoreUnavailable(msg));
            }
            Err(e) => {
                warn!(leave_id = %id, error = %e, "Approval lost a concurrent decision");
                return Err(e.into());
            }
        }

        self.accounting.record_committed(projected).await;
        info!(
            leave_id = %id,
            employee_id = %request.employee_id,
            category = %request.category,
            days = request.number_of_days,
            decided_by = %decided_by,
            remaining = projected.remaining_days,
            "Leave request approved"
        );

        Ok(decided(request, LeaveStatus::Approved, decided_by, comment, decided_at))
    }

    /// Pending -> Rejected. Never touches the balance.
    pub async fn reject(
        &self,
        id: LeaveRequestId,
        decided_by: UserId,
        comment: Option<String>,
    ) -> Result<LeaveRequest> {
        let request = self.load_pending(id).await?;
        let decided_at = self.accounting.clock().now();
        let mutation = LeaveMutation::Decide {
            status: LeaveStatus::Rejected,
            decided_by,
            comment: comment.clone(),
            decided_at,
        };

        self.store.update(id, mutation).await.map_err(|e| {
            match &e {
                StoreError::Unavailable(msg) => {
                    error!(leave_id = %id, error = %msg, "Rejection write failed")
                }
                other => warn!(leave_id = %id, error = %other, "Rejection lost a concurrent decision"),
            }
            LeaveError::from(e)
        })?;

        info!(
            leave_id = %id,
            employee_id = %request.employee_id,
            decided_by = %decided_by,
            "Leave request rejected"
        );
        Ok(decided(request, LeaveStatus::Rejected, decided_by, comment, decided_at))
    }

    async fn load_pending(&self, id: LeaveRequestId) -> Result<LeaveRequest> {
        let request = with_retry(self.retry_attempts, "get", || self.store.get(id)).await?;
        if !request.is_pending() {
            warn!(leave_id = %id, status = %request.status, "Decision on a non-pending request");
            return Err(LeaveError::NotPending {
                id,
                status: request.status,
            });
        }
        Ok(request)
    }
}

fn decided(
    mut request: LeaveRequest,
    status: LeaveStatus,
    decided_by: UserId,
    comment: Option<String>,
    decided_at: chrono::DateTime<chrono::Utc>,
) -> LeaveRequest {
    request.status = status;
    request.decided_by = Some(decided_by);
    request.decision_comment = comment;
    request.decided_at = Some(decided_at);
    request
}
