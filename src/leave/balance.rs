//! Annual balance accounting.
//!
//! Balances are never stored as counters; they are folded from the decided
//! history of an employee. The fold result is cached by [`BalanceCache`].

use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, warn};

use crate::leave::calendar::Clock;
use crate::leave::error::{LeaveError, Result};
use crate::leave::policy::LeavePolicy;
use crate::model::balance::LeaveBalance;
use crate::model::leave_request::{EmployeeId, LeaveCategory, LeaveRequest, LeaveStatus};
use crate::store::{LeaveRequestStore, with_retry};
use crate::utils::balance_cache::BalanceCache;

/// Read-only balance gate used by the wizard.
pub trait BalanceCheck {
    fn would_exceed_balance(&self, category: LeaveCategory, number_of_days: u32) -> bool;
}

/// A balance read at one instant together with the policy that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceSnapshot {
    pub balance: LeaveBalance,
    pub policy: LeavePolicy,
}

impl BalanceCheck for BalanceSnapshot {
    fn would_exceed_balance(&self, category: LeaveCategory, number_of_days: u32) -> bool {
        self.policy.deducts(category) && i64::from(number_of_days) > self.balance.remaining_days
    }
}

/// Fold the Approved requests starting in `year` into a balance.
pub fn fold_balance(
    employee_id: EmployeeId,
    year: i32,
    policy: &LeavePolicy,
    history: &[LeaveRequest],
) -> LeaveBalance {
    history
        .iter()
        .filter(|r| r.employee_id == employee_id)
        .filter(|r| r.status == LeaveStatus::Approved)
        .filter(|r| r.start_date.year() == year)
        .fold(LeaveBalance::new(employee_id, year, policy.annual_days), |mut acc, r| {
            if policy.deducts(r.category) {
                acc.add_used(r.number_of_days);
            }
            if r.category == LeaveCategory::Medical {
                acc.add_medical(r.number_of_days);
            }
            acc
        })
}

pub struct BalanceAccounting {
    store: Arc<dyn LeaveRequestStore>,
    policy: LeavePolicy,
    clock: Arc<dyn Clock>,
    cache: BalanceCache,
    retry_attempts: u32,
}

impl BalanceAccounting {
    pub fn new(
        store: Arc<dyn LeaveRequestStore>,
        policy: LeavePolicy,
        clock: Arc<dyn Clock>,
        cache: BalanceCache,
        retry_attempts: u32,
    ) -> Self {
        Self {
            store,
            policy,
            clock,
            cache,
            retry_attempts,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Balance of the clock's current accounting year. Pure read.
    pub async fn current_balance(&self, employee_id: EmployeeId) -> Result<LeaveBalance> {
        let year = self.clock.today().year();
        self.cache
            .get_or_load(employee_id, year, || self.recompute(employee_id, year))
            .await
    }

    pub async fn snapshot(&self, employee_id: EmployeeId) -> Result<BalanceSnapshot> {
        Ok(BalanceSnapshot {
            balance: self.current_balance(employee_id).await?,
            policy: self.policy,
        })
    }

    /// Only deducting categories can exceed; the others always return `false`.
    pub async fn would_exceed_balance(
        &self,
        employee_id: EmployeeId,
        category: LeaveCategory,
        number_of_days: u32,
    ) -> Result<bool> {
        if !self.policy.deducts(category) {
            return Ok(false);
        }
        let snapshot = self.snapshot(employee_id).await?;
        Ok(snapshot.would_exceed_balance(category, number_of_days))
    }

    /// Authoritative gate for an approval.
    ///
    /// Recomputes from the store, bypassing the cache, and returns the balance
    /// as it will be once `request` is Approved. Must run under the
    /// employee's approval lock.
    pub async fn commit_approval(&self, request: &LeaveRequest) -> Result<LeaveBalance> {
        let year = request.start_date.year();
        let current = self.recompute(request.employee_id, year).await?;

        let mut projected = current;
        if self.policy.deducts(request.category) {
            projected.add_used(request.number_of_days);
            if projected.remaining_days < 0 {
                warn!(
                    employee_id = %request.employee_id,
                    leave_id = %request.id,
                    requested = request.number_of_days,
                    remaining = current.remaining_days,
                    "Approval would overdraw balance"
                );
                return Err(LeaveError::BalanceViolation {
                    employee_id: request.employee_id,
                    requested: request.number_of_days,
                    remaining: current.remaining_days,
                });
            }
        }
        if request.category == LeaveCategory::Medical {
            projected.add_medical(request.number_of_days);
        }
        Ok(projected)
    }

    /// Write-through once the store confirmed the Approved status.
    pub async fn record_committed(&self, balance: LeaveBalance) {
        self.cache.store(balance).await;
    }

    pub async fn invalidate(&self, employee_id: EmployeeId, year: i32) {
        self.cache.invalidate(employee_id, year).await;
    }

    async fn recompute(&self, employee_id: EmployeeId, year: i32) -> Result<LeaveBalance> {
        let history = with_retry(self.retry_attempts, "list_by_employee", || {
            self.store.list_by_employee(employee_id)
        })
        .await?;
        let balance = fold_balance(employee_id, year, &self.policy, &history);
        debug!(
            employee_id = %employee_id,
            year,
            used = balance.used_days,
            remaining = balance.remaining_days,
            "Balance recomputed"
        );
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::calendar::test_clock::FixedClock;
    use crate::model::leave_request::{LeaveRequestId, NewLeaveRequest, UserId};
    use crate::store::memory::InMemoryLeaveStore;
    use crate::store::LeaveMutation;
    use chrono::{NaiveDate, Utc};
    use std::time::Duration;

    fn request(
        id: u64,
        category: LeaveCategory,
        start: (i32, u32, u32),
        days: u32,
        status: LeaveStatus,
    ) -> LeaveRequest {
        let start_date = NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap();
        LeaveRequest {
            id: LeaveRequestId(id),
            employee_id: EmployeeId(1),
            category,
            start_date,
            end_date: start_date + chrono::Duration::days(i64::from(days) - 1),
            number_of_days: days,
            reason: "Annual family trip".into(),
            documents: vec![],
            status,
            decision_comment: None,
            decided_by: None,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    #[test]
    fn fold_counts_only_approved_deducting_requests_of_the_year() {
        let history = vec![
            request(1, LeaveCategory::Paid, (2026, 2, 1), 5, LeaveStatus::Approved),
            request(2, LeaveCategory::Paid, (2026, 3, 1), 4, LeaveStatus::Pending),
            request(3, LeaveCategory::Paid, (2026, 4, 1), 2, LeaveStatus::Rejected),
            request(4, LeaveCategory::Paid, (2025, 6, 1), 9, LeaveStatus::Approved),
            request(5, LeaveCategory::Medical, (2026, 5, 1), 3, LeaveStatus::Approved),
            request(6, LeaveCategory::Unpaid, (2026, 6, 1), 7, LeaveStatus::Approved),
            request(7, LeaveCategory::Personal, (2026, 7, 1), 1, LeaveStatus::Approved),
        ];
        let b = fold_balance(EmployeeId(1), 2026, &LeavePolicy::default(), &history);
        assert_eq!(b.total_days, 30);
        assert_eq!(b.used_days, 5);
        assert_eq!(b.remaining_days, 25);
        assert_eq!(b.medical_days_used, 3);

        let strict = LeavePolicy {
            personal_deducts: true,
            ..Default::default()
        };
        let b = fold_balance(EmployeeId(1), 2026, &strict, &history);
        assert_eq!(b.used_days, 6);
    }

    #[test]
    fn snapshot_gate_is_strictly_greater_than() {
        let mut balance = LeaveBalance::new(EmployeeId(1), 2026, 30);
        balance.add_used(10);
        let snap = BalanceSnapshot {
            balance,
            policy: LeavePolicy::default(),
        };
        assert!(!snap.would_exceed_balance(LeaveCategory::Paid, 20));
        assert!(snap.would_exceed_balance(LeaveCategory::Paid, 21));
        assert!(!snap.would_exceed_balance(LeaveCategory::Unpaid, 400));
        assert!(!snap.would_exceed_balance(LeaveCategory::Medical, 400));
        assert!(!snap.would_exceed_balance(LeaveCategory::Personal, 400));
    }

    async fn seeded(history: &[(LeaveCategory, u32, LeaveStatus)]) -> (Arc<InMemoryLeaveStore>, BalanceAccounting) {
        let store = Arc::new(InMemoryLeaveStore::new());
        for (category, days, status) in history {
            let start = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
            let id = store
                .create(NewLeaveRequest {
                    employee_id: EmployeeId(1),
                    category: *category,
                    start_date: start,
                    end_date: start + chrono::Duration::days(i64::from(*days) - 1),
                    number_of_days: *days,
                    reason: "Seeded history entry".into(),
                    documents: vec![],
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
            if *status != LeaveStatus::Pending {
                store
                    .update(
                        id,
                        LeaveMutation::Decide {
                            status: *status,
                            decided_by: UserId(99),
                            comment: None,
                            decided_at: Utc::now(),
                        },
                    )
                    .await
                    .unwrap();
            }
        }
        let accounting = BalanceAccounting::new(
            store.clone(),
            LeavePolicy::default(),
            Arc::new(FixedClock::at(2026, 3, 1)),
            BalanceCache::new(Duration::from_secs(60)),
            2,
        );
        (store, accounting)
    }

    #[actix_web::test]
    async fn current_balance_reflects_history() {
        let (_, accounting) = seeded(&[
            (LeaveCategory::Paid, 5, LeaveStatus::Approved),
            (LeaveCategory::Medical, 2, LeaveStatus::Approved),
        ])
        .await;
        let b = accounting.current_balance(EmployeeId(1)).await.unwrap();
        assert_eq!((b.used_days, b.remaining_days, b.medical_days_used), (5, 25, 2));
    }

    #[actix_web::test]
    async fn would_exceed_only_for_paid() {
        let (_, accounting) = seeded(&[(LeaveCategory::Paid, 5, LeaveStatus::Approved)]).await;
        let emp = EmployeeId(1);
        assert!(!accounting.would_exceed_balance(emp, LeaveCategory::Paid, 25).await.unwrap());
        assert!(accounting.would_exceed_balance(emp, LeaveCategory::Paid, 26).await.unwrap());
        assert!(!accounting.would_exceed_balance(emp, LeaveCategory::Unpaid, 26).await.unwrap());
        assert!(!accounting.would_exceed_balance(emp, LeaveCategory::Personal, 26).await.unwrap());
    }

    #[actix_web::test]
    async fn commit_projects_deduction_and_refuses_overdraw() {
        let (_, accounting) = seeded(&[(LeaveCategory::Paid, 10, LeaveStatus::Approved)]).await;

        let ok = request(50, LeaveCategory::Paid, (2026, 6, 1), 20, LeaveStatus::Pending);
        let projected = accounting.commit_approval(&ok).await.unwrap();
        assert_eq!((projected.used_days, projected.remaining_days), (30, 0));

        let too_long = request(51, LeaveCategory::Paid, (2026, 6, 1), 21, LeaveStatus::Pending);
        assert_eq!(
            accounting.commit_approval(&too_long).await.unwrap_err(),
            LeaveError::BalanceViolation {
                employee_id: EmployeeId(1),
                requested: 21,
                remaining: 20,
            }
        );

        let medical = request(52, LeaveCategory::Medical, (2026, 6, 1), 45, LeaveStatus::Pending);
        let projected = accounting.commit_approval(&medical).await.unwrap();
        assert_eq!(projected.remaining_days, 20);
        assert_eq!(projected.medical_days_used, 45);
    }

    #[actix_web::test]
    async fn commit_ignores_stale_cache() {
        let (store, accounting) = seeded(&[]).await;
        let emp = EmployeeId(1);
        // warm cache with the empty history
        assert_eq!(accounting.current_balance(emp).await.unwrap().remaining_days, 30);

        let id = store
            .create(NewLeaveRequest {
                employee_id: emp,
                category: LeaveCategory::Paid,
                start_date: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2026, 4, 25).unwrap(),
                number_of_days: 25,
                reason: "Long trip abroad".into(),
                documents: vec![],
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store
            .update(
                id,
                LeaveMutation::Decide {
                    status: LeaveStatus::Approved,
                    decided_by: UserId(99),
                    comment: None,
                    decided_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let next = request(60, LeaveCategory::Paid, (2026, 7, 1), 6, LeaveStatus::Pending);
        assert!(matches!(
            accounting.commit_approval(&next).await,
            Err(LeaveError::BalanceViolation { remaining: 5, .. })
        ));
    }

    #[actix_web::test]
    async fn store_outage_surfaces_after_retries() {
        let (store, accounting) = seeded(&[]).await;
        store.fail_next(2);
        assert!(matches!(
            accounting.current_balance(EmployeeId(1)).await,
            Err(LeaveError::StoreUnavailable(_))
        ));
        // one transient failure is absorbed by the retry
        store.fail_next(1);
        assert!(accounting.current_balance(EmployeeId(1)).await.is_ok());
    }
}
