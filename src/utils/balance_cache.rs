use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::future::Cache;

use crate::model::balance::LeaveBalance;
use crate::model::leave_request::EmployeeId;

/// Balances keyed by `(employee, accounting year)`.
///
/// Read-through on miss, write-through once the store confirms a decision,
/// explicit invalidation when a decision outcome is unknown.
///
/// Every write-through or invalidation bumps `epoch`. A read-through load
/// only fills the cache if no such write happened while it was loading.
#[derive(Clone)]
pub struct BalanceCache {
    entries: Cache<(EmployeeId, i32), LeaveBalance>,
    epoch: Arc<AtomicU64>,
}

impl BalanceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(50_000)
                .time_to_live(ttl)
                .build(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get_or_load<E, F, Fut>(
        &self,
        employee_id: EmployeeId,
        year: i32,
        load: F,
    ) -> Result<LeaveBalance, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<LeaveBalance, E>>,
    {
        let key = (employee_id, year);
        if let Some(hit) = self.entries.get(&key).await {
            return Ok(hit);
        }
        let started = self.epoch.load(Ordering::Acquire);
        let balance = load().await?;
        if self.epoch.load(Ordering::Acquire) == started {
            self.entries.insert(key, balance).await;
            // a write-through landed between the check and the insert
            if self.epoch.load(Ordering::Acquire) != started {
                self.entries.invalidate(&key).await;
            }
        }
        Ok(balance)
    }

    /// Write-through after a confirmed write.
    pub async fn store(&self, balance: LeaveBalance) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries
            .insert((balance.employee_id, balance.year), balance)
            .await;
    }

    pub async fn invalidate(&self, employee_id: EmployeeId, year: i32) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.invalidate(&(employee_id, year)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[actix_web::test]
    async fn loads_once_then_serves_from_cache() {
        let cache = BalanceCache::new(Duration::from_secs(60));
        let loads = AtomicU32::new(0);
        let emp = EmployeeId(5);

        for _ in 0..3 {
            let b: Result<_, ()> = cache
                .get_or_load(emp, 2026, || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(LeaveBalance::new(emp, 2026, 30))
                })
                .await;
            assert_eq!(b.unwrap().remaining_days, 30);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn failed_loads_are_not_cached() {
        let cache = BalanceCache::new(Duration::from_secs(60));
        let emp = EmployeeId(5);

        let first: Result<LeaveBalance, &str> = cache.get_or_load(emp, 2026, || async { Err("down") }).await;
        assert!(first.is_err());

        let second: Result<LeaveBalance, &str> = cache
            .get_or_load(emp, 2026, || async { Ok(LeaveBalance::new(emp, 2026, 30)) })
            .await;
        assert!(second.is_ok());
    }

    #[actix_web::test]
    async fn write_through_and_invalidate() {
        let cache = BalanceCache::new(Duration::from_secs(60));
        let emp = EmployeeId(8);
        let mut b = LeaveBalance::new(emp, 2026, 30);
        b.add_used(4);
        cache.store(b).await;

        let hit: Result<_, &str> = cache
            .get_or_load(emp, 2026, || async { Err("loader must not run") })
            .await;
        assert_eq!(hit.unwrap().remaining_days, 26);

        cache.invalidate(emp, 2026).await;
        let reloaded: Result<_, ()> = cache
            .get_or_load(emp, 2026, || async { Ok(LeaveBalance::new(emp, 2026, 30)) })
            .await;
        assert_eq!(reloaded.unwrap().remaining_days, 30);
    }

    #[actix_web::test]
    async fn load_overtaken_by_write_through_is_not_cached() {
        let cache = BalanceCache::new(Duration::from_secs(60));
        let emp = EmployeeId(9);
        let mut committed = LeaveBalance::new(emp, 2026, 30);
        committed.add_used(5);

        // the approval commits while the read is still loading
        let stale: Result<_, ()> = cache
            .get_or_load(emp, 2026, || async {
                cache.store(committed).await;
                Ok(LeaveBalance::new(emp, 2026, 30))
            })
            .await;
        assert_eq!(stale.unwrap().remaining_days, 30);

        let next: Result<_, &str> = cache
            .get_or_load(emp, 2026, || async { Err("loader must not run") })
            .await;
        assert_eq!(next.unwrap().remaining_days, 25);
    }
}
