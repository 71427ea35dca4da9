use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::leave::approval::ApprovalWorkflow;
use crate::leave::balance::BalanceAccounting;
use crate::leave::calendar::Clock;
use crate::store::LeaveRequestStore;
use crate::store::documents::DocumentStorage;
use crate::utils::balance_cache::BalanceCache;
use crate::utils::employee_locks::EmployeeLocks;
use crate::utils::wizard_sessions::WizardSessions;

/// Shared services handed to every handler through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn LeaveRequestStore>,
    pub documents: Arc<dyn DocumentStorage>,
    pub accounting: Arc<BalanceAccounting>,
    pub approvals: ApprovalWorkflow,
    pub wizards: WizardSessions,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn LeaveRequestStore>,
        documents: Arc<dyn DocumentStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accounting = Arc::new(BalanceAccounting::new(
            store.clone(),
            config.leave_policy(),
            clock,
            BalanceCache::new(Duration::from_secs(config.balance_cache_ttl_secs)),
            config.store_retry_attempts,
        ));
        let approvals = ApprovalWorkflow::new(
            store.clone(),
            accounting.clone(),
            EmployeeLocks::new(),
            config.store_retry_attempts,
        );
        let wizards = WizardSessions::new(Duration::from_secs(config.wizard_idle_secs), documents.clone());
        Self {
            store,
            documents,
            accounting,
            approvals,
            wizards,
        }
    }

    pub fn retry_attempts(&self) -> u32 {
        self.approvals.retry_attempts()
    }
}
