use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::model::leave_request::EmployeeId;

/// One async mutex per employee.
///
/// Serializes the balance check and the status write of approvals touching
/// the same employee. Approvals of different employees never contend.
/// Slots nobody holds or waits on are dropped on the next `lock` call.
///
/// Process-local only: running several instances against one MySQL store
/// does not serialize approvals across them.
#[derive(Clone, Default)]
pub struct EmployeeLocks {
    slots: Arc<Mutex<HashMap<EmployeeId, Arc<AsyncMutex<()>>>>>,
}

impl EmployeeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds the employee's slot until the guard is dropped.
    pub async fn lock(&self, employee_id: EmployeeId) -> OwnedMutexGuard<()> {
        let slot = {
            // entries are inserted and removed whole, a poisoned guard is still consistent
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // a count of one means only the map refers to the slot
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(employee_id).or_default().clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    fn slot_count(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
