use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use moka::future::Cache;
use moka::notification::{ListenerFuture, RemovalCause};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::leave::wizard::{LeaveRequestWizard, WizardStep};
use crate::model::document::StorageRef;
use crate::model::leave_request::EmployeeId;
use crate::store::documents::DocumentStorage;

pub type WizardHandle = Arc<Mutex<LeaveRequestWizard>>;

/// Open wizard drafts, one per employee.
///
/// Entries idle longer than the configured time are dropped, which discards
/// the draft the same way an explicit reset would. Documents uploaded for a
/// dropped draft are deleted; those of a submitted draft belong to the stored
/// request and stay.
#[derive(Clone)]
pub struct WizardSessions {
    open: Cache<EmployeeId, WizardHandle>,
}

impl WizardSessions {
    pub fn new(idle: Duration, documents: Arc<dyn DocumentStorage>) -> Self {
        let listener = move |employee_id: Arc<EmployeeId>,
                             handle: WizardHandle,
                             cause: RemovalCause|
              -> ListenerFuture {
            let documents = documents.clone();
            async move {
                let orphans = unsubmitted_documents(&handle).await;
                debug!(employee_id = %employee_id, ?cause, documents = orphans.len(), "Wizard draft dropped");
                for storage_ref in orphans {
                    if let Err(e) = documents.delete(&storage_ref).await {
                        warn!(employee_id = %employee_id, storage_ref = %storage_ref, error = %e, "Orphaned document kept");
                    }
                }
            }
            .boxed()
        };

        Self {
            open: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(idle)
                .async_eviction_listener(listener)
                .build(),
        }
    }

    /// The employee's open wizard, starting a fresh one if none exists.
    pub async fn get_or_start(&self, employee_id: EmployeeId) -> WizardHandle {
        self.open
            .get_with(employee_id, async move {
                Arc::new(Mutex::new(LeaveRequestWizard::new(employee_id)))
            })
            .await
    }

    pub async fn discard(&self, employee_id: EmployeeId) {
        self.open.invalidate(&employee_id).await;
    }
}

async fn unsubmitted_documents(handle: &WizardHandle) -> Vec<StorageRef> {
    let wizard = handle.lock().await;
    if wizard.step() == WizardStep::Submitted {
        return Vec::new();
    }
    wizard
        .draft()
        .documents
        .iter()
        .map(|d| d.storage_ref.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::balance::BalanceSnapshot;
    use crate::leave::policy::LeavePolicy;
    use crate::model::balance::LeaveBalance;
    use crate::model::document::DocumentMeta;
    use crate::model::leave_request::LeaveCategory;
    use crate::store::documents::LocalDocumentStorage;
    use chrono::NaiveDate;

    async fn sessions(dir: &tempfile::TempDir) -> (WizardSessions, Arc<LocalDocumentStorage>) {
        let storage = Arc::new(LocalDocumentStorage::open(dir.path()).await.unwrap());
        (WizardSessions::new(Duration::from_secs(60), storage.clone()), storage)
    }

    #[actix_web::test]
    async fn draft_survives_between_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (sessions, _) = sessions(&dir).await;
        {
            let handle = sessions.get_or_start(EmployeeId(3)).await;
            handle
                .lock()
                .await
                .select_category(LeaveCategory::Unpaid)
                .unwrap();
        }
        let handle = sessions.get_or_start(EmployeeId(3)).await;
        let wizard = handle.lock().await;
        assert_eq!(wizard.draft().category, Some(LeaveCategory::Unpaid));
        assert_eq!(wizard.employee_id(), EmployeeId(3));
    }

    #[actix_web::test]
    async fn discard_starts_over() {
        let dir = tempfile::tempdir().unwrap();
        let (sessions, _) = sessions(&dir).await;
        sessions
            .get_or_start(EmployeeId(3))
            .await
            .lock()
            .await
            .select_category(LeaveCategory::Paid)
            .unwrap();
        sessions.discard(EmployeeId(3)).await;

        let handle = sessions.get_or_start(EmployeeId(3)).await;
        let wizard = handle.lock().await;
        assert_eq!(wizard.step(), WizardStep::SelectCategory);
        assert_eq!(wizard.draft().category, None);
    }

    #[actix_web::test]
    async fn discarded_draft_deletes_its_documents() {
        let dir = tempfile::tempdir().unwrap();
        let (sessions, storage) = sessions(&dir).await;
        let meta = DocumentMeta {
            original_name: "scan.png".into(),
            mime_type: "image/png".into(),
            size_bytes: 3,
        };
        let storage_ref = storage.put(b"png", &meta).await.unwrap();

        {
            let handle = sessions.get_or_start(EmployeeId(4)).await;
            let mut wizard = handle.lock().await;
            let snap = BalanceSnapshot {
                balance: LeaveBalance::new(EmployeeId(4), 2026, 30),
                policy: LeavePolicy::default(),
            };
            let day = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
            wizard.select_category(LeaveCategory::Unpaid).unwrap();
            wizard.advance(&snap).unwrap();
            wizard.set_period(day, day).unwrap();
            wizard.advance(&snap).unwrap();
            wizard.set_reason("Moving to a new flat").unwrap();
            wizard.advance(&snap).unwrap();
            wizard.attach_document(meta.into_document(storage_ref.clone())).unwrap();
        }
        assert!(dir.path().join(&storage_ref.0).exists());

        sessions.discard(EmployeeId(4)).await;
        sessions.open.run_pending_tasks().await;
        assert!(!dir.path().join(&storage_ref.0).exists());
    }
}
