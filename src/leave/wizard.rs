//! Multi-step leave request wizard.
//!
//! Steps advance forward one at a time, each gated by its completion
//! predicate. Earlier steps can be revisited without losing data; `submit`
//! re-checks every predicate because revisits can leave later steps stale.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use utoipa::ToSchema;

use crate::leave::balance::BalanceCheck;
use crate::leave::calendar::inclusive_day_count;
use crate::leave::document_gate;
use crate::leave::error::{LeaveError, Result};
use crate::leave::policy::MIN_REASON_CHARS;
use crate::model::document::Document;
use crate::model::leave_request::{EmployeeId, LeaveCategory, LeaveRequestId, NewLeaveRequest};
use crate::store::LeaveRequestStore;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WizardStep {
    SelectCategory = 0,
    SelectPeriod = 1,
    EnterReason = 2,
    /// Optional unless the category is Medical.
    AttachDocuments = 3,
    Review = 4,
    Submitted = 5,
}

impl WizardStep {
    /// Steps carrying a completion predicate, in order.
    pub const INPUT_STEPS: [WizardStep; 5] = [
        WizardStep::SelectCategory,
        WizardStep::SelectPeriod,
        WizardStep::EnterReason,
        WizardStep::AttachDocuments,
        WizardStep::Review,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    fn next(self) -> Option<Self> {
        match self {
            WizardStep::SelectCategory => Some(WizardStep::SelectPeriod),
            WizardStep::SelectPeriod => Some(WizardStep::EnterReason),
            WizardStep::EnterReason => Some(WizardStep::AttachDocuments),
            WizardStep::AttachDocuments => Some(WizardStep::Review),
            WizardStep::Review | WizardStep::Submitted => None,
        }
    }

    fn previous(self) -> Option<Self> {
        match self {
            WizardStep::SelectCategory | WizardStep::Submitted => None,
            WizardStep::SelectPeriod => Some(WizardStep::SelectCategory),
            WizardStep::EnterReason => Some(WizardStep::SelectPeriod),
            WizardStep::AttachDocuments => Some(WizardStep::EnterReason),
            WizardStep::Review => Some(WizardStep::AttachDocuments),
        }
    }
}

/// The in-progress request held by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LeaveDraft {
    pub category: Option<LeaveCategory>,
    #[schema(format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub reason: String,
    pub documents: Vec<Document>,
}

impl LeaveDraft {
    /// Derived from the dates; `None` until both are set.
    pub fn number_of_days(&self) -> Option<u32> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => inclusive_day_count(start, end).ok(),
            _ => None,
        }
    }
}

/// What the UI layer renders.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WizardState {
    pub step: WizardStep,
    pub draft: LeaveDraft,
    pub number_of_days: Option<u32>,
    /// Indexed by step ordinal, `SelectCategory..=Review`.
    #[schema(value_type = Vec<bool>)]
    pub step_complete: [bool; 5],
    #[schema(value_type = Option<u64>)]
    pub submitted_id: Option<LeaveRequestId>,
}

#[derive(Debug, Clone)]
pub struct LeaveRequestWizard {
    employee_id: EmployeeId,
    step: WizardStep,
    draft: LeaveDraft,
    submitted_id: Option<LeaveRequestId>,
}

impl LeaveRequestWizard {
    pub fn new(employee_id: EmployeeId) -> Self {
        Self {
            employee_id,
            step: WizardStep::SelectCategory,
            draft: LeaveDraft::default(),
            submitted_id: None,
        }
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &LeaveDraft {
        &self.draft
    }

    // ---------- input ----------

    pub fn select_category(&mut self, category: LeaveCategory) -> Result<()> {
        self.ensure_editable(WizardStep::SelectCategory)?;
        self.draft.category = Some(category);
        Ok(())
    }

    /// Stores the period and returns its day count. A reversed range is
    /// refused and the previous dates are kept.
    pub fn set_period(&mut self, start: NaiveDate, end: NaiveDate) -> Result<u32> {
        self.ensure_editable(WizardStep::SelectPeriod)?;
        let days = inclusive_day_count(start, end)?;
        self.draft.start_date = Some(start);
        self.draft.end_date = Some(end);
        Ok(days)
    }

    pub fn set_reason(&mut self, reason: &str) -> Result<()> {
        self.ensure_editable(WizardStep::EnterReason)?;
        self.draft.reason = reason.trim().to_string();
        Ok(())
    }

    /// Attaches an already stored document after checking type and size.
    pub fn attach_document(&mut self, document: Document) -> Result<()> {
        self.ensure_editable(WizardStep::AttachDocuments)?;
        document_gate::check_document(
            &document.original_name,
            &document.mime_type,
            document.size_bytes,
        )?;
        self.draft.documents.push(document);
        Ok(())
    }

    pub fn remove_document(&mut self, index: usize) -> Result<Document> {
        self.ensure_editable(WizardStep::AttachDocuments)?;
        if index >= self.draft.documents.len() {
            return Err(LeaveError::WizardAction(format!(
                "no document at position {index}"
            )));
        }
        Ok(self.draft.documents.remove(index))
    }

    /// Input for `step` may be edited once the step has been reached.
    pub fn ensure_editable(&self, step: WizardStep) -> Result<()> {
        if self.step == WizardStep::Submitted {
            return Err(LeaveError::WizardAction(
                "request already submitted, reset to start a new one".into(),
            ));
        }
        if step > self.step {
            return Err(LeaveError::WizardAction(format!(
                "step '{step}' has not been reached yet"
            )));
        }
        Ok(())
    }

    // ---------- gating ----------

    /// The completion predicate of `step`, with the failing rule on error.
    pub fn check_step(&self, step: WizardStep, balance: &impl BalanceCheck) -> Result<()> {
        let unmet = |reason: &str| LeaveError::ValidationFailed {
            step,
            reason: reason.to_string(),
        };

        match step {
            WizardStep::SelectCategory => match self.draft.category {
                Some(_) => Ok(()),
                None => Err(unmet("choose a leave category")),
            },
            WizardStep::SelectPeriod => {
                let (Some(start), Some(end)) = (self.draft.start_date, self.draft.end_date) else {
                    return Err(unmet("start and end dates are required"));
                };
                let days = inclusive_day_count(start, end).map_err(|e| unmet(&e.to_string()))?;
                if days == 0 {
                    return Err(unmet("the period must cover at least one day"));
                }
                match self.draft.category {
                    Some(category) if balance.would_exceed_balance(category, days) => Err(unmet(
                        &format!("{days} day(s) exceed the remaining {category} leave balance"),
                    )),
                    _ => Ok(()),
                }
            }
            WizardStep::EnterReason => {
                if self.draft.reason.chars().count() >= MIN_REASON_CHARS {
                    Ok(())
                } else {
                    Err(unmet(&format!(
                        "reason must be at least {MIN_REASON_CHARS} characters"
                    )))
                }
            }
            WizardStep::AttachDocuments => {
                let outcome = match self.draft.category {
                    Some(category) => document_gate::validate(category, &self.draft.documents),
                    None => match document_gate::violations(&self.draft.documents).into_iter().next() {
                        Some(err) => Err(err),
                        None => Ok(()),
                    },
                };
                outcome.map_err(|e| unmet(&e.to_string()))
            }
            WizardStep::Review => Ok(()),
            WizardStep::Submitted => Err(LeaveError::WizardAction(
                "submitted requests have no further steps".into(),
            )),
        }
    }

    pub fn step_complete(&self, step: WizardStep, balance: &impl BalanceCheck) -> bool {
        self.check_step(step, balance).is_ok()
    }

    /// First unmet predicate across all input steps.
    pub fn validate_all(&self, balance: &impl BalanceCheck) -> Result<()> {
        WizardStep::INPUT_STEPS
            .iter()
            .try_for_each(|step| self.check_step(*step, balance))
    }

    // ---------- navigation ----------

    pub fn advance(&mut self, balance: &impl BalanceCheck) -> Result<WizardStep> {
        let Some(next) = self.step.next() else {
            return Err(LeaveError::WizardAction(match self.step {
                WizardStep::Review => "review is the last step, submit the request".into(),
                _ => "request already submitted".into(),
            }));
        };
        self.check_step(self.step, balance)?;
        debug!(employee_id = %self.employee_id, from = %self.step, to = %next, "Wizard advanced");
        self.step = next;
        Ok(next)
    }

    pub fn back(&mut self) -> Result<WizardStep> {
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                Ok(previous)
            }
            None => Err(LeaveError::WizardAction(match self.step {
                WizardStep::Submitted => "request already submitted".into(),
                _ => "already at the first step".into(),
            })),
        }
    }

    /// Jump back to any step already reached; data is kept.
    pub fn revisit(&mut self, step: WizardStep) -> Result<WizardStep> {
        if step == WizardStep::Submitted {
            return Err(LeaveError::WizardAction("cannot jump to submitted".into()));
        }
        self.ensure_editable(step)?;
        self.step = step;
        Ok(step)
    }

    // ---------- submission ----------

    /// Builds the candidate request without persisting it.
    pub fn prepare_submission(
        &self,
        balance: &impl BalanceCheck,
        now: DateTime<Utc>,
    ) -> Result<NewLeaveRequest> {
        if self.step == WizardStep::Submitted {
            return Err(LeaveError::WizardAction("request already submitted".into()));
        }
        self.validate_all(balance)?;
        if self.step != WizardStep::Review {
            return Err(LeaveError::WizardAction(
                "review the request before submitting".into(),
            ));
        }

        // validate_all guarantees every field below is present
        let (Some(category), Some(start_date), Some(end_date)) =
            (self.draft.category, self.draft.start_date, self.draft.end_date)
        else {
            return Err(LeaveError::ValidationFailed {
                step: WizardStep::SelectCategory,
                reason: "draft is incomplete".into(),
            });
        };

        Ok(NewLeaveRequest {
            employee_id: self.employee_id,
            category,
            start_date,
            end_date,
            number_of_days: inclusive_day_count(start_date, end_date)?,
            reason: self.draft.reason.clone(),
            documents: self.draft.documents.clone(),
            created_at: now,
        })
    }

    /// Persists the draft as a Pending request.
    ///
    /// On a store failure the draft and step are left untouched so the
    /// caller can retry.
    pub async fn submit<B>(
        &mut self,
        balance: &B,
        store: &dyn LeaveRequestStore,
        now: DateTime<Utc>,
    ) -> Result<LeaveRequestId>
    where
        B: BalanceCheck + Sync,
    {
        let candidate = self.prepare_submission(balance, now)?;
        let category = candidate.category;
        let days = candidate.number_of_days;

        match store.create(candidate).await {
            Ok(id) => {
                info!(
                    employee_id = %self.employee_id,
                    leave_id = %id,
                    category = %category,
                    days,
                    "Leave request submitted"
                );
                self.step = WizardStep::Submitted;
                self.submitted_id = Some(id);
                Ok(id)
            }
            Err(e) => {
                error!(error = %e, employee_id = %self.employee_id, "Failed to persist leave request");
                Err(e.into())
            }
        }
    }

    /// Discards the draft and returns to the first step.
    pub fn reset(&mut self) {
        *self = Self::new(self.employee_id);
    }

    pub fn state(&self, balance: &impl BalanceCheck) -> WizardState {
        let mut step_complete = [false; 5];
        for step in WizardStep::INPUT_STEPS {
            step_complete[step.ordinal()] = self.step_complete(step, balance);
        }
        WizardState {
            step: self.step,
            draft: self.draft.clone(),
            number_of_days: self.draft.number_of_days(),
            step_complete,
            submitted_id: self.submitted_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::balance::BalanceSnapshot;
    use crate::leave::policy::LeavePolicy;
    use crate::model::balance::LeaveBalance;
    use crate::model::document::StorageRef;
    use crate::store::memory::InMemoryLeaveStore;
    use chrono::TimeZone;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn balance(used: u32) -> BalanceSnapshot {
        let mut b = LeaveBalance::new(EmployeeId(1), 2026, 30);
        b.add_used(used);
        BalanceSnapshot {
            balance: b,
            policy: LeavePolicy::default(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    fn certificate() -> Document {
        Document {
            original_name: "certificat.pdf".into(),
            mime_type: "application/pdf".into(),
            size_bytes: 2048,
            storage_ref: StorageRef("abc.pdf".into()),
        }
    }

    /// Drive a wizard to Review with valid input.
    fn at_review(category: LeaveCategory, start: NaiveDate, end: NaiveDate) -> LeaveRequestWizard {
        let snap = balance(0);
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        w.select_category(category).unwrap();
        w.advance(&snap).unwrap();
        w.set_period(start, end).unwrap();
        w.advance(&snap).unwrap();
        w.set_reason("Visiting family in Monastir").unwrap();
        w.advance(&snap).unwrap();
        if category == LeaveCategory::Medical {
            w.attach_document(certificate()).unwrap();
        }
        w.advance(&snap).unwrap();
        assert_eq!(w.step(), WizardStep::Review);
        w
    }

    #[test]
    fn cannot_advance_without_category() {
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        let err = w.advance(&balance(0)).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::ValidationFailed {
                step: WizardStep::SelectCategory,
                ..
            }
        ));
        assert_eq!(w.step(), WizardStep::SelectCategory);
    }

    #[test]
    fn cannot_fill_steps_not_reached() {
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        assert!(matches!(
            w.set_reason("Too early for this"),
            Err(LeaveError::WizardAction(_))
        ));
        assert!(matches!(
            w.set_period(d(2026, 3, 10), d(2026, 3, 12)),
            Err(LeaveError::WizardAction(_))
        ));
    }

    #[test]
    fn reversed_period_is_refused_and_previous_kept() {
        let snap = balance(0);
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        w.select_category(LeaveCategory::Unpaid).unwrap();
        w.advance(&snap).unwrap();
        assert_eq!(w.set_period(d(2026, 3, 10), d(2026, 3, 12)).unwrap(), 3);
        assert!(matches!(
            w.set_period(d(2026, 3, 12), d(2026, 3, 10)),
            Err(LeaveError::InvalidRange { .. })
        ));
        assert_eq!(w.draft().number_of_days(), Some(3));
    }

    #[test]
    fn single_day_request_counts_one_day() {
        let w = at_review(LeaveCategory::Unpaid, d(2024, 3, 10), d(2024, 3, 10));
        let candidate = w.prepare_submission(&balance(0), now()).unwrap();
        assert_eq!(candidate.number_of_days, 1);
    }

    #[test]
    fn paid_period_gated_by_remaining_balance() {
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        let snap = balance(5);
        w.select_category(LeaveCategory::Paid).unwrap();
        w.advance(&snap).unwrap();

        // 26 days > 25 remaining
        w.set_period(d(2026, 6, 1), d(2026, 6, 26)).unwrap();
        let err = w.advance(&snap).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::ValidationFailed {
                step: WizardStep::SelectPeriod,
                ..
            }
        ));

        // 25 days fits exactly
        w.set_period(d(2026, 6, 1), d(2026, 6, 25)).unwrap();
        assert_eq!(w.advance(&snap).unwrap(), WizardStep::EnterReason);
    }

    #[test]
    fn unpaid_period_ignores_balance() {
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        let snap = balance(30);
        w.select_category(LeaveCategory::Unpaid).unwrap();
        w.advance(&snap).unwrap();
        w.set_period(d(2026, 6, 1), d(2026, 7, 31)).unwrap();
        assert!(w.advance(&snap).is_ok());
    }

    #[test]
    fn period_step_checks_dates_then_day_count() {
        let snap = balance(0);
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        w.select_category(LeaveCategory::Personal).unwrap();
        w.advance(&snap).unwrap();

        let err = w.check_step(WizardStep::SelectPeriod, &snap).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::ValidationFailed {
                step: WizardStep::SelectPeriod,
                ..
            }
        ));
        assert!(!w.step_complete(WizardStep::SelectPeriod, &snap));

        w.set_period(d(2026, 4, 1), d(2026, 4, 2)).unwrap();
        assert!(w.check_step(WizardStep::SelectPeriod, &snap).is_ok());
    }

    #[test]
    fn short_reason_blocks_step() {
        let snap = balance(0);
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        w.select_category(LeaveCategory::Unpaid).unwrap();
        w.advance(&snap).unwrap();
        w.set_period(d(2026, 6, 1), d(2026, 6, 2)).unwrap();
        w.advance(&snap).unwrap();
        w.set_reason("   short   ").unwrap();
        assert!(!w.step_complete(WizardStep::EnterReason, &snap));
        assert!(w.advance(&snap).is_err());
        w.set_reason("exactly10!").unwrap();
        assert!(w.advance(&snap).is_ok());
    }

    #[test]
    fn medical_requires_document_to_leave_attach_step() {
        let snap = balance(0);
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        w.select_category(LeaveCategory::Medical).unwrap();
        w.advance(&snap).unwrap();
        w.set_period(d(2026, 6, 1), d(2026, 6, 3)).unwrap();
        w.advance(&snap).unwrap();
        w.set_reason("Flu, doctor ordered rest").unwrap();
        w.advance(&snap).unwrap();

        let err = w.advance(&snap).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::ValidationFailed {
                step: WizardStep::AttachDocuments,
                ..
            }
        ));
        w.attach_document(certificate()).unwrap();
        assert_eq!(w.advance(&snap).unwrap(), WizardStep::Review);
    }

    #[test]
    fn oversized_attachment_is_refused() {
        let snap = balance(0);
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        w.select_category(LeaveCategory::Medical).unwrap();
        w.advance(&snap).unwrap();
        w.set_period(d(2026, 6, 1), d(2026, 6, 3)).unwrap();
        w.advance(&snap).unwrap();
        w.set_reason("Surgery and recovery").unwrap();
        w.advance(&snap).unwrap();

        let mut big = certificate();
        big.size_bytes = 11 * 1024 * 1024;
        assert!(matches!(
            w.attach_document(big),
            Err(LeaveError::DocumentTooLarge { .. })
        ));
        assert!(w.draft().documents.is_empty());
    }

    #[test]
    fn back_navigation_keeps_data() {
        let mut w = at_review(LeaveCategory::Paid, d(2026, 6, 1), d(2026, 6, 5));
        assert_eq!(w.back().unwrap(), WizardStep::AttachDocuments);
        assert_eq!(w.back().unwrap(), WizardStep::EnterReason);
        assert_eq!(w.revisit(WizardStep::SelectCategory).unwrap(), WizardStep::SelectCategory);
        assert_eq!(w.draft().number_of_days(), Some(5));
        assert_eq!(w.draft().reason, "Visiting family in Monastir");
        assert!(matches!(w.back(), Err(LeaveError::WizardAction(_))));
        assert!(matches!(
            w.revisit(WizardStep::Review),
            Err(LeaveError::WizardAction(_))
        ));
    }

    #[test]
    fn stale_category_change_caught_at_submit() {
        // Switch to Medical from Review without going through documents again.
        let mut w = at_review(LeaveCategory::Paid, d(2026, 6, 1), d(2026, 6, 5));
        w.select_category(LeaveCategory::Medical).unwrap();
        let err = w.prepare_submission(&balance(0), now()).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::ValidationFailed {
                step: WizardStep::AttachDocuments,
                ..
            }
        ));
    }

    #[test]
    fn stale_balance_caught_at_submit() {
        let w = at_review(LeaveCategory::Paid, d(2026, 6, 1), d(2026, 6, 10));
        let err = w.prepare_submission(&balance(25), now()).unwrap_err();
        assert!(matches!(
            err,
            LeaveError::ValidationFailed {
                step: WizardStep::SelectPeriod,
                ..
            }
        ));
    }

    #[test]
    fn submit_requires_review() {
        let snap = balance(0);
        let mut w = at_review(LeaveCategory::Unpaid, d(2026, 6, 1), d(2026, 6, 2));
        w.back().unwrap();
        assert!(matches!(
            w.prepare_submission(&snap, now()),
            Err(LeaveError::WizardAction(_))
        ));
        assert!(matches!(w.advance(&snap), Ok(WizardStep::Review)));
        assert!(matches!(w.advance(&snap), Err(LeaveError::WizardAction(_))));
    }

    #[test]
    fn state_reports_step_completion() {
        let w = at_review(LeaveCategory::Unpaid, d(2026, 6, 1), d(2026, 6, 2));
        let state = w.state(&balance(0));
        assert_eq!(state.step, WizardStep::Review);
        assert_eq!(state.step_complete, [true; 5]);
        assert_eq!(state.number_of_days, Some(2));

        let fresh = LeaveRequestWizard::new(EmployeeId(1)).state(&balance(0));
        assert_eq!(fresh.step_complete, [false, false, false, true, true]);
    }

    #[actix_web::test]
    async fn submit_persists_pending_request() {
        let store = InMemoryLeaveStore::new();
        let mut w = at_review(LeaveCategory::Medical, d(2026, 6, 1), d(2026, 6, 3));

        let id = w.submit(&balance(0), &store, now()).await.unwrap();
        assert_eq!(w.step(), WizardStep::Submitted);

        let stored = store.get(id).await.unwrap();
        assert_eq!(stored.category, LeaveCategory::Medical);
        assert_eq!(stored.number_of_days, 3);
        assert_eq!(stored.reason, "Visiting family in Monastir");
        assert_eq!(stored.documents.len(), 1);
        assert!(stored.is_pending());
        assert!(stored.decided_at.is_none());

        assert!(matches!(
            w.submit(&balance(0), &store, now()).await,
            Err(LeaveError::WizardAction(_))
        ));
        assert!(matches!(
            w.set_reason("Another attempt here"),
            Err(LeaveError::WizardAction(_))
        ));
    }

    #[actix_web::test]
    async fn medical_without_documents_never_submits() {
        let store = InMemoryLeaveStore::new();
        let snap = balance(0);
        let mut w = LeaveRequestWizard::new(EmployeeId(1));
        w.select_category(LeaveCategory::Medical).unwrap();
        w.advance(&snap).unwrap();
        w.set_period(d(2026, 6, 1), d(2026, 6, 3)).unwrap();
        w.advance(&snap).unwrap();
        w.set_reason("Back pain, bed rest").unwrap();
        w.advance(&snap).unwrap();

        let err = w.submit(&snap, &store, now()).await.unwrap_err();
        assert!(matches!(
            err,
            LeaveError::ValidationFailed {
                step: WizardStep::AttachDocuments,
                ..
            }
        ));
        assert!(store.list_by_employee(EmployeeId(1)).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn store_outage_preserves_draft_for_retry() {
        let store = InMemoryLeaveStore::new();
        let mut w = at_review(LeaveCategory::Paid, d(2026, 6, 1), d(2026, 6, 5));
        let before = w.draft().clone();

        store.fail_next(1);
        let err = w.submit(&balance(0), &store, now()).await.unwrap_err();
        assert!(matches!(err, LeaveError::StoreUnavailable(_)));
        assert_eq!(w.step(), WizardStep::Review);
        assert_eq!(w.draft(), &before);

        assert!(w.submit(&balance(0), &store, now()).await.is_ok());
    }

    #[test]
    fn reset_discards_everything() {
        let mut w = at_review(LeaveCategory::Paid, d(2026, 6, 1), d(2026, 6, 5));
        w.reset();
        assert_eq!(w.step(), WizardStep::SelectCategory);
        assert_eq!(w.draft(), &LeaveDraft::default());
        assert_eq!(w.employee_id(), EmployeeId(1));
    }
}
