//! Write-through session driving the signup form.
use chrono::NaiveDate;
use thiserror::Error;

use super::snapshot::{FormSnapshot, SnapshotError, SnapshotStore};
use super::{ApplicationForm, ApplicationReport, Step, StepError, StepPolicy};
use crate::services::relay::{RelayOutcome, Submission, SubmissionRelay};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] StepError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// One member's in-progress application bound to its snapshot store.
///
/// Every mutation is persisted immediately; closing the session without
/// resetting leaves the snapshot behind so the member can resume later.
pub struct SignupSession<S: SnapshotStore> {
    store: S,
    policy: StepPolicy,
    snapshot: FormSnapshot,
}

impl<S: SnapshotStore> SignupSession<S> {
    /// Restore a previous session from the store, or start fresh. The
    /// persisted step pointer is clamped to the furthest step the saved
    /// fields still gate through, so e.g. a postcode cleared after advancing
    /// cannot resume past the address step.
    pub fn open(store: S, policy: StepPolicy, today: NaiveDate) -> Result<Self, SnapshotError> {
        let snapshot = match store.load()? {
            Some(mut saved) => {
                saved.step = Self::resume_step(&saved, policy, today);
                saved
            }
            None => FormSnapshot::default(),
        };
        Ok(Self {
            store,
            policy,
            snapshot,
        })
    }

    fn resume_step(snapshot: &FormSnapshot, policy: StepPolicy, today: NaiveDate) -> Step {
        let mut step = Step::FIRST;
        while step < snapshot.step {
            if snapshot.form.validate_step(step, policy, today).is_err() {
                break;
            }
            step = step.next();
        }
        step
    }

    pub fn step(&self) -> Step {
        self.snapshot.step
    }

    pub fn form(&self) -> &ApplicationForm {
        &self.snapshot.form
    }

    /// Apply a mutation and write the whole snapshot through.
    pub fn update(
        &mut self,
        mutate: impl FnOnce(&mut ApplicationForm),
    ) -> Result<(), SnapshotError> {
        mutate(&mut self.snapshot.form);
        self.store.save(&self.snapshot)
    }

    /// Validate the current step and move forward. The new step is
    /// persisted; validation failures leave the step untouched.
    pub fn advance(&mut self, today: NaiveDate) -> Result<Step, SessionError> {
        self.snapshot
            .form
            .validate_step(self.snapshot.step, self.policy, today)?;
        self.snapshot.step = self.snapshot.step.next();
        self.store.save(&self.snapshot)?;
        Ok(self.snapshot.step)
    }

    /// Move one step back without validating.
    pub fn retreat(&mut self) -> Result<Step, SnapshotError> {
        self.snapshot.step = self.snapshot.step.prev();
        self.store.save(&self.snapshot)?;
        Ok(self.snapshot.step)
    }

    /// Clear the store and start over at the first step.
    pub fn reset(&mut self) -> Result<(), SnapshotError> {
        self.store.clear()?;
        self.snapshot = FormSnapshot::default();
        Ok(())
    }

    /// Partial state tagged with the step the member stopped at.
    pub fn incomplete_report(&self) -> ApplicationReport {
        ApplicationReport {
            step: Some(self.snapshot.step),
            form: self.snapshot.form.clone(),
            photo_url: None,
        }
    }

    /// Fully validated record ready for final delivery.
    pub fn complete_report(
        &self,
        photo_url: Option<String>,
    ) -> Result<ApplicationReport, StepError> {
        self.snapshot.form.validate_submission()?;
        Ok(ApplicationReport {
            step: None,
            form: self.snapshot.form.clone(),
            photo_url,
        })
    }

    /// Notify the club of an incomplete application. The snapshot stays in
    /// the store so the member can pick up where they left off.
    pub async fn save_and_exit(&self, relay: &SubmissionRelay) -> RelayOutcome {
        relay
            .deliver(Submission::IncompleteApplication(self.incomplete_report()))
            .await
    }

    /// Final submission: validate, deliver the complete record (with the
    /// separately uploaded photo URL), and clear the store only when
    /// delivery succeeded.
    pub async fn submit(
        &mut self,
        relay: &SubmissionRelay,
        photo_url: Option<String>,
    ) -> Result<RelayOutcome, SessionError> {
        let report = self.complete_report(photo_url)?;
        let outcome = relay
            .deliver(Submission::CompleteApplication(report))
            .await;
        if outcome.is_success() {
            self.reset()?;
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::super::snapshot::{InMemoryStore, SNAPSHOT_SCHEMA_VERSION};
    use super::super::{DirectDebit, PhotoAttachment};
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
    }

    fn open(store: &InMemoryStore) -> SignupSession<InMemoryStore> {
        SignupSession::open(store.clone(), StepPolicy::default(), today()).unwrap()
    }

    fn fill_identity(session: &mut SignupSession<InMemoryStore>) {
        session
            .update(|form| {
                form.first_name = "Jan".to_string();
                form.last_name = "Jansen".to_string();
                form.birth_date = "1990-05-01".to_string();
                form.email = "jan@voorbeeld.nl".to_string();
                form.mobile = "06-12345678".to_string();
            })
            .unwrap();
    }

    fn attach_photo(session: &mut SignupSession<InMemoryStore>) {
        session
            .update(|form| {
                form.photo = Some(PhotoAttachment {
                    file_name: "pasfoto.jpg".to_string(),
                    mime_type: "image/jpeg".to_string(),
                    size: 1024,
                });
            })
            .unwrap();
    }

    #[test]
    fn every_update_is_written_through() {
        let store = InMemoryStore::new();
        let mut session = open(&store);

        for (index, name) in ["J", "Ja", "Jan"].iter().enumerate() {
            session
                .update(|form| form.first_name = name.to_string())
                .unwrap();
            let persisted: FormSnapshot =
                serde_json::from_str(&store.raw().unwrap()).unwrap();
            assert_eq!(&persisted.form, session.form(), "after update {index}");
            assert_eq!(persisted.step, session.step());
        }
    }

    #[test]
    fn fresh_store_opens_at_the_first_step() {
        let session = open(&InMemoryStore::new());
        assert_eq!(session.step(), Step::Identity);
        assert_eq!(session.form(), &ApplicationForm::default());
    }

    #[test]
    fn resumes_at_the_address_step_after_postcode_only() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_identity(&mut session);
        session.advance(today()).unwrap();
        session
            .update(|form| form.postcode = "1234AB".to_string())
            .unwrap();
        drop(session);

        let resumed = open(&store);
        assert_eq!(resumed.step(), Step::Address);
        assert_eq!(resumed.form().postcode, "1234AB");
    }

    #[test]
    fn resumes_at_the_final_step_after_signing() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_identity(&mut session);
        session.advance(today()).unwrap();
        session
            .update(|form| {
                form.postcode = "1234AB".to_string();
                form.house_number = "12".to_string();
            })
            .unwrap();
        session.advance(today()).unwrap();
        attach_photo(&mut session);
        session.advance(today()).unwrap();
        session
            .update(|form| form.signature = "Jan Jansen".to_string())
            .unwrap();
        drop(session);

        let resumed = open(&store);
        assert_eq!(resumed.step(), Step::Membership);
        assert_eq!(resumed.form().signature, "Jan Jansen");
    }

    #[test]
    fn resume_clamps_past_a_cleared_gate() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_identity(&mut session);
        session.advance(today()).unwrap();
        session
            .update(|form| {
                form.postcode = "1234AB".to_string();
                form.house_number = "12".to_string();
            })
            .unwrap();
        session.advance(today()).unwrap();
        assert_eq!(session.step(), Step::Payment);

        // Go back and clear the postcode; the saved pointer still says
        // payment but the address gate no longer passes.
        session.update(|form| form.postcode.clear()).unwrap();
        drop(session);

        let resumed = open(&store);
        assert_eq!(resumed.step(), Step::Address);
    }

    #[test]
    fn advance_is_blocked_by_the_gate_and_retreat_floors() {
        let store = InMemoryStore::new();
        let mut session = open(&store);

        let err = session.advance(today()).unwrap_err();
        assert!(matches!(err, SessionError::Validation(_)));
        assert_eq!(session.step(), Step::Identity);

        fill_identity(&mut session);
        session.advance(today()).unwrap();
        assert_eq!(session.step(), Step::Address);

        assert_eq!(session.retreat().unwrap(), Step::Identity);
        assert_eq!(session.retreat().unwrap(), Step::Identity);
    }

    #[test]
    fn direct_debit_gates_banking_fields() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_identity(&mut session);
        session.advance(today()).unwrap();
        session
            .update(|form| {
                form.postcode = "1234AB".to_string();
                form.house_number = "12".to_string();
            })
            .unwrap();
        session.advance(today()).unwrap();
        attach_photo(&mut session);
        session
            .update(|form| form.direct_debit = DirectDebit::Authorized)
            .unwrap();

        let err = session.advance(today()).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Validation(StepError::MissingFields(ref fields))
                if fields == &vec!["IBAN", "Account holder"]
        ));

        session
            .update(|form| {
                form.iban = "NL91BANK0417164300".to_string();
                form.account_holder = "Jan Jansen".to_string();
            })
            .unwrap();
        assert_eq!(session.advance(today()).unwrap(), Step::Membership);
    }

    #[test]
    fn reset_clears_the_store_and_returns_to_start() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_identity(&mut session);
        session.advance(today()).unwrap();

        session.reset().unwrap();
        assert_eq!(session.step(), Step::Identity);
        assert_eq!(session.form(), &ApplicationForm::default());
        assert!(store.raw().is_none());
    }

    #[test]
    fn foreign_schema_version_starts_fresh() {
        let store = InMemoryStore::new();
        let snapshot = FormSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION + 1,
            step: Step::Membership,
            form: ApplicationForm {
                signature: "Jan Jansen".to_string(),
                ..ApplicationForm::default()
            },
        };
        store.set_raw(serde_json::to_string(&snapshot).unwrap());

        let session = open(&store);
        assert_eq!(session.step(), Step::Identity);
        assert!(session.form().signature.is_empty());
    }

    fn fill_for_submission(session: &mut SignupSession<InMemoryStore>) {
        fill_identity(session);
        session
            .update(|form| {
                form.postcode = "1234AB".to_string();
                form.house_number = "12".to_string();
                form.street = "Dorpsstraat".to_string();
                form.city = "Tiel".to_string();
                form.signature = "Jan Jansen".to_string();
            })
            .unwrap();
        attach_photo(session);
    }

    #[tokio::test]
    async fn save_and_exit_keeps_the_snapshot_even_when_delivery_fails() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_identity(&mut session);

        let relay = SubmissionRelay::new("http://127.0.0.1:0/exec".to_string()).unwrap();
        let outcome = session.save_and_exit(&relay).await;

        assert!(!outcome.is_success());
        assert!(store.raw().is_some());
    }

    #[tokio::test]
    async fn failed_submission_does_not_clear_the_store() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_for_submission(&mut session);

        let relay = SubmissionRelay::new("http://127.0.0.1:0/exec".to_string()).unwrap();
        let outcome = session.submit(&relay, None).await.unwrap();

        assert!(!outcome.is_success());
        assert!(store.raw().is_some());
        assert_eq!(session.form().signature, "Jan Jansen");
    }

    #[test]
    fn complete_report_rejects_a_short_signature() {
        let store = InMemoryStore::new();
        let mut session = open(&store);
        fill_identity(&mut session);
        session
            .update(|form| {
                form.postcode = "1234AB".to_string();
                form.house_number = "12".to_string();
                form.street = "Dorpsstraat".to_string();
                form.city = "Tiel".to_string();
                form.signature = "JJ".to_string();
            })
            .unwrap();
        attach_photo(&mut session);

        let err = session.complete_report(None).unwrap_err();
        assert_eq!(err, StepError::MissingFields(vec!["Signature (full name)"]));

        session
            .update(|form| form.signature = "Jan Jansen".to_string())
            .unwrap();
        let report = session.complete_report(None).unwrap();
        assert!(report.step.is_none());
    }
}
