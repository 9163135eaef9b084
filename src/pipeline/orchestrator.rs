//! Pipeline orchestrator. Drives each pending record through the bounded
//! state machine: pending → validated → dispatched → terminal.
//!
//! Processing is strictly sequential: one record completes before the next
//! begins. Per-record errors are converted into status/remark writes and
//! never abort the batch; only the initial fetch (or configuration) aborts
//! a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Days, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::channels::Dispatcher;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::record::{DATE_FORMAT, LeadRecord, Status};
use crate::schema;
use crate::store::RecordStore;
use crate::verify::EmailVerifier;

/// Result contract for one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub processed_count: usize,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub errors: Vec<RecordError>,
}

/// One per-record failure, keyed by the record's email.
#[derive(Debug, Clone, Serialize)]
pub struct RecordError {
    pub email: String,
    pub reason: String,
}

/// The state machine driver.
pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
    dispatcher: Dispatcher,
    verifier: EmailVerifier,
    config: PipelineConfig,
    /// In-process guard against overlapping runs. Not a distributed lock.
    running: AtomicBool,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        dispatcher: Dispatcher,
        verifier: EmailVerifier,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            verifier,
            config,
            running: AtomicBool::new(false),
        }
    }

    /// Run one pass over every pending record.
    ///
    /// A second invocation while one is in flight is rejected with
    /// `PipelineError::AlreadyRunning` rather than queued.
    pub async fn run(&self) -> Result<PipelineReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Pipeline invoked while a run is in flight; rejecting");
            return Err(PipelineError::AlreadyRunning.into());
        }

        let result = self.run_inner().await;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&self) -> Result<PipelineReport> {
        // A fetch failure aborts the whole run before any record is touched.
        let mut pending = self.store.fetch_pending().await?;
        if let Some(cap) = self.config.batch_size {
            pending.truncate(cap);
        }
        info!(count = pending.len(), "Fetched pending records");

        let mut report = PipelineReport::default();
        let total = pending.len();
        for (i, record) in pending.iter().enumerate() {
            self.process_record(record, &mut report).await;

            if i + 1 < total && !self.config.delay_between_records.is_zero() {
                tokio::time::sleep(self.config.delay_between_records).await;
            }
        }

        info!(
            processed = report.processed_count,
            succeeded = report.succeeded_count,
            failed = report.failed_count,
            "Pipeline run complete"
        );
        Ok(report)
    }

    async fn process_record(&self, record: &LeadRecord, report: &mut PipelineReport) {
        let email = record.contact_email.trim().to_string();
        if email.is_empty() {
            // Data-quality gap, not a pipeline failure: no status write.
            warn!(
                contact = %record.contact_person,
                company = %record.company,
                "Record has no contact email; skipping"
            );
            return;
        }

        info!(email = %email, company = %record.company, "Processing record");
        report.processed_count += 1;

        if !self.verifier.verify(&email).await {
            // Invalid is terminal and excluded from the retry pass; the
            // dispatcher is never invoked for it.
            self.write_fields(
                report,
                &email,
                &[
                    (schema::STATUS, Status::Invalid.as_str().to_string()),
                    (schema::REMARKS, "Invalid email format".to_string()),
                ],
            )
            .await;
            report.failed_count += 1;
            report.errors.push(RecordError {
                email,
                reason: "Invalid email format".into(),
            });
            return;
        }

        // Written before dispatch so a crash mid-dispatch leaves the record
        // visibly "verified but not yet actioned" instead of pending forever.
        if !self
            .write_fields(
                report,
                &email,
                &[(schema::STATUS, Status::EmailVerified.as_str().to_string())],
            )
            .await
        {
            report.failed_count += 1;
            return;
        }

        match self.dispatcher.dispatch(record).await {
            Ok(outcome) if outcome.any() => {
                let follow_up = Utc::now().date_naive() + Days::new(self.config.follow_up_days);
                let mut fields = vec![
                    (
                        schema::REMARKS,
                        format!(
                            "Messages sent: email={}, sms={}",
                            outcome.email_sent, outcome.sms_sent
                        ),
                    ),
                    (
                        schema::FOLLOW_UP_DATE,
                        follow_up.format(DATE_FORMAT).to_string(),
                    ),
                ];
                if let Some(action) = outcome.action() {
                    fields.push((schema::ACTION, action.as_str().to_string()));
                }

                if self.write_fields(report, &email, &fields).await {
                    report.succeeded_count += 1;
                } else {
                    report.failed_count += 1;
                }
            }
            Ok(_) => {
                self.mark_failed(report, &email, "Failed to send messages: no channel succeeded")
                    .await;
            }
            Err(e) => {
                self.mark_failed(report, &email, &e.to_string()).await;
            }
        }
    }

    /// Overwrite the record's status to `Failed` with a remark, and account
    /// for it in the report. Failed records are retry-eligible.
    async fn mark_failed(&self, report: &mut PipelineReport, email: &str, reason: &str) {
        self.write_fields(
            report,
            email,
            &[
                (schema::STATUS, Status::Failed.as_str().to_string()),
                (schema::REMARKS, reason.to_string()),
            ],
        )
        .await;
        report.failed_count += 1;
        report.errors.push(RecordError {
            email: email.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Write fields by key; a store failure is logged and recorded in the
    /// report but never aborts the batch.
    async fn write_fields(
        &self,
        report: &mut PipelineReport,
        email: &str,
        fields: &[(&str, String)],
    ) -> bool {
        match self.store.update_fields(email, fields).await {
            Ok(()) => true,
            Err(e) => {
                error!(email = %email, error = %e, "Store write failed");
                report.errors.push(RecordError {
                    email: email.to_string(),
                    reason: format!("store write failed: {e}"),
                });
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::channels::{ChannelKind, OutreachChannel};
    use crate::error::{ChannelError, Error, StoreError};
    use crate::record::Action;
    use crate::store::MemoryStore;

    const HEADERS: &[&str] = &[
        "Company",
        "Contact Person",
        "Contact Number",
        "Email",
        "Industry",
        "Status",
        "Action",
        "Remarks",
        "Follow Up Date",
        "Retry Count",
    ];

    fn row<'a>(
        company: &'a str,
        number: &'a str,
        email: &'a str,
    ) -> Vec<&'a str> {
        vec![company, "Pat", number, email, "Textiles", "", "", "", "", ""]
    }

    /// Mock channel with a scripted outcome and an attempt counter.
    struct MockChannel {
        kind: ChannelKind,
        succeed: bool,
        attempts: AtomicUsize,
    }

    impl MockChannel {
        fn new(kind: ChannelKind, succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                kind,
                succeed,
                attempts: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl OutreachChannel for MockChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }

        fn applies_to(&self, record: &LeadRecord) -> bool {
            match self.kind {
                ChannelKind::Email => !record.contact_email.is_empty(),
                ChannelKind::Sms => record.contact_number.is_some(),
            }
        }

        async fn attempt(&self, _record: &LeadRecord) -> std::result::Result<(), ChannelError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(())
            } else {
                Err(ChannelError::SendFailed {
                    name: self.kind.as_str().into(),
                    reason: "scripted failure".into(),
                })
            }
        }
    }

    fn orchestrator(
        store: Arc<MemoryStore>,
        channels: Vec<Arc<dyn OutreachChannel>>,
    ) -> Orchestrator {
        let config = PipelineConfig {
            delay_between_records: Duration::ZERO,
            ..Default::default()
        };
        Orchestrator::new(
            store,
            Dispatcher::new(channels),
            EmailVerifier::new(None),
            config,
        )
    }

    async fn record(store: &MemoryStore, email: &str) -> LeadRecord {
        store.find_by_key(email).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn invalid_email_is_marked_without_dispatch() {
        // Scenario A: one row, malformed email, empty status.
        let store = Arc::new(MemoryStore::with_rows(HEADERS, &[&row("Acme", "", "bad@@x")]));
        let email_channel = MockChannel::new(ChannelKind::Email, true);
        let orch = orchestrator(store.clone(), vec![email_channel.clone()]);

        let report = orch.run().await.unwrap();
        assert_eq!(report.processed_count, 1);
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.succeeded_count, 0);

        let updated = record(&store, "bad@@x").await;
        assert_eq!(updated.status, Status::Invalid);
        assert_eq!(updated.remarks, "Invalid email format");
        // The dispatcher was never invoked.
        assert_eq!(email_channel.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_email_dispatch_is_verified_and_actioned() {
        // Scenario B: valid email only, email channel succeeds.
        let store = Arc::new(MemoryStore::with_rows(
            HEADERS,
            &[&row("Acme", "", "pat@acme.example")],
        ));
        let email_channel = MockChannel::new(ChannelKind::Email, true);
        let orch = orchestrator(store.clone(), vec![email_channel]);

        let report = orch.run().await.unwrap();
        assert_eq!(report.succeeded_count, 1);
        assert_eq!(report.failed_count, 0);
        assert!(report.errors.is_empty());

        let updated = record(&store, "pat@acme.example").await;
        assert_eq!(updated.status, Status::EmailVerified);
        assert_eq!(updated.action, Some(Action::Emailed));
        assert!(updated.follow_up_date.is_some());
        assert!(updated.remarks.contains("email=true"));
    }

    #[tokio::test]
    async fn partial_channel_success_keeps_verified_status() {
        // Scenario C: email fails, SMS succeeds.
        let store = Arc::new(MemoryStore::with_rows(
            HEADERS,
            &[&row("Acme", "+1 555 0100", "pat@acme.example")],
        ));
        let email_channel = MockChannel::new(ChannelKind::Email, false);
        let sms_channel = MockChannel::new(ChannelKind::Sms, true);
        let orch = orchestrator(store.clone(), vec![email_channel, sms_channel]);

        let report = orch.run().await.unwrap();
        assert_eq!(report.succeeded_count, 1);

        let updated = record(&store, "pat@acme.example").await;
        assert_eq!(updated.status, Status::EmailVerified);
        assert_eq!(updated.action, Some(Action::Texted));
    }

    #[tokio::test]
    async fn all_channels_failing_marks_record_failed() {
        // Scenario D: both channels fail.
        let store = Arc::new(MemoryStore::with_rows(
            HEADERS,
            &[&row("Acme", "+1 555 0100", "pat@acme.example")],
        ));
        let email_channel = MockChannel::new(ChannelKind::Email, false);
        let sms_channel = MockChannel::new(ChannelKind::Sms, false);
        let orch = orchestrator(store.clone(), vec![email_channel, sms_channel]);

        let report = orch.run().await.unwrap();
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.errors.len(), 1);

        let updated = record(&store, "pat@acme.example").await;
        assert_eq!(updated.status, Status::Failed);
        assert_eq!(updated.action, None);
        assert!(updated.remarks.contains("no channel succeeded"));
    }

    #[tokio::test]
    async fn missing_email_is_skipped_without_status_write() {
        let store = Arc::new(MemoryStore::with_rows(HEADERS, &[&row("Acme", "", "")]));
        let email_channel = MockChannel::new(ChannelKind::Email, true);
        let orch = orchestrator(store.clone(), vec![email_channel]);

        let report = orch.run().await.unwrap();
        assert_eq!(report.processed_count, 0);
        assert_eq!(report.failed_count, 0);
        // The row is untouched and still pending.
        assert_eq!(store.rows()[0][5], "");
    }

    #[tokio::test]
    async fn terminal_records_are_not_reprocessed() {
        let store = Arc::new(MemoryStore::with_rows(
            HEADERS,
            &[&[
                "Acme", "Pat", "", "done@acme.example", "Textiles",
                "Email Verified", "Emailed", "", "", "",
            ]],
        ));
        let email_channel = MockChannel::new(ChannelKind::Email, true);
        let orch = orchestrator(store.clone(), vec![email_channel.clone()]);

        let report = orch.run().await.unwrap();
        assert_eq!(report.processed_count, 0);
        assert_eq!(email_channel.attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_size_caps_records_per_run() {
        let store = Arc::new(MemoryStore::with_rows(
            HEADERS,
            &[
                &row("Acme", "", "one@acme.example"),
                &row("Bolt", "", "two@bolt.example"),
                &row("Core", "", "three@core.example"),
            ],
        ));
        let email_channel = MockChannel::new(ChannelKind::Email, true);
        let orch = Orchestrator::new(
            store.clone(),
            Dispatcher::new(vec![email_channel]),
            EmailVerifier::new(None),
            PipelineConfig {
                delay_between_records: Duration::ZERO,
                batch_size: Some(2),
                ..Default::default()
            },
        );

        let report = orch.run().await.unwrap();
        assert_eq!(report.processed_count, 2);
        assert_eq!(store.fetch_pending().await.unwrap().len(), 1);
    }

    // ── Run guard ───────────────────────────────────────────────────

    /// Store whose fetch blocks until the test releases it.
    struct GatedStore {
        entered: tokio::sync::Semaphore,
        release: tokio::sync::Semaphore,
    }

    #[async_trait::async_trait]
    impl crate::store::RecordStore for GatedStore {
        async fn fetch_all(&self) -> std::result::Result<Vec<LeadRecord>, StoreError> {
            self.entered.add_permits(1);
            let permit = self.release.acquire().await.expect("gate closed");
            permit.forget();
            Ok(Vec::new())
        }

        async fn find_by_key(&self, _email: &str) -> std::result::Result<Option<LeadRecord>, StoreError> {
            unimplemented!("not used by this test")
        }

        async fn update_fields(
            &self,
            _email: &str,
            _fields: &[(&str, String)],
        ) -> std::result::Result<(), StoreError> {
            unimplemented!("not used by this test")
        }

        async fn append(&self, _record: &LeadRecord) -> std::result::Result<(), StoreError> {
            unimplemented!("not used by this test")
        }
    }

    #[tokio::test]
    async fn overlapping_run_is_rejected_then_guard_releases() {
        let store = Arc::new(GatedStore {
            entered: tokio::sync::Semaphore::new(0),
            release: tokio::sync::Semaphore::new(0),
        });
        let orch = Arc::new(Orchestrator::new(
            store.clone(),
            Dispatcher::new(vec![MockChannel::new(ChannelKind::Email, true)]),
            EmailVerifier::new(None),
            PipelineConfig {
                delay_between_records: Duration::ZERO,
                ..Default::default()
            },
        ));

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.run().await })
        };

        // Wait until the first run is inside its fetch.
        store.entered.acquire().await.unwrap().forget();

        let second = orch.run().await;
        assert!(matches!(
            second,
            Err(Error::Pipeline(PipelineError::AlreadyRunning))
        ));

        // Let the first run finish; the guard must release.
        store.release.add_permits(1);
        first.await.unwrap().unwrap();
        store.release.add_permits(1);
        orch.run().await.unwrap();
    }

    // ── Fetch failure aborts the run ────────────────────────────────

    struct FailingStore;

    #[async_trait::async_trait]
    impl crate::store::RecordStore for FailingStore {
        async fn fetch_all(&self) -> std::result::Result<Vec<LeadRecord>, StoreError> {
            Err(StoreError::Http("connection refused".into()))
        }

        async fn find_by_key(&self, _email: &str) -> std::result::Result<Option<LeadRecord>, StoreError> {
            unimplemented!("not used by this test")
        }

        async fn update_fields(
            &self,
            _email: &str,
            _fields: &[(&str, String)],
        ) -> std::result::Result<(), StoreError> {
            unimplemented!("not used by this test")
        }

        async fn append(&self, _record: &LeadRecord) -> std::result::Result<(), StoreError> {
            unimplemented!("not used by this test")
        }
    }

    #[tokio::test]
    async fn fetch_failure_aborts_the_whole_run() {
        let orch = Orchestrator::new(
            Arc::new(FailingStore),
            Dispatcher::new(vec![MockChannel::new(ChannelKind::Email, true)]),
            EmailVerifier::new(None),
            PipelineConfig::default(),
        );

        let result = orch.run().await;
        assert!(matches!(result, Err(Error::Store(StoreError::Http(_)))));
        // The guard released even though the run failed.
        assert!(matches!(
            orch.run().await,
            Err(Error::Store(StoreError::Http(_)))
        ));
    }
}
