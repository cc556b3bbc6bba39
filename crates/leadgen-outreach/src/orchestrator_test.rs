use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;

use leadgen_core::record::{BusinessRecord, BusinessStatus};
use leadgen_directory::{Directory, DirectoryError, PresenceFilter};

use crate::error::{OutreachError, RecorderError};
use crate::message::Message;
use crate::progress::{ProgressEvent, ProgressSink};

use super::*;

fn business(name: &str, phone: Option<&str>, email: Option<&str>) -> BusinessRecord {
    BusinessRecord {
        name: name.to_owned(),
        phone_numbers: phone.map(str::to_owned).into_iter().collect(),
        email: email.map(str::to_owned),
        website: None,
        address: "Nairobi, Kenya".to_owned(),
        categories: vec!["plumber".to_owned()],
        rating: None,
        rating_count: 0,
        external_id: format!("place-{name}"),
        status: BusinessStatus::Operational,
        has_live_website: false,
        source_query: "plumber in Kisumu".to_owned(),
        discovered_at: Utc::now(),
    }
}

#[derive(Default)]
struct FakeDirectory {
    results: HashMap<String, Vec<BusinessRecord>>,
    delay_ms: u64,
    calls: AtomicUsize,
}

impl FakeDirectory {
    fn returning(results: HashMap<String, Vec<BusinessRecord>>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn search(&self, query: &str) -> Result<Vec<BusinessRecord>, DirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeMessenger {
    reachable: HashSet<String>,
    check_fails: bool,
    send_fails: bool,
    send_fails_for: HashSet<String>,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeMessenger {
    fn reaching(phones: &[&str]) -> Self {
        Self {
            reachable: phones.iter().map(|p| (*p).to_owned()).collect(),
            ..Self::default()
        }
    }

    fn reaching_but_failing_for(phones: &[&str], failing: &[&str]) -> Self {
        Self {
            send_fails_for: failing.iter().map(|p| (*p).to_owned()).collect(),
            ..Self::reaching(phones)
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent log").clone()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn is_reachable(&self, phone: &str) -> Result<bool, OutreachError> {
        if self.check_fails {
            return Err(OutreachError::UnexpectedStatus {
                status: 500,
                endpoint: "/check-whatsapp".to_owned(),
            });
        }
        Ok(self.reachable.contains(phone))
    }

    async fn send_text(&self, phone: &str, message: &str) -> Result<(), OutreachError> {
        if self.send_fails || self.send_fails_for.contains(phone) {
            return Err(OutreachError::UnexpectedStatus {
                status: 500,
                endpoint: "/send-message".to_owned(),
            });
        }
        self.sent
            .lock()
            .expect("sent log")
            .push((phone.to_owned(), message.to_owned()));
        Ok(())
    }
}

struct FakeMailer {
    configured: bool,
    fails: bool,
    sent: Mutex<Vec<(String, String)>>,
}

impl FakeMailer {
    fn working() -> Self {
        Self {
            configured: true,
            fails: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn unconfigured() -> Self {
        Self {
            configured: false,
            fails: false,
            sent: Mutex::new(Vec::new()),
        }
    }

    fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("sent log").clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), OutreachError> {
        if !self.configured {
            return Err(OutreachError::NotConfigured { channel: "email" });
        }
        if self.fails {
            return Err(OutreachError::UnexpectedStatus {
                status: 500,
                endpoint: "/v3/mail/send".to_owned(),
            });
        }
        self.sent
            .lock()
            .expect("sent log")
            .push((to.to_owned(), subject.to_owned()));
        Ok(())
    }
}

struct FakeGenerator;

#[async_trait]
impl MessageGenerator for FakeGenerator {
    async fn generate(&self, business: &BusinessRecord, channel: Channel) -> Message {
        match channel {
            Channel::Whatsapp => Message::Text(format!("Hello {}", business.name)),
            Channel::Email => Message::Email {
                subject: format!("A website for {}", business.name),
                body: format!("Hello {}", business.name),
            },
        }
    }
}

#[derive(Default)]
struct FakeRecorder {
    fails: bool,
    entries: Mutex<Vec<(String, ContactOutcome)>>,
}

impl FakeRecorder {
    fn failing() -> Self {
        Self {
            fails: true,
            entries: Mutex::new(Vec::new()),
        }
    }

    fn entries(&self) -> Vec<(String, ContactOutcome)> {
        self.entries.lock().expect("entries").clone()
    }
}

#[async_trait]
impl LeadRecorder for FakeRecorder {
    async fn record(
        &self,
        business: &BusinessRecord,
        outcome: &ContactOutcome,
    ) -> Result<(), RecorderError> {
        if self.fails {
            return Err(RecorderError::Io {
                path: "leads.jsonl".to_owned(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.entries
            .lock()
            .expect("entries")
            .push((business.name.clone(), outcome.clone()));
        Ok(())
    }
}

fn options() -> OrchestratorOptions {
    OrchestratorOptions {
        max_concurrent_searches: 5,
        inter_batch_delay_ms: 0,
        outreach_batch_size: 5,
        outreach_batch_delay_ms: 0,
    }
}

fn presence() -> PresenceFilter {
    PresenceFilter::new(1, "leadgen-test").expect("presence filter")
}

type TestOrchestrator =
    Orchestrator<FakeDirectory, FakeMessenger, FakeMailer, FakeGenerator, FakeRecorder>;

fn orchestrator(
    directory: FakeDirectory,
    messenger: FakeMessenger,
    mailer: FakeMailer,
    recorder: FakeRecorder,
    options: OrchestratorOptions,
    progress: ProgressSink,
) -> TestOrchestrator {
    Orchestrator::new(
        directory,
        messenger,
        mailer,
        FakeGenerator,
        recorder,
        presence(),
        options,
        progress,
    )
}

#[tokio::test]
async fn business_without_phone_is_skipped_and_recorded() {
    let orch = orchestrator(
        FakeDirectory::default(),
        FakeMessenger::default(),
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    let outcome = orch
        .process_single_business(&business("No Phone Ltd", None, Some("x@example.com")))
        .await;

    assert_eq!(outcome.skip_reason.as_deref(), Some("No phone numbers"));
    assert_eq!(outcome.whatsapp.status, AttemptStatus::NotAttempted);
    assert_eq!(outcome.email.status, AttemptStatus::NotAttempted);
    let stats = orch.stats();
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.email_sent, 0);
}

#[tokio::test]
async fn reachable_number_gets_message_and_missing_email_is_no_target() {
    let messenger = FakeMessenger::reaching(&["+254712345678"]);
    let orch = orchestrator(
        FakeDirectory::default(),
        messenger,
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    let outcome = orch
        .process_single_business(&business("Otieno Plumbing", Some("+254712345678"), None))
        .await;

    assert_eq!(outcome.whatsapp.status, AttemptStatus::Sent);
    assert_eq!(outcome.email.status, AttemptStatus::NoTarget);
    assert!(outcome.skip_reason.is_none());
    assert_eq!(orch.stats().whatsapp_sent, 1);
}

#[tokio::test]
async fn no_channel_available_sets_final_skip_reason() {
    let orch = orchestrator(
        FakeDirectory::default(),
        FakeMessenger::default(),
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    let outcome = orch
        .process_single_business(&business("Unreachable Ltd", Some("+254712345678"), None))
        .await;

    assert_eq!(outcome.whatsapp.status, AttemptStatus::NoTarget);
    assert_eq!(outcome.email.status, AttemptStatus::NoTarget);
    assert_eq!(
        outcome.skip_reason.as_deref(),
        Some("No WhatsApp or Email available")
    );
    assert_eq!(orch.stats().skipped, 1);
}

#[tokio::test]
async fn check_failure_leaves_email_channel_working() {
    let messenger = FakeMessenger {
        check_fails: true,
        ..FakeMessenger::default()
    };
    let orch = orchestrator(
        FakeDirectory::default(),
        messenger,
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    let outcome = orch
        .process_single_business(&business(
            "Wanjiku Salon",
            Some("+254712345678"),
            Some("salon@example.com"),
        ))
        .await;

    assert_eq!(outcome.whatsapp.status, AttemptStatus::ChannelUnavailable);
    assert!(outcome.whatsapp.error.is_some());
    assert_eq!(outcome.email.status, AttemptStatus::Sent);
    assert!(outcome.skip_reason.is_none());
    assert_eq!(orch.stats().email_sent, 1);
    assert_eq!(orch.stats().errors, 0);
}

#[tokio::test]
async fn unconfigured_mailer_is_channel_unavailable_not_an_error() {
    let orch = orchestrator(
        FakeDirectory::default(),
        FakeMessenger::default(),
        FakeMailer::unconfigured(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    let outcome = orch
        .process_single_business(&business(
            "Mail Only Ltd",
            Some("+254712345678"),
            Some("owner@example.com"),
        ))
        .await;

    assert_eq!(outcome.email.status, AttemptStatus::ChannelUnavailable);
    assert_eq!(
        outcome.skip_reason.as_deref(),
        Some("No WhatsApp or Email available")
    );
    assert_eq!(orch.stats().errors, 0);
}

#[tokio::test]
async fn failed_send_counts_as_error_not_skip() {
    let messenger = FakeMessenger {
        reachable: HashSet::from(["+254712345678".to_owned()]),
        send_fails: true,
        ..FakeMessenger::default()
    };
    let orch = orchestrator(
        FakeDirectory::default(),
        messenger,
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    let outcome = orch
        .process_single_business(&business("Flaky Ltd", Some("+254712345678"), None))
        .await;

    assert_eq!(outcome.whatsapp.status, AttemptStatus::Failed);
    assert!(outcome.skip_reason.is_none());
    let stats = orch.stats();
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.skipped, 0);
}

#[tokio::test]
async fn send_failure_for_one_business_leaves_the_rest_of_the_batch_intact() {
    // Both businesses land in the same outreach batch; only the first one's
    // number is broken on the send side.
    let directory = FakeDirectory::returning(HashMap::from([(
        "plumber in Kisumu".to_owned(),
        vec![
            business("Flaky Ltd", Some("+254712345678"), None),
            business("Otieno Plumbing", Some("+254701234567"), None),
        ],
    )]));
    let messenger = FakeMessenger::reaching_but_failing_for(
        &["+254712345678", "+254701234567"],
        &["+254712345678"],
    );
    let orch = orchestrator(
        directory,
        messenger,
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    let report = orch
        .run(&["plumber in Kisumu".to_owned()])
        .await
        .expect("run must start");

    assert_eq!(report.stats.whatsapp_sent, 1);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.skipped, 0);

    let sent = orch.messenger.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "+254701234567");

    let entries = orch.recorder.entries();
    assert_eq!(entries.len(), 2);
    let outcome_for = |name: &str| {
        entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
            .expect("outcome recorded")
    };
    assert_eq!(
        outcome_for("Flaky Ltd").attempt(Channel::Whatsapp).status,
        AttemptStatus::Failed
    );
    assert_eq!(
        outcome_for("Otieno Plumbing")
            .attempt(Channel::Whatsapp)
            .status,
        AttemptStatus::Sent
    );
}

#[tokio::test]
async fn recorder_failure_increments_errors_but_outcome_survives() {
    let messenger = FakeMessenger::reaching(&["+254712345678"]);
    let orch = orchestrator(
        FakeDirectory::default(),
        messenger,
        FakeMailer::working(),
        FakeRecorder::failing(),
        options(),
        ProgressSink::none(),
    );

    let outcome = orch
        .process_single_business(&business("Otieno Plumbing", Some("+254712345678"), None))
        .await;

    assert_eq!(outcome.whatsapp.status, AttemptStatus::Sent);
    let stats = orch.stats();
    assert_eq!(stats.whatsapp_sent, 1);
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn full_run_dedupes_and_aggregates_stats() {
    let duplicate = business("Otieno Plumbing", Some("+254712345678"), None);
    let directory = FakeDirectory::returning(HashMap::from([
        (
            "plumber in Kisumu".to_owned(),
            vec![duplicate.clone(), duplicate],
        ),
        (
            "salon in Thika".to_owned(),
            vec![business(
                "Wanjiku Salon",
                Some("+254701234567"),
                Some("salon@example.com"),
            )],
        ),
    ]));
    let messenger = FakeMessenger::reaching(&["+254712345678"]);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let orch = orchestrator(
        directory,
        messenger,
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::new(tx),
    );

    let queries = vec!["plumber in Kisumu".to_owned(), "salon in Thika".to_owned()];
    let report = orch.run(&queries).await.expect("run must start");

    let stats = report.stats;
    assert_eq!(stats.total_searches, 2);
    assert_eq!(stats.total_found, 3);
    assert_eq!(stats.without_website, 2);
    assert_eq!(stats.whatsapp_sent, 1);
    assert_eq!(stats.email_sent, 1);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.errors, 0);
    assert!((stats.whatsapp_success_rate - 50.0).abs() < f64::EPSILON);
    assert!(!orch.is_running());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(
        events.first(),
        Some(ProgressEvent::SearchStarted { total_queries: 2 })
    ));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::SearchCompleted { businesses_found: 3 })));
    assert!(events
        .iter()
        .any(|e| matches!(e, ProgressEvent::FilterCompleted { without_website: 2 })));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, ProgressEvent::BusinessProcessed { .. }))
            .count(),
        2
    );
    assert!(matches!(
        events.last(),
        Some(ProgressEvent::RunCompleted { .. })
    ));
}

#[tokio::test]
async fn messages_and_mail_reach_the_right_targets() {
    let directory = FakeDirectory::returning(HashMap::from([(
        "salon in Thika".to_owned(),
        vec![business(
            "Wanjiku Salon",
            Some("+254701234567"),
            Some("salon@example.com"),
        )],
    )]));
    let messenger = FakeMessenger::reaching(&["+254701234567"]);
    let mailer = FakeMailer::working();
    let recorder = FakeRecorder::default();
    let orch = orchestrator(
        directory,
        messenger,
        mailer,
        recorder,
        options(),
        ProgressSink::none(),
    );

    orch.run(&["salon in Thika".to_owned()])
        .await
        .expect("run must start");

    let messenger_sent = orch.messenger.sent();
    assert_eq!(messenger_sent.len(), 1);
    assert_eq!(messenger_sent[0].0, "+254701234567");
    assert!(messenger_sent[0].1.contains("Wanjiku Salon"));

    let mail_sent = orch.mailer.sent();
    assert_eq!(mail_sent.len(), 1);
    assert_eq!(mail_sent[0].0, "salon@example.com");
    assert!(mail_sent[0].1.contains("Wanjiku Salon"));

    let entries = orch.recorder.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "Wanjiku Salon");
    assert_eq!(entries[0].1.whatsapp.status, AttemptStatus::Sent);
    assert_eq!(entries[0].1.email.status, AttemptStatus::Sent);
}

#[tokio::test]
async fn stopped_run_issues_no_lookups() {
    let directory = FakeDirectory::returning(HashMap::from([(
        "plumber in Kisumu".to_owned(),
        vec![business("Otieno Plumbing", Some("+254712345678"), None)],
    )]));
    let orch = orchestrator(
        directory,
        FakeMessenger::default(),
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    );

    orch.stop_flag().stop();
    let report = orch
        .run(&["plumber in Kisumu".to_owned()])
        .await
        .expect("run must start");

    assert_eq!(report.stats.total_found, 0);
    assert_eq!(orch.directory.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_run_is_rejected() {
    let directory = FakeDirectory {
        delay_ms: 60_000,
        ..FakeDirectory::default()
    };
    let orch = Arc::new(orchestrator(
        directory,
        FakeMessenger::default(),
        FakeMailer::working(),
        FakeRecorder::default(),
        options(),
        ProgressSink::none(),
    ));

    let first = tokio::spawn({
        let orch = Arc::clone(&orch);
        async move { orch.run(&["plumber in Kisumu".to_owned()]).await }
    });
    tokio::task::yield_now().await;
    assert!(orch.is_running());

    let second = orch.run(&["salon in Thika".to_owned()]).await;
    assert!(second.is_err());

    first
        .await
        .expect("task must finish")
        .expect("first run must complete");
    assert!(!orch.is_running());
}

#[tokio::test(start_paused = true)]
async fn outreach_batches_are_paced() {
    // 7 targets at batch size 5 means one inter-batch delay and nothing else
    // that sleeps.
    let targets: Vec<BusinessRecord> = (0..7)
        .map(|i| business(&format!("Business {i}"), Some("+254712345678"), None))
        .collect();
    let directory =
        FakeDirectory::returning(HashMap::from([("plumber in Kisumu".to_owned(), targets)]));
    let orch = orchestrator(
        directory,
        FakeMessenger::default(),
        FakeMailer::working(),
        FakeRecorder::default(),
        OrchestratorOptions {
            outreach_batch_delay_ms: 2_000,
            ..options()
        },
        ProgressSink::none(),
    );

    let start = Instant::now();
    orch.run(&["plumber in Kisumu".to_owned()])
        .await
        .expect("run must start");

    assert_eq!(start.elapsed(), Duration::from_millis(2_000));
    assert_eq!(orch.stats().skipped, 7);
}
