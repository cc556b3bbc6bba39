//! End-to-end run pipeline: search, dedupe, presence filter, outreach.
//!
//! One orchestrator owns all collaborators for its lifetime and can run at
//! most one pipeline at a time. Everything downstream of the search stage is
//! per-business resilient: a failing channel, generator or recorder affects
//! exactly one business and is absorbed into its outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{error, info, warn};

use leadgen_core::record::BusinessRecord;
use leadgen_directory::{BatchExecutor, Directory, PresenceFilter, StopFlag};

use crate::bridge::Messenger;
use crate::error::OutreachError;
use crate::generate::MessageGenerator;
use crate::mail::Mailer;
use crate::outcome::{AttemptStatus, Channel, ChannelAttempt, ContactOutcome};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::recorder::LeadRecorder;
use crate::stats::{RunStats, RunStatsSnapshot};

const SKIP_NO_PHONE: &str = "No phone numbers";
const SKIP_NO_CHANNEL: &str = "No WhatsApp or Email available";

#[derive(Debug, Error)]
#[error("a run is already in progress")]
pub struct RunInProgress;

/// Pacing and sizing knobs for one run.
#[derive(Debug, Clone, Copy)]
pub struct OrchestratorOptions {
    pub max_concurrent_searches: usize,
    pub inter_batch_delay_ms: u64,
    pub outreach_batch_size: usize,
    pub outreach_batch_delay_ms: u64,
}

/// Final report handed back to the caller.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub duration_secs: u64,
    pub stats: RunStatsSnapshot,
}

pub struct Orchestrator<D, M, E, G, R> {
    directory: D,
    messenger: M,
    mailer: E,
    generator: G,
    recorder: R,
    presence: PresenceFilter,
    options: OrchestratorOptions,
    progress: ProgressSink,
    stats: Arc<RunStats>,
    stop: StopFlag,
    running: AtomicBool,
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<D, M, E, G, R> Orchestrator<D, M, E, G, R>
where
    D: Directory,
    M: Messenger,
    E: Mailer,
    G: MessageGenerator,
    R: LeadRecorder,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        directory: D,
        messenger: M,
        mailer: E,
        generator: G,
        recorder: R,
        presence: PresenceFilter,
        options: OrchestratorOptions,
        progress: ProgressSink,
    ) -> Self {
        Self {
            directory,
            messenger,
            mailer,
            generator,
            recorder,
            presence,
            options,
            progress,
            stats: Arc::new(RunStats::new()),
            stop: StopFlag::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Whether a run is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Point-in-time counters; valid during and after a run.
    #[must_use]
    pub fn stats(&self) -> RunStatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle for requesting a cooperative stop from another task.
    #[must_use]
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Runs the full pipeline over `queries`.
    ///
    /// Each stage that finds nothing ends the run early with an
    /// informational report rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`RunInProgress`] when called while another run is active.
    pub async fn run(&self, queries: &[String]) -> Result<RunReport, RunInProgress> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RunInProgress);
        }
        let _guard = RunningGuard(&self.running);
        let started = Instant::now();

        self.stats.set_total_searches(queries.len() as u64);
        self.progress.emit(ProgressEvent::SearchStarted {
            total_queries: queries.len(),
        });
        if queries.is_empty() {
            info!("no search queries, nothing to do");
            return Ok(self.finish(started));
        }

        let executor = BatchExecutor::new(self.options.inter_batch_delay_ms);
        let found = executor
            .execute(
                &self.directory,
                queries,
                self.options.max_concurrent_searches,
                &self.stop,
            )
            .await;
        self.stats.record_found(found.len() as u64);
        self.progress.emit(ProgressEvent::SearchCompleted {
            businesses_found: found.len(),
        });
        if found.is_empty() {
            info!("no businesses found across all queries");
            return Ok(self.finish(started));
        }

        let unique = leadgen_directory::dedupe(found);
        let targets = self.presence.filter_without_website(unique).await;
        self.stats.record_without_website(targets.len() as u64);
        self.progress.emit(ProgressEvent::FilterCompleted {
            without_website: targets.len(),
        });
        if targets.is_empty() {
            info!("every remaining business already has a live website");
            return Ok(self.finish(started));
        }

        self.contact_in_batches(&targets).await;
        Ok(self.finish(started))
    }

    /// Works through outreach targets in fixed-size concurrent batches with
    /// the same pacing discipline as the search stage.
    async fn contact_in_batches(&self, targets: &[BusinessRecord]) {
        let batch_size = self.options.outreach_batch_size.max(1);
        let total = targets.len();

        for (batch_index, batch) in targets.chunks(batch_size).enumerate() {
            if self.stop.is_stopped() {
                info!(
                    processed = batch_index * batch_size,
                    total,
                    "stop requested, not starting further outreach batches"
                );
                break;
            }
            if batch_index > 0 && self.options.outreach_batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.outreach_batch_delay_ms))
                    .await;
            }

            let contacts = batch.iter().enumerate().map(|(offset, business)| {
                let index = batch_index * batch_size + offset;
                async move {
                    let outcome = self.process_single_business(business).await;
                    self.progress.emit(ProgressEvent::BusinessProcessed {
                        name: business.name.clone(),
                        index: index + 1,
                        total,
                    });
                    outcome
                }
            });
            join_all(contacts).await;
        }
    }

    /// The per-business state machine: try the messaging channel, then
    /// email, record whatever happened.
    pub async fn process_single_business(&self, business: &BusinessRecord) -> ContactOutcome {
        let mut outcome = ContactOutcome::new();

        match business.primary_phone() {
            None => {
                outcome.skip_reason = Some(SKIP_NO_PHONE.to_owned());
                self.stats.incr_skipped();
                info!(business = %business.name, "skipped: no phone numbers");
            }
            Some(phone) => {
                let phone = phone.to_owned();
                outcome.whatsapp = self.attempt_whatsapp(business, &phone).await;
                outcome.email = self.attempt_email(business).await;

                if outcome.nothing_sent() {
                    let any_send_failed = outcome.whatsapp.status == AttemptStatus::Failed
                        || outcome.email.status == AttemptStatus::Failed;
                    if any_send_failed {
                        self.stats.incr_errors();
                    } else {
                        outcome.skip_reason = Some(SKIP_NO_CHANNEL.to_owned());
                        self.stats.incr_skipped();
                        info!(business = %business.name, "skipped: no channel available");
                    }
                }
            }
        }

        if let Err(err) = self.recorder.record(business, &outcome).await {
            self.stats.incr_errors();
            error!(business = %business.name, error = %err, "failed to record lead");
        }
        outcome
    }

    async fn attempt_whatsapp(&self, business: &BusinessRecord, phone: &str) -> ChannelAttempt {
        match self.messenger.is_reachable(phone).await {
            Ok(false) => ChannelAttempt::no_target(),
            Err(err) => {
                if !matches!(err, OutreachError::NotConfigured { .. }) {
                    warn!(business = %business.name, error = %err,
                          "whatsapp availability check failed");
                }
                ChannelAttempt::unavailable(Some(err.to_string()))
            }
            Ok(true) => {
                let message = self.generator.generate(business, Channel::Whatsapp).await;
                match self.messenger.send_text(phone, message.as_text()).await {
                    Ok(()) => {
                        self.stats.incr_sent(Channel::Whatsapp);
                        info!(business = %business.name, "whatsapp message sent");
                        ChannelAttempt::sent()
                    }
                    Err(err) => {
                        error!(business = %business.name, error = %err,
                               "whatsapp send failed");
                        ChannelAttempt::failed(err.to_string())
                    }
                }
            }
        }
    }

    async fn attempt_email(&self, business: &BusinessRecord) -> ChannelAttempt {
        // Email copy is generated whether or not there is an address to
        // send it to.
        let message = self.generator.generate(business, Channel::Email).await;
        let Some(to) = business.email.as_deref() else {
            return ChannelAttempt::no_target();
        };
        let (subject, body) = message.email_parts();
        match self.mailer.send(to, subject, body).await {
            Ok(()) => {
                self.stats.incr_sent(Channel::Email);
                info!(business = %business.name, "email sent");
                ChannelAttempt::sent()
            }
            Err(err @ OutreachError::NotConfigured { .. }) => {
                ChannelAttempt::unavailable(Some(err.to_string()))
            }
            Err(err) => {
                error!(business = %business.name, error = %err, "email send failed");
                ChannelAttempt::failed(err.to_string())
            }
        }
    }

    fn finish(&self, started: Instant) -> RunReport {
        let stats = self.stats.snapshot();
        self.progress.emit(ProgressEvent::RunCompleted { stats });
        let duration_secs = started.elapsed().as_secs();
        info!(
            duration_secs,
            found = stats.total_found,
            without_website = stats.without_website,
            whatsapp_sent = stats.whatsapp_sent,
            email_sent = stats.email_sent,
            skipped = stats.skipped,
            errors = stats.errors,
            whatsapp_success_rate = stats.whatsapp_success_rate,
            email_success_rate = stats.email_success_rate,
            "run complete"
        );
        RunReport {
            duration_secs,
            stats,
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
