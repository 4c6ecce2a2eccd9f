//! DispatchEngine - Background service for reliable event delivery.
//!
//! This service implements the second half of the Transactional Outbox Pattern:
//! 1. Business code appends entries to the event log (same transaction as domain changes)
//! 2. **DispatchEngine claims, publishes, and marks entries** ← This module
//!
//! ## Tick
//!
//! 1. Claim up to `batch_size` entries in id order
//! 2. Group by event type (first-appearance order, entry order preserved)
//! 3. Publish each group under `publish_timeout`
//! 4. Mark accepted entries SENT, rejected ones FAILED with backoff
//!
//! A tick started while another is still running on the same engine is
//! skipped without claiming anything. A group whose claim has less than
//! `publish_timeout` left when its turn comes is released unpublished and
//! picked up by a later tick.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 1s | Time between ticks |
//! | `batch_size` | 100 | Max entries claimed per tick |
//! | `publish_timeout` | 10s | Bound on one publish call |
//! | `lease` | 60s | How long a claim survives without being marked |
//! | `max_attempts` | none | FAILED entries stop being retried at this count |
//! | `publish_concurrency` | 4 | Groups published in parallel |
//!
//! ## Graceful Shutdown
//!
//! The service listens for a shutdown signal, completes the current tick,
//! and releases any claims it still holds before stopping.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::event_log::{BackoffPolicy, EventLogEntry};
use crate::domain::foundation::{DomainError, EntryId, LockOwner, Timestamp};
use crate::ports::{
    ClaimRequest, FailedDelivery, LogStore, PublishError, PublishOutcome, PublisherClient,
};

/// Configuration for the DispatchEngine service.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Claim owner identity of this engine.
    pub owner: LockOwner,

    /// How often to tick.
    pub poll_interval: Duration,

    /// Maximum entries claimed per tick.
    pub batch_size: u32,

    /// Bound on a single publish call.
    pub publish_timeout: Duration,

    /// Claim lease.
    pub lease: Duration,

    /// Attempt budget for FAILED entries.
    pub max_attempts: Option<u32>,

    pub backoff: BackoffPolicy,

    /// Event type groups published in parallel.
    pub publish_concurrency: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            owner: LockOwner::random(),
            poll_interval: Duration::from_secs(1),
            batch_size: 100,
            publish_timeout: Duration::from_secs(10),
            lease: Duration::from_secs(60),
            max_attempts: None,
            backoff: BackoffPolicy::default(),
            publish_concurrency: 4,
        }
    }
}

impl DispatchConfig {
    pub fn with_owner(mut self, owner: LockOwner) -> Self {
        self.owner = owner;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_publish_concurrency(mut self, concurrency: usize) -> Self {
        self.publish_concurrency = concurrency.max(1);
        self
    }
}

/// Counts for one completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub claimed: usize,
    pub sent: u64,
    pub failed: u64,
    /// Entries handed back because their claim ran short before publishing.
    pub released: u64,
    pub groups: usize,
}

/// What a call to `tick` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(TickReport),
    /// Another tick was in flight; nothing was claimed.
    Skipped,
}

impl TickOutcome {
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Completed(report) => Some(report),
            TickOutcome::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TickOutcome::Skipped)
    }
}

#[derive(Debug, Default)]
struct GroupReport {
    sent: u64,
    failed: u64,
    released: u64,
}

/// Clears the in-flight flag when the tick ends, including on early return.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Background service that publishes entries from the event log.
pub struct DispatchEngine {
    store: Arc<dyn LogStore>,
    publisher: Arc<dyn PublisherClient>,
    config: DispatchConfig,
    in_flight: AtomicBool,
}

impl DispatchEngine {
    /// Create a new DispatchEngine with default configuration.
    pub fn new(store: Arc<dyn LogStore>, publisher: Arc<dyn PublisherClient>) -> Self {
        Self::with_config(store, publisher, DispatchConfig::default())
    }

    /// Create a new DispatchEngine with custom configuration.
    pub fn with_config(
        store: Arc<dyn LogStore>,
        publisher: Arc<dyn PublisherClient>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Run the dispatch loop until shutdown signal is received.
    ///
    /// Tick failures are logged and never end the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let owner = &self.config.owner;
        info!(owner = %owner, interval_ms = self.config.poll_interval.as_millis() as u64, "Dispatch engine started");

        // Claims left by a previous run under the same identity.
        self.release_claims().await;

        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(TickOutcome::Completed(report)) if report.claimed > 0 => {
                            debug!(
                                claimed = report.claimed,
                                sent = report.sent,
                                failed = report.failed,
                                released = report.released,
                                groups = report.groups,
                                "Dispatch tick completed"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!(owner = %owner, error = %e, "Dispatch tick failed");
                        }
                    }
                }
            }
        }

        self.release_claims().await;
        info!(owner = %owner, "Dispatch engine stopped");
    }

    /// Run exactly one dispatch pass.
    ///
    /// Returns `Skipped` if a pass is already running on this engine.
    pub async fn tick(&self) -> Result<TickOutcome, DomainError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(owner = %self.config.owner, "Tick skipped, previous tick still running");
            return Ok(TickOutcome::Skipped);
        }
        let _in_flight = InFlight(&self.in_flight);

        let report = self.dispatch_batch().await?;
        Ok(TickOutcome::Completed(report))
    }

    async fn dispatch_batch(&self) -> Result<TickReport, DomainError> {
        let request = ClaimRequest::new(
            self.config.owner.clone(),
            self.config.batch_size,
            self.config.lease,
        )
        .with_max_attempts(self.config.max_attempts);

        let claimed = self.store.claim_batch(&request).await?;
        if claimed.is_empty() {
            return Ok(TickReport::default());
        }

        let claimed_count = claimed.len();
        let groups = group_by_event_type(claimed);
        let group_count = groups.len();

        let reports: Vec<GroupReport> = stream::iter(groups)
            .map(|(event_type, entries)| self.publish_group(event_type, entries))
            .buffer_unordered(self.config.publish_concurrency.max(1))
            .collect()
            .await;

        Ok(reports.into_iter().fold(
            TickReport {
                claimed: claimed_count,
                groups: group_count,
                ..TickReport::default()
            },
            |mut acc, group| {
                acc.sent += group.sent;
                acc.failed += group.failed;
                acc.released += group.released;
                acc
            },
        ))
    }

    async fn publish_group(&self, event_type: String, entries: Vec<EventLogEntry>) -> GroupReport {
        if !self.lease_covers_publish(&entries) {
            return self.release_group(&event_type, &entries).await;
        }

        let attempt = time::timeout(
            self.config.publish_timeout,
            self.publisher.publish(&event_type, &entries),
        )
        .await;

        let (sent, failed): (Vec<&EventLogEntry>, Vec<(&EventLogEntry, String)>) = match attempt {
            Ok(Ok(PublishOutcome::Published)) => (entries.iter().collect(), Vec::new()),
            Ok(Ok(outcome)) => {
                let (rejected, accepted): (Vec<_>, Vec<_>) =
                    entries.iter().partition(|e| outcome.rejected(&e.eid));
                warn!(
                    event_type = %event_type,
                    rejected = rejected.len(),
                    accepted = accepted.len(),
                    "Broker partially rejected batch"
                );
                let reason = "rejected by broker".to_string();
                (accepted, rejected.into_iter().map(|e| (e, reason.clone())).collect())
            }
            Ok(Err(err)) => {
                log_publish_error(&event_type, entries.len(), &err);
                let reason = err.to_string();
                (Vec::new(), entries.iter().map(|e| (e, reason.clone())).collect())
            }
            Err(_) => {
                let reason = format!(
                    "publish timed out after {}ms",
                    self.config.publish_timeout.as_millis()
                );
                warn!(event_type = %event_type, count = entries.len(), "{}", reason);
                (Vec::new(), entries.iter().map(|e| (e, reason.clone())).collect())
            }
        };

        let mut report = GroupReport::default();
        let owner = &self.config.owner;

        if !sent.is_empty() {
            let ids: Vec<EntryId> = sent.iter().map(|e| e.id).collect();
            match self.store.mark_sent(owner, &ids).await {
                Ok(n) => {
                    if n < ids.len() as u64 {
                        warn!(event_type = %event_type, expected = ids.len(), marked = n, "Lost claim on some sent entries");
                    }
                    report.sent = n;
                }
                Err(e) => {
                    error!(event_type = %event_type, error = %e, "Failed to mark entries sent");
                }
            }
        }

        if !failed.is_empty() {
            let failures: Vec<FailedDelivery> = failed
                .into_iter()
                .map(|(entry, reason)| {
                    let retry_after = self.config.backoff.delay(entry.attempts.saturating_add(1));
                    FailedDelivery::new(entry.id, retry_after, reason)
                })
                .collect();
            match self.store.mark_failed(owner, &failures).await {
                Ok(n) => report.failed = n,
                Err(e) => {
                    error!(event_type = %event_type, error = %e, "Failed to mark entries failed");
                }
            }
        }

        report
    }

    /// True if every claim in the group outlives a full publish timeout.
    fn lease_covers_publish(&self, entries: &[EventLogEntry]) -> bool {
        let now = Timestamp::now();
        entries.iter().all(|entry| {
            entry
                .locked_until
                .and_then(|until| until.duration_since(&now).to_std().ok())
                .is_some_and(|left| left >= self.config.publish_timeout)
        })
    }

    async fn release_group(&self, event_type: &str, entries: &[EventLogEntry]) -> GroupReport {
        let ids: Vec<EntryId> = entries.iter().map(|e| e.id).collect();
        match self.store.release_entries(&self.config.owner, &ids).await {
            Ok(released) => {
                warn!(event_type = %event_type, released, "Claim too short to publish, released group");
                GroupReport {
                    released,
                    ..GroupReport::default()
                }
            }
            Err(e) => {
                error!(event_type = %event_type, error = %e, "Failed to release group");
                GroupReport::default()
            }
        }
    }

    async fn release_claims(&self) {
        match self.store.release_claims(&self.config.owner).await {
            Ok(0) => {}
            Ok(n) => info!(owner = %self.config.owner, released = n, "Released held claims"),
            Err(e) => warn!(owner = %self.config.owner, error = %e, "Failed to release claims"),
        }
    }
}

fn log_publish_error(event_type: &str, count: usize, err: &PublishError) {
    if err.is_transient() {
        warn!(event_type = %event_type, count, error = %err, "Transient publish failure");
    } else {
        error!(event_type = %event_type, count, error = %err, "Permanent publish failure");
    }
}

/// Groups entries by event type, keeping first-appearance order of groups
/// and id order inside each group.
fn group_by_event_type(entries: Vec<EventLogEntry>) -> Vec<(String, Vec<EventLogEntry>)> {
    let mut groups: Vec<(String, Vec<EventLogEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(t, _)| *t == entry.event_type) {
            Some((_, group)) => group.push(entry),
            None => groups.push((entry.event_type.clone(), vec![entry])),
        }
    }
    groups
}
