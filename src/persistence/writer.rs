// Copyright 2025 Cowboy AI, LLC.

//! Fire-and-forget persistence
//!
//! The [`MatchWriter`] runs as a background task. Snapshots handed to it are
//! debounced so a burst of deliveries becomes one write of the latest state,
//! and failed writes are retried with backoff. Nothing here ever blocks or
//! fails a scoring operation: when a write is finally given up, a
//! [`PersistenceWarning`] is published for the application to show.
//!
//! ```mermaid
//! graph LR
//!     S[submit snapshot] --> Q[queue]
//!     Q -->|debounce, latest wins| W[update]
//!     W -->|error| R[backoff + retry]
//!     R --> W
//!     R -->|retries exhausted| P[PersistenceWarning]
//! ```

use super::repository::{MatchRepository, RepositoryError};
use crate::cricket_match::Match;
use crate::entity::{AggregateRoot, MatchId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Backoff schedule for failed writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries
    pub max_retries: u32,

    /// Initial backoff in milliseconds
    pub initial_backoff_ms: u64,

    /// Backoff multiplier
    pub backoff_multiplier: f32,

    /// Maximum backoff in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 10000,
        }
    }
}

impl RetryPolicy {
    /// Same delay before every retry
    pub fn fixed(delay: Duration, retries: u32) -> Self {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            max_retries: retries,
            initial_backoff_ms: ms,
            backoff_multiplier: 1.0,
            max_backoff_ms: ms,
        }
    }

    /// Delay before the given retry, counting from zero
    ///
    /// ```rust
    /// use cim_domain_cricket::persistence::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(0), Duration::from_millis(100));
    /// assert_eq!(policy.backoff(2), Duration::from_millis(400));
    /// assert_eq!(policy.backoff(20), Duration::from_millis(10000));
    /// ```
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let factor = f64::from(self.backoff_multiplier).powi(exponent);
        let ms = (self.initial_backoff_ms as f64 * factor).min(self.max_backoff_ms as f64);
        Duration::from_millis(ms as u64)
    }
}

/// Writer settings
#[derive(Debug, Clone, PartialEq)]
pub struct WriterConfig {
    /// Quiet period before a snapshot is written
    pub debounce: Duration,
    /// Retry schedule for failed writes
    pub retry: RetryPolicy,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(250),
            retry: RetryPolicy::default(),
        }
    }
}

/// A snapshot that could not be stored
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("match {match_id} version {version} not saved after {attempts} attempts: {error}")]
pub struct PersistenceWarning {
    /// Match whose snapshot was dropped
    pub match_id: MatchId,
    /// Version of the dropped snapshot
    pub version: u64,
    /// Writes attempted
    pub attempts: u32,
    /// Last repository error
    pub error: String,
    /// When the writer gave up
    pub at: DateTime<Utc>,
}

/// Background writer for match snapshots
pub struct MatchWriter {
    snapshots: mpsc::UnboundedSender<Match>,
    warnings: watch::Receiver<Option<PersistenceWarning>>,
    task: JoinHandle<()>,
}

impl MatchWriter {
    /// Start the writer task on the current tokio runtime
    pub fn spawn<R>(repository: Arc<R>, config: WriterConfig) -> Self
    where
        R: MatchRepository + ?Sized + 'static,
    {
        let (snapshots, queue) = mpsc::unbounded_channel();
        let (warn_tx, warnings) = watch::channel(None);
        let task = tokio::spawn(run(repository, config, queue, warn_tx));
        Self {
            snapshots,
            warnings,
            task,
        }
    }

    /// Queue the latest state of a match; never waits
    pub fn submit(&self, game: &Match) {
        if self.snapshots.send(game.clone()).is_err() {
            warn!(match_id = %game.id(), "match writer stopped; snapshot dropped");
        }
    }

    /// Latest persistence warning, updated whenever a write is given up
    pub fn warnings(&self) -> watch::Receiver<Option<PersistenceWarning>> {
        self.warnings.clone()
    }

    /// Write whatever is queued, then stop
    pub async fn shutdown(self) {
        drop(self.snapshots);
        if let Err(err) = self.task.await {
            warn!(error = %err, "match writer task failed");
        }
    }
}

async fn run<R>(
    repository: Arc<R>,
    config: WriterConfig,
    mut queue: mpsc::UnboundedReceiver<Match>,
    warnings: watch::Sender<Option<PersistenceWarning>>,
) where
    R: MatchRepository + ?Sized,
{
    while let Some(mut latest) = queue.recv().await {
        tokio::time::sleep(config.debounce).await;
        let mut skipped = 0u32;
        while let Ok(newer) = queue.try_recv() {
            latest = newer;
            skipped += 1;
        }
        if skipped > 0 {
            debug!(match_id = %latest.id(), skipped, "snapshots coalesced");
        }

        let written = write_with_retry(repository.as_ref(), &latest, &config.retry).await;
        if let Err((attempts, err)) = written {
            warn!(
                match_id = %latest.id(),
                version = latest.version(),
                attempts,
                error = %err,
                "giving up on snapshot"
            );
            warnings.send_replace(Some(PersistenceWarning {
                match_id: latest.id(),
                version: latest.version(),
                attempts,
                error: err.to_string(),
                at: Utc::now(),
            }));
        }
    }
    debug!("match writer drained");
}

async fn write_with_retry<R>(
    repository: &R,
    game: &Match,
    policy: &RetryPolicy,
) -> Result<(), (u32, RepositoryError)>
where
    R: MatchRepository + ?Sized,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match repository.update(game.id(), game).await {
            Ok(()) => {
                debug!(match_id = %game.id(), version = game.version(), attempts, "snapshot saved");
                return Ok(());
            }
            // A newer snapshot is already stored.
            Err(err @ RepositoryError::VersionConflict { .. }) => return Err((attempts, err)),
            Err(err) if attempts <= policy.max_retries => {
                let delay = policy.backoff(attempts - 1);
                warn!(
                    match_id = %game.id(),
                    attempts,
                    ?delay,
                    error = %err,
                    "snapshot write failed; retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err((attempts, err)),
        }
    }
}
