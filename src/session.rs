// Copyright 2025 Cowboy AI, LLC.

//! Application façade for live scoring
//!
//! A [`ScoringSession`] is the single writer for one match. It forwards each
//! operation to the [`Match`] aggregate and, when the operation is accepted,
//! publishes the queued events and hands the new snapshot to the
//! [`MatchWriter`]. Rejected operations publish and persist nothing.

use crate::cricket_match::{Match, Toss};
use crate::delivery::Delivery;
use crate::entity::AggregateRoot;
use crate::errors::ScoringResult;
use crate::events::EventPublisher;
use crate::innings::{DeliveryOutcome, Openers};
use crate::persistence::{
    MatchCode, MatchRepository, MatchWriter, PersistenceWarning, RepositoryError,
};
use crate::result::MatchResult;
use crate::roster::PlayerRef;
use tokio::sync::watch;
use tracing::{info, warn};

/// One match being scored
pub struct ScoringSession<P: EventPublisher> {
    game: Match,
    publisher: P,
    writer: MatchWriter,
}

impl<P: EventPublisher> ScoringSession<P> {
    /// Take ownership of a match
    ///
    /// Events already queued on the match, such as its creation, are
    /// published right away.
    pub fn new(game: Match, publisher: P, writer: MatchWriter) -> Self {
        let mut session = Self {
            game,
            publisher,
            writer,
        };
        session.publish();
        session
    }

    /// Store the match for the first time and keep the issued code
    pub async fn register<R>(&mut self, repository: &R) -> Result<MatchCode, RepositoryError>
    where
        R: MatchRepository + ?Sized,
    {
        let code = repository.create(&self.game).await.map_err(|err| {
            warn!(match_id = %self.game.id(), error = %err, "match could not be registered");
            err
        })?;
        self.game.assign_code(code.clone());
        info!(match_id = %self.game.id(), %code, "match registered");
        Ok(code)
    }

    /// The match as it stands
    pub fn game(&self) -> &Match {
        &self.game
    }

    /// Advisory warnings from the writer
    pub fn persistence_warnings(&self) -> watch::Receiver<Option<PersistenceWarning>> {
        self.writer.warnings()
    }

    /// Record the toss and open the first innings
    pub fn start(&mut self, toss: Toss, openers: Openers) -> ScoringResult<()> {
        let result = self.game.start(toss, openers);
        self.commit(result)
    }

    /// Apply one delivery
    pub fn record_delivery(&mut self, delivery: Delivery) -> ScoringResult<DeliveryOutcome> {
        let result = self.game.record_delivery(delivery);
        self.commit(result)
    }

    /// Hand the ball to a new bowler
    pub fn change_bowler(&mut self, bowler: PlayerRef) -> ScoringResult<()> {
        let result = self.game.change_bowler(bowler);
        self.commit(result)
    }

    /// Replace a batsman at the crease
    pub fn change_batsman(&mut self, out: PlayerRef, new: PlayerRef) -> ScoringResult<()> {
        let result = self.game.change_batsman(out, new);
        self.commit(result)
    }

    /// Let the last batsman continue alone
    pub fn switch_to_single_batting(&mut self, remaining: PlayerRef) -> ScoringResult<()> {
        let result = self.game.switch_to_single_batting(remaining);
        self.commit(result)
    }

    /// Close the innings in play
    pub fn end_innings_early(&mut self) -> ScoringResult<()> {
        let result = self.game.end_innings_early();
        self.commit(result)
    }

    /// Open the chase
    pub fn open_second_innings(&mut self, openers: Openers) -> ScoringResult<()> {
        let result = self.game.open_second_innings(openers);
        self.commit(result)
    }

    /// Decide the match
    pub fn finalize_match(&mut self) -> ScoringResult<MatchResult> {
        let result = self.game.finalize_match();
        self.commit(result)
    }

    /// Call the match off
    pub fn abandon(&mut self, reason: impl Into<String>) -> ScoringResult<()> {
        let result = self.game.abandon(reason);
        self.commit(result)
    }

    /// Flush pending writes and hand the match back
    pub async fn close(self) -> Match {
        self.writer.shutdown().await;
        self.game
    }

    fn commit<T>(&mut self, result: ScoringResult<T>) -> ScoringResult<T> {
        if result.is_ok() && self.publish() {
            self.writer.submit(&self.game);
        }
        result
    }

    /// Publish queued events; true if anything changed
    fn publish(&mut self) -> bool {
        let events = self.game.take_events();
        if events.is_empty() {
            return false;
        }
        if let Err(err) = self.publisher.publish_events(&events) {
            warn!(
                match_id = %self.game.id(),
                error = %err,
                dropped = events.len(),
                "event publish failed"
            );
        }
        true
    }
}
