// Copyright 2025 Cowboy AI, LLC.

//! Match events and publishing
//!
//! The match aggregate queues a [`MatchEvent`] for every accepted mutation.
//! The application drains them and publishes them; the engine never waits on
//! a publisher.

use crate::delivery::Delivery;
use crate::entity::MatchId;
use crate::innings::InningsCompletion;
use crate::result::MatchResult;
use crate::roster::{PlayerRef, TeamSide};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Trait for events raised by an aggregate
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get the event type name
    fn event_type(&self) -> &'static str;

    /// Get the schema version
    fn version(&self) -> &'static str {
        "v1"
    }
}

/// Something that happened to a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Match set up with validated format and rosters
    MatchCreated {
        /// Match
        match_id: MatchId,
        /// Team names, side A first
        teams: [String; 2],
    },
    /// Toss recorded and first innings opened
    MatchStarted {
        /// Match
        match_id: MatchId,
        /// Side batting first
        batting_first: TeamSide,
    },
    /// A delivery was accepted
    DeliveryRecorded {
        /// Match
        match_id: MatchId,
        /// Innings number
        innings: u8,
        /// Over number
        over: u32,
        /// Stored (normalized) delivery
        delivery: Delivery,
        /// Innings total after the delivery
        total_runs: u32,
        /// Innings wickets after the delivery
        total_wickets: u32,
    },
    /// A new bowler took the ball
    BowlerChanged {
        /// Match
        match_id: MatchId,
        /// Innings number
        innings: u8,
        /// Incoming bowler
        bowler: PlayerRef,
    },
    /// A batsman was replaced at the crease
    BatsmanChanged {
        /// Match
        match_id: MatchId,
        /// Innings number
        innings: u8,
        /// Outgoing batsman
        out: PlayerRef,
        /// Incoming batsman
        new: PlayerRef,
    },
    /// The last batsman continues alone
    SwitchedToSingleBatting {
        /// Match
        match_id: MatchId,
        /// Innings number
        innings: u8,
        /// Remaining batsman
        batsman: PlayerRef,
    },
    /// An innings ended
    InningsCompleted {
        /// Match
        match_id: MatchId,
        /// Innings number
        innings: u8,
        /// Why it ended
        reason: InningsCompletion,
        /// Final total
        total_runs: u32,
        /// Final wickets
        total_wickets: u32,
    },
    /// The second innings opened with a fixed target
    SecondInningsOpened {
        /// Match
        match_id: MatchId,
        /// Runs needed
        target: u32,
    },
    /// The match finished
    MatchCompleted {
        /// Match
        match_id: MatchId,
        /// Outcome
        result: MatchResult,
    },
    /// The match was called off
    MatchAbandoned {
        /// Match
        match_id: MatchId,
        /// Why
        reason: String,
    },
}

impl MatchEvent {
    /// Match this event belongs to
    pub fn match_id(&self) -> MatchId {
        match self {
            MatchEvent::MatchCreated { match_id, .. }
            | MatchEvent::MatchStarted { match_id, .. }
            | MatchEvent::DeliveryRecorded { match_id, .. }
            | MatchEvent::BowlerChanged { match_id, .. }
            | MatchEvent::BatsmanChanged { match_id, .. }
            | MatchEvent::SwitchedToSingleBatting { match_id, .. }
            | MatchEvent::InningsCompleted { match_id, .. }
            | MatchEvent::SecondInningsOpened { match_id, .. }
            | MatchEvent::MatchCompleted { match_id, .. }
            | MatchEvent::MatchAbandoned { match_id, .. } => *match_id,
        }
    }
}

impl DomainEvent for MatchEvent {
    fn aggregate_id(&self) -> Uuid {
        *self.match_id().as_uuid()
    }

    fn event_type(&self) -> &'static str {
        match self {
            MatchEvent::MatchCreated { .. } => "MatchCreated",
            MatchEvent::MatchStarted { .. } => "MatchStarted",
            MatchEvent::DeliveryRecorded { .. } => "DeliveryRecorded",
            MatchEvent::BowlerChanged { .. } => "BowlerChanged",
            MatchEvent::BatsmanChanged { .. } => "BatsmanChanged",
            MatchEvent::SwitchedToSingleBatting { .. } => "SwitchedToSingleBatting",
            MatchEvent::InningsCompleted { .. } => "InningsCompleted",
            MatchEvent::SecondInningsOpened { .. } => "SecondInningsOpened",
            MatchEvent::MatchCompleted { .. } => "MatchCompleted",
            MatchEvent::MatchAbandoned { .. } => "MatchAbandoned",
        }
    }
}

/// Event publisher trait for the application to fan out match events
pub trait EventPublisher: Send + Sync {
    /// Publish events in the order they happened
    fn publish_events(&self, events: &[MatchEvent]) -> Result<(), String>;
}

/// Publisher that keeps every event in memory, for tests and replays
#[derive(Clone, Default)]
pub struct RecordingEventPublisher {
    published: Arc<Mutex<Vec<MatchEvent>>>,
}

impl RecordingEventPublisher {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far
    pub fn published_events(&self) -> Vec<MatchEvent> {
        self.published
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Event type names published so far
    pub fn event_types(&self) -> Vec<&'static str> {
        self.published_events()
            .iter()
            .map(DomainEvent::event_type)
            .collect()
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish_events(&self, events: &[MatchEvent]) -> Result<(), String> {
        let mut published = self
            .published
            .lock()
            .map_err(|e| format!("publisher poisoned: {e}"))?;
        published.extend_from_slice(events);
        Ok(())
    }
}
