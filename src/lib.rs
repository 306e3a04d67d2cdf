// Copyright 2025 Cowboy AI, LLC.

//! # CIM Domain Cricket
//!
//! A ball-by-ball cricket scoring engine built as a Domain-Driven Design
//! aggregate.
//!
//! The engine ingests one delivery at a time and keeps the authoritative state
//! of a match: runs, wickets, overs, batsmen at the crease, the bowler in
//! charge, innings transitions and the result. Formats are configurable
//! (overs, squad size, a shared joker, single-batsman mode, penalty runs for
//! wides and no-balls).
//!
//! - **Format**: validated, immutable rules for one match
//! - **Roster**: two fixed teams plus the optional joker
//! - **Innings**: the delivery-processing state machine
//! - **Result**: target and winner, computed in one place
//! - **Match**: the aggregate root tying it all together
//! - **Persistence**: repository boundary, cache and background writer
//!
//! ## Design Principles
//!
//! 1. **Type Safety**: phantom-typed ids, tagged variants for batting modes
//! 2. **Atomic Operations**: every operation validates before it mutates
//! 3. **Single Source of Truth**: results are only ever computed by the resolver
//! 4. **Storage Is Advisory**: the engine never waits on or fails for storage
//!
//! ```rust
//! use cim_domain_cricket::{
//!     Delivery, ExtraKind, FormatConfiguration, Identity, Match, Openers, PlayerRef,
//!     TeamSheet, TeamSide, Toss, TossChoice,
//! };
//!
//! let format = FormatConfiguration::builder().overs(2).players_per_team(3).build().unwrap();
//! let sheet = |name: &str| TeamSheet::new(name).player("one").player("two").player("three");
//! let mut game = Match::create(format, [sheet("Lions"), sheet("Tigers")], Identity::guest()).unwrap();
//!
//! let lions = |i: usize| PlayerRef::Player(game.team(TeamSide::A).players[i].id);
//! let bowler = PlayerRef::Player(game.team(TeamSide::B).players[0].id);
//! let openers = Openers::pair(lions(0), lions(1), bowler);
//! game.start(Toss { winner: TeamSide::A, choice: TossChoice::Bat }, openers).unwrap();
//!
//! game.record_delivery(Delivery::extra(ExtraKind::Wide, 3, bowler)).unwrap();
//! let innings = game.current_innings().unwrap();
//! assert_eq!(innings.total_runs(), 4);
//! assert_eq!(innings.total_legal_balls(), 0);
//! ```

#![warn(missing_docs)]

mod cricket_match;
mod delivery;
mod entity;
mod errors;
mod events;
mod format;
mod identity;
mod innings;
mod result;
mod roster;
mod session;
mod state_machine;
mod stats;
pub mod persistence;

// Re-export core types
pub use cricket_match::{Match, Toss, TossChoice};
pub use delivery::{Delivery, Extra, ExtraKind, Wicket, WicketKind, MAX_RUNS_PER_BALL};
pub use entity::{AggregateRoot, EntityId, MatchId, PlayerId, TeamId};
pub use errors::{
    IllegalDelivery, IneligibleBatsman, IneligibleBowler, ScoringError, ScoringResult,
    ValidationError, ValidationIssue,
};
pub use events::{DomainEvent, EventPublisher, MatchEvent, RecordingEventPublisher};
pub use format::{
    FormatBuilder, FormatConfiguration, JokerConfig, BALLS_PER_OVER, MAX_OVERS, MAX_PLAYERS,
    MIN_OVERS, MIN_PLAYERS,
};
pub use identity::Identity;
pub use innings::{
    ActiveBatsmen, DeliveryOutcome, Innings, InningsCompletion, InningsState, Openers, Over,
};
pub use result::{resolve, second_innings_target, MatchResult, WinMargin};
pub use roster::{
    validate_rosters, Player, PlayerRef, PlayerRefParseError, PlayerRole, Team, TeamSheet,
    TeamSide,
};
pub use session::ScoringSession;
pub use state_machine::{
    MatchStatus, State, StateMachine, StateTransition, StateTransitions,
};
pub use stats::{BatsmanStats, BowlerStats, ScoreBook};

// Re-export marker types
pub mod markers {
    //! Marker types for phantom type parameters
    pub use crate::entity::{MatchMarker, PlayerMarker, TeamMarker};
}
