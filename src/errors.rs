// Copyright 2025 Cowboy AI, LLC.

//! Error types for scoring operations
//!
//! Every rejected engine operation is a no-op: the aggregate is left exactly as
//! it was before the call, so callers can simply re-prompt for a valid input.

use crate::roster::{PlayerRef, TeamSide};
use std::fmt;
use thiserror::Error;

/// A single field that failed format or roster validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Overs per innings outside `1..=50`
    OversOutOfRange {
        /// Requested overs
        overs: u32,
    },
    /// Players per team outside `3..=11`
    PlayersPerTeamOutOfRange {
        /// Requested squad size
        players_per_team: u32,
    },
    /// A joker was requested for an eleven-a-side format
    JokerNotAllowed {
        /// Requested squad size
        players_per_team: u32,
    },
    /// A joker was requested without a usable name
    MissingJokerName,
    /// Team name is empty or whitespace
    EmptyTeamName {
        /// Which team
        side: TeamSide,
    },
    /// Roster length differs from the configured squad size
    RosterSize {
        /// Which team
        side: TeamSide,
        /// Configured squad size
        expected: usize,
        /// Players supplied
        actual: usize,
    },
    /// A player name is empty or whitespace
    EmptyPlayerName {
        /// Which team
        side: TeamSide,
        /// Zero-based roster position
        index: usize,
    },
}

impl ValidationIssue {
    /// Name of the offending field, for form highlighting
    pub fn field(&self) -> &'static str {
        match self {
            ValidationIssue::OversOutOfRange { .. } => "overs",
            ValidationIssue::PlayersPerTeamOutOfRange { .. } => "players_per_team",
            ValidationIssue::JokerNotAllowed { .. } => "joker",
            ValidationIssue::MissingJokerName => "joker_name",
            ValidationIssue::EmptyTeamName { .. } => "team_name",
            ValidationIssue::RosterSize { .. } => "players",
            ValidationIssue::EmptyPlayerName { .. } => "player_name",
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::OversOutOfRange { overs } => {
                write!(f, "overs must be between 1 and 50, got {overs}")
            }
            ValidationIssue::PlayersPerTeamOutOfRange { players_per_team } => {
                write!(f, "players per team must be between 3 and 11, got {players_per_team}")
            }
            ValidationIssue::JokerNotAllowed { players_per_team } => {
                write!(f, "joker is not allowed with {players_per_team} players per team")
            }
            ValidationIssue::MissingJokerName => write!(f, "joker requires a name"),
            ValidationIssue::EmptyTeamName { side } => write!(f, "{side} needs a name"),
            ValidationIssue::RosterSize {
                side,
                expected,
                actual,
            } => write!(f, "{side} needs {expected} players, got {actual}"),
            ValidationIssue::EmptyPlayerName { side, index } => {
                write!(f, "{side} player #{} needs a name", index + 1)
            }
        }
    }
}

/// Configuration or roster rejected at setup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    /// Every field that failed, in the order checked
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    /// Wrap a non-empty list of issues
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    /// Whether any issue concerns the given field
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field() == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Why a delivery was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalDelivery {
    /// The striker has already been dismissed this innings
    #[error("batsman {0} is already out")]
    BatsmanAlreadyOut(PlayerRef),

    /// The named striker is not one of the active batsmen
    #[error("batsman {0} is not at the crease")]
    NotAtCrease(PlayerRef),

    /// The innings no longer accepts deliveries
    #[error("innings is already completed")]
    InningsCompleted,

    /// The delivery names a different bowler than the one in charge
    #[error("delivery bowled by {actual}, but {expected} is bowling")]
    BowlerMismatch {
        /// Current bowler
        expected: PlayerRef,
        /// Bowler named on the delivery
        actual: PlayerRef,
    },

    /// A lone survivor is waiting for the caller to continue or end the innings
    #[error("last man standing: continue with single batting or end the innings")]
    LastManDecisionPending,

    /// More runs than one ball can yield
    #[error("{0} runs off one ball exceeds the limit of {max}", max = crate::delivery::MAX_RUNS_PER_BALL)]
    ImplausibleRuns(u32),
}

/// Why a bowler selection was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IneligibleBowler {
    /// Same bowler may not bowl consecutive overs
    #[error("{0} bowled the previous over")]
    BowledPreviousOver(PlayerRef),

    /// Bowler is not part of the fielding side
    #[error("{0} is not in the bowling team")]
    NotInBowlingTeam(PlayerRef),
}

/// Why a batsman selection was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IneligibleBatsman {
    /// Player has already been dismissed this innings
    #[error("{0} is already out")]
    AlreadyOut(PlayerRef),

    /// Player is already at the crease
    #[error("{0} is already batting")]
    AlreadyBatting(PlayerRef),

    /// Player being replaced is not at the crease
    #[error("{0} is not an active batsman")]
    NotActive(PlayerRef),

    /// Player is not part of the batting side
    #[error("{0} is not in the batting team")]
    NotInBattingTeam(PlayerRef),

    /// Wrong number of openers for the format
    #[error("expected {expected} opening batsmen, got {actual}")]
    OpenerCount {
        /// Openers the format needs
        expected: usize,
        /// Openers supplied
        actual: usize,
    },
}

/// Errors produced by the scoring engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// Bad configuration or roster at setup
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Delivery refused; engine state unchanged
    #[error("Illegal delivery: {0}")]
    IllegalDelivery(#[from] IllegalDelivery),

    /// Bowler selection refused
    #[error("Ineligible bowler: {0}")]
    IneligibleBowler(#[from] IneligibleBowler),

    /// Batsman selection refused
    #[error("Ineligible batsman: {0}")]
    IneligibleBatsman(#[from] IneligibleBatsman),

    /// Lifecycle operation attempted from the wrong state
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Attempted target state or operation
        to: String,
    },
}

/// Result type for scoring operations
pub type ScoringResult<T> = Result<T, ScoringError>;

impl ScoringError {
    /// Build an [`ScoringError::InvalidTransition`]
    pub fn transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        ScoringError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Check if this is a setup validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ScoringError::Validation(_))
    }

    /// Check if the caller should re-prompt for a player selection
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            ScoringError::IneligibleBowler(_) | ScoringError::IneligibleBatsman(_)
        )
    }

    /// Check if this is a lifecycle error
    pub fn is_transition_error(&self) -> bool {
        matches!(self, ScoringError::InvalidTransition { .. })
    }
}
