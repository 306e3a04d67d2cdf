// Copyright 2025 Cowboy AI, LLC.

//! Completion and result resolution
//!
//! The only place a target or a result is computed. Both functions are pure
//! and depend on nothing but the final innings totals.

use crate::errors::{ScoringError, ScoringResult};
use crate::innings::Innings;
use crate::roster::{Team, TeamSide};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Winning margin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinMargin {
    /// Side batting first defended its total
    Runs(u32),
    /// Side batting second chased with wickets in hand
    Wickets(u32),
}

impl fmt::Display for WinMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, unit) = match self {
            WinMargin::Runs(n) => (n, "run"),
            WinMargin::Wickets(n) => (n, "wicket"),
        };
        write!(f, "{n} {unit}{}", if *n == 1 { "" } else { "s" })
    }
}

/// Final outcome of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchResult {
    /// One side won
    Won {
        /// Winning side
        side: TeamSide,
        /// Winning team's name at the time of the result
        team_name: String,
        /// By how much
        margin: WinMargin,
    },
    /// Scores level
    Tied,
    /// Completed without a result
    Abandoned {
        /// Why the match was called off
        reason: String,
    },
}

impl MatchResult {
    /// Winner for display: the team name, `"Tied"`, or nothing when abandoned
    pub fn winner(&self) -> Option<String> {
        match self {
            MatchResult::Won { team_name, .. } => Some(team_name.clone()),
            MatchResult::Tied => Some("Tied".to_string()),
            MatchResult::Abandoned { .. } => None,
        }
    }

    /// Margin for display, e.g. `"12 runs"`
    pub fn win_margin(&self) -> Option<String> {
        match self {
            MatchResult::Won { margin, .. } => Some(margin.to_string()),
            MatchResult::Tied | MatchResult::Abandoned { .. } => None,
        }
    }

    /// Winning side, if any
    pub fn winning_side(&self) -> Option<TeamSide> {
        match self {
            MatchResult::Won { side, .. } => Some(*side),
            _ => None,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Won {
                team_name, margin, ..
            } => write!(f, "{team_name} won by {margin}"),
            MatchResult::Tied => write!(f, "Match tied"),
            MatchResult::Abandoned { reason } => write!(f, "Match abandoned: {reason}"),
        }
    }
}

/// Target for the second innings: first-innings runs plus one
pub fn second_innings_target(first: &Innings) -> ScoringResult<u32> {
    if !first.is_completed() {
        return Err(ScoringError::transition("FirstInningsOpen", "SecondInnings"));
    }
    Ok(first.total_runs() + 1)
}

/// Decide the match from two completed innings
pub fn resolve(first: &Innings, second: &Innings, teams: &[Team; 2]) -> ScoringResult<MatchResult> {
    if !second.is_completed() {
        return Err(ScoringError::transition("SecondInningsOpen", "Finalize"));
    }

    let (side, margin) = match second.total_runs().cmp(&first.total_runs()) {
        std::cmp::Ordering::Greater => (
            second.batting_side(),
            WinMargin::Wickets(second.max_wickets().saturating_sub(second.total_wickets())),
        ),
        std::cmp::Ordering::Less => (
            first.batting_side(),
            WinMargin::Runs(first.total_runs() - second.total_runs()),
        ),
        std::cmp::Ordering::Equal => return Ok(MatchResult::Tied),
    };

    Ok(MatchResult::Won {
        side,
        team_name: teams[side.index()].name.clone(),
        margin,
    })
}
