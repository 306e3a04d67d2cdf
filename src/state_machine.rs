// Copyright 2025 Cowboy AI, LLC.

//! Enum-based state machines for the match lifecycle
//!
//! States are plain enums; the transition table lives on the enum itself and
//! the [`StateMachine`] wrapper enforces it and keeps a timestamped history.
//!
//! ```mermaid
//! stateDiagram-v2
//!     [*] --> Setup
//!     Setup --> Active: toss + openers
//!     Setup --> Completed: abandoned
//!     Active --> Completed: second innings over / abandoned
//!     Completed --> [*]
//! ```

use crate::errors::{ScoringError, ScoringResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use uuid::Uuid;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Transition table for a state enum
pub trait StateTransitions: State {
    /// Check if a transition to the target state is valid
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Get all valid target states from this state
    fn valid_transitions(&self) -> Vec<Self>;
}

/// Record of a state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<S> {
    /// The state before the transition
    pub from: S,
    /// The state after the transition
    pub to: S,
    /// Unique identifier for this transition instance
    pub transition_id: Uuid,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

/// State holder that only moves along the transition table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine<S> {
    current_state: S,
    history: Vec<StateTransition<S>>,
}

impl<S: StateTransitions> StateMachine<S> {
    /// Start in the given state
    pub fn new(initial_state: S) -> Self {
        Self {
            current_state: initial_state,
            history: Vec::new(),
        }
    }

    /// Get the current state
    pub fn current_state(&self) -> &S {
        &self.current_state
    }

    /// Transition to a new state
    pub fn transition_to(&mut self, new_state: S) -> ScoringResult<&StateTransition<S>> {
        if self.current_state.is_terminal() || !self.current_state.can_transition_to(&new_state) {
            return Err(ScoringError::transition(
                self.current_state.name(),
                new_state.name(),
            ));
        }

        self.history.push(StateTransition {
            from: self.current_state.clone(),
            to: new_state.clone(),
            transition_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        });
        self.current_state = new_state;

        self.history
            .last()
            .ok_or_else(|| ScoringError::transition("Unknown", "Unknown"))
    }

    /// Get the transition history
    pub fn history(&self) -> &[StateTransition<S>] {
        &self.history
    }

    /// Check if in a specific state
    pub fn is_in_state(&self, state: &S) -> bool {
        &self.current_state == state
    }

    /// Get valid next states
    pub fn valid_next_states(&self) -> Vec<S> {
        self.current_state.valid_transitions()
    }
}

/// Lifecycle of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchStatus {
    /// Created, toss not yet recorded
    Setup,
    /// Innings in progress
    Active,
    /// Result decided or match abandoned
    Completed,
}

impl State for MatchStatus {
    fn name(&self) -> &'static str {
        match self {
            MatchStatus::Setup => "Setup",
            MatchStatus::Active => "Active",
            MatchStatus::Completed => "Completed",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Completed)
    }
}

impl StateTransitions for MatchStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(
            (self, target),
            (MatchStatus::Setup, MatchStatus::Active)
                | (MatchStatus::Setup, MatchStatus::Completed)
                | (MatchStatus::Active, MatchStatus::Completed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            MatchStatus::Setup => vec![MatchStatus::Active, MatchStatus::Completed],
            MatchStatus::Active => vec![MatchStatus::Completed],
            MatchStatus::Completed => vec![],
        }
    }
}
