// Copyright 2025 Cowboy AI, LLC.

//! Match format configuration
//!
//! A [`FormatConfiguration`] is the immutable rule set of one match: how many
//! overs, how many players, whether a joker plays for both sides, whether the
//! format is single-batsman, and which extras carry a penalty run. It can only
//! be obtained through [`FormatBuilder::build`], which validates every field.

use crate::errors::{ValidationError, ValidationIssue};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Shortest allowed innings, in overs
pub const MIN_OVERS: u32 = 1;
/// Longest allowed innings, in overs
pub const MAX_OVERS: u32 = 50;
/// Smallest allowed squad
pub const MIN_PLAYERS: u32 = 3;
/// Largest allowed squad
pub const MAX_PLAYERS: u32 = 11;
/// Legal deliveries in an over
pub const BALLS_PER_OVER: u32 = 6;

/// The shared joker player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JokerConfig {
    /// Display name
    pub name: String,
}

/// Validated, immutable rules for a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormatConfiguration {
    overs: u32,
    players_per_team: u32,
    joker: Option<JokerConfig>,
    single_side: bool,
    wide_penalty: bool,
    no_ball_penalty: bool,
    last_man_stands: bool,
}

impl FormatConfiguration {
    /// Start building a configuration
    pub fn builder() -> FormatBuilder {
        FormatBuilder::default()
    }

    /// Overs per innings
    pub fn overs(&self) -> u32 {
        self.overs
    }

    /// Rostered players per team, joker excluded
    pub fn players_per_team(&self) -> u32 {
        self.players_per_team
    }

    /// The joker, when enabled
    pub fn joker(&self) -> Option<&JokerConfig> {
        self.joker.as_ref()
    }

    /// Whether a joker plays for both sides
    pub fn has_joker(&self) -> bool {
        self.joker.is_some()
    }

    /// Single-batsman format
    pub fn is_single_side(&self) -> bool {
        self.single_side
    }

    /// Whether a wide adds a penalty run
    pub fn wide_penalty(&self) -> bool {
        self.wide_penalty
    }

    /// Whether a no-ball adds a penalty run
    pub fn no_ball_penalty(&self) -> bool {
        self.no_ball_penalty
    }

    /// Whether the last undismissed batsman may be offered to continue alone
    pub fn last_man_stands(&self) -> bool {
        self.last_man_stands
    }

    /// Players who can bat for one side, joker included
    pub fn players_available(&self) -> u32 {
        self.players_per_team + u32::from(self.has_joker())
    }

    /// Wickets that end an innings under this format
    pub fn max_wickets(&self) -> u32 {
        if self.single_side {
            self.players_available()
        } else {
            self.players_available() - 1
        }
    }

    /// Legal deliveries in a full innings
    pub fn max_legal_balls(&self) -> u32 {
        self.overs * BALLS_PER_OVER
    }
}

/// Builder for [`FormatConfiguration`]
///
/// # Examples
///
/// ```rust
/// use cim_domain_cricket::FormatConfiguration;
///
/// let format = FormatConfiguration::builder()
///     .overs(5)
///     .players_per_team(6)
///     .joker("Sam")
///     .build()
///     .unwrap();
/// assert_eq!(format.players_available(), 7);
/// assert_eq!(format.max_wickets(), 6);
///
/// let err = FormatConfiguration::builder()
///     .overs(0)
///     .players_per_team(11)
///     .joker("Sam")
///     .build()
///     .unwrap_err();
/// assert_eq!(err.issues.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct FormatBuilder {
    overs: u32,
    players_per_team: u32,
    has_joker: bool,
    joker_name: Option<String>,
    single_side: bool,
    wide_penalty: bool,
    no_ball_penalty: bool,
    last_man_stands: bool,
}

impl Default for FormatBuilder {
    fn default() -> Self {
        Self {
            overs: 6,
            players_per_team: 6,
            has_joker: false,
            joker_name: None,
            single_side: false,
            wide_penalty: true,
            no_ball_penalty: true,
            last_man_stands: false,
        }
    }
}

impl FormatBuilder {
    /// Overs per innings
    pub fn overs(mut self, overs: u32) -> Self {
        self.overs = overs;
        self
    }

    /// Rostered players per team
    pub fn players_per_team(mut self, players: u32) -> Self {
        self.players_per_team = players;
        self
    }

    /// Enable the joker with the given name
    pub fn joker(mut self, name: impl Into<String>) -> Self {
        self.has_joker = true;
        self.joker_name = Some(name.into());
        self
    }

    /// Set the joker flag and name separately, as a setup form submits them
    pub fn joker_fields(mut self, has_joker: bool, name: Option<String>) -> Self {
        self.has_joker = has_joker;
        self.joker_name = name;
        self
    }

    /// Single-batsman format
    pub fn single_side(mut self, single_side: bool) -> Self {
        self.single_side = single_side;
        self
    }

    /// Penalty run on wides
    pub fn wide_penalty(mut self, enabled: bool) -> Self {
        self.wide_penalty = enabled;
        self
    }

    /// Penalty run on no-balls
    pub fn no_ball_penalty(mut self, enabled: bool) -> Self {
        self.no_ball_penalty = enabled;
        self
    }

    /// Offer the last undismissed batsman the choice to bat on alone
    pub fn last_man_stands(mut self, enabled: bool) -> Self {
        self.last_man_stands = enabled;
        self
    }

    /// Validate and freeze the configuration
    pub fn build(self) -> Result<FormatConfiguration, ValidationError> {
        let mut issues = Vec::new();

        if !(MIN_OVERS..=MAX_OVERS).contains(&self.overs) {
            issues.push(ValidationIssue::OversOutOfRange { overs: self.overs });
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players_per_team) {
            issues.push(ValidationIssue::PlayersPerTeamOutOfRange {
                players_per_team: self.players_per_team,
            });
        }

        let joker_name = self
            .joker_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if self.has_joker {
            if self.players_per_team >= MAX_PLAYERS {
                issues.push(ValidationIssue::JokerNotAllowed {
                    players_per_team: self.players_per_team,
                });
            }
            if joker_name.is_none() {
                issues.push(ValidationIssue::MissingJokerName);
            }
        }

        if !issues.is_empty() {
            return Err(ValidationError::new(issues));
        }

        Ok(FormatConfiguration {
            overs: self.overs,
            players_per_team: self.players_per_team,
            joker: joker_name
                .filter(|_| self.has_joker)
                .map(|name| JokerConfig {
                    name: name.to_string(),
                }),
            single_side: self.single_side,
            wide_penalty: self.wide_penalty,
            no_ball_penalty: self.no_ball_penalty,
            last_man_stands: self.last_man_stands,
        })
    }
}
