// Copyright 2025 Cowboy AI, LLC.

//! Teams, players and the joker
//!
//! A match owns exactly two [`Team`]s. Inside an innings a participant is named
//! by a [`PlayerRef`]: either a rostered player or the joker scoped to the side
//! it currently plays for. `joker@teamA` and `joker@teamB` are distinct
//! identities for dismissal and crease tracking.

use crate::entity::{PlayerId, TeamId};
use crate::errors::{ValidationError, ValidationIssue};
use crate::format::FormatConfiguration;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the two sides in a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum TeamSide {
    /// First team entered at setup
    A,
    /// Second team entered at setup
    B,
}

impl TeamSide {
    /// The other side
    pub fn opponent(self) -> Self {
        match self {
            TeamSide::A => TeamSide::B,
            TeamSide::B => TeamSide::A,
        }
    }

    /// Index into `[Team; 2]`
    pub fn index(self) -> usize {
        match self {
            TeamSide::A => 0,
            TeamSide::B => 1,
        }
    }
}

impl fmt::Display for TeamSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamSide::A => write!(f, "teamA"),
            TeamSide::B => write!(f, "teamB"),
        }
    }
}

/// Informational player role; never gates batting or bowling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum PlayerRole {
    /// Specialist batsman
    Batsman,
    /// Specialist bowler
    Bowler,
    /// Bats and bowls
    #[default]
    AllRounder,
    /// Keeps wicket
    WicketKeeper,
}

/// A rostered player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identity
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Informational role
    pub role: PlayerRole,
}

/// A team and its fixed roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Identity
    pub id: TeamId,
    /// Display name
    pub name: String,
    /// Roster in batting-card order
    pub players: Vec<Player>,
}

impl Team {
    /// Whether a rostered player belongs to this team
    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Look up a rostered player
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Rostered players as innings participants
    pub fn player_refs(&self) -> impl Iterator<Item = PlayerRef> + '_ {
        self.players.iter().map(|p| PlayerRef::Player(p.id))
    }
}

/// Unvalidated team entry as submitted by a setup form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSheet {
    /// Team name
    pub name: String,
    /// Player names and roles, in batting-card order
    pub players: Vec<(String, PlayerRole)>,
}

impl TeamSheet {
    /// Start a sheet for the named team
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            players: Vec::new(),
        }
    }

    /// Add a player with the default role
    pub fn player(self, name: impl Into<String>) -> Self {
        self.player_with_role(name, PlayerRole::default())
    }

    /// Add a player with an explicit role
    pub fn player_with_role(mut self, name: impl Into<String>, role: PlayerRole) -> Self {
        self.players.push((name.into(), role));
        self
    }
}

/// Validate both team sheets against the format and mint ids
///
/// All issues from both sheets are collected; no team is returned unless both
/// pass.
pub fn validate_rosters(
    format: &FormatConfiguration,
    sheets: [TeamSheet; 2],
) -> Result<[Team; 2], ValidationError> {
    let expected = format.players_per_team() as usize;
    let mut issues = Vec::new();

    for (sheet, side) in sheets.iter().zip([TeamSide::A, TeamSide::B]) {
        if sheet.name.trim().is_empty() {
            issues.push(ValidationIssue::EmptyTeamName { side });
        }
        if sheet.players.len() != expected {
            issues.push(ValidationIssue::RosterSize {
                side,
                expected,
                actual: sheet.players.len(),
            });
        }
        for (index, (name, _)) in sheet.players.iter().enumerate() {
            if name.trim().is_empty() {
                issues.push(ValidationIssue::EmptyPlayerName { side, index });
            }
        }
    }

    if !issues.is_empty() {
        return Err(ValidationError::new(issues));
    }

    Ok(sheets.map(|sheet| Team {
        id: TeamId::new(),
        name: sheet.name.trim().to_string(),
        players: sheet
            .players
            .into_iter()
            .map(|(name, role)| Player {
                id: PlayerId::new(),
                name: name.trim().to_string(),
                role,
            })
            .collect(),
    }))
}

/// A participant in an innings
///
/// Serializes as a string so it can key JSON maps: `player:<uuid>`,
/// `joker@teamA` or `joker@teamB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PlayerRef {
    /// A rostered player
    Player(PlayerId),
    /// The joker, playing for the given side
    Joker(TeamSide),
}

impl PlayerRef {
    /// Whether this participant may play for `side` in a match between `teams`
    pub fn belongs_to(&self, side: TeamSide, teams: &[Team; 2], format: &FormatConfiguration) -> bool {
        match self {
            PlayerRef::Player(id) => teams[side.index()].contains(*id),
            PlayerRef::Joker(joker_side) => format.has_joker() && *joker_side == side,
        }
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerRef::Player(id) => write!(f, "player:{id}"),
            PlayerRef::Joker(side) => write!(f, "joker@{side}"),
        }
    }
}

/// Error parsing a [`PlayerRef`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid player reference: {0}")]
pub struct PlayerRefParseError(String);

impl FromStr for PlayerRef {
    type Err = PlayerRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "joker@teamA" => Ok(PlayerRef::Joker(TeamSide::A)),
            "joker@teamB" => Ok(PlayerRef::Joker(TeamSide::B)),
            _ => s
                .strip_prefix("player:")
                .and_then(|id| id.parse().ok())
                .map(PlayerRef::Player)
                .ok_or_else(|| PlayerRefParseError(s.to_string())),
        }
    }
}

impl From<PlayerRef> for String {
    fn from(player: PlayerRef) -> Self {
        player.to_string()
    }
}

impl TryFrom<String> for PlayerRef {
    type Error = PlayerRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn format(players: u32) -> FormatConfiguration {
        FormatConfiguration::builder()
            .players_per_team(players)
            .build()
            .unwrap()
    }

    fn sheet(name: &str, players: &[&str]) -> TeamSheet {
        players
            .iter()
            .fold(TeamSheet::new(name), |sheet, p| sheet.player(*p))
    }

    #[test]
    fn test_validate_rosters_accepts_and_trims() {
        let teams = validate_rosters(
            &format(3),
            [
                sheet(" Lions ", &["Ann", "Bob ", "Cy"]),
                sheet("Tigers", &["Dee", "Ed", "Flo"]),
            ],
        )
        .unwrap();

        assert_eq!(teams[0].name, "Lions");
        assert_eq!(teams[0].players[1].name, "Bob");
        assert_eq!(teams[1].players.len(), 3);
        assert_ne!(teams[0].id, teams[1].id);
    }

    /// Test that issues from both sheets are reported together
    #[test]
    fn test_validate_rosters_collects_all_issues() {
        let err = validate_rosters(
            &format(3),
            [sheet("", &["Ann", " ", "Cy"]), sheet("Tigers", &["Dee", "Ed"])],
        )
        .unwrap_err();

        assert_eq!(
            err.issues,
            vec![
                ValidationIssue::EmptyTeamName { side: TeamSide::A },
                ValidationIssue::EmptyPlayerName {
                    side: TeamSide::A,
                    index: 1
                },
                ValidationIssue::RosterSize {
                    side: TeamSide::B,
                    expected: 3,
                    actual: 2
                },
            ]
        );
    }

    #[test]
    fn test_player_ref_string_form() {
        let id = PlayerId::new();
        let player = PlayerRef::Player(id);
        assert_eq!(player.to_string(), format!("player:{id}"));
        assert_eq!(player.to_string().parse::<PlayerRef>().unwrap(), player);

        let joker = PlayerRef::Joker(TeamSide::B);
        assert_eq!(serde_json::to_string(&joker).unwrap(), "\"joker@teamB\"");
        assert_eq!(
            serde_json::from_str::<PlayerRef>("\"joker@teamB\"").unwrap(),
            joker
        );
        assert!("joker@teamC".parse::<PlayerRef>().is_err());
        assert!("player:nope".parse::<PlayerRef>().is_err());
    }

    /// Test the joker is scoped per side
    #[test]
    fn test_joker_scoping() {
        let with_joker = FormatConfiguration::builder()
            .players_per_team(3)
            .joker("Sam")
            .build()
            .unwrap();
        let teams = validate_rosters(
            &with_joker,
            [sheet("A", &["a", "b", "c"]), sheet("B", &["d", "e", "f"])],
        )
        .unwrap();

        let joker_a = PlayerRef::Joker(TeamSide::A);
        assert!(joker_a.belongs_to(TeamSide::A, &teams, &with_joker));
        assert!(!joker_a.belongs_to(TeamSide::B, &teams, &with_joker));
        assert!(!joker_a.belongs_to(TeamSide::A, &teams, &format(3)));

        let first = PlayerRef::Player(teams[0].players[0].id);
        assert!(first.belongs_to(TeamSide::A, &teams, &with_joker));
        assert!(!first.belongs_to(TeamSide::B, &teams, &with_joker));
    }
}
