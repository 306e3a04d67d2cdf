// Copyright 2025 Cowboy AI, LLC.

//! The delivery: one bowled ball and its outcome

use crate::format::FormatConfiguration;
use crate::roster::PlayerRef;
use serde::{Deserialize, Serialize};

/// Most runs a scorer may enter for a single ball, overthrows included
pub const MAX_RUNS_PER_BALL: u32 = 12;

/// Kind of extra conceded on a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtraKind {
    /// Ball too wide to hit; not a legal delivery
    Wide,
    /// Illegal delivery; not a legal delivery
    NoBall,
    /// Runs taken without the bat touching the ball
    Bye,
    /// Runs taken off the batsman's body
    LegBye,
}

impl ExtraKind {
    /// Whether a delivery with this extra counts toward the over
    pub fn is_legal(self) -> bool {
        matches!(self, ExtraKind::Bye | ExtraKind::LegBye)
    }
}

/// Extra runs on a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    /// What kind of extra
    pub kind: ExtraKind,
    /// Runs entered by the scorer, penalty excluded
    pub runs: u32,
    /// Penalty run applied by the engine; set when the delivery is recorded
    #[serde(default)]
    pub penalty: u32,
}

impl Extra {
    /// Extra with no penalty applied yet
    pub fn new(kind: ExtraKind, runs: u32) -> Self {
        Self {
            kind,
            runs,
            penalty: 0,
        }
    }

    /// Runs the extra adds to the team total
    pub fn total(&self) -> u32 {
        self.runs.saturating_add(self.penalty)
    }
}

/// How the striker was dismissed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WicketKind {
    /// Stumps broken by the ball
    Bowled,
    /// Caught by a fielder
    Caught,
    /// Leg before wicket
    Lbw,
    /// Run out
    RunOut,
    /// Stumped by the keeper
    Stumped,
    /// Hit own wicket
    HitWicket,
    /// Any other mode of dismissal
    Other,
}

/// A dismissal on a delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wicket {
    /// Mode of dismissal
    pub kind: WicketKind,
}

/// One bowled ball
///
/// The scorer may leave `striker` empty to mean "whoever is on strike". The
/// stored copy always carries the effective striker and the applied penalty,
/// so stats can be rebuilt from stored overs alone.
///
/// # Examples
///
/// ```rust
/// use cim_domain_cricket::{Delivery, ExtraKind, PlayerRef, TeamSide};
///
/// let bowler = PlayerRef::Joker(TeamSide::B);
/// let ball = Delivery::runs(4, bowler);
/// assert!(ball.is_legal());
/// assert!(!Delivery::extra(ExtraKind::Wide, 1, bowler).is_legal());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Runs struck by the batsman
    pub runs_off_bat: u32,
    /// Extras conceded
    pub extra: Option<Extra>,
    /// Dismissal of the striker
    pub wicket: Option<Wicket>,
    /// Batsman on strike
    pub striker: Option<PlayerRef>,
    /// Bowler
    pub bowler: PlayerRef,
}

impl Delivery {
    /// Runs off the bat
    pub fn runs(runs: u32, bowler: PlayerRef) -> Self {
        Self {
            runs_off_bat: runs,
            extra: None,
            wicket: None,
            striker: None,
            bowler,
        }
    }

    /// A dot ball
    pub fn dot(bowler: PlayerRef) -> Self {
        Self::runs(0, bowler)
    }

    /// An extra with the scorer-entered runs
    pub fn extra(kind: ExtraKind, runs: u32, bowler: PlayerRef) -> Self {
        Self {
            extra: Some(Extra::new(kind, runs)),
            ..Self::dot(bowler)
        }
    }

    /// A dismissal with no runs
    pub fn wicket(kind: WicketKind, bowler: PlayerRef) -> Self {
        Self {
            wicket: Some(Wicket { kind }),
            ..Self::dot(bowler)
        }
    }

    /// Name the striker explicitly
    pub fn with_striker(mut self, striker: PlayerRef) -> Self {
        self.striker = Some(striker);
        self
    }

    /// Largest figure entered for one ball, off the bat or as extras
    pub fn entered_runs(&self) -> u32 {
        self.runs_off_bat.max(self.extra.map_or(0, |extra| extra.runs))
    }

    /// Whether this ball counts toward the six-ball over
    pub fn is_legal(&self) -> bool {
        self.extra.map_or(true, |extra| extra.kind.is_legal())
    }

    /// Runs added to the team total
    pub fn total_runs(&self) -> u32 {
        self.runs_off_bat
            .saturating_add(self.extra.map_or(0, |extra| extra.total()))
    }

    /// Runs credited to the striker; wides and no-balls credit nothing
    pub fn batsman_runs(&self) -> u32 {
        match self.extra.map(|extra| extra.kind) {
            Some(ExtraKind::Wide) | Some(ExtraKind::NoBall) => 0,
            _ => self.runs_off_bat,
        }
    }

    /// Whether the striker faced this ball
    pub fn counts_as_ball_faced(&self) -> bool {
        self.is_legal()
    }

    /// Whether the ball is a boundary four
    pub fn is_four(&self) -> bool {
        self.batsman_runs() == 4
    }

    /// Whether the ball is a six
    pub fn is_six(&self) -> bool {
        self.batsman_runs() == 6
    }

    /// Copy of this delivery with the format's penalty run applied
    pub(crate) fn with_penalty(mut self, format: &FormatConfiguration) -> Self {
        if let Some(extra) = self.extra.as_mut() {
            let penalised = match extra.kind {
                ExtraKind::Wide => format.wide_penalty(),
                ExtraKind::NoBall => format.no_ball_penalty(),
                ExtraKind::Bye | ExtraKind::LegBye => false,
            };
            extra.penalty = u32::from(penalised);
        }
        self
    }
}
