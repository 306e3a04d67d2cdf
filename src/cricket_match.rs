// Copyright 2025 Cowboy AI, LLC.

//! The match aggregate
//!
//! A [`Match`] owns the format, both teams, at most two innings and the
//! result. Every engine operation goes through it: the aggregate checks the
//! lifecycle, delegates to the innings in play, bumps its version and queues
//! a [`MatchEvent`] for the application to publish.
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Match
//!     participant Innings
//!     App->>Match: create(format, sheets, identity)
//!     App->>Match: start(toss, openers)
//!     Match->>Innings: open(1)
//!     loop every ball
//!         App->>Match: record_delivery(ball)
//!         Match->>Innings: record_delivery(ball)
//!     end
//!     App->>Match: open_second_innings(openers)
//!     Match->>Innings: open(2, target)
//!     Innings-->>Match: completed
//!     Match->>Match: resolve result
//! ```

use crate::delivery::Delivery;
use crate::entity::{AggregateRoot, MatchId};
use crate::errors::{IllegalDelivery, ScoringError, ScoringResult};
use crate::events::MatchEvent;
use crate::format::FormatConfiguration;
use crate::identity::Identity;
use crate::innings::{DeliveryOutcome, Innings, Openers, Over};
use crate::persistence::MatchCode;
use crate::result::{resolve, second_innings_target, MatchResult};
use crate::roster::{validate_rosters, PlayerRef, Team, TeamSheet, TeamSide};
use crate::state_machine::{MatchStatus, State, StateMachine, StateTransitions};
use crate::stats::{BatsmanStats, BowlerStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What the toss winner chose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TossChoice {
    /// Bat first
    Bat,
    /// Bowl first
    Bowl,
}

/// Outcome of the toss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toss {
    /// Side that won the toss
    pub winner: TeamSide,
    /// Their decision
    pub choice: TossChoice,
}

impl Toss {
    /// Side that bats in the first innings
    pub fn batting_first(&self) -> TeamSide {
        match self.choice {
            TossChoice::Bat => self.winner,
            TossChoice::Bowl => self.winner.opponent(),
        }
    }
}

/// A cricket match between two teams
///
/// Only serialized fields are persisted. The score books inside each innings
/// are rebuilt by [`Match::rehydrate`] after loading.
///
/// # Examples
///
/// ```rust
/// use cim_domain_cricket::{
///     Delivery, FormatConfiguration, Identity, Match, MatchStatus, Openers, PlayerRef,
///     TeamSheet, Toss, TossChoice, TeamSide,
/// };
///
/// let format = FormatConfiguration::builder().overs(1).players_per_team(3).build().unwrap();
/// let sheet = |name: &str| TeamSheet::new(name).player("a").player("b").player("c");
/// let mut game = Match::create(format, [sheet("Lions"), sheet("Tigers")], Identity::guest()).unwrap();
///
/// let bat = |i: usize| PlayerRef::Player(game.teams()[0].players[i].id);
/// let bowler = PlayerRef::Player(game.teams()[1].players[0].id);
/// let openers = Openers::pair(bat(0), bat(1), bowler);
/// game.start(Toss { winner: TeamSide::A, choice: TossChoice::Bat }, openers).unwrap();
/// game.record_delivery(Delivery::runs(4, bowler)).unwrap();
///
/// assert_eq!(game.status(), MatchStatus::Active);
/// assert_eq!(game.current_innings().unwrap().total_runs(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    id: MatchId,
    code: Option<MatchCode>,
    version: u64,
    config: FormatConfiguration,
    teams: [Team; 2],
    innings: Vec<Innings>,
    lifecycle: StateMachine<MatchStatus>,
    toss: Option<Toss>,
    result: Option<MatchResult>,
    created_by: Identity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    pending_events: Vec<MatchEvent>,
}

impl Match {
    /// Set up a match from a validated format and two team sheets
    ///
    /// Nothing is constructed unless both rosters pass.
    pub fn create(
        config: FormatConfiguration,
        sheets: [TeamSheet; 2],
        created_by: Identity,
    ) -> ScoringResult<Self> {
        let teams = validate_rosters(&config, sheets).map_err(|err| {
            warn!(issues = err.issues.len(), "match setup rejected");
            ScoringError::from(err)
        })?;

        let id = MatchId::new();
        let now = Utc::now();
        info!(match_id = %id, overs = config.overs(), players = config.players_per_team(), "match created");

        Ok(Self {
            id,
            code: None,
            version: 0,
            pending_events: vec![MatchEvent::MatchCreated {
                match_id: id,
                teams: [teams[0].name.clone(), teams[1].name.clone()],
            }],
            config,
            teams,
            innings: Vec::new(),
            lifecycle: StateMachine::new(MatchStatus::Setup),
            toss: None,
            result: None,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Load a persisted match and rebuild its derived state
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut game: Self = serde_json::from_str(json)?;
        game.rehydrate();
        Ok(game)
    }

    /// Rebuild every innings' score book and dismissed set from stored overs
    pub fn rehydrate(&mut self) {
        for innings in &mut self.innings {
            innings.rehydrate();
        }
    }

    /// Attach the code issued by the repository
    pub fn assign_code(&mut self, code: MatchCode) {
        self.code = Some(code);
    }

    /// Drain events queued since the last call
    pub fn take_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ---- lifecycle -------------------------------------------------------

    /// Record the toss and open the first innings
    pub fn start(&mut self, toss: Toss, openers: Openers) -> ScoringResult<()> {
        self.ensure_transition(MatchStatus::Active, "Start")?;

        let batting_first = toss.batting_first();
        let innings = Innings::open(1, batting_first, &self.config, &self.teams, &openers, None)
            .map_err(|err| self.rejected("start", err))?;

        self.lifecycle.transition_to(MatchStatus::Active)?;
        self.toss = Some(toss);
        self.innings.push(innings);
        self.touch();
        self.pending_events.push(MatchEvent::MatchStarted {
            match_id: self.id,
            batting_first,
        });
        info!(match_id = %self.id, batting = %batting_first, "match started");
        Ok(())
    }

    /// Open the second innings once the first is complete
    ///
    /// Sides swap and the target is fixed at first-innings runs plus one.
    pub fn open_second_innings(&mut self, openers: Openers) -> ScoringResult<()> {
        self.ensure_status(MatchStatus::Active, "SecondInnings")?;
        let first = match self.innings.as_slice() {
            [first] => first,
            _ => {
                let err = ScoringError::transition("SecondInningsOpen", "SecondInnings");
                return Err(self.rejected("open_second_innings", err));
            }
        };
        let target =
            second_innings_target(first).map_err(|err| self.rejected("open_second_innings", err))?;
        let second = Innings::open(
            2,
            first.bowling_side(),
            &self.config,
            &self.teams,
            &openers,
            Some(target),
        )
        .map_err(|err| self.rejected("open_second_innings", err))?;

        self.innings.push(second);
        self.touch();
        self.pending_events.push(MatchEvent::SecondInningsOpened {
            match_id: self.id,
            target,
        });
        info!(match_id = %self.id, target, "second innings opened");
        Ok(())
    }

    /// Decide the match once the second innings is over
    ///
    /// The match completes on its own when the second innings ends, so this
    /// usually just returns the stored result. Calling it again is harmless.
    pub fn finalize_match(&mut self) -> ScoringResult<MatchResult> {
        if let Some(result) = &self.result {
            return Ok(result.clone());
        }
        self.conclude().map_err(|err| self.rejected("finalize_match", err))
    }

    /// Call the match off without a result
    pub fn abandon(&mut self, reason: impl Into<String>) -> ScoringResult<()> {
        self.ensure_transition(MatchStatus::Completed, "Abandon")?;
        let reason = reason.into();
        self.lifecycle.transition_to(MatchStatus::Completed)?;
        self.result = Some(MatchResult::Abandoned {
            reason: reason.clone(),
        });
        self.touch();
        info!(match_id = %self.id, %reason, "match abandoned");
        self.pending_events.push(MatchEvent::MatchAbandoned {
            match_id: self.id,
            reason,
        });
        Ok(())
    }

    // ---- innings operations ----------------------------------------------

    /// Apply one delivery to the innings in play
    pub fn record_delivery(&mut self, delivery: Delivery) -> ScoringResult<DeliveryOutcome> {
        // A finished chase reports the closed innings.
        if self.status() == MatchStatus::Completed
            && self.innings.len() == 2
            && self.innings.iter().all(Innings::is_completed)
        {
            let err = IllegalDelivery::InningsCompleted.into();
            return Err(self.rejected("record_delivery", err));
        }
        let outcome =
            self.with_innings("record_delivery", |innings| innings.record_delivery(delivery))?;

        let innings = self.innings_in_play()?;
        let event = MatchEvent::DeliveryRecorded {
            match_id: self.id,
            innings: innings.number(),
            over: outcome.over_number,
            delivery: innings
                .current_over()
                .and_then(|over| over.deliveries.last())
                .cloned()
                .ok_or_else(|| ScoringError::transition("NoOver", "Delivery"))?,
            total_runs: innings.total_runs(),
            total_wickets: innings.total_wickets(),
        };
        self.pending_events.push(event);

        if outcome.innings_completed.is_some() {
            self.innings_closed()?;
        }
        Ok(outcome)
    }

    /// Hand the ball to a new bowler
    pub fn change_bowler(&mut self, bowler: PlayerRef) -> ScoringResult<()> {
        let innings = self.with_innings("change_bowler", |innings| {
            innings.change_bowler(bowler)?;
            Ok(innings.number())
        })?;
        self.pending_events.push(MatchEvent::BowlerChanged {
            match_id: self.id,
            innings,
            bowler,
        });
        Ok(())
    }

    /// Replace a batsman at the crease
    pub fn change_batsman(&mut self, out: PlayerRef, new: PlayerRef) -> ScoringResult<()> {
        let innings = self.with_innings("change_batsman", |innings| {
            innings.change_batsman(out, new)?;
            Ok(innings.number())
        })?;
        self.pending_events.push(MatchEvent::BatsmanChanged {
            match_id: self.id,
            innings,
            out,
            new,
        });
        Ok(())
    }

    /// Let the last batsman continue alone
    pub fn switch_to_single_batting(&mut self, remaining: PlayerRef) -> ScoringResult<()> {
        let innings = self.with_innings("switch_to_single_batting", |innings| {
            innings.switch_to_single_batting(remaining)?;
            Ok(innings.number())
        })?;
        self.pending_events.push(MatchEvent::SwitchedToSingleBatting {
            match_id: self.id,
            innings,
            batsman: remaining,
        });
        Ok(())
    }

    /// Close the innings in play now
    pub fn end_innings_early(&mut self) -> ScoringResult<()> {
        self.with_innings("end_innings_early", Innings::end_innings_early)?;
        self.innings_closed()
    }

    /// The lone undismissed batsman awaiting a decision, if any
    pub fn is_last_man_standing(&self) -> Option<PlayerRef> {
        self.current_innings()
            .filter(|_| self.status() == MatchStatus::Active)
            .and_then(Innings::is_last_man_standing)
    }

    fn with_innings<T>(
        &mut self,
        operation: &'static str,
        apply: impl FnOnce(&mut Innings) -> ScoringResult<T>,
    ) -> ScoringResult<T> {
        self.ensure_status(MatchStatus::Active, operation)?;
        let match_id = self.id;
        let innings = self
            .innings
            .last_mut()
            .ok_or_else(|| ScoringError::transition("NoInnings", operation))?;
        let value = apply(innings).map_err(|err| {
            warn!(%match_id, operation, error = %err, "operation rejected");
            err
        })?;
        self.touch();
        debug!(%match_id, operation, version = self.version, "match updated");
        Ok(value)
    }

    fn innings_in_play(&self) -> ScoringResult<&Innings> {
        self.innings
            .last()
            .ok_or_else(|| ScoringError::transition("NoInnings", "Innings"))
    }

    fn innings_closed(&mut self) -> ScoringResult<()> {
        let innings = self.innings_in_play()?;
        let Some(reason) = innings.completion() else {
            return Ok(());
        };
        let number = innings.number();
        let event = MatchEvent::InningsCompleted {
            match_id: self.id,
            innings: number,
            reason,
            total_runs: innings.total_runs(),
            total_wickets: innings.total_wickets(),
        };
        self.pending_events.push(event);
        if number == 2 {
            self.conclude()?;
        }
        Ok(())
    }

    fn conclude(&mut self) -> ScoringResult<MatchResult> {
        let result = match self.innings.as_slice() {
            [first, second] => resolve(first, second, &self.teams)?,
            _ => return Err(ScoringError::transition(self.status().name(), "Finalize")),
        };
        self.lifecycle.transition_to(MatchStatus::Completed)?;
        self.result = Some(result.clone());
        self.touch();
        info!(match_id = %self.id, %result, "match completed");
        self.pending_events.push(MatchEvent::MatchCompleted {
            match_id: self.id,
            result: result.clone(),
        });
        Ok(result)
    }

    fn ensure_status(&self, expected: MatchStatus, operation: &str) -> ScoringResult<()> {
        if self.status() != expected {
            let err = ScoringError::transition(self.status().name(), operation);
            return Err(self.rejected(operation, err));
        }
        Ok(())
    }

    fn ensure_transition(&self, target: MatchStatus, operation: &str) -> ScoringResult<()> {
        if !self.lifecycle.current_state().can_transition_to(&target) {
            let err = ScoringError::transition(self.status().name(), operation);
            return Err(self.rejected(operation, err));
        }
        Ok(())
    }

    fn rejected(&self, operation: &str, err: ScoringError) -> ScoringError {
        warn!(match_id = %self.id, operation, error = %err, "operation rejected");
        err
    }

    fn touch(&mut self) {
        self.increment_version();
        self.updated_at = Utc::now();
    }

    // ---- projections -----------------------------------------------------

    /// Code issued by the repository, once created there
    pub fn code(&self) -> Option<&MatchCode> {
        self.code.as_ref()
    }

    /// Rules in force
    pub fn config(&self) -> &FormatConfiguration {
        &self.config
    }

    /// Both teams, side A first
    pub fn teams(&self) -> &[Team; 2] {
        &self.teams
    }

    /// Team on the given side
    pub fn team(&self, side: TeamSide) -> &Team {
        &self.teams[side.index()]
    }

    /// Innings played so far, in order
    pub fn innings(&self) -> &[Innings] {
        &self.innings
    }

    /// The latest innings, open or not
    pub fn current_innings(&self) -> Option<&Innings> {
        self.innings.last()
    }

    /// Lifecycle status
    pub fn status(&self) -> MatchStatus {
        *self.lifecycle.current_state()
    }

    /// Lifecycle with its transition history
    pub fn lifecycle(&self) -> &StateMachine<MatchStatus> {
        &self.lifecycle
    }

    /// Toss, once recorded
    pub fn toss(&self) -> Option<&Toss> {
        self.toss.as_ref()
    }

    /// Result, once decided
    pub fn result(&self) -> Option<&MatchResult> {
        self.result.as_ref()
    }

    /// Winning team name, `"Tied"`, or nothing yet
    pub fn winner(&self) -> Option<String> {
        self.result.as_ref().and_then(MatchResult::winner)
    }

    /// Winning margin, e.g. `"4 wickets"`
    pub fn win_margin(&self) -> Option<String> {
        self.result.as_ref().and_then(MatchResult::win_margin)
    }

    /// Who set the match up
    pub fn created_by(&self) -> &Identity {
        &self.created_by
    }

    /// When the match was set up
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the match last changed
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Over in progress, or the last one bowled
    pub fn current_over(&self) -> Option<&Over> {
        self.current_innings().and_then(Innings::current_over)
    }

    /// Batsmen at the crease with their figures, striker first
    pub fn current_batsmen(&self) -> Vec<(PlayerRef, BatsmanStats)> {
        self.current_innings()
            .map(Innings::current_batsmen)
            .unwrap_or_default()
    }

    /// Bowler in charge
    pub fn current_bowler(&self) -> Option<PlayerRef> {
        self.current_innings().map(Innings::current_bowler)
    }

    /// Batting card of the current innings, in order of appearance
    pub fn batting_stats(&self) -> Vec<(PlayerRef, BatsmanStats)> {
        self.current_innings()
            .map(|innings| {
                innings
                    .score_book()
                    .batting()
                    .map(|(player, stats)| (*player, stats.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Bowling figures of the current innings, in order of first over
    pub fn bowling_stats(&self) -> Vec<(PlayerRef, BowlerStats)> {
        self.current_innings()
            .map(|innings| {
                innings
                    .score_book()
                    .bowling()
                    .map(|(player, stats)| (*player, stats.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Players who may come in next in the current innings
    pub fn eligible_batsmen(&self) -> Vec<PlayerRef> {
        self.current_innings()
            .map(Innings::eligible_batsmen)
            .unwrap_or_default()
    }

    /// Display name of a participant
    pub fn player_name(&self, player: PlayerRef) -> Option<&str> {
        match player {
            PlayerRef::Player(id) => self
                .teams
                .iter()
                .find_map(|team| team.player(id))
                .map(|p| p.name.as_str()),
            PlayerRef::Joker(_) => self.config.joker().map(|joker| joker.name.as_str()),
        }
    }
}

impl AggregateRoot for Match {
    type Id = MatchId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}
