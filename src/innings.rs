// Copyright 2025 Cowboy AI, LLC.

//! The innings engine
//!
//! An [`Innings`] consumes deliveries one at a time and keeps the running
//! totals, the batsmen at the crease, the bowler in charge and the score book.
//! Every operation validates first and mutates second, so a rejected call
//! leaves the innings untouched.
//!
//! ```mermaid
//! stateDiagram-v2
//!     [*] --> Open
//!     Open --> Open: record_delivery
//!     Open --> Completed: all out / overs exhausted / target reached
//!     Open --> Completed: end_innings_early
//!     Completed --> [*]
//! ```

use crate::delivery::{Delivery, MAX_RUNS_PER_BALL};
use crate::errors::{
    IllegalDelivery, IneligibleBatsman, IneligibleBowler, ScoringError, ScoringResult,
};
use crate::format::{FormatConfiguration, BALLS_PER_OVER};
use crate::roster::{PlayerRef, Team, TeamSide};
use crate::state_machine::State;
use crate::stats::{BatsmanStats, BowlerStats, ScoreBook};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// One over: up to six legal deliveries from one bowler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Over {
    /// One-based over number within the innings
    pub number: u32,
    /// Bowler of every delivery in the over
    pub bowler: PlayerRef,
    /// Deliveries in bowling order
    pub deliveries: Vec<Delivery>,
    /// Runs conceded, extras included
    pub runs_conceded: u32,
    /// Wickets that fell in the over
    pub wickets_in_over: u32,
    /// Set once six legal deliveries have been bowled
    pub completed: bool,
}

impl Over {
    /// Empty over
    pub fn new(number: u32, bowler: PlayerRef) -> Self {
        Self {
            number,
            bowler,
            deliveries: Vec::new(),
            runs_conceded: 0,
            wickets_in_over: 0,
            completed: false,
        }
    }

    /// Legal deliveries so far
    pub fn legal_balls(&self) -> u32 {
        self.deliveries.iter().filter(|d| d.is_legal()).count() as u32
    }

    /// Append a normalized delivery; returns true if it completed the over
    pub fn push(&mut self, delivery: Delivery) -> bool {
        self.runs_conceded = self.runs_conceded.saturating_add(delivery.total_runs());
        if delivery.wicket.is_some() {
            self.wickets_in_over += 1;
        }
        self.deliveries.push(delivery);
        if !self.completed && self.legal_balls() >= BALLS_PER_OVER {
            self.completed = true;
            return true;
        }
        false
    }
}

/// Batsmen at the crease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveBatsmen {
    /// Single-batsman mode
    Single(PlayerRef),
    /// Standard mode; the first is on strike
    Pair {
        /// Facing the next delivery
        striker: PlayerRef,
        /// At the bowler's end
        non_striker: PlayerRef,
    },
}

impl ActiveBatsmen {
    /// The batsman facing the next delivery
    pub fn on_strike(&self) -> PlayerRef {
        match *self {
            ActiveBatsmen::Single(player) => player,
            ActiveBatsmen::Pair { striker, .. } => striker,
        }
    }

    /// Whether the player is at the crease
    pub fn contains(&self, player: PlayerRef) -> bool {
        match *self {
            ActiveBatsmen::Single(p) => p == player,
            ActiveBatsmen::Pair {
                striker,
                non_striker,
            } => striker == player || non_striker == player,
        }
    }

    /// Batsmen at the crease, striker first
    pub fn players(&self) -> Vec<PlayerRef> {
        match *self {
            ActiveBatsmen::Single(p) => vec![p],
            ActiveBatsmen::Pair {
                striker,
                non_striker,
            } => vec![striker, non_striker],
        }
    }

    fn swap_strike(&mut self) {
        if let ActiveBatsmen::Pair {
            striker,
            non_striker,
        } = self
        {
            std::mem::swap(striker, non_striker);
        }
    }

    fn replace(&mut self, out: PlayerRef, new: PlayerRef) {
        match self {
            ActiveBatsmen::Single(p) if *p == out => *p = new,
            ActiveBatsmen::Pair {
                striker,
                non_striker,
            } => {
                if *striker == out {
                    *striker = new;
                } else if *non_striker == out {
                    *non_striker = new;
                }
            }
            ActiveBatsmen::Single(_) => {}
        }
    }
}

/// Why an innings ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InningsCompletion {
    /// Wicket limit reached
    AllOut,
    /// Every legal ball bowled
    OversExhausted,
    /// Chasing side passed the target
    TargetReached,
    /// Ended by the caller
    EndedEarly,
}

/// Lifecycle state of an innings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InningsState {
    /// Accepting deliveries
    Open,
    /// Terminal
    Completed,
}

impl State for InningsState {
    fn name(&self) -> &'static str {
        match self {
            InningsState::Open => "Open",
            InningsState::Completed => "Completed",
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, InningsState::Completed)
    }
}

/// Opening selections for an innings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Openers {
    /// One batsman in single-batsman formats, otherwise two; striker first
    pub batsmen: Vec<PlayerRef>,
    /// Opening bowler
    pub bowler: PlayerRef,
}

impl Openers {
    /// Standard-mode openers
    pub fn pair(striker: PlayerRef, non_striker: PlayerRef, bowler: PlayerRef) -> Self {
        Self {
            batsmen: vec![striker, non_striker],
            bowler,
        }
    }

    /// Single-batsman-mode opener
    pub fn single(batsman: PlayerRef, bowler: PlayerRef) -> Self {
        Self {
            batsmen: vec![batsman],
            bowler,
        }
    }
}

/// What an accepted delivery did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Over the delivery landed in
    pub over_number: u32,
    /// Whether it completed that over
    pub over_completed: bool,
    /// Batsman dismissed on the delivery
    pub dismissed: Option<PlayerRef>,
    /// Set when the delivery ended the innings
    pub innings_completed: Option<InningsCompletion>,
}

/// One team's batting turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Innings {
    number: u8,
    batting_side: TeamSide,
    bowling_side: TeamSide,
    format: FormatConfiguration,
    batting_lineup: Vec<PlayerRef>,
    bowling_lineup: Vec<PlayerRef>,
    overs: Vec<Over>,
    total_runs: u32,
    total_wickets: u32,
    total_legal_balls: u32,
    active_batsmen: ActiveBatsmen,
    current_bowler: PlayerRef,
    target: Option<u32>,
    completion: Option<InningsCompletion>,
    #[serde(skip)]
    dismissed: BTreeSet<PlayerRef>,
    #[serde(skip)]
    score_book: ScoreBook,
}

fn lineup(side: TeamSide, teams: &[Team; 2], format: &FormatConfiguration) -> Vec<PlayerRef> {
    let mut players: Vec<PlayerRef> = teams[side.index()].player_refs().collect();
    if format.has_joker() {
        players.push(PlayerRef::Joker(side));
    }
    players
}

impl Innings {
    /// Open an innings with validated openers
    ///
    /// `target` is set only for the second innings and never changes after.
    pub fn open(
        number: u8,
        batting_side: TeamSide,
        format: &FormatConfiguration,
        teams: &[Team; 2],
        openers: &Openers,
        target: Option<u32>,
    ) -> ScoringResult<Self> {
        let bowling_side = batting_side.opponent();
        let batting_lineup = lineup(batting_side, teams, format);
        let bowling_lineup = lineup(bowling_side, teams, format);

        let expected = if format.is_single_side() { 1 } else { 2 };
        for batsman in &openers.batsmen {
            if !batsman.belongs_to(batting_side, teams, format) {
                return Err(IneligibleBatsman::NotInBattingTeam(*batsman).into());
            }
        }
        if !openers.bowler.belongs_to(bowling_side, teams, format) {
            return Err(IneligibleBowler::NotInBowlingTeam(openers.bowler).into());
        }

        let active_batsmen = match (expected, openers.batsmen.as_slice()) {
            (1, [single]) => ActiveBatsmen::Single(*single),
            (2, [striker, non_striker]) if striker == non_striker => {
                return Err(IneligibleBatsman::AlreadyBatting(*non_striker).into());
            }
            (2, [striker, non_striker]) => ActiveBatsmen::Pair {
                striker: *striker,
                non_striker: *non_striker,
            },
            (expected, batsmen) => {
                return Err(IneligibleBatsman::OpenerCount {
                    expected,
                    actual: batsmen.len(),
                }
                .into());
            }
        };

        info!(innings = number, batting = %batting_side, ?target, "innings opened");

        Ok(Self {
            number,
            batting_side,
            bowling_side,
            format: format.clone(),
            batting_lineup,
            bowling_lineup,
            overs: Vec::new(),
            total_runs: 0,
            total_wickets: 0,
            total_legal_balls: 0,
            active_batsmen,
            current_bowler: openers.bowler,
            target,
            completion: None,
            dismissed: BTreeSet::new(),
            score_book: ScoreBook::new(),
        })
    }

    /// Rebuild derived state after loading from storage
    ///
    /// Replays the stored overs into a fresh score book and recollects the
    /// dismissed batsmen. Safe to call more than once.
    pub fn rehydrate(&mut self) {
        self.score_book = ScoreBook::rebuild(&self.overs);
        self.dismissed = self
            .overs
            .iter()
            .flat_map(|over| &over.deliveries)
            .filter(|d| d.wicket.is_some())
            .filter_map(|d| d.striker)
            .collect();
    }

    // ---- delivery processing -------------------------------------------

    /// Apply one delivery
    ///
    /// Rejected deliveries leave the innings untouched.
    pub fn record_delivery(&mut self, delivery: Delivery) -> ScoringResult<DeliveryOutcome> {
        let striker = self.check_delivery(&delivery)?;

        if striker != self.active_batsmen.on_strike() {
            self.active_batsmen.swap_strike();
        }

        let mut stored = delivery.with_penalty(&self.format);
        stored.striker = Some(striker);

        if self.needs_new_over() {
            let number = self.overs.len() as u32 + 1;
            self.overs.push(Over::new(number, self.current_bowler));
        }
        let over = self
            .overs
            .last_mut()
            .ok_or_else(|| ScoringError::transition("NoOver", "Delivery"))?;
        let over_number = over.number;
        let over_completed = over.push(stored.clone());

        self.total_runs = self.total_runs.saturating_add(stored.total_runs());
        if stored.is_legal() {
            self.total_legal_balls += 1;
        }
        let dismissed = stored.wicket.map(|_| striker);
        if let Some(out) = dismissed {
            self.total_wickets += 1;
            self.dismissed.insert(out);
        }

        self.score_book.record(&stored);
        if over_completed {
            if let Some(over) = self.overs.last() {
                self.score_book.close_over(over);
            }
        }

        // The over-boundary swap is the only rotation on the last ball.
        if over_completed || stored.runs_off_bat % 2 == 1 {
            self.active_batsmen.swap_strike();
        }

        debug!(
            innings = self.number,
            over = over_number,
            runs = stored.total_runs(),
            total = self.total_runs,
            wickets = self.total_wickets,
            "delivery recorded"
        );

        let innings_completed = self.evaluate_completion();
        Ok(DeliveryOutcome {
            over_number,
            over_completed,
            dismissed,
            innings_completed,
        })
    }

    /// Validate a delivery and resolve its striker without mutating
    fn check_delivery(&self, delivery: &Delivery) -> ScoringResult<PlayerRef> {
        if self.is_completed() {
            return Err(IllegalDelivery::InningsCompleted.into());
        }
        if self.is_last_man_standing().is_some() {
            return Err(IllegalDelivery::LastManDecisionPending.into());
        }
        if delivery.entered_runs() > MAX_RUNS_PER_BALL {
            return Err(IllegalDelivery::ImplausibleRuns(delivery.entered_runs()).into());
        }
        if delivery.bowler != self.current_bowler {
            return Err(IllegalDelivery::BowlerMismatch {
                expected: self.current_bowler,
                actual: delivery.bowler,
            }
            .into());
        }
        if self.needs_new_over() && self.previous_over_bowler() == Some(self.current_bowler) {
            return Err(IneligibleBowler::BowledPreviousOver(self.current_bowler).into());
        }

        let striker = match delivery.striker {
            Some(named) if self.dismissed.contains(&named) => {
                return Err(IllegalDelivery::BatsmanAlreadyOut(named).into());
            }
            Some(named) if !self.active_batsmen.contains(named) => {
                return Err(IllegalDelivery::NotAtCrease(named).into());
            }
            Some(named) => named,
            None => self.active_batsmen.on_strike(),
        };

        // Both batsmen at the crease must still be in.
        if let Some(out) = self
            .active_batsmen
            .players()
            .into_iter()
            .find(|p| self.dismissed.contains(p))
        {
            return Err(IllegalDelivery::BatsmanAlreadyOut(out).into());
        }

        Ok(striker)
    }

    fn needs_new_over(&self) -> bool {
        self.overs.last().map_or(true, |over| over.completed)
    }

    fn previous_over_bowler(&self) -> Option<PlayerRef> {
        self.overs
            .iter()
            .rev()
            .find(|over| over.completed)
            .map(|over| over.bowler)
    }

    fn evaluate_completion(&mut self) -> Option<InningsCompletion> {
        let reason = if self.target.is_some_and(|target| self.total_runs >= target) {
            InningsCompletion::TargetReached
        } else if self.total_wickets >= self.max_wickets() {
            InningsCompletion::AllOut
        } else if self.total_legal_balls >= self.format.max_legal_balls() {
            InningsCompletion::OversExhausted
        } else {
            return None;
        };
        self.complete(reason);
        Some(reason)
    }

    fn complete(&mut self, reason: InningsCompletion) {
        self.completion = Some(reason);
        info!(
            innings = self.number,
            ?reason,
            runs = self.total_runs,
            wickets = self.total_wickets,
            balls = self.total_legal_balls,
            "innings completed"
        );
    }

    // ---- selections ------------------------------------------------------

    /// Hand the ball to a new bowler for the next over
    ///
    /// Rejected if the bowler bowled the previous completed over, or if the
    /// current over already has deliveries.
    pub fn change_bowler(&mut self, bowler: PlayerRef) -> ScoringResult<()> {
        self.ensure_open("ChangeBowler")?;
        if !self.bowling_lineup.contains(&bowler) {
            return Err(IneligibleBowler::NotInBowlingTeam(bowler).into());
        }
        if !self.needs_new_over() {
            return Err(ScoringError::transition("OverInProgress", "ChangeBowler"));
        }
        if self.previous_over_bowler() == Some(bowler) {
            return Err(IneligibleBowler::BowledPreviousOver(bowler).into());
        }
        debug!(innings = self.number, %bowler, "bowler changed");
        self.current_bowler = bowler;
        Ok(())
    }

    /// Replace one batsman at the crease
    pub fn change_batsman(&mut self, out: PlayerRef, new: PlayerRef) -> ScoringResult<()> {
        self.ensure_open("ChangeBatsman")?;
        if !self.active_batsmen.contains(out) {
            return Err(IneligibleBatsman::NotActive(out).into());
        }
        self.check_incoming(new)?;
        self.active_batsmen.replace(out, new);
        debug!(innings = self.number, %out, %new, "batsman changed");
        Ok(())
    }

    fn check_incoming(&self, new: PlayerRef) -> ScoringResult<()> {
        if self.dismissed.contains(&new) {
            return Err(IneligibleBatsman::AlreadyOut(new).into());
        }
        if self.active_batsmen.contains(new) {
            return Err(IneligibleBatsman::AlreadyBatting(new).into());
        }
        if !self.batting_lineup.contains(&new) {
            return Err(IneligibleBatsman::NotInBattingTeam(new).into());
        }
        Ok(())
    }

    /// Players who may come in next
    ///
    /// The batting roster plus the batting side's joker, minus the batsmen at
    /// the crease and everyone dismissed this innings.
    pub fn eligible_batsmen(&self) -> Vec<PlayerRef> {
        self.batting_lineup
            .iter()
            .copied()
            .filter(|p| !self.active_batsmen.contains(*p) && !self.dismissed.contains(p))
            .collect()
    }

    /// The lone undismissed batsman when no replacement is left
    ///
    /// Only meaningful in two-batsman mode. The engine never acts on this; the
    /// caller picks [`Innings::switch_to_single_batting`] or
    /// [`Innings::end_innings_early`].
    pub fn is_last_man_standing(&self) -> Option<PlayerRef> {
        if self.is_completed() {
            return None;
        }
        let ActiveBatsmen::Pair {
            striker,
            non_striker,
        } = self.active_batsmen
        else {
            return None;
        };
        let survivor = match (
            self.dismissed.contains(&striker),
            self.dismissed.contains(&non_striker),
        ) {
            (true, false) => non_striker,
            (false, true) => striker,
            _ => return None,
        };
        self.eligible_batsmen().is_empty().then_some(survivor)
    }

    /// Continue with the last batsman alone
    pub fn switch_to_single_batting(&mut self, remaining: PlayerRef) -> ScoringResult<()> {
        self.ensure_open("SingleBatting")?;
        match self.is_last_man_standing() {
            None => Err(ScoringError::transition("TwoBatsmen", "SingleBatting")),
            Some(survivor) if survivor != remaining => {
                if self.dismissed.contains(&remaining) {
                    Err(IneligibleBatsman::AlreadyOut(remaining).into())
                } else {
                    Err(IneligibleBatsman::NotActive(remaining).into())
                }
            }
            Some(survivor) => {
                self.active_batsmen = ActiveBatsmen::Single(survivor);
                info!(innings = self.number, batsman = %survivor, "switched to single batting");
                Ok(())
            }
        }
    }

    /// Close the innings now
    pub fn end_innings_early(&mut self) -> ScoringResult<()> {
        self.ensure_open("EndInnings")?;
        self.complete(InningsCompletion::EndedEarly);
        Ok(())
    }

    fn ensure_open(&self, operation: &str) -> ScoringResult<()> {
        if self.is_completed() {
            return Err(ScoringError::transition(self.state().name(), operation));
        }
        Ok(())
    }

    // ---- projections -----------------------------------------------------

    /// 1 or 2
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Side batting
    pub fn batting_side(&self) -> TeamSide {
        self.batting_side
    }

    /// Side bowling
    pub fn bowling_side(&self) -> TeamSide {
        self.bowling_side
    }

    /// All overs, in order
    pub fn overs(&self) -> &[Over] {
        &self.overs
    }

    /// The last over started, whether or not it is finished
    pub fn current_over(&self) -> Option<&Over> {
        self.overs.last()
    }

    /// Runs scored
    pub fn total_runs(&self) -> u32 {
        self.total_runs
    }

    /// Wickets fallen
    pub fn total_wickets(&self) -> u32 {
        self.total_wickets
    }

    /// Legal deliveries bowled
    pub fn total_legal_balls(&self) -> u32 {
        self.total_legal_balls
    }

    /// Overs with six legal deliveries
    pub fn completed_overs(&self) -> u32 {
        self.overs.iter().filter(|over| over.completed).count() as u32
    }

    /// Legal deliveries in the unfinished over
    pub fn legal_balls_in_current_over(&self) -> u32 {
        self.overs
            .last()
            .filter(|over| !over.completed)
            .map_or(0, Over::legal_balls)
    }

    /// Wicket limit for this innings
    ///
    /// Follows the format, except that a last-man-stands format lets the
    /// final batsman bat on, so every available player can be dismissed.
    pub fn max_wickets(&self) -> u32 {
        if self.format.last_man_stands() {
            self.format.players_available()
        } else {
            self.format.max_wickets()
        }
    }

    /// Batsmen at the crease
    pub fn active_batsmen(&self) -> &ActiveBatsmen {
        &self.active_batsmen
    }

    /// Bowler in charge
    pub fn current_bowler(&self) -> PlayerRef {
        self.current_bowler
    }

    /// Runs needed to win; second innings only
    pub fn target(&self) -> Option<u32> {
        self.target
    }

    /// Whether the innings is over
    pub fn is_completed(&self) -> bool {
        self.completion.is_some()
    }

    /// Why the innings ended
    pub fn completion(&self) -> Option<InningsCompletion> {
        self.completion
    }

    /// Lifecycle state
    pub fn state(&self) -> InningsState {
        if self.is_completed() {
            InningsState::Completed
        } else {
            InningsState::Open
        }
    }

    /// Whether the player has been dismissed this innings
    pub fn is_dismissed(&self, player: PlayerRef) -> bool {
        self.dismissed.contains(&player)
    }

    /// Batting and bowling figures
    pub fn score_book(&self) -> &ScoreBook {
        &self.score_book
    }

    /// Card entries for the batsmen at the crease, striker first
    pub fn current_batsmen(&self) -> Vec<(PlayerRef, BatsmanStats)> {
        self.active_batsmen
            .players()
            .into_iter()
            .map(|p| (p, self.score_book.batsman(&p).cloned().unwrap_or_default()))
            .collect()
    }

    /// Figures for the bowler in charge
    pub fn current_bowler_stats(&self) -> BowlerStats {
        self.score_book
            .bowler(&self.current_bowler)
            .cloned()
            .unwrap_or_default()
    }

    /// Runs still needed; `None` outside a chase
    pub fn runs_required(&self) -> Option<u32> {
        self.target.map(|t| t.saturating_sub(self.total_runs))
    }

    /// Legal deliveries left
    pub fn balls_remaining(&self) -> u32 {
        self.format
            .max_legal_balls()
            .saturating_sub(self.total_legal_balls)
    }

    /// Runs per over so far
    pub fn current_run_rate(&self) -> f64 {
        if self.total_legal_balls == 0 {
            return 0.0;
        }
        f64::from(self.total_runs) / f64::from(self.total_legal_balls) * f64::from(BALLS_PER_OVER)
    }

    /// Runs per over needed from here; `None` outside a chase or when no balls remain
    pub fn required_run_rate(&self) -> Option<f64> {
        let required = self.runs_required()?;
        let balls = self.balls_remaining();
        (balls > 0).then(|| f64::from(required) / f64::from(balls) * f64::from(BALLS_PER_OVER))
    }
}
