// Copyright 2025 Cowboy AI, LLC.

//! Running batting and bowling aggregates
//!
//! Stats are updated incrementally as deliveries are accepted. After a cold
//! load they are rebuilt by replaying the stored overs in
//! `(over number, ball number)` order; the replay is deterministic, so the
//! rebuilt [`ScoreBook`] equals the one produced live.

use crate::delivery::{Delivery, WicketKind};
use crate::format::BALLS_PER_OVER;
use crate::innings::Over;
use crate::roster::PlayerRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A batsman's innings so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatsmanStats {
    /// Runs off the bat
    pub runs: u32,
    /// Legal deliveries faced
    pub balls: u32,
    /// Boundary fours
    pub fours: u32,
    /// Sixes
    pub sixes: u32,
    /// How the batsman was dismissed, if out
    pub dismissal: Option<WicketKind>,
}

impl BatsmanStats {
    /// Runs per hundred balls; zero before the first ball faced
    pub fn strike_rate(&self) -> f64 {
        if self.balls == 0 {
            0.0
        } else {
            f64::from(self.runs) / f64::from(self.balls) * 100.0
        }
    }

    /// Whether the batsman has been dismissed
    pub fn is_out(&self) -> bool {
        self.dismissal.is_some()
    }
}

/// A bowler's figures so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerStats {
    /// Legal deliveries bowled
    pub legal_balls: u32,
    /// Runs conceded, extras included
    pub runs_conceded: u32,
    /// Wickets taken
    pub wickets: u32,
    /// Completed overs without a run conceded
    pub maidens: u32,
}

impl BowlerStats {
    /// Runs per six legal balls; zero before the first legal ball
    pub fn economy(&self) -> f64 {
        if self.legal_balls == 0 {
            0.0
        } else {
            f64::from(self.runs_conceded) / f64::from(self.legal_balls) * f64::from(BALLS_PER_OVER)
        }
    }

    /// Overs in scorecard notation, e.g. `"2.3"`
    pub fn overs(&self) -> String {
        format!(
            "{}.{}",
            self.legal_balls / BALLS_PER_OVER,
            self.legal_balls % BALLS_PER_OVER
        )
    }
}

/// Batting and bowling figures for one innings, in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBook {
    batting: IndexMap<PlayerRef, BatsmanStats>,
    bowling: IndexMap<PlayerRef, BowlerStats>,
}

impl ScoreBook {
    /// Empty score book
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored overs
    ///
    /// Overs are replayed by over number and deliveries in stored order.
    pub fn rebuild(overs: &[Over]) -> Self {
        let mut ordered: Vec<&Over> = overs.iter().collect();
        ordered.sort_by_key(|over| over.number);

        let mut book = Self::new();
        for over in ordered {
            for delivery in &over.deliveries {
                book.record(delivery);
            }
            if over.completed {
                book.close_over(over);
            }
        }
        book
    }

    /// Apply one normalized delivery
    ///
    /// The delivery must carry its effective striker; a delivery without one
    /// only updates the bowler.
    pub fn record(&mut self, delivery: &Delivery) {
        if let Some(striker) = delivery.striker {
            let batsman = self.batting.entry(striker).or_default();
            batsman.runs = batsman.runs.saturating_add(delivery.batsman_runs());
            if delivery.counts_as_ball_faced() {
                batsman.balls += 1;
            }
            if delivery.is_four() {
                batsman.fours += 1;
            }
            if delivery.is_six() {
                batsman.sixes += 1;
            }
            if let Some(wicket) = delivery.wicket {
                batsman.dismissal = Some(wicket.kind);
            }
        }

        let bowler = self.bowling.entry(delivery.bowler).or_default();
        if delivery.is_legal() {
            bowler.legal_balls += 1;
        }
        bowler.runs_conceded = bowler.runs_conceded.saturating_add(delivery.total_runs());
        if delivery.wicket.is_some() {
            bowler.wickets += 1;
        }
    }

    /// Credit a maiden when a completed over conceded nothing
    pub fn close_over(&mut self, over: &Over) {
        if over.completed && over.runs_conceded == 0 {
            self.bowling.entry(over.bowler).or_default().maidens += 1;
        }
    }

    /// A batsman's card entry
    pub fn batsman(&self, player: &PlayerRef) -> Option<&BatsmanStats> {
        self.batting.get(player)
    }

    /// A bowler's figures
    pub fn bowler(&self, player: &PlayerRef) -> Option<&BowlerStats> {
        self.bowling.get(player)
    }

    /// All batting entries, in order of appearance
    pub fn batting(&self) -> impl Iterator<Item = (&PlayerRef, &BatsmanStats)> {
        self.batting.iter()
    }

    /// All bowling entries, in order of first over
    pub fn bowling(&self) -> impl Iterator<Item = (&PlayerRef, &BowlerStats)> {
        self.bowling.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::ExtraKind;
    use crate::entity::PlayerId;
    use crate::roster::TeamSide;

    fn striker() -> PlayerRef {
        PlayerRef::Player(PlayerId::new())
    }

    const BOWLER: PlayerRef = PlayerRef::Joker(TeamSide::B);

    /// Test batting aggregates
    #[test]
    fn test_batting_figures() {
        let bat = striker();
        let mut book = ScoreBook::new();
        for runs in [4, 0, 6, 1] {
            book.record(&Delivery::runs(runs, BOWLER).with_striker(bat));
        }
        let wide = Delivery {
            extra: Some(crate::delivery::Extra {
                kind: ExtraKind::Wide,
                runs: 0,
                penalty: 1,
            }),
            ..Delivery::dot(BOWLER).with_striker(bat)
        };
        book.record(&wide);

        let stats = book.batsman(&bat).unwrap();
        assert_eq!(stats.runs, 11);
        assert_eq!(stats.balls, 4);
        assert_eq!(stats.fours, 1);
        assert_eq!(stats.sixes, 1);
        assert!((stats.strike_rate() - 275.0).abs() < f64::EPSILON);

        let bowling = book.bowler(&BOWLER).unwrap();
        assert_eq!(bowling.legal_balls, 4);
        assert_eq!(bowling.runs_conceded, 12);
        assert!((bowling.economy() - 18.0).abs() < f64::EPSILON);
        assert_eq!(bowling.overs(), "0.4");
    }

    #[test]
    fn test_dismissal_recorded() {
        let bat = striker();
        let mut book = ScoreBook::new();
        book.record(&Delivery::wicket(WicketKind::Bowled, BOWLER).with_striker(bat));

        assert!(book.batsman(&bat).unwrap().is_out());
        assert_eq!(book.bowler(&BOWLER).unwrap().wickets, 1);
    }

    #[test]
    fn test_zero_ball_rates() {
        assert_eq!(BatsmanStats::default().strike_rate(), 0.0);
        assert_eq!(BowlerStats::default().economy(), 0.0);
    }

    /// Test rebuild credits maidens only for completed overs
    #[test]
    fn test_rebuild_from_overs() {
        let bat = striker();
        let mut maiden = Over::new(1, BOWLER);
        for _ in 0..6 {
            maiden.push(Delivery::dot(BOWLER).with_striker(bat));
        }
        let mut partial = Over::new(2, BOWLER);
        partial.push(Delivery::dot(BOWLER).with_striker(bat));

        let book = ScoreBook::rebuild(&[partial, maiden]);
        let bowling = book.bowler(&BOWLER).unwrap();
        assert_eq!(bowling.maidens, 1);
        assert_eq!(bowling.legal_balls, 7);
        assert_eq!(bowling.overs(), "1.1");
        assert_eq!(book.batsman(&bat).unwrap().balls, 7);
    }
}
