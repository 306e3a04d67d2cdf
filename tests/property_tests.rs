//! Property tests for the innings engine
//!
//! Random ball sequences are driven through whole innings and the scoring
//! invariants are checked after every ball.


use cim_domain_cricket::{
    Delivery, IllegalDelivery, InningsCompletion, Match, MatchStatus, ScoreBook, ScoringError,
    TeamSide,
};
use proptest::prelude::*;
use scoring_support::{bowl, format, new_match, openers, play, start, Ball};

fn ball() -> impl Strategy<Value = Ball> {
    prop_oneof![
        6 => (0u32..=6).prop_map(Ball::Runs),
        1 => Just(Ball::Out),
        1 => (0u32..=4).prop_map(Ball::Wide),
        1 => (0u32..=6).prop_map(Ball::NoBall),
        1 => (0u32..=4).prop_map(Ball::Bye),
    ]
}

fn scoring_ball() -> impl Strategy<Value = Ball> {
    prop_oneof![
        4 => (0u32..=6).prop_map(Ball::Runs),
        1 => (0u32..=4).prop_map(Ball::Wide),
        1 => (0u32..=6).prop_map(Ball::NoBall),
        1 => (0u32..=4).prop_map(Ball::Bye),
    ]
}

fn started(overs: u32, players: u32) -> Match {
    let mut game = new_match(format(overs, players));
    start(&mut game, TeamSide::A);
    game
}

/// Team runs for one ball with both penalties on
fn team_runs(ball: Ball) -> u32 {
    match ball {
        Ball::Runs(runs) | Ball::Bye(runs) => runs,
        Ball::Wide(runs) | Ball::NoBall(runs) => runs + 1,
        Ball::Out => 0,
    }
}

fn is_legal(ball: Ball) -> bool {
    !matches!(ball, Ball::Wide(_) | Ball::NoBall(_))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Wides and no-balls never count toward the over
    #[test]
    fn legal_balls_count_only_legal_deliveries(
        overs in 1u32..=5,
        players in 3u32..=8,
        balls in prop::collection::vec(ball(), 1..80),
    ) {
        let mut game = started(overs, players);
        for ball in balls {
            let innings = game.current_innings().unwrap();
            if innings.is_completed() {
                break;
            }
            let (legal_before, runs_before) = (innings.total_legal_balls(), innings.total_runs());

            bowl(&mut game, ball);

            let innings = game.current_innings().unwrap();
            prop_assert_eq!(
                innings.total_legal_balls(),
                legal_before + u32::from(is_legal(ball))
            );
            prop_assert_eq!(innings.total_runs(), runs_before + team_runs(ball));
            prop_assert!(innings.total_legal_balls() <= overs * 6);

            let per_over: u32 = innings.overs().iter().map(|over| over.legal_balls()).sum();
            prop_assert_eq!(per_over, innings.total_legal_balls());
            prop_assert!(innings.overs().iter().all(|over| over.legal_balls() <= 6));
        }
    }

    /// Wickets stop at the ceiling and the innings closes itself there
    #[test]
    fn wickets_never_exceed_the_ceiling(
        players in 3u32..=8,
        balls in prop::collection::vec(ball(), 1..120),
    ) {
        let mut game = started(20, players);
        play(&mut game, &balls);

        let innings = game.current_innings().unwrap();
        let max = game.config().max_wickets();
        prop_assert!(innings.total_wickets() <= max);
        if innings.total_wickets() == max {
            prop_assert_eq!(innings.completion(), Some(InningsCompletion::AllOut));
        }
        if innings.is_completed() {
            let bowler = innings.current_bowler();
            let err = game.record_delivery(Delivery::dot(bowler)).unwrap_err();
            prop_assert_eq!(err, ScoringError::IllegalDelivery(IllegalDelivery::InningsCompleted));
        }
    }

    /// Without wickets, strike follows odd runs off the bat and over ends only
    #[test]
    fn strike_rotation_is_deterministic(
        overs in 1u32..=4,
        balls in prop::collection::vec(scoring_ball(), 1..60),
    ) {
        let mut game = started(overs, 4);
        let opener = |game: &Match, i| scoring_support::player(game, TeamSide::A, i);
        let (mut striker, mut non_striker) = (opener(&game, 0), opener(&game, 1));

        for ball in balls {
            if game.current_innings().unwrap().is_completed() {
                break;
            }
            bowl(&mut game, ball);

            let innings = game.current_innings().unwrap();
            let over_completed = is_legal(ball) && innings.total_legal_balls() % 6 == 0;
            let odd_off_bat = matches!(ball, Ball::Runs(runs) if runs % 2 == 1);
            if over_completed || odd_off_bat {
                std::mem::swap(&mut striker, &mut non_striker);
            }
            prop_assert_eq!(innings.active_batsmen().on_strike(), striker);
        }
    }

    /// Reloading a stored match rebuilds exactly the live state
    #[test]
    fn replay_matches_live_state(
        balls in prop::collection::vec(ball(), 1..90),
    ) {
        let mut game = started(10, 6);
        play(&mut game, &balls);
        game.take_events();

        let innings = game.current_innings().unwrap();
        prop_assert_eq!(&ScoreBook::rebuild(innings.overs()), innings.score_book());

        let json = serde_json::to_string(&game).unwrap();
        let mut restored = Match::from_json(&json).unwrap();
        prop_assert_eq!(&restored, &game);
        prop_assert_eq!(serde_json::to_string(&restored).unwrap(), json);

        restored.rehydrate();
        prop_assert_eq!(&restored, &game);
    }

    /// The target is fixed when the chase opens and the result follows it
    #[test]
    fn target_never_changes_during_the_chase(
        first in prop::collection::vec(ball(), 1..40),
        second in prop::collection::vec(ball(), 1..60),
    ) {
        let mut game = started(5, 5);
        play(&mut game, &first);
        if !game.current_innings().unwrap().is_completed() {
            game.end_innings_early().unwrap();
        }
        let target = game.current_innings().unwrap().total_runs() + 1;

        let chase_openers = openers(&game, TeamSide::B);
        game.open_second_innings(chase_openers).unwrap();

        for ball in second {
            if game.status() == MatchStatus::Completed {
                break;
            }
            bowl(&mut game, ball);
            prop_assert_eq!(game.current_innings().unwrap().target(), Some(target));
        }

        let chase = game.current_innings().unwrap();
        if chase.completion() == Some(InningsCompletion::TargetReached) {
            prop_assert!(chase.total_runs() >= target);
            let winner = game.winner();
            prop_assert_eq!(winner.as_deref(), Some("Tigers"));
        }
        if chase.is_completed() {
            prop_assert_eq!(game.status(), MatchStatus::Completed);
            let expected = match chase.total_runs() + 1 {
                runs if runs > target => "Tigers",
                runs if runs == target => "Tied",
                _ => "Lions",
            };
            let winner = game.winner();
            prop_assert_eq!(winner.as_deref(), Some(expected));

            let bowler = chase.current_bowler();
            let err = game.record_delivery(Delivery::dot(bowler)).unwrap_err();
            prop_assert_eq!(err, ScoringError::IllegalDelivery(IllegalDelivery::InningsCompleted));
        }
    }
}
