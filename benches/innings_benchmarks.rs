use cim_domain_cricket::{
    Delivery, ExtraKind, FormatConfiguration, Identity, Match, Openers, PlayerRef, TeamSheet,
    TeamSide, Toss, TossChoice, WicketKind,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn player(game: &Match, side: TeamSide, i: usize) -> PlayerRef {
    PlayerRef::Player(game.team(side).players[i].id)
}

fn started_match(overs: u32) -> Match {
    let format = FormatConfiguration::builder()
        .overs(overs)
        .players_per_team(11)
        .build()
        .unwrap();
    let sheet = |name: &str| (0..11).fold(TeamSheet::new(name), |s, i| s.player(format!("{name} {i}")));
    let mut game = Match::create(format, [sheet("Lions"), sheet("Tigers")], Identity::guest()).unwrap();

    let openers = Openers::pair(
        player(&game, TeamSide::A, 0),
        player(&game, TeamSide::A, 1),
        player(&game, TeamSide::B, 0),
    );
    let toss = Toss {
        winner: TeamSide::A,
        choice: TossChoice::Bat,
    };
    game.start(toss, openers).unwrap();
    game.take_events();
    game
}

fn random_delivery(rng: &mut StdRng, bowler: PlayerRef) -> Delivery {
    match rng.gen_range(0..100) {
        0..=3 => Delivery::wicket(WicketKind::Caught, bowler),
        4..=7 => Delivery::extra(ExtraKind::Wide, rng.gen_range(0..=2), bowler),
        8..=9 => Delivery::extra(ExtraKind::NoBall, rng.gen_range(0..=4), bowler),
        _ => Delivery::runs(rng.gen_range(0..=6), bowler),
    }
}

/// Bowl random deliveries until the innings ends
fn play_innings(game: &mut Match, rng: &mut StdRng) {
    loop {
        let innings = game.current_innings().unwrap();
        if innings.is_completed() {
            return;
        }
        if innings.current_over().is_some_and(|over| over.completed) {
            let next = (innings.completed_overs() % 2) as usize;
            let bowler = player(game, innings.bowling_side(), next);
            game.change_bowler(bowler).unwrap();
        }

        let bowler = game.current_bowler().unwrap();
        let outcome = game.record_delivery(random_delivery(rng, bowler)).unwrap();
        if let (Some(out), None) = (outcome.dismissed, outcome.innings_completed) {
            let next = game.eligible_batsmen()[0];
            game.change_batsman(out, next).unwrap();
        }
    }
}

fn benchmark_delivery_processing(c: &mut Criterion) {
    let mut group = c.benchmark_group("delivery_processing");

    for overs in [5, 20, 50] {
        group.bench_with_input(BenchmarkId::new("full_innings", overs), &overs, |b, &overs| {
            b.iter_batched(
                || (started_match(overs), StdRng::seed_from_u64(7)),
                |(mut game, mut rng)| {
                    play_innings(&mut game, &mut rng);
                    black_box(game.current_innings().map(|i| i.total_runs()))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn benchmark_cold_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_replay");

    for overs in [5, 20, 50] {
        let mut game = started_match(overs);
        play_innings(&mut game, &mut StdRng::seed_from_u64(11));
        let json = serde_json::to_string(&game).unwrap();

        group.bench_with_input(BenchmarkId::new("from_json", overs), &json, |b, json| {
            b.iter(|| black_box(Match::from_json(json).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("rehydrate", overs), &game, |b, game| {
            b.iter_batched(
                || game.clone(),
                |mut game| {
                    game.rehydrate();
                    black_box(game)
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_delivery_processing, benchmark_cold_replay);
criterion_main!(benches);
