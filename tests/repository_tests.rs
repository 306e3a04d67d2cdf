//! Repository boundary, cache, writer and session tests


use async_trait::async_trait;
use cim_domain_cricket::persistence::{
    CacheConfig, CachedMatchRepository, InMemoryMatchRepository, MatchCode, MatchRepository,
    MatchSubscription, MatchWriter, RepositoryError, RetryPolicy, WriterConfig,
};
use cim_domain_cricket::{
    AggregateRoot, Delivery, Match, MatchId, RecordingEventPublisher, ScoringSession, TeamSide,
    Toss, TossChoice,
};
use futures::StreamExt;
use mockall::mock;
use pretty_assertions::assert_eq;
use scoring_support::{format, new_match, openers, player, start};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

mock! {
    pub Repository {}

    #[async_trait]
    impl MatchRepository for Repository {
        async fn create(&self, game: &Match) -> Result<MatchCode, RepositoryError>;
        async fn update(&self, id: MatchId, game: &Match) -> Result<(), RepositoryError>;
        async fn get_by_code(&self, code: &MatchCode) -> Result<Option<Match>, RepositoryError>;
        async fn subscribe(&self, id: MatchId) -> Result<MatchSubscription, RepositoryError>;
    }
}

/// In-memory store whose first lookup pauses after reading
struct PausedLookup {
    inner: InMemoryMatchRepository,
    pause: AtomicBool,
    loaded: Notify,
    resume: Notify,
}

#[async_trait]
impl MatchRepository for PausedLookup {
    async fn create(&self, game: &Match) -> Result<MatchCode, RepositoryError> {
        self.inner.create(game).await
    }

    async fn update(&self, id: MatchId, game: &Match) -> Result<(), RepositoryError> {
        self.inner.update(id, game).await
    }

    async fn get_by_code(&self, code: &MatchCode) -> Result<Option<Match>, RepositoryError> {
        let found = self.inner.get_by_code(code).await?;
        if self.pause.swap(false, Ordering::SeqCst) {
            self.loaded.notify_one();
            self.resume.notified().await;
        }
        Ok(found)
    }

    async fn subscribe(&self, id: MatchId) -> Result<MatchSubscription, RepositoryError> {
        self.inner.subscribe(id).await
    }
}

fn coded_match() -> Match {
    let mut game = new_match(format(2, 3));
    game.assign_code(MatchCode::generate());
    game
}

fn quick_writer(retries: u32) -> WriterConfig {
    WriterConfig {
        debounce: Duration::from_millis(20),
        retry: RetryPolicy::fixed(Duration::from_millis(1), retries),
    }
}

/// Subscribers see each accepted update
#[tokio::test]
async fn test_subscription_receives_updates() {
    let repository = InMemoryMatchRepository::new();
    let mut game = new_match(format(2, 3));
    repository.create(&game).await.unwrap();
    let mut updates = repository.subscribe(game.id()).await.unwrap();

    start(&mut game, TeamSide::A);
    repository.update(game.id(), &game).await.unwrap();

    let received = tokio::time::timeout(Duration::from_secs(1), updates.next())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(received.version(), game.version());
    assert_eq!(received.current_innings().unwrap().number(), 1);
}

/// Subscribing to an unknown match fails
#[tokio::test]
async fn test_subscribe_unknown_match() {
    let repository = InMemoryMatchRepository::new();
    let game = new_match(format(2, 3));
    let result = repository.subscribe(game.id()).await;
    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
}

/// Cached lookups skip the store until the entry expires
#[tokio::test]
async fn test_cache_serves_until_ttl() {
    let game = coded_match();
    let code = game.code().cloned().unwrap();
    let loads = Arc::new(AtomicU32::new(0));

    let mut inner = MockRepository::new();
    let counter = loads.clone();
    let stored = game.clone();
    inner.expect_get_by_code().returning(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(stored.clone()))
    });

    let repository = CachedMatchRepository::new(
        inner,
        CacheConfig {
            capacity: 4,
            ttl: Duration::from_millis(50),
        },
    );

    for _ in 0..3 {
        let loaded = repository.get_by_code(&code).await.unwrap().unwrap();
        assert_eq!(loaded.id(), game.id());
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(repository.cached_len().await, 1);

    tokio::time::sleep(Duration::from_millis(80)).await;
    repository.get_by_code(&code).await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

/// An update drops the cached entry for that match
#[tokio::test]
async fn test_cache_invalidated_on_update() {
    let game = coded_match();
    let code = game.code().cloned().unwrap();
    let loads = Arc::new(AtomicU32::new(0));

    let mut inner = MockRepository::new();
    let counter = loads.clone();
    let stored = game.clone();
    inner.expect_get_by_code().returning(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(stored.clone()))
    });
    inner.expect_update().times(1).returning(|_, _| Ok(()));

    let repository = CachedMatchRepository::new(inner, CacheConfig::default());
    repository.get_by_code(&code).await.unwrap();
    repository.update(game.id(), &game).await.unwrap();
    assert_eq!(repository.cached_len().await, 0);

    repository.get_by_code(&code).await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);
}

/// A lookup that overlaps an update does not cache its older snapshot
///
/// ```mermaid
/// sequenceDiagram
///     participant Reader
///     participant Cache
///     participant Writer
///     Reader->>Cache: get_by_code (loads v0, paused)
///     Writer->>Cache: update (v1 stored, entry dropped)
///     Reader-->>Cache: resumes with v0, not cached
///     Reader->>Cache: get_by_code (v1)
/// ```
#[tokio::test]
async fn test_cache_skips_load_overlapping_update() {
    let inner = PausedLookup {
        inner: InMemoryMatchRepository::new(),
        pause: AtomicBool::new(true),
        loaded: Notify::new(),
        resume: Notify::new(),
    };
    let mut game = new_match(format(2, 3));
    let code = inner.create(&game).await.unwrap();
    game.assign_code(code.clone());

    let repository = Arc::new(CachedMatchRepository::new(inner, CacheConfig::default()));
    let reader = {
        let repository = repository.clone();
        let code = code.clone();
        tokio::spawn(async move { repository.get_by_code(&code).await })
    };
    repository.inner().loaded.notified().await;

    start(&mut game, TeamSide::A);
    repository.update(game.id(), &game).await.unwrap();
    repository.inner().resume.notify_one();

    let stale = reader.await.unwrap().unwrap().unwrap();
    assert_eq!(stale.version(), 0);
    assert_eq!(repository.cached_len().await, 0);

    let fresh = repository.get_by_code(&code).await.unwrap().unwrap();
    assert_eq!(fresh.version(), game.version());
    assert_eq!(repository.cached_len().await, 1);
}

/// Unknown codes are not cached
#[tokio::test]
async fn test_cache_skips_misses() {
    let mut inner = MockRepository::new();
    inner.expect_get_by_code().times(2).returning(|_| Ok(None));

    let repository = CachedMatchRepository::new(inner, CacheConfig::default());
    let code = MatchCode::generate();
    assert!(repository.get_by_code(&code).await.unwrap().is_none());
    assert!(repository.get_by_code(&code).await.unwrap().is_none());
    assert_eq!(repository.cached_len().await, 0);
}

/// Transient failures are retried until the write lands
///
/// ```mermaid
/// sequenceDiagram
///     participant W as MatchWriter
///     participant R as Repository
///     W->>R: update (fails)
///     W->>R: update (fails)
///     W->>R: update (ok)
/// ```
#[tokio::test]
async fn test_writer_retries_transient_failures() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut repository = MockRepository::new();
    let counter = attempts.clone();
    repository.expect_update().returning(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(RepositoryError::Storage("connection reset".to_string()))
        } else {
            Ok(())
        }
    });

    let writer = MatchWriter::spawn(Arc::new(repository), quick_writer(3));
    let warnings = writer.warnings();
    writer.submit(&coded_match());
    writer.shutdown().await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(warnings.borrow().is_none());
}

/// A write that keeps failing becomes a warning, not an error
#[tokio::test]
async fn test_writer_warns_after_retries_exhausted() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut repository = MockRepository::new();
    let counter = attempts.clone();
    repository.expect_update().returning(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(RepositoryError::Storage("disk full".to_string()))
    });

    let game = coded_match();
    let writer = MatchWriter::spawn(Arc::new(repository), quick_writer(2));
    let warnings = writer.warnings();
    writer.submit(&game);
    writer.shutdown().await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    let warning = warnings.borrow().clone().unwrap();
    assert_eq!(warning.match_id, game.id());
    assert_eq!(warning.attempts, 3);
    assert!(warning.error.contains("disk full"));
}

/// A stale snapshot is dropped at once
#[tokio::test]
async fn test_writer_does_not_retry_conflicts() {
    let attempts = Arc::new(AtomicU32::new(0));
    let mut repository = MockRepository::new();
    let counter = attempts.clone();
    repository.expect_update().returning(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(RepositoryError::VersionConflict {
            stored: 5,
            incoming: 0,
        })
    });

    let writer = MatchWriter::spawn(Arc::new(repository), quick_writer(3));
    let warnings = writer.warnings();
    writer.submit(&coded_match());
    writer.shutdown().await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(warnings.borrow().as_ref().map(|w| w.attempts), Some(1));
}

/// A burst of snapshots is written once, latest wins
#[tokio::test]
async fn test_writer_coalesces_bursts() {
    let writes = Arc::new(AtomicU32::new(0));
    let written_version = Arc::new(AtomicU64::new(0));
    let mut repository = MockRepository::new();
    let (counter, version) = (writes.clone(), written_version.clone());
    repository.expect_update().returning(move |_, game| {
        counter.fetch_add(1, Ordering::SeqCst);
        version.store(game.version(), Ordering::SeqCst);
        Ok(())
    });

    let writer = MatchWriter::spawn(
        Arc::new(repository),
        WriterConfig {
            debounce: Duration::from_millis(100),
            ..WriterConfig::default()
        },
    );

    let mut game = coded_match();
    start(&mut game, TeamSide::A);
    let bowler = player(&game, TeamSide::B, 0);
    writer.submit(&game);
    for _ in 0..4 {
        game.record_delivery(Delivery::runs(2, bowler)).unwrap();
        writer.submit(&game);
    }
    writer.shutdown().await;

    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(written_version.load(Ordering::SeqCst), game.version());
}

/// Live scoring through a session ends with the final state stored
#[tokio::test]
async fn test_session_end_to_end() {
    let repository = Arc::new(InMemoryMatchRepository::new());
    let publisher = RecordingEventPublisher::new();
    let writer = MatchWriter::spawn(repository.clone(), quick_writer(1));

    let mut session = ScoringSession::new(new_match(format(1, 3)), publisher.clone(), writer);
    let code = session.register(repository.as_ref()).await.unwrap();
    assert_eq!(session.game().code(), Some(&code));

    let chosen = openers(session.game(), TeamSide::A);
    let toss = Toss {
        winner: TeamSide::A,
        choice: TossChoice::Bat,
    };
    session.start(toss, chosen).unwrap();
    let bowler = player(session.game(), TeamSide::B, 0);

    for runs in [1, 4, 0] {
        session.record_delivery(Delivery::runs(runs, bowler)).unwrap();
    }
    let published = publisher.published_events().len();
    let wrong_bowler = player(session.game(), TeamSide::B, 1);
    session
        .record_delivery(Delivery::runs(6, wrong_bowler))
        .unwrap_err();
    assert_eq!(publisher.published_events().len(), published);

    let warnings = session.persistence_warnings();
    let id = session.game().id();
    let game = session.close().await;

    let types = publisher.event_types();
    assert_eq!(types.first(), Some(&"MatchCreated"));
    assert_eq!(types.iter().filter(|t| **t == "DeliveryRecorded").count(), 3);
    assert!(warnings.borrow().is_none());

    let document = repository.document(id).await.unwrap();
    let stored = Match::from_json(&document).unwrap();
    assert_eq!(stored, game);
    assert_eq!(stored.current_innings().unwrap().total_runs(), 5);

    let by_code = repository.get_by_code(&code).await.unwrap().unwrap();
    assert_eq!(by_code.version(), game.version());
}
