//! Upsert semantics: natural keys, idempotency, forward-only game status,
//! contiguous scoring sequences, and the player resolution ladder.

use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use gridfeed_backend::db::{self, GameUpsert, PlayerUpsert};
use gridfeed_backend::ingest::resolver::Resolver;
use gridfeed_backend::models::{GameStatus, ScoringPlay};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::init_schema(&pool).await.expect("schema");
    pool
}

async fn seed_team(pool: &SqlitePool, espn_id: i64, abbr: &str) -> String {
    db::upsert_team(pool, espn_id, abbr, abbr, "").await.unwrap();
    db::get_team_by_abbr(pool, abbr).await.unwrap().unwrap().id
}

fn game<'a>(
    espn_id: &'a str,
    home: &'a str,
    away: &'a str,
    status: GameStatus,
    scores: Option<(i64, i64)>,
) -> GameUpsert<'a> {
    GameUpsert {
        espn_id,
        season: 2024,
        week: 1,
        kickoff: Utc.with_ymd_and_hms(2024, 9, 8, 17, 0, 0).unwrap(),
        home_team_id: home,
        away_team_id: away,
        home_score: scores.map(|s| s.0),
        away_score: scores.map(|s| s.1),
        status,
        status_detail: None,
        period: None,
        clock: None,
        venue_name: Some("Arrowhead"),
        venue_city: Some("Kansas City"),
        attendance: None,
        playoff_round: None,
    }
}

#[tokio::test]
async fn game_upsert_is_idempotent_on_external_id() {
    let pool = test_pool().await;
    let kc = seed_team(&pool, 1, "KC").await;
    let det = seed_team(&pool, 2, "DET").await;

    let upsert = game("401001", &kc, &det, GameStatus::Scheduled, None);
    db::upsert_game(&pool, &upsert).await.unwrap();
    db::upsert_game(&pool, &upsert).await.unwrap();

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn game_status_never_regresses() {
    let pool = test_pool().await;
    let kc = seed_team(&pool, 1, "KC").await;
    let det = seed_team(&pool, 2, "DET").await;

    db::upsert_game(
        &pool,
        &game("401001", &kc, &det, GameStatus::Completed, Some((20, 21))),
    )
    .await
    .unwrap();

    // A stale feed claims the game is back to scheduled with no scores.
    db::upsert_game(&pool, &game("401001", &kc, &det, GameStatus::Scheduled, None))
        .await
        .unwrap();

    let stored = db::get_game_by_espn_id(&pool, "401001").await.unwrap().unwrap();
    assert_eq!(stored.status, "completed");
    assert_eq!(stored.home_score, Some(20));
    assert_eq!(stored.away_score, Some(21));
    // Venue snapshot survives too.
    assert_eq!(stored.venue_name.as_deref(), Some("Arrowhead"));
}

#[tokio::test]
async fn scoring_sequences_stay_contiguous_after_resync() {
    let pool = test_pool().await;
    let kc = seed_team(&pool, 1, "KC").await;
    let det = seed_team(&pool, 2, "DET").await;
    db::upsert_game(
        &pool,
        &game("401001", &kc, &det, GameStatus::Completed, Some((13, 7))),
    )
    .await
    .unwrap();
    let game_id = db::get_game_by_espn_id(&pool, "401001")
        .await
        .unwrap()
        .unwrap()
        .id;

    let play = |seq: i64, points: i64| ScoringPlay {
        game_id: game_id.clone(),
        sequence_number: seq,
        quarter: Some(1),
        clock: None,
        team_id: None,
        play_type: if points == 6 { "TD".into() } else { "FG".into() },
        points,
        scoring_player_id: None,
        assist_player_id: None,
        scoring_player_name: None,
        assist_player_name: None,
        description: "test play".into(),
        home_score_after: 0,
        away_score_after: 0,
    };

    db::replace_scoring_plays(&pool, &game_id, &[play(1, 6), play(2, 1), play(3, 3)])
        .await
        .unwrap();

    // A resync finds only two plays; the old third row must not linger.
    db::replace_scoring_plays(&pool, &game_id, &[play(1, 6), play(2, 3)])
        .await
        .unwrap();

    let stored = db::get_scoring_plays(&pool, &game_id).await.unwrap();
    let sequences: Vec<i64> = stored.iter().map(|p| p.sequence_number).collect();
    assert_eq!(sequences, vec![1, 2]);
}

#[tokio::test]
async fn player_resolution_ladder() {
    let pool = test_pool().await;
    let kc = seed_team(&pool, 1, "KC").await;
    let cin = seed_team(&pool, 2, "CIN").await;

    db::upsert_player(
        &pool,
        &PlayerUpsert {
            espn_id: 3139477,
            name: "Patrick Mahomes",
            position: Some("QB"),
            team_id: Some(&kc),
            jersey_number: Some(15),
            height_inches: Some(74),
            weight_pounds: Some(225),
            birth_date: None,
            birth_city: None,
            birth_state: None,
            college: None,
            draft_year: Some(2017),
            draft_round: Some(1),
            draft_pick: Some(10),
            status: "active",
        },
    )
    .await
    .unwrap();

    let mut resolver = Resolver::new();

    // Rung 1: exact case-insensitive name with team.
    let hit = resolver
        .player(&pool, "patrick mahomes", Some(&kc))
        .await
        .unwrap();
    assert!(hit.is_some());

    // Rung 2: last-name substring with the same team.
    let hit = resolver.player(&pool, "P. Mahomes", Some(&kc)).await.unwrap();
    assert!(hit.is_some());

    // Rung 3: exact name, wrong team hint (mid-season trade shape).
    let hit = resolver
        .player(&pool, "Patrick Mahomes", Some(&cin))
        .await
        .unwrap();
    assert!(hit.is_some());

    // No rung matches: the caller records a skip.
    let miss = resolver.player(&pool, "X. Unknown", Some(&kc)).await.unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn import_progress_tracks_lifecycle() {
    let pool = test_pool().await;

    db::mark_progress(&pool, 2023, "stats", "in_progress", 0, None)
        .await
        .unwrap();
    let row = db::get_progress(&pool, 2023, "stats").await.unwrap().unwrap();
    assert_eq!(row.status, "in_progress");
    assert!(row.started_at.is_some());
    assert!(row.completed_at.is_none());

    db::mark_progress(&pool, 2023, "stats", "completed", 1422, None)
        .await
        .unwrap();
    let row = db::get_progress(&pool, 2023, "stats").await.unwrap().unwrap();
    assert_eq!(row.status, "completed");
    assert_eq!(row.records_processed, 1422);
    assert!(row.started_at.is_some());
    assert!(row.completed_at.is_some());
}
