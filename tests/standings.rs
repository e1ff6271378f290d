//! End-to-end standings: seed teams and completed games, replay, and check
//! the persisted rows.

use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use gridfeed_backend::db::{self, GameUpsert};
use gridfeed_backend::models::GameStatus;
use gridfeed_backend::services::standings::compute_standings;

async fn test_pool() -> SqlitePool {
    // One connection: each in-memory SQLite connection is its own database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::init_schema(&pool).await.expect("schema");
    pool
}

async fn seed_afc_west(pool: &SqlitePool) {
    for (espn_id, abbr, name, city) in [
        (1, "KC", "Kansas City Chiefs", "Kansas City"),
        (2, "DEN", "Denver Broncos", "Denver"),
        (3, "LV", "Las Vegas Raiders", "Las Vegas"),
        (4, "LAC", "Los Angeles Chargers", "Los Angeles"),
    ] {
        db::upsert_team(pool, espn_id, abbr, name, city).await.unwrap();
    }
    db::nfl::curate_team_metadata(pool).await.unwrap();
}

async fn team_id(pool: &SqlitePool, abbr: &str) -> String {
    db::get_team_by_abbr(pool, abbr).await.unwrap().unwrap().id
}

async fn completed_game(
    pool: &SqlitePool,
    espn_id: &str,
    week: i64,
    home: &str,
    away: &str,
    home_score: i64,
    away_score: i64,
) {
    let home_id = team_id(pool, home).await;
    let away_id = team_id(pool, away).await;
    let kickoff = Utc
        .with_ymd_and_hms(2024, 9, 1 + week as u32, 17, 0, 0)
        .unwrap();
    db::upsert_game(
        pool,
        &GameUpsert {
            espn_id,
            season: 2024,
            week,
            kickoff,
            home_team_id: &home_id,
            away_team_id: &away_id,
            home_score: Some(home_score),
            away_score: Some(away_score),
            status: GameStatus::Completed,
            status_detail: Some("Final"),
            period: Some(4),
            clock: Some("0:00"),
            venue_name: None,
            venue_city: None,
            attendance: None,
            playoff_round: None,
        },
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn standings_replay_ranks_and_seeds() {
    let pool = test_pool().await;
    seed_afc_west(&pool).await;

    completed_game(&pool, "g1", 1, "KC", "DEN", 30, 10).await;
    completed_game(&pool, "g2", 1, "LV", "LAC", 20, 17).await;
    completed_game(&pool, "g3", 2, "KC", "LV", 27, 20).await;
    completed_game(&pool, "g4", 2, "DEN", "LAC", 24, 21).await;

    let written = compute_standings(&pool, 2024, 2).await.unwrap();
    assert_eq!(written, 4);

    let standings = db::get_standings(&pool, 2024, 2).await.unwrap();
    assert_eq!(standings.len(), 4);

    let kc_id = team_id(&pool, "KC").await;
    let kc = standings.iter().find(|s| s.team_id == kc_id).unwrap();
    assert_eq!((kc.wins, kc.losses, kc.ties), (2, 0, 0));
    assert_eq!(kc.streak, "W2");
    assert_eq!(kc.division_rank, Some(1));
    assert_eq!(kc.playoff_seed, Some(1));
    assert_eq!(kc.points_for, 57);
    assert_eq!(kc.points_against, 30);
    // Intra-division games count toward the division split.
    assert_eq!(kc.division_wins, 2);

    // Division ranks form a dense permutation of 1..4.
    let mut ranks: Vec<i64> = standings.iter().filter_map(|s| s.division_rank).collect();
    ranks.sort_unstable();
    assert_eq!(ranks, vec![1, 2, 3, 4]);

    // Every team satisfies wins + losses + ties <= games played.
    for s in &standings {
        assert!(s.wins + s.losses + s.ties <= 2);
    }

    // No more than seven seeds per conference.
    let seeded = standings.iter().filter(|s| s.playoff_seed.is_some()).count();
    assert!(seeded <= 7);
}

#[tokio::test]
async fn recomputation_is_idempotent() {
    let pool = test_pool().await;
    seed_afc_west(&pool).await;
    completed_game(&pool, "g1", 1, "KC", "DEN", 14, 7).await;

    compute_standings(&pool, 2024, 1).await.unwrap();
    let first = db::get_standings(&pool, 2024, 1).await.unwrap();

    compute_standings(&pool, 2024, 1).await.unwrap();
    let second = db::get_standings(&pool, 2024, 1).await.unwrap();

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.team_id, b.team_id);
        assert_eq!(a.wins, b.wins);
        assert_eq!(a.division_rank, b.division_rank);
        assert_eq!(a.playoff_seed, b.playoff_seed);
    }
}

#[tokio::test]
async fn ties_count_as_half_wins() {
    let pool = test_pool().await;
    seed_afc_west(&pool).await;
    completed_game(&pool, "g1", 1, "KC", "DEN", 20, 20).await;

    compute_standings(&pool, 2024, 1).await.unwrap();
    let standings = db::get_standings(&pool, 2024, 1).await.unwrap();
    let kc_id = team_id(&pool, "KC").await;
    let kc = standings.iter().find(|s| s.team_id == kc_id).unwrap();

    assert_eq!(kc.ties, 1);
    assert!((kc.win_pct - 0.5).abs() < f64::EPSILON);
    assert_eq!(kc.streak, "T1");
}
