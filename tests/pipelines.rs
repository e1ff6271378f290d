//! CSV pipeline ingestion against an in-memory store: typed coercion through
//! to the tables, season rollups, the regular-season filter, unresolved-row
//! skips, and re-run idempotency.

use std::io::Cursor;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use gridfeed_backend::db::{self, PlayerUpsert};
use gridfeed_backend::ingest::csv::RowCursor;
use gridfeed_backend::ingest::{ngs, weekly_stats};

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    db::init_schema(&pool).await.expect("schema");
    pool
}

fn rows(data: &str) -> RowCursor<Cursor<Vec<u8>>> {
    RowCursor::new(Cursor::new(data.as_bytes().to_vec())).expect("csv cursor")
}

async fn seed_mahomes(pool: &SqlitePool) -> String {
    db::upsert_team(pool, 12, "KC", "Kansas City Chiefs", "Kansas City")
        .await
        .unwrap();
    let team = db::get_team_by_abbr(pool, "KC").await.unwrap().unwrap();
    db::upsert_player(
        pool,
        &PlayerUpsert {
            espn_id: 3139477,
            name: "Patrick Mahomes",
            position: Some("QB"),
            team_id: Some(&team.id),
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
    db::find_player_by_name(pool, "Patrick Mahomes")
        .await
        .unwrap()
        .unwrap()
        .id
}

const WEEKLY_CSV: &str = "\
player_id,player_display_name,recent_team,season_type,week,completions,attempts,passing_yards,passing_tds,interceptions,carries,rushing_yards,rushing_tds,receptions,targets,receiving_yards,receiving_tds
00-0033873,Patrick Mahomes,KC,REG,1,25,30,300,3,0,4,18,0,0,0,0,0
00-0033873,Patrick Mahomes,KC,REG,2,20,28,250,1,1,2,9,0,0,0,0,0
00-0033873,Patrick Mahomes,KC,POST,19,30,40,320,2,0,1,3,0,0,0,0,0
00-9999999,X. Unknown,ABC,REG,1,0,0,0,0,0,10,44,1,0,0,0,0
";

#[tokio::test]
async fn weekly_stats_aggregate_into_season_rollups() {
    let pool = test_pool().await;
    let player_id = seed_mahomes(&pool).await;

    let report = weekly_stats::ingest_rows(&pool, rows(WEEKLY_CSV), 2024)
        .await
        .unwrap();
    // Two regular-season rows land; the unresolved row is skipped, the
    // postseason row is filtered before it counts.
    assert_eq!(report.upserted, 2);
    assert_eq!(report.skipped, 1);

    let week1_yards: i64 = sqlx::query_scalar(
        "SELECT passing_yards FROM game_stats WHERE player_id = ? AND season = 2024 AND week = 1",
    )
    .bind(&player_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(week1_yards, 300);

    let rollup = db::get_season_stats(&pool, &player_id, 2024)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rollup.games_played, 2);
    assert_eq!(rollup.completions, 45);
    assert_eq!(rollup.pass_attempts, 58);
    assert_eq!(rollup.passing_yards, 550);
    assert_eq!(rollup.passing_tds, 4);
    assert_eq!(rollup.interceptions, 1);
    assert!((rollup.rushing_avg - 27.0 / 6.0).abs() < 1e-9);
    let rating = rollup.passer_rating.unwrap();
    assert!(rating > 0.0 && rating <= 158.4);

    // The cross-source id from the file is stamped onto the player row.
    let by_gsis = db::get_player_by_gsis_id(&pool, "00-0033873")
        .await
        .unwrap();
    assert_eq!(by_gsis.map(|p| p.id), Some(player_id.clone()));

    // Re-running the same file changes nothing.
    weekly_stats::ingest_rows(&pool, rows(WEEKLY_CSV), 2024)
        .await
        .unwrap();
    let line_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM game_stats WHERE player_id = ? AND season = 2024",
    )
    .bind(&player_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(line_count, 2);
    let rollup_again = db::get_season_stats(&pool, &player_id, 2024)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rollup_again.passing_yards, rollup.passing_yards);
}

const NGS_CSV: &str = "\
season_type,week,player_display_name,player_gsis_id,team_abbr,avg_time_to_throw,avg_intended_air_yards,completion_percentage_above_expectation,aggressiveness
REG,0,Patrick Mahomes,00-0033873,KC,2.81,7.4,3.2,15.1
REG,3,Patrick Mahomes,00-0033873,KC,2.65,8.0,4.0,17.9
POST,20,Patrick Mahomes,00-0033873,KC,2.50,9.1,5.0,20.0
";

#[tokio::test]
async fn ngs_season_totals_stay_unique_across_reruns() {
    let pool = test_pool().await;
    let player_id = seed_mahomes(&pool).await;

    ngs::ingest_rows(&pool, rows(NGS_CSV), 2024, "passing")
        .await
        .unwrap();
    // Week 0 became the week-NULL season total; running again must not
    // duplicate it.
    ngs::ingest_rows(&pool, rows(NGS_CSV), 2024, "passing")
        .await
        .unwrap();

    let total_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM advanced_stats WHERE player_id = ? AND season = 2024",
    )
    .bind(&player_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(total_rows, 2);

    let season_total_rows: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM advanced_stats
         WHERE player_id = ? AND season = 2024 AND week IS NULL AND stat_type = 'passing'",
    )
    .bind(&player_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(season_total_rows, 1);
}
