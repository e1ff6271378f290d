pub mod nfl;
pub mod schema;

pub use schema::init_schema;

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use uuid::Uuid;

use crate::config::Config;
use crate::models::*;

pub async fn create_pool(config: &Config) -> Result<SqlitePool> {
    let database_url = &config.database_url;

    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if file_path != ":memory:" {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_conns)
        .min_connections(config.min_conns)
        .connect_with(options)
        .await?;
    Ok(pool)
}

// ── Teams ─────────────────────────────────────────────────────────────────────

/// Insert a skeleton team row from the events feed. Conference/division stay
/// blank until the metadata curation pass fills them.
pub async fn upsert_team(
    pool: &SqlitePool,
    espn_id: i64,
    abbreviation: &str,
    name: &str,
    city: &str,
) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO teams (id, espn_id, abbreviation, name, city, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (espn_id) DO UPDATE SET
               abbreviation = excluded.abbreviation,
               name = excluded.name,
               city = excluded.city,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(espn_id)
    .bind(abbreviation)
    .bind(name)
    .bind(city)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_team_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Team>> {
    let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}

pub async fn get_team_by_espn_id(pool: &SqlitePool, espn_id: i64) -> Result<Option<Team>> {
    let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE espn_id = ?")
        .bind(espn_id)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}

pub async fn get_team_by_abbr(pool: &SqlitePool, abbr: &str) -> Result<Option<Team>> {
    let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE abbreviation = ?")
        .bind(abbr)
        .fetch_optional(pool)
        .await?;
    Ok(team)
}

pub async fn get_all_teams(pool: &SqlitePool) -> Result<Vec<Team>> {
    let teams = sqlx::query_as::<_, Team>(
        "SELECT * FROM teams ORDER BY conference, division, abbreviation",
    )
    .fetch_all(pool)
    .await?;
    Ok(teams)
}

// ── Players ───────────────────────────────────────────────────────────────────

pub struct PlayerUpsert<'a> {
    pub espn_id: i64,
    pub name: &'a str,
    pub position: Option<&'a str>,
    pub team_id: Option<&'a str>,
    pub jersey_number: Option<i64>,
    pub height_inches: Option<i64>,
    pub weight_pounds: Option<i64>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub birth_city: Option<&'a str>,
    pub birth_state: Option<&'a str>,
    pub college: Option<&'a str>,
    pub draft_year: Option<i64>,
    pub draft_round: Option<i64>,
    pub draft_pick: Option<i64>,
    pub status: &'a str,
}

pub async fn upsert_player(pool: &SqlitePool, p: &PlayerUpsert<'_>) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO players
           (id, espn_id, name, position, team_id, jersey_number, height_inches, weight_pounds,
            birth_date, birth_city, birth_state, college, draft_year, draft_round, draft_pick,
            status, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (espn_id) DO UPDATE SET
               name = excluded.name,
               position = excluded.position,
               team_id = excluded.team_id,
               jersey_number = excluded.jersey_number,
               height_inches = excluded.height_inches,
               weight_pounds = excluded.weight_pounds,
               birth_date = COALESCE(excluded.birth_date, players.birth_date),
               birth_city = COALESCE(excluded.birth_city, players.birth_city),
               birth_state = COALESCE(excluded.birth_state, players.birth_state),
               college = COALESCE(excluded.college, players.college),
               draft_year = COALESCE(excluded.draft_year, players.draft_year),
               draft_round = COALESCE(excluded.draft_round, players.draft_round),
               draft_pick = COALESCE(excluded.draft_pick, players.draft_pick),
               status = excluded.status,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(p.espn_id)
    .bind(p.name)
    .bind(p.position)
    .bind(p.team_id)
    .bind(p.jersey_number)
    .bind(p.height_inches)
    .bind(p.weight_pounds)
    .bind(p.birth_date)
    .bind(p.birth_city)
    .bind(p.birth_state)
    .bind(p.college)
    .bind(p.draft_year)
    .bind(p.draft_round)
    .bind(p.draft_pick)
    .bind(p.status)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_player_gsis_id(pool: &SqlitePool, player_id: &str, gsis_id: &str) -> Result<()> {
    sqlx::query("UPDATE players SET gsis_id = ?, updated_at = ? WHERE id = ? AND gsis_id IS NULL")
        .bind(gsis_id)
        .bind(Utc::now())
        .bind(player_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_player_yahoo_key(
    pool: &SqlitePool,
    player_id: &str,
    yahoo_key: &str,
) -> Result<()> {
    sqlx::query("UPDATE players SET yahoo_key = ?, updated_at = ? WHERE id = ? AND yahoo_key IS NULL")
        .bind(yahoo_key)
        .bind(Utc::now())
        .bind(player_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_player_by_name_and_team(
    pool: &SqlitePool,
    name: &str,
    team_id: &str,
) -> Result<Option<Player>> {
    let player = sqlx::query_as::<_, Player>(
        "SELECT * FROM players WHERE LOWER(name) = LOWER(?) AND team_id = ? LIMIT 1",
    )
    .bind(name)
    .bind(team_id)
    .fetch_optional(pool)
    .await?;
    Ok(player)
}

pub async fn find_player_by_lastname_and_team(
    pool: &SqlitePool,
    last_name: &str,
    team_id: &str,
) -> Result<Option<Player>> {
    let player = sqlx::query_as::<_, Player>(
        "SELECT * FROM players WHERE name LIKE ? AND team_id = ? LIMIT 1",
    )
    .bind(format!("%{}%", last_name))
    .bind(team_id)
    .fetch_optional(pool)
    .await?;
    Ok(player)
}

pub async fn find_player_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Player>> {
    let player =
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE LOWER(name) = LOWER(?) LIMIT 1")
            .bind(name)
            .fetch_optional(pool)
            .await?;
    Ok(player)
}

pub async fn get_player_by_gsis_id(pool: &SqlitePool, gsis_id: &str) -> Result<Option<Player>> {
    let player = sqlx::query_as::<_, Player>("SELECT * FROM players WHERE gsis_id = ? LIMIT 1")
        .bind(gsis_id)
        .fetch_optional(pool)
        .await?;
    Ok(player)
}

// ── Games ─────────────────────────────────────────────────────────────────────

pub struct GameUpsert<'a> {
    pub espn_id: &'a str,
    pub season: i64,
    pub week: i64,
    pub kickoff: DateTime<Utc>,
    pub home_team_id: &'a str,
    pub away_team_id: &'a str,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub status: GameStatus,
    pub status_detail: Option<&'a str>,
    pub period: Option<i64>,
    pub clock: Option<&'a str>,
    pub venue_name: Option<&'a str>,
    pub venue_city: Option<&'a str>,
    pub attendance: Option<i64>,
    pub playoff_round: Option<&'a str>,
}

/// Scoreboard upsert. The venue snapshot is written once on insert; scores,
/// status, period, clock and attendance refresh on update. Status never moves
/// backwards, and a regressing feed cannot null out recorded scores.
pub async fn upsert_game(pool: &SqlitePool, g: &GameUpsert<'_>) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO games
           (id, espn_id, season, week, kickoff, home_team_id, away_team_id,
            home_score, away_score, status, status_detail, period, clock,
            venue_name, venue_city, attendance, playoff_round, created_at, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (espn_id) DO UPDATE SET
               season = excluded.season,
               week = excluded.week,
               kickoff = excluded.kickoff,
               home_score = COALESCE(excluded.home_score, games.home_score),
               away_score = COALESCE(excluded.away_score, games.away_score),
               status = CASE
                   WHEN (CASE excluded.status WHEN 'completed' THEN 2 WHEN 'in_progress' THEN 1 ELSE 0 END)
                      > (CASE games.status WHEN 'completed' THEN 2 WHEN 'in_progress' THEN 1 ELSE 0 END)
                   THEN excluded.status ELSE games.status END,
               status_detail = COALESCE(excluded.status_detail, games.status_detail),
               period = COALESCE(excluded.period, games.period),
               clock = COALESCE(excluded.clock, games.clock),
               attendance = COALESCE(excluded.attendance, games.attendance),
               playoff_round = COALESCE(excluded.playoff_round, games.playoff_round),
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(g.espn_id)
    .bind(g.season)
    .bind(g.week)
    .bind(g.kickoff)
    .bind(g.home_team_id)
    .bind(g.away_team_id)
    .bind(g.home_score)
    .bind(g.away_score)
    .bind(g.status.as_str())
    .bind(g.status_detail)
    .bind(g.period)
    .bind(g.clock)
    .bind(g.venue_name)
    .bind(g.venue_city)
    .bind(g.attendance)
    .bind(g.playoff_round)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_game_by_espn_id(pool: &SqlitePool, espn_id: &str) -> Result<Option<Game>> {
    let game = sqlx::query_as::<_, Game>("SELECT * FROM games WHERE espn_id = ?")
        .bind(espn_id)
        .fetch_optional(pool)
        .await?;
    Ok(game)
}

pub async fn get_games_for_week(pool: &SqlitePool, season: i64, week: i64) -> Result<Vec<Game>> {
    let games = sqlx::query_as::<_, Game>(
        "SELECT * FROM games WHERE season = ? AND week = ? ORDER BY kickoff",
    )
    .bind(season)
    .bind(week)
    .fetch_all(pool)
    .await?;
    Ok(games)
}

pub async fn get_completed_games_for_week(
    pool: &SqlitePool,
    season: i64,
    week: i64,
) -> Result<Vec<Game>> {
    let games = sqlx::query_as::<_, Game>(
        "SELECT * FROM games WHERE season = ? AND week = ? AND status = 'completed' ORDER BY kickoff",
    )
    .bind(season)
    .bind(week)
    .fetch_all(pool)
    .await?;
    Ok(games)
}

/// Completed games up to and including `week`, in (week, kickoff) order —
/// the replay order the standings engine depends on.
pub async fn get_completed_games_through_week(
    pool: &SqlitePool,
    season: i64,
    week: i64,
) -> Result<Vec<Game>> {
    let games = sqlx::query_as::<_, Game>(
        "SELECT * FROM games WHERE season = ? AND week <= ? AND status = 'completed'
         ORDER BY week, kickoff",
    )
    .bind(season)
    .bind(week)
    .fetch_all(pool)
    .await?;
    Ok(games)
}

pub async fn find_game_id(
    pool: &SqlitePool,
    season: i64,
    week: i64,
    home_team_id: &str,
) -> Result<Option<String>> {
    let id: Option<String> = sqlx::query_scalar(
        "SELECT id FROM games WHERE season = ? AND week = ? AND home_team_id = ? LIMIT 1",
    )
    .bind(season)
    .bind(week)
    .bind(home_team_id)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Home games of a season with no weather recorded yet, joined to stadium
/// coordinates so the enrichment pass can query by location.
pub async fn get_games_missing_weather(pool: &SqlitePool, season: i64) -> Result<Vec<Game>> {
    let games = sqlx::query_as::<_, Game>(
        r#"SELECT g.* FROM games g
           JOIN teams t ON t.id = g.home_team_id
           WHERE g.season = ? AND g.weather_temp IS NULL
             AND t.stadium_lat IS NOT NULL AND t.stadium_lon IS NOT NULL
           ORDER BY g.kickoff"#,
    )
    .bind(season)
    .fetch_all(pool)
    .await?;
    Ok(games)
}

pub struct WeatherUpdate<'a> {
    pub temp_f: f64,
    pub condition: &'a str,
    pub wind_mph: f64,
    pub humidity: f64,
    pub pressure_mb: f64,
    pub visibility_miles: f64,
    pub precip_in: f64,
    pub cloud_pct: f64,
    pub is_day_game: bool,
}

pub async fn update_game_weather(
    pool: &SqlitePool,
    game_id: &str,
    w: &WeatherUpdate<'_>,
) -> Result<()> {
    sqlx::query(
        r#"UPDATE games SET
               weather_temp = ?, weather_condition = ?, weather_wind_mph = ?,
               weather_humidity = ?, weather_pressure_mb = ?, weather_visibility_miles = ?,
               weather_precip_in = ?, weather_cloud_pct = ?, is_day_game = ?, updated_at = ?
           WHERE id = ?"#,
    )
    .bind(w.temp_f)
    .bind(w.condition)
    .bind(w.wind_mph)
    .bind(w.humidity)
    .bind(w.pressure_mb)
    .bind(w.visibility_miles)
    .bind(w.precip_in)
    .bind(w.cloud_pct)
    .bind(w.is_day_game)
    .bind(Utc::now())
    .bind(game_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Schedule-archive enrichment: fills gaps without clobbering what the live
/// feed already wrote.
pub async fn update_game_schedule_fields(
    pool: &SqlitePool,
    game_id: &str,
    playoff_round: Option<&str>,
    venue_name: Option<&str>,
    is_day_game: Option<bool>,
) -> Result<()> {
    sqlx::query(
        r#"UPDATE games SET
               playoff_round = COALESCE(?, playoff_round),
               venue_name = COALESCE(venue_name, ?),
               is_day_game = COALESCE(is_day_game, ?),
               updated_at = ?
           WHERE id = ?"#,
    )
    .bind(playoff_round)
    .bind(venue_name)
    .bind(is_day_game)
    .bind(Utc::now())
    .bind(game_id)
    .execute(pool)
    .await?;
    Ok(())
}

// ── Box scores ────────────────────────────────────────────────────────────────

pub async fn upsert_game_team_stats(pool: &SqlitePool, s: &GameTeamStats) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO game_team_stats
           (id, game_id, team_id, first_downs, total_yards, passing_yards, rushing_yards,
            third_down_attempts, third_down_conversions, third_down_pct,
            fourth_down_attempts, fourth_down_conversions, fourth_down_pct,
            red_zone_attempts, red_zone_conversions, turnovers, fumbles_lost,
            interceptions_thrown, penalties, penalty_yards, possession_time,
            possession_seconds, completions, pass_attempts, rushing_attempts,
            rushing_avg, sacks_allowed, sack_yards_lost, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (game_id, team_id) DO UPDATE SET
               first_downs = excluded.first_downs,
               total_yards = excluded.total_yards,
               passing_yards = excluded.passing_yards,
               rushing_yards = excluded.rushing_yards,
               third_down_attempts = excluded.third_down_attempts,
               third_down_conversions = excluded.third_down_conversions,
               third_down_pct = excluded.third_down_pct,
               fourth_down_attempts = excluded.fourth_down_attempts,
               fourth_down_conversions = excluded.fourth_down_conversions,
               fourth_down_pct = excluded.fourth_down_pct,
               red_zone_attempts = excluded.red_zone_attempts,
               red_zone_conversions = excluded.red_zone_conversions,
               turnovers = excluded.turnovers,
               fumbles_lost = excluded.fumbles_lost,
               interceptions_thrown = excluded.interceptions_thrown,
               penalties = excluded.penalties,
               penalty_yards = excluded.penalty_yards,
               possession_time = excluded.possession_time,
               possession_seconds = excluded.possession_seconds,
               completions = excluded.completions,
               pass_attempts = excluded.pass_attempts,
               rushing_attempts = excluded.rushing_attempts,
               rushing_avg = excluded.rushing_avg,
               sacks_allowed = excluded.sacks_allowed,
               sack_yards_lost = excluded.sack_yards_lost,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&s.game_id)
    .bind(&s.team_id)
    .bind(s.first_downs)
    .bind(s.total_yards)
    .bind(s.passing_yards)
    .bind(s.rushing_yards)
    .bind(s.third_down_attempts)
    .bind(s.third_down_conversions)
    .bind(s.third_down_pct)
    .bind(s.fourth_down_attempts)
    .bind(s.fourth_down_conversions)
    .bind(s.fourth_down_pct)
    .bind(s.red_zone_attempts)
    .bind(s.red_zone_conversions)
    .bind(s.turnovers)
    .bind(s.fumbles_lost)
    .bind(s.interceptions_thrown)
    .bind(s.penalties)
    .bind(s.penalty_yards)
    .bind(&s.possession_time)
    .bind(s.possession_seconds)
    .bind(s.completions)
    .bind(s.pass_attempts)
    .bind(s.rushing_attempts)
    .bind(s.rushing_avg)
    .bind(s.sacks_allowed)
    .bind(s.sack_yards_lost)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_game_team_stats(pool: &SqlitePool, game_id: &str) -> Result<Vec<GameTeamStats>> {
    let rows = sqlx::query_as::<_, GameTeamStats>(
        "SELECT game_id, team_id, first_downs, total_yards, passing_yards, rushing_yards,
                third_down_attempts, third_down_conversions, third_down_pct,
                fourth_down_attempts, fourth_down_conversions, fourth_down_pct,
                red_zone_attempts, red_zone_conversions, turnovers, fumbles_lost,
                interceptions_thrown, penalties, penalty_yards, possession_time,
                possession_seconds, completions, pass_attempts, rushing_attempts,
                rushing_avg, sacks_allowed, sack_yards_lost
         FROM game_team_stats WHERE game_id = ?",
    )
    .bind(game_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ── Player stat lines and rollups ─────────────────────────────────────────────

pub async fn upsert_game_stat_line(pool: &SqlitePool, s: &GameStatLine) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO game_stats
           (id, player_id, season, week, completions, pass_attempts, passing_yards, passing_tds,
            interceptions, rushing_attempts, rushing_yards, rushing_tds, receptions, targets,
            receiving_yards, receiving_tds, tackles, sacks, defensive_ints,
            field_goals_made, field_goals_attempted, extra_points_made, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (player_id, season, week) DO UPDATE SET
               completions = excluded.completions,
               pass_attempts = excluded.pass_attempts,
               passing_yards = excluded.passing_yards,
               passing_tds = excluded.passing_tds,
               interceptions = excluded.interceptions,
               rushing_attempts = excluded.rushing_attempts,
               rushing_yards = excluded.rushing_yards,
               rushing_tds = excluded.rushing_tds,
               receptions = excluded.receptions,
               targets = excluded.targets,
               receiving_yards = excluded.receiving_yards,
               receiving_tds = excluded.receiving_tds,
               tackles = excluded.tackles,
               sacks = excluded.sacks,
               defensive_ints = excluded.defensive_ints,
               field_goals_made = excluded.field_goals_made,
               field_goals_attempted = excluded.field_goals_attempted,
               extra_points_made = excluded.extra_points_made,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&s.player_id)
    .bind(s.season)
    .bind(s.week)
    .bind(s.completions)
    .bind(s.pass_attempts)
    .bind(s.passing_yards)
    .bind(s.passing_tds)
    .bind(s.interceptions)
    .bind(s.rushing_attempts)
    .bind(s.rushing_yards)
    .bind(s.rushing_tds)
    .bind(s.receptions)
    .bind(s.targets)
    .bind(s.receiving_yards)
    .bind(s.receiving_tds)
    .bind(s.tackles)
    .bind(s.sacks)
    .bind(s.defensive_ints)
    .bind(s.field_goals_made)
    .bind(s.field_goals_attempted)
    .bind(s.extra_points_made)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_season_stats(pool: &SqlitePool, s: &PlayerSeasonStats) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO player_season_stats
           (id, player_id, season, games_played, completions, pass_attempts, passing_yards,
            passing_tds, interceptions, passer_rating, rushing_attempts, rushing_yards,
            rushing_tds, rushing_avg, receptions, targets, receiving_yards, receiving_tds,
            receiving_avg, tackles, sacks, defensive_ints, field_goals_made,
            field_goals_attempted, extra_points_made, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (player_id, season) DO UPDATE SET
               games_played = excluded.games_played,
               completions = excluded.completions,
               pass_attempts = excluded.pass_attempts,
               passing_yards = excluded.passing_yards,
               passing_tds = excluded.passing_tds,
               interceptions = excluded.interceptions,
               passer_rating = excluded.passer_rating,
               rushing_attempts = excluded.rushing_attempts,
               rushing_yards = excluded.rushing_yards,
               rushing_tds = excluded.rushing_tds,
               rushing_avg = excluded.rushing_avg,
               receptions = excluded.receptions,
               targets = excluded.targets,
               receiving_yards = excluded.receiving_yards,
               receiving_tds = excluded.receiving_tds,
               receiving_avg = excluded.receiving_avg,
               tackles = excluded.tackles,
               sacks = excluded.sacks,
               defensive_ints = excluded.defensive_ints,
               field_goals_made = excluded.field_goals_made,
               field_goals_attempted = excluded.field_goals_attempted,
               extra_points_made = excluded.extra_points_made,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&s.player_id)
    .bind(s.season)
    .bind(s.games_played)
    .bind(s.completions)
    .bind(s.pass_attempts)
    .bind(s.passing_yards)
    .bind(s.passing_tds)
    .bind(s.interceptions)
    .bind(s.passer_rating)
    .bind(s.rushing_attempts)
    .bind(s.rushing_yards)
    .bind(s.rushing_tds)
    .bind(s.rushing_avg)
    .bind(s.receptions)
    .bind(s.targets)
    .bind(s.receiving_yards)
    .bind(s.receiving_tds)
    .bind(s.receiving_avg)
    .bind(s.tackles)
    .bind(s.sacks)
    .bind(s.defensive_ints)
    .bind(s.field_goals_made)
    .bind(s.field_goals_attempted)
    .bind(s.extra_points_made)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_season_stats(
    pool: &SqlitePool,
    player_id: &str,
    season: i64,
) -> Result<Option<PlayerSeasonStats>> {
    let row = sqlx::query_as::<_, PlayerSeasonStats>(
        "SELECT player_id, season, games_played, completions, pass_attempts, passing_yards,
                passing_tds, interceptions, passer_rating, rushing_attempts, rushing_yards,
                rushing_tds, rushing_avg, receptions, targets, receiving_yards, receiving_tds,
                receiving_avg, tackles, sacks, defensive_ints, field_goals_made,
                field_goals_attempted, extra_points_made
         FROM player_season_stats WHERE player_id = ? AND season = ?",
    )
    .bind(player_id)
    .bind(season)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ── Advanced stats ────────────────────────────────────────────────────────────

/// Season-total rows carry week NULL, which SQLite's unique constraint treats
/// as always-distinct, so those go through delete-then-insert instead of
/// ON CONFLICT.
pub async fn upsert_advanced_stat(pool: &SqlitePool, a: &AdvancedStat) -> Result<()> {
    let now = Utc::now();
    if a.week.is_none() {
        sqlx::query(
            "DELETE FROM advanced_stats
             WHERE player_id = ? AND season = ? AND week IS NULL AND stat_type = ?",
        )
        .bind(&a.player_id)
        .bind(a.season)
        .bind(&a.stat_type)
        .execute(pool)
        .await?;
    }
    sqlx::query(
        r#"INSERT INTO advanced_stats
           (id, player_id, season, week, stat_type, avg_time_to_throw, avg_air_yards,
            completion_pct_above_expectation, aggressiveness, rush_efficiency,
            rush_yards_over_expected, time_to_line_of_scrimmage, avg_separation,
            avg_yac_above_expectation, catch_pct, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (player_id, season, week, stat_type) DO UPDATE SET
               avg_time_to_throw = excluded.avg_time_to_throw,
               avg_air_yards = excluded.avg_air_yards,
               completion_pct_above_expectation = excluded.completion_pct_above_expectation,
               aggressiveness = excluded.aggressiveness,
               rush_efficiency = excluded.rush_efficiency,
               rush_yards_over_expected = excluded.rush_yards_over_expected,
               time_to_line_of_scrimmage = excluded.time_to_line_of_scrimmage,
               avg_separation = excluded.avg_separation,
               avg_yac_above_expectation = excluded.avg_yac_above_expectation,
               catch_pct = excluded.catch_pct,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&a.player_id)
    .bind(a.season)
    .bind(a.week)
    .bind(&a.stat_type)
    .bind(a.avg_time_to_throw)
    .bind(a.avg_air_yards)
    .bind(a.completion_pct_above_expectation)
    .bind(a.aggressiveness)
    .bind(a.rush_efficiency)
    .bind(a.rush_yards_over_expected)
    .bind(a.time_to_line_of_scrimmage)
    .bind(a.avg_separation)
    .bind(a.avg_yac_above_expectation)
    .bind(a.catch_pct)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

// ── Play by play ──────────────────────────────────────────────────────────────

pub async fn upsert_play(pool: &SqlitePool, p: &Play) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO play_by_play
           (id, play_id, game_id, quarter, down, distance, yardline, clock, play_type,
            description, posteam_id, passer_id, rusher_id, receiver_id, yards_gained,
            epa, wpa, touchdown, interception, fumble, home_score_after, away_score_after,
            updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (play_id, game_id) DO UPDATE SET
               quarter = excluded.quarter,
               down = excluded.down,
               distance = excluded.distance,
               yardline = excluded.yardline,
               clock = excluded.clock,
               play_type = excluded.play_type,
               description = excluded.description,
               posteam_id = excluded.posteam_id,
               passer_id = excluded.passer_id,
               rusher_id = excluded.rusher_id,
               receiver_id = excluded.receiver_id,
               yards_gained = excluded.yards_gained,
               epa = excluded.epa,
               wpa = excluded.wpa,
               touchdown = excluded.touchdown,
               interception = excluded.interception,
               fumble = excluded.fumble,
               home_score_after = excluded.home_score_after,
               away_score_after = excluded.away_score_after,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&p.play_id)
    .bind(&p.game_id)
    .bind(p.quarter)
    .bind(p.down)
    .bind(p.distance)
    .bind(p.yardline)
    .bind(&p.clock)
    .bind(&p.play_type)
    .bind(&p.description)
    .bind(&p.posteam_id)
    .bind(&p.passer_id)
    .bind(&p.rusher_id)
    .bind(&p.receiver_id)
    .bind(p.yards_gained)
    .bind(p.epa)
    .bind(p.wpa)
    .bind(p.touchdown)
    .bind(p.interception)
    .bind(p.fumble)
    .bind(p.home_score_after)
    .bind(p.away_score_after)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Rebuild the two play-by-play aggregates for a set of games. Delete plus
/// insert-select keeps the tables consistent with whatever is in play_by_play.
pub async fn refresh_play_aggregates(pool: &SqlitePool, game_ids: &[String]) -> Result<()> {
    let now = Utc::now();
    for game_id in game_ids {
        sqlx::query("DELETE FROM game_play_summary WHERE game_id = ?")
            .bind(game_id)
            .execute(pool)
            .await?;
        sqlx::query(
            r#"INSERT INTO game_play_summary (game_id, total_plays, touchdowns, turnovers, total_epa, updated_at)
               SELECT game_id, COUNT(*),
                      SUM(touchdown),
                      SUM(interception) + SUM(fumble),
                      COALESCE(SUM(epa), 0), ?
               FROM play_by_play WHERE game_id = ? GROUP BY game_id"#,
        )
        .bind(now)
        .bind(game_id)
        .execute(pool)
        .await?;

        sqlx::query("DELETE FROM player_play_stats WHERE game_id = ?")
            .bind(game_id)
            .execute(pool)
            .await?;
        // One row per player touching the ball, whichever role they had.
        sqlx::query(
            r#"INSERT INTO player_play_stats (player_id, game_id, touches, total_epa, success_rate, updated_at)
               SELECT player_id, game_id, COUNT(*),
                      COALESCE(SUM(epa), 0),
                      AVG(CASE WHEN COALESCE(epa, 0) > 0 THEN 1.0 ELSE 0.0 END), ?
               FROM (
                   SELECT passer_id AS player_id, game_id, epa FROM play_by_play
                       WHERE game_id = ? AND passer_id IS NOT NULL
                   UNION ALL
                   SELECT rusher_id, game_id, epa FROM play_by_play
                       WHERE game_id = ? AND rusher_id IS NOT NULL
                   UNION ALL
                   SELECT receiver_id, game_id, epa FROM play_by_play
                       WHERE game_id = ? AND receiver_id IS NOT NULL
               ) GROUP BY player_id, game_id"#,
        )
        .bind(now)
        .bind(game_id)
        .bind(game_id)
        .bind(game_id)
        .execute(pool)
        .await?;
    }
    Ok(())
}

// ── Scoring plays ─────────────────────────────────────────────────────────────

/// Delete-then-reinsert inside one transaction so sequence numbers stay a
/// contiguous 1..K even after a resync shrinks the list.
pub async fn replace_scoring_plays(
    pool: &SqlitePool,
    game_id: &str,
    plays: &[ScoringPlay],
) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM scoring_plays WHERE game_id = ?")
        .bind(game_id)
        .execute(&mut *tx)
        .await?;
    for p in plays {
        sqlx::query(
            r#"INSERT INTO scoring_plays
               (id, game_id, sequence_number, quarter, clock, team_id, play_type, points,
                scoring_player_id, assist_player_id, scoring_player_name, assist_player_name,
                description, home_score_after, away_score_after)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(game_id)
        .bind(p.sequence_number)
        .bind(p.quarter)
        .bind(&p.clock)
        .bind(&p.team_id)
        .bind(&p.play_type)
        .bind(p.points)
        .bind(&p.scoring_player_id)
        .bind(&p.assist_player_id)
        .bind(&p.scoring_player_name)
        .bind(&p.assist_player_name)
        .bind(&p.description)
        .bind(p.home_score_after)
        .bind(p.away_score_after)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn get_scoring_plays(pool: &SqlitePool, game_id: &str) -> Result<Vec<ScoringPlay>> {
    let rows = sqlx::query_as::<_, ScoringPlay>(
        "SELECT game_id, sequence_number, quarter, clock, team_id, play_type, points,
                scoring_player_id, assist_player_id, scoring_player_name, assist_player_name,
                description, home_score_after, away_score_after
         FROM scoring_plays WHERE game_id = ? ORDER BY sequence_number",
    )
    .bind(game_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ── Standings ─────────────────────────────────────────────────────────────────

pub async fn upsert_standing(pool: &SqlitePool, s: &TeamStanding) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        r#"INSERT INTO team_standings
           (id, team_id, season, week, wins, losses, ties, win_pct, home_wins, home_losses,
            away_wins, away_losses, division_wins, division_losses, conference_wins,
            conference_losses, points_for, points_against, point_diff, streak,
            division_rank, conference_rank, playoff_seed, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (team_id, season, week) DO UPDATE SET
               wins = excluded.wins,
               losses = excluded.losses,
               ties = excluded.ties,
               win_pct = excluded.win_pct,
               home_wins = excluded.home_wins,
               home_losses = excluded.home_losses,
               away_wins = excluded.away_wins,
               away_losses = excluded.away_losses,
               division_wins = excluded.division_wins,
               division_losses = excluded.division_losses,
               conference_wins = excluded.conference_wins,
               conference_losses = excluded.conference_losses,
               points_for = excluded.points_for,
               points_against = excluded.points_against,
               point_diff = excluded.point_diff,
               streak = excluded.streak,
               division_rank = excluded.division_rank,
               conference_rank = excluded.conference_rank,
               playoff_seed = excluded.playoff_seed,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&s.team_id)
    .bind(s.season)
    .bind(s.week)
    .bind(s.wins)
    .bind(s.losses)
    .bind(s.ties)
    .bind(s.win_pct)
    .bind(s.home_wins)
    .bind(s.home_losses)
    .bind(s.away_wins)
    .bind(s.away_losses)
    .bind(s.division_wins)
    .bind(s.division_losses)
    .bind(s.conference_wins)
    .bind(s.conference_losses)
    .bind(s.points_for)
    .bind(s.points_against)
    .bind(s.point_diff)
    .bind(&s.streak)
    .bind(s.division_rank)
    .bind(s.conference_rank)
    .bind(s.playoff_seed)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_standings(pool: &SqlitePool, season: i64, week: i64) -> Result<Vec<TeamStanding>> {
    let rows = sqlx::query_as::<_, TeamStanding>(
        "SELECT team_id, season, week, wins, losses, ties, win_pct, home_wins, home_losses,
                away_wins, away_losses, division_wins, division_losses, conference_wins,
                conference_losses, points_for, points_against, point_diff, streak,
                division_rank, conference_rank, playoff_seed
         FROM team_standings WHERE season = ? AND week = ?
         ORDER BY conference_rank",
    )
    .bind(season)
    .bind(week)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ── Injuries and fantasy ──────────────────────────────────────────────────────

pub async fn upsert_injury(pool: &SqlitePool, i: &PlayerInjury) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO player_injuries
           (id, player_id, season, week, status, injury, practice_status, report_date, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (player_id, season, week) DO UPDATE SET
               status = excluded.status,
               injury = excluded.injury,
               practice_status = excluded.practice_status,
               report_date = excluded.report_date,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&i.player_id)
    .bind(i.season)
    .bind(i.week)
    .bind(&i.status)
    .bind(&i.injury)
    .bind(&i.practice_status)
    .bind(i.report_date)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert_fantasy_ranking(pool: &SqlitePool, r: &FantasyRanking) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO fantasy_rankings
           (id, player_id, season, week, position, rank, projected_points, source, updated_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (player_id, season, week, position) DO UPDATE SET
               rank = excluded.rank,
               projected_points = excluded.projected_points,
               source = excluded.source,
               updated_at = excluded.updated_at"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&r.player_id)
    .bind(r.season)
    .bind(r.week)
    .bind(&r.position)
    .bind(r.rank)
    .bind(r.projected_points)
    .bind(&r.source)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

// ── Import progress ───────────────────────────────────────────────────────────

pub async fn mark_progress(
    pool: &SqlitePool,
    season: i64,
    data_type: &str,
    status: &str,
    records_processed: i64,
    error: Option<&str>,
) -> Result<()> {
    let now = Utc::now();
    let started_at = if status == "in_progress" { Some(now) } else { None };
    let completed_at = if status == "completed" || status == "failed" {
        Some(now)
    } else {
        None
    };
    sqlx::query(
        r#"INSERT INTO import_progress
           (season, data_type, status, records_processed, started_at, completed_at, error)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT (season, data_type) DO UPDATE SET
               status = excluded.status,
               records_processed = excluded.records_processed,
               started_at = COALESCE(import_progress.started_at, excluded.started_at),
               completed_at = excluded.completed_at,
               error = excluded.error"#,
    )
    .bind(season)
    .bind(data_type)
    .bind(status)
    .bind(records_processed)
    .bind(started_at)
    .bind(completed_at)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_progress(
    pool: &SqlitePool,
    season: i64,
    data_type: &str,
) -> Result<Option<ImportProgress>> {
    let row = sqlx::query_as::<_, ImportProgress>(
        "SELECT season, data_type, status, records_processed, started_at, completed_at, error
         FROM import_progress WHERE season = ? AND data_type = ?",
    )
    .bind(season)
    .bind(data_type)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

// ── Counters for diagnostics ──────────────────────────────────────────────────

pub async fn count_games(pool: &SqlitePool, season: i64) -> Result<i64> {
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM games WHERE season = ?")
        .bind(season)
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn count_players(pool: &SqlitePool) -> Result<i64> {
    let n = sqlx::query_scalar("SELECT COUNT(*) FROM players")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

pub async fn count_scheduled_games_today(pool: &SqlitePool) -> Result<i64> {
    let n = sqlx::query_scalar(
        "SELECT COUNT(*) FROM games WHERE date(kickoff) = date('now') AND status <> 'completed'",
    )
    .fetch_one(pool)
    .await?;
    Ok(n)
}
