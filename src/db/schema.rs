use anyhow::Result;
use sqlx::SqlitePool;

/// Numbered, append-only migration list. Every statement is idempotent, so
/// the whole list runs on every startup and from `init-db`.
const MIGRATIONS: &[&str] = &[
    // 001 teams
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id TEXT PRIMARY KEY,
        espn_id INTEGER UNIQUE,
        abbreviation TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        city TEXT NOT NULL DEFAULT '',
        conference TEXT,
        division TEXT,
        stadium_name TEXT,
        stadium_lat REAL,
        stadium_lon REAL,
        stadium_surface TEXT,
        stadium_type TEXT,
        stadium_capacity INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    // 002 players
    r#"
    CREATE TABLE IF NOT EXISTS players (
        id TEXT PRIMARY KEY,
        espn_id INTEGER UNIQUE,
        yahoo_key TEXT,
        gsis_id TEXT,
        name TEXT NOT NULL,
        position TEXT,
        team_id TEXT REFERENCES teams (id),
        jersey_number INTEGER,
        height_inches INTEGER,
        weight_pounds INTEGER,
        birth_date TEXT,
        birth_city TEXT,
        birth_state TEXT,
        birth_country TEXT,
        college TEXT,
        draft_year INTEGER,
        draft_round INTEGER,
        draft_pick INTEGER,
        rookie_year INTEGER,
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    // 003 games
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id TEXT PRIMARY KEY,
        espn_id TEXT NOT NULL UNIQUE,
        season INTEGER NOT NULL,
        week INTEGER NOT NULL,
        kickoff TEXT NOT NULL,
        home_team_id TEXT NOT NULL REFERENCES teams (id),
        away_team_id TEXT NOT NULL REFERENCES teams (id),
        home_score INTEGER,
        away_score INTEGER,
        status TEXT NOT NULL DEFAULT 'scheduled',
        status_detail TEXT,
        period INTEGER,
        clock TEXT,
        venue_name TEXT,
        venue_city TEXT,
        attendance INTEGER,
        playoff_round TEXT,
        weather_temp REAL,
        weather_condition TEXT,
        weather_wind_mph REAL,
        weather_humidity REAL,
        weather_pressure_mb REAL,
        weather_visibility_miles REAL,
        weather_precip_in REAL,
        weather_cloud_pct REAL,
        is_day_game INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        CHECK (home_team_id <> away_team_id)
    )
    "#,
    // 004 per-side box scores
    r#"
    CREATE TABLE IF NOT EXISTS game_team_stats (
        id TEXT PRIMARY KEY,
        game_id TEXT NOT NULL REFERENCES games (id),
        team_id TEXT NOT NULL REFERENCES teams (id),
        first_downs INTEGER NOT NULL DEFAULT 0,
        total_yards INTEGER NOT NULL DEFAULT 0,
        passing_yards INTEGER NOT NULL DEFAULT 0,
        rushing_yards INTEGER NOT NULL DEFAULT 0,
        third_down_attempts INTEGER NOT NULL DEFAULT 0,
        third_down_conversions INTEGER NOT NULL DEFAULT 0,
        third_down_pct REAL NOT NULL DEFAULT 0,
        fourth_down_attempts INTEGER NOT NULL DEFAULT 0,
        fourth_down_conversions INTEGER NOT NULL DEFAULT 0,
        fourth_down_pct REAL NOT NULL DEFAULT 0,
        red_zone_attempts INTEGER NOT NULL DEFAULT 0,
        red_zone_conversions INTEGER NOT NULL DEFAULT 0,
        turnovers INTEGER NOT NULL DEFAULT 0,
        fumbles_lost INTEGER NOT NULL DEFAULT 0,
        interceptions_thrown INTEGER NOT NULL DEFAULT 0,
        penalties INTEGER NOT NULL DEFAULT 0,
        penalty_yards INTEGER NOT NULL DEFAULT 0,
        possession_time TEXT NOT NULL DEFAULT '',
        possession_seconds INTEGER NOT NULL DEFAULT 0,
        completions INTEGER NOT NULL DEFAULT 0,
        pass_attempts INTEGER NOT NULL DEFAULT 0,
        rushing_attempts INTEGER NOT NULL DEFAULT 0,
        rushing_avg REAL NOT NULL DEFAULT 0,
        sacks_allowed INTEGER NOT NULL DEFAULT 0,
        sack_yards_lost INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        UNIQUE (game_id, team_id)
    )
    "#,
    // 005 per-player per-game lines
    r#"
    CREATE TABLE IF NOT EXISTS game_stats (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL REFERENCES players (id),
        season INTEGER NOT NULL,
        week INTEGER NOT NULL,
        completions INTEGER NOT NULL DEFAULT 0,
        pass_attempts INTEGER NOT NULL DEFAULT 0,
        passing_yards INTEGER NOT NULL DEFAULT 0,
        passing_tds INTEGER NOT NULL DEFAULT 0,
        interceptions INTEGER NOT NULL DEFAULT 0,
        rushing_attempts INTEGER NOT NULL DEFAULT 0,
        rushing_yards INTEGER NOT NULL DEFAULT 0,
        rushing_tds INTEGER NOT NULL DEFAULT 0,
        receptions INTEGER NOT NULL DEFAULT 0,
        targets INTEGER NOT NULL DEFAULT 0,
        receiving_yards INTEGER NOT NULL DEFAULT 0,
        receiving_tds INTEGER NOT NULL DEFAULT 0,
        tackles INTEGER NOT NULL DEFAULT 0,
        sacks REAL NOT NULL DEFAULT 0,
        defensive_ints INTEGER NOT NULL DEFAULT 0,
        field_goals_made INTEGER NOT NULL DEFAULT 0,
        field_goals_attempted INTEGER NOT NULL DEFAULT 0,
        extra_points_made INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        UNIQUE (player_id, season, week)
    )
    "#,
    // 006 season rollups
    r#"
    CREATE TABLE IF NOT EXISTS player_season_stats (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL REFERENCES players (id),
        season INTEGER NOT NULL,
        games_played INTEGER NOT NULL DEFAULT 0,
        completions INTEGER NOT NULL DEFAULT 0,
        pass_attempts INTEGER NOT NULL DEFAULT 0,
        passing_yards INTEGER NOT NULL DEFAULT 0,
        passing_tds INTEGER NOT NULL DEFAULT 0,
        interceptions INTEGER NOT NULL DEFAULT 0,
        passer_rating REAL,
        rushing_attempts INTEGER NOT NULL DEFAULT 0,
        rushing_yards INTEGER NOT NULL DEFAULT 0,
        rushing_tds INTEGER NOT NULL DEFAULT 0,
        rushing_avg REAL NOT NULL DEFAULT 0,
        receptions INTEGER NOT NULL DEFAULT 0,
        targets INTEGER NOT NULL DEFAULT 0,
        receiving_yards INTEGER NOT NULL DEFAULT 0,
        receiving_tds INTEGER NOT NULL DEFAULT 0,
        receiving_avg REAL NOT NULL DEFAULT 0,
        tackles INTEGER NOT NULL DEFAULT 0,
        sacks REAL NOT NULL DEFAULT 0,
        defensive_ints INTEGER NOT NULL DEFAULT 0,
        field_goals_made INTEGER NOT NULL DEFAULT 0,
        field_goals_attempted INTEGER NOT NULL DEFAULT 0,
        extra_points_made INTEGER NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        UNIQUE (player_id, season)
    )
    "#,
    // 007 next-gen stats
    r#"
    CREATE TABLE IF NOT EXISTS advanced_stats (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL REFERENCES players (id),
        season INTEGER NOT NULL,
        week INTEGER,
        stat_type TEXT NOT NULL,
        avg_time_to_throw REAL,
        avg_air_yards REAL,
        completion_pct_above_expectation REAL,
        aggressiveness REAL,
        rush_efficiency REAL,
        rush_yards_over_expected REAL,
        time_to_line_of_scrimmage REAL,
        avg_separation REAL,
        avg_yac_above_expectation REAL,
        catch_pct REAL,
        updated_at TEXT NOT NULL,
        UNIQUE (player_id, season, week, stat_type)
    )
    "#,
    // 008 play by play
    r#"
    CREATE TABLE IF NOT EXISTS play_by_play (
        id TEXT PRIMARY KEY,
        play_id TEXT NOT NULL,
        game_id TEXT NOT NULL REFERENCES games (id),
        quarter INTEGER,
        down INTEGER,
        distance INTEGER,
        yardline INTEGER,
        clock TEXT,
        play_type TEXT,
        description TEXT,
        posteam_id TEXT,
        passer_id TEXT,
        rusher_id TEXT,
        receiver_id TEXT,
        yards_gained INTEGER,
        epa REAL,
        wpa REAL,
        touchdown INTEGER NOT NULL DEFAULT 0,
        interception INTEGER NOT NULL DEFAULT 0,
        fumble INTEGER NOT NULL DEFAULT 0,
        home_score_after INTEGER,
        away_score_after INTEGER,
        updated_at TEXT NOT NULL,
        UNIQUE (play_id, game_id)
    )
    "#,
    // 009 play-by-play aggregates, rebuilt after each ingested week
    r#"
    CREATE TABLE IF NOT EXISTS game_play_summary (
        game_id TEXT PRIMARY KEY REFERENCES games (id),
        total_plays INTEGER NOT NULL DEFAULT 0,
        touchdowns INTEGER NOT NULL DEFAULT 0,
        turnovers INTEGER NOT NULL DEFAULT 0,
        total_epa REAL NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_play_stats (
        player_id TEXT NOT NULL REFERENCES players (id),
        game_id TEXT NOT NULL REFERENCES games (id),
        touches INTEGER NOT NULL DEFAULT 0,
        total_epa REAL NOT NULL DEFAULT 0,
        success_rate REAL NOT NULL DEFAULT 0,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (player_id, game_id)
    )
    "#,
    // 010 scoring plays
    r#"
    CREATE TABLE IF NOT EXISTS scoring_plays (
        id TEXT PRIMARY KEY,
        game_id TEXT NOT NULL REFERENCES games (id),
        sequence_number INTEGER NOT NULL,
        quarter INTEGER,
        clock TEXT,
        team_id TEXT,
        play_type TEXT NOT NULL,
        points INTEGER NOT NULL,
        scoring_player_id TEXT,
        assist_player_id TEXT,
        scoring_player_name TEXT,
        assist_player_name TEXT,
        description TEXT NOT NULL,
        home_score_after INTEGER NOT NULL DEFAULT 0,
        away_score_after INTEGER NOT NULL DEFAULT 0,
        UNIQUE (game_id, sequence_number)
    )
    "#,
    // 011 standings
    r#"
    CREATE TABLE IF NOT EXISTS team_standings (
        id TEXT PRIMARY KEY,
        team_id TEXT NOT NULL REFERENCES teams (id),
        season INTEGER NOT NULL,
        week INTEGER NOT NULL,
        wins INTEGER NOT NULL DEFAULT 0,
        losses INTEGER NOT NULL DEFAULT 0,
        ties INTEGER NOT NULL DEFAULT 0,
        win_pct REAL NOT NULL DEFAULT 0,
        home_wins INTEGER NOT NULL DEFAULT 0,
        home_losses INTEGER NOT NULL DEFAULT 0,
        away_wins INTEGER NOT NULL DEFAULT 0,
        away_losses INTEGER NOT NULL DEFAULT 0,
        division_wins INTEGER NOT NULL DEFAULT 0,
        division_losses INTEGER NOT NULL DEFAULT 0,
        conference_wins INTEGER NOT NULL DEFAULT 0,
        conference_losses INTEGER NOT NULL DEFAULT 0,
        points_for INTEGER NOT NULL DEFAULT 0,
        points_against INTEGER NOT NULL DEFAULT 0,
        point_diff INTEGER NOT NULL DEFAULT 0,
        streak TEXT NOT NULL DEFAULT '',
        division_rank INTEGER,
        conference_rank INTEGER,
        playoff_seed INTEGER,
        updated_at TEXT NOT NULL,
        UNIQUE (team_id, season, week)
    )
    "#,
    // 012 injuries
    r#"
    CREATE TABLE IF NOT EXISTS player_injuries (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL REFERENCES players (id),
        season INTEGER NOT NULL,
        week INTEGER NOT NULL,
        status TEXT NOT NULL,
        injury TEXT,
        practice_status TEXT,
        report_date TEXT,
        updated_at TEXT NOT NULL,
        UNIQUE (player_id, season, week)
    )
    "#,
    // 013 fantasy rankings + projections
    r#"
    CREATE TABLE IF NOT EXISTS fantasy_rankings (
        id TEXT PRIMARY KEY,
        player_id TEXT NOT NULL REFERENCES players (id),
        season INTEGER NOT NULL,
        week INTEGER NOT NULL,
        position TEXT NOT NULL,
        rank INTEGER,
        projected_points REAL,
        source TEXT NOT NULL DEFAULT 'yahoo',
        updated_at TEXT NOT NULL,
        UNIQUE (player_id, season, week, position)
    )
    "#,
    // 014 backfill bookkeeping
    r#"
    CREATE TABLE IF NOT EXISTS import_progress (
        season INTEGER NOT NULL,
        data_type TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        records_processed INTEGER NOT NULL DEFAULT 0,
        started_at TEXT,
        completed_at TEXT,
        error TEXT,
        PRIMARY KEY (season, data_type)
    )
    "#,
    // 015 indexes
    "CREATE INDEX IF NOT EXISTS idx_games_season_week ON games (season, week)",
    "CREATE INDEX IF NOT EXISTS idx_games_status ON games (status)",
    "CREATE INDEX IF NOT EXISTS idx_players_name ON players (name)",
    "CREATE INDEX IF NOT EXISTS idx_players_team ON players (team_id)",
    "CREATE INDEX IF NOT EXISTS idx_pbp_game ON play_by_play (game_id)",
    "CREATE INDEX IF NOT EXISTS idx_scoring_game ON scoring_plays (game_id)",
    "CREATE INDEX IF NOT EXISTS idx_standings_season_week ON team_standings (season, week)",
    "CREATE INDEX IF NOT EXISTS idx_game_stats_season_week ON game_stats (season, week)",
];

pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    for (i, stmt) in MIGRATIONS.iter().enumerate() {
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| anyhow::anyhow!("migration {:03} failed: {}", i + 1, e))?;
    }
    tracing::info!("Database schema ready ({} statements)", MIGRATIONS.len());
    Ok(())
}
