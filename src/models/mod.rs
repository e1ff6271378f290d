use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Game lifecycle. Transitions only move forward: a feed that reports
/// "scheduled" for a game already recorded as completed is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Scheduled => "scheduled",
            GameStatus::InProgress => "in_progress",
            GameStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> GameStatus {
        match s {
            "completed" => GameStatus::Completed,
            "in_progress" => GameStatus::InProgress,
            _ => GameStatus::Scheduled,
        }
    }

    /// Ordering rank used to forbid status regression on upsert.
    pub fn rank(&self) -> i32 {
        match self {
            GameStatus::Scheduled => 0,
            GameStatus::InProgress => 1,
            GameStatus::Completed => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub id: String,
    pub espn_id: Option<i64>,
    pub abbreviation: String, // 2-4 chars, unique
    pub name: String,
    pub city: String,
    pub conference: Option<String>, // "AFC" | "NFC", blank until curated
    pub division: Option<String>,   // "North" | "South" | "East" | "West"
    pub stadium_name: Option<String>,
    pub stadium_lat: Option<f64>,
    pub stadium_lon: Option<f64>,
    pub stadium_surface: Option<String>,
    pub stadium_type: Option<String>, // "outdoor" | "dome" | "retractable"
    pub stadium_capacity: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Player {
    pub id: String,
    pub espn_id: Option<i64>,
    pub yahoo_key: Option<String>,
    pub gsis_id: Option<String>,
    pub name: String,
    pub position: Option<String>,
    pub team_id: Option<String>,
    pub jersey_number: Option<i64>,
    pub height_inches: Option<i64>,
    pub weight_pounds: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub birth_city: Option<String>,
    pub birth_state: Option<String>,
    pub birth_country: Option<String>,
    pub college: Option<String>,
    pub draft_year: Option<i64>,
    pub draft_round: Option<i64>,
    pub draft_pick: Option<i64>,
    pub rookie_year: Option<i64>,
    pub status: String, // "active" | "inactive" | "injured"
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: String,
    pub espn_id: String, // unique external key
    pub season: i64,
    pub week: i64,
    pub kickoff: DateTime<Utc>,
    pub home_team_id: String,
    pub away_team_id: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub status: String, // GameStatus::as_str
    pub status_detail: Option<String>,
    pub period: Option<i64>,
    pub clock: Option<String>,
    pub venue_name: Option<String>,
    pub venue_city: Option<String>,
    pub attendance: Option<i64>,
    pub playoff_round: Option<String>,
    pub weather_temp: Option<f64>, // fahrenheit
    pub weather_condition: Option<String>,
    pub weather_wind_mph: Option<f64>,
    pub weather_humidity: Option<f64>,
    pub weather_pressure_mb: Option<f64>,
    pub weather_visibility_miles: Option<f64>,
    pub weather_precip_in: Option<f64>,
    pub weather_cloud_pct: Option<f64>,
    pub is_day_game: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    pub fn game_status(&self) -> GameStatus {
        GameStatus::parse(&self.status)
    }
}

/// Per-side box score for one game. Natural key (game_id, team_id).
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct GameTeamStats {
    pub game_id: String,
    pub team_id: String,
    pub first_downs: i64,
    pub total_yards: i64,
    pub passing_yards: i64,
    pub rushing_yards: i64,
    pub third_down_attempts: i64,
    pub third_down_conversions: i64,
    pub third_down_pct: f64,
    pub fourth_down_attempts: i64,
    pub fourth_down_conversions: i64,
    pub fourth_down_pct: f64,
    pub red_zone_attempts: i64,
    pub red_zone_conversions: i64,
    pub turnovers: i64,
    pub fumbles_lost: i64,
    pub interceptions_thrown: i64,
    pub penalties: i64,
    pub penalty_yards: i64,
    pub possession_time: String, // "MM:SS" verbatim from the feed
    pub possession_seconds: i64,
    pub completions: i64,
    pub pass_attempts: i64,
    pub rushing_attempts: i64,
    pub rushing_avg: f64,
    pub sacks_allowed: i64,
    pub sack_yards_lost: i64,
}

/// One player's line for one game. Natural key (player_id, season, week).
#[derive(Debug, Clone, Default)]
pub struct GameStatLine {
    pub player_id: String,
    pub season: i64,
    pub week: i64,
    pub completions: i64,
    pub pass_attempts: i64,
    pub passing_yards: i64,
    pub passing_tds: i64,
    pub interceptions: i64,
    pub rushing_attempts: i64,
    pub rushing_yards: i64,
    pub rushing_tds: i64,
    pub receptions: i64,
    pub targets: i64,
    pub receiving_yards: i64,
    pub receiving_tds: i64,
    pub tackles: i64,
    pub sacks: f64,
    pub defensive_ints: i64,
    pub field_goals_made: i64,
    pub field_goals_attempted: i64,
    pub extra_points_made: i64,
}

/// Season rollup. Natural key (player_id, season).
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct PlayerSeasonStats {
    pub player_id: String,
    pub season: i64,
    pub games_played: i64,
    pub completions: i64,
    pub pass_attempts: i64,
    pub passing_yards: i64,
    pub passing_tds: i64,
    pub interceptions: i64,
    pub passer_rating: Option<f64>,
    pub rushing_attempts: i64,
    pub rushing_yards: i64,
    pub rushing_tds: i64,
    pub rushing_avg: f64,
    pub receptions: i64,
    pub targets: i64,
    pub receiving_yards: i64,
    pub receiving_tds: i64,
    pub receiving_avg: f64,
    pub tackles: i64,
    pub sacks: f64,
    pub defensive_ints: i64,
    pub field_goals_made: i64,
    pub field_goals_attempted: i64,
    pub extra_points_made: i64,
}

/// Next Gen Stats row. Natural key (player_id, season, week, stat_type);
/// week NULL marks the season total.
#[derive(Debug, Clone, Default)]
pub struct AdvancedStat {
    pub player_id: String,
    pub season: i64,
    pub week: Option<i64>,
    pub stat_type: String, // "passing" | "rushing" | "receiving"
    pub avg_time_to_throw: Option<f64>,
    pub avg_air_yards: Option<f64>,
    pub completion_pct_above_expectation: Option<f64>,
    pub aggressiveness: Option<f64>,
    pub rush_efficiency: Option<f64>,
    pub rush_yards_over_expected: Option<f64>,
    pub time_to_line_of_scrimmage: Option<f64>,
    pub avg_separation: Option<f64>,
    pub avg_yac_above_expectation: Option<f64>,
    pub catch_pct: Option<f64>,
}

/// One play. Natural key (play_id, game_id).
#[derive(Debug, Clone, Default)]
pub struct Play {
    pub play_id: String,
    pub game_id: String,
    pub quarter: Option<i64>,
    pub down: Option<i64>,
    pub distance: Option<i64>,
    pub yardline: Option<i64>, // 0-100, distance to the opponent end zone
    pub clock: Option<String>,
    pub play_type: Option<String>,
    pub description: Option<String>,
    pub posteam_id: Option<String>,
    pub passer_id: Option<String>,
    pub rusher_id: Option<String>,
    pub receiver_id: Option<String>,
    pub yards_gained: Option<i64>,
    pub epa: Option<f64>,
    pub wpa: Option<f64>,
    pub touchdown: bool,
    pub interception: bool,
    pub fumble: bool,
    pub home_score_after: Option<i64>,
    pub away_score_after: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoringPlay {
    pub game_id: String,
    pub sequence_number: i64, // 1..K, contiguous within a game
    pub quarter: Option<i64>,
    pub clock: Option<String>,
    pub team_id: Option<String>,
    pub play_type: String, // "TD" | "FG" | "XP" | "2PT" | "SF" | "unknown"
    pub points: i64,
    pub scoring_player_id: Option<String>,
    pub assist_player_id: Option<String>,
    pub scoring_player_name: Option<String>,
    pub assist_player_name: Option<String>,
    pub description: String,
    pub home_score_after: i64,
    pub away_score_after: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct TeamStanding {
    pub team_id: String,
    pub season: i64,
    pub week: i64,
    pub wins: i64,
    pub losses: i64,
    pub ties: i64,
    pub win_pct: f64,
    pub home_wins: i64,
    pub home_losses: i64,
    pub away_wins: i64,
    pub away_losses: i64,
    pub division_wins: i64,
    pub division_losses: i64,
    pub conference_wins: i64,
    pub conference_losses: i64,
    pub points_for: i64,
    pub points_against: i64,
    pub point_diff: i64,
    pub streak: String, // "<W|L|T><n>", e.g. "W3"
    pub division_rank: Option<i64>,
    pub conference_rank: Option<i64>,
    pub playoff_seed: Option<i64>, // 1..7 when set
}

#[derive(Debug, Clone)]
pub struct PlayerInjury {
    pub player_id: String,
    pub season: i64,
    pub week: i64,
    pub status: String,
    pub injury: Option<String>,
    pub practice_status: Option<String>,
    pub report_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct FantasyRanking {
    pub player_id: String,
    pub season: i64,
    pub week: i64,
    pub position: String,
    pub rank: Option<i64>,
    pub projected_points: Option<f64>,
    pub source: String,
}

/// Bookkeeping for long historical backfills. Natural key (season, data_type).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImportProgress {
    pub season: i64,
    pub data_type: String,
    pub status: String, // "pending" | "in_progress" | "completed" | "failed"
    pub records_processed: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

// API response envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_status_never_parses_garbage_to_completed() {
        assert_eq!(GameStatus::parse("completed"), GameStatus::Completed);
        assert_eq!(GameStatus::parse("halftime"), GameStatus::Scheduled);
    }

    #[test]
    fn game_status_rank_is_monotonic() {
        assert!(GameStatus::Scheduled.rank() < GameStatus::InProgress.rank());
        assert!(GameStatus::InProgress.rank() < GameStatus::Completed.rank());
    }
}
