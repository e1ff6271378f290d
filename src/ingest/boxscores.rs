//! Box-score ingestion for completed games. The feed's statistics array mixes
//! plain numbers with "X-Y" pair strings; each statistic converts with an
//! explicit rule and the percentages are recomputed from the parsed pairs so
//! they stay consistent with them.

use std::time::Duration;

use anyhow::Result;
use sqlx::SqlitePool;

use super::resolver::Resolver;
use super::RunReport;
use crate::clients::espn::{BoxScoreStatistic, EspnClient, StatValue};
use crate::db;
use crate::models::GameTeamStats;
use crate::utils::{pct, possession_to_seconds, split_pair};

const FETCH_GAP: Duration = Duration::from_millis(500);

pub async fn sync_boxscores(
    pool: &SqlitePool,
    espn: &EspnClient,
    season: i64,
    week: i64,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut resolver = Resolver::new();
    let games = db::get_completed_games_for_week(pool, season, week).await?;
    let mut first = true;

    for game in games {
        if !first {
            tokio::time::sleep(FETCH_GAP).await;
        }
        first = false;

        let summary = match espn.game_summary(&game.espn_id).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Summary fetch failed for game {}: {}", game.espn_id, e);
                report.record_error(format!("game {}: {}", game.espn_id, e));
                continue;
            }
        };
        let Some(boxscore) = summary.boxscore else {
            report.record_skip();
            continue;
        };

        for team_box in boxscore.teams {
            let team_id = match team_box.team.id.parse::<i64>() {
                Ok(espn_id) => resolver.team_by_espn_id(pool, espn_id).await?,
                Err(_) => None,
            };
            let Some(team_id) = team_id else {
                report.record_skip();
                continue;
            };

            let stats = parse_team_statistics(&team_box.statistics, &game.id, &team_id);
            match db::upsert_game_team_stats(pool, &stats).await {
                Ok(()) => report.record_upsert(),
                Err(e) => report.record_error(format!("game {} team {}: {}", game.id, team_id, e)),
            }
        }
    }

    Ok(report.finish("box scores sync"))
}

/// Conversion rules, by statistic name:
/// - plain numerics read the numeric `value`, falling back to the display string;
/// - "made-attempts" pairs: down efficiency, red zone;
/// - "count-yards" pairs: penalties, sacks;
/// - "completions-attempts" for passing;
/// - possession stays verbatim and is also converted to seconds.
fn parse_team_statistics(
    statistics: &[BoxScoreStatistic],
    game_id: &str,
    team_id: &str,
) -> GameTeamStats {
    let mut s = GameTeamStats {
        game_id: game_id.to_string(),
        team_id: team_id.to_string(),
        ..Default::default()
    };

    for stat in statistics {
        match stat.name.as_str() {
            "firstDowns" => s.first_downs = stat_i64(stat),
            "totalYards" => s.total_yards = stat_i64(stat),
            "netPassingYards" => s.passing_yards = stat_i64(stat),
            "rushingYards" => s.rushing_yards = stat_i64(stat),
            "rushingAttempts" => s.rushing_attempts = stat_i64(stat),
            "yardsPerRushAttempt" => s.rushing_avg = stat_f64(stat),
            "thirdDownEff" => {
                let (made, attempts) = stat_pair(stat);
                s.third_down_conversions = made;
                s.third_down_attempts = attempts;
                s.third_down_pct = pct(made, attempts);
            }
            "fourthDownEff" => {
                let (made, attempts) = stat_pair(stat);
                s.fourth_down_conversions = made;
                s.fourth_down_attempts = attempts;
                s.fourth_down_pct = pct(made, attempts);
            }
            "redZoneAttempts" | "redZoneEff" => {
                let (made, attempts) = stat_pair(stat);
                s.red_zone_conversions = made;
                s.red_zone_attempts = attempts;
            }
            "totalPenaltiesYards" => {
                let (count, yards) = stat_pair(stat);
                s.penalties = count;
                s.penalty_yards = yards;
            }
            "turnovers" => s.turnovers = stat_i64(stat),
            "fumblesLost" => s.fumbles_lost = stat_i64(stat),
            "interceptions" => s.interceptions_thrown = stat_i64(stat),
            "completionAttempts" => {
                let (completions, attempts) = stat_pair(stat);
                s.completions = completions;
                s.pass_attempts = attempts;
            }
            "sacksYardsLost" => {
                let (sacks, yards) = stat_pair(stat);
                s.sacks_allowed = sacks;
                s.sack_yards_lost = yards;
            }
            "possessionTime" => {
                let raw = display(stat);
                s.possession_time = raw.to_string();
                s.possession_seconds = possession_to_seconds(raw);
            }
            _ => {}
        }
    }

    s
}

fn display(stat: &BoxScoreStatistic) -> &str {
    match (&stat.display_value, &stat.value) {
        (Some(d), _) if !d.is_empty() => d,
        (_, StatValue::Text(t)) => t,
        _ => "",
    }
}

fn stat_f64(stat: &BoxScoreStatistic) -> f64 {
    stat.value
        .as_f64()
        .or_else(|| display(stat).trim().parse().ok())
        .unwrap_or(0.0)
}

fn stat_i64(stat: &BoxScoreStatistic) -> i64 {
    stat_f64(stat) as i64
}

/// Some renderings use "25/30" instead of "25-30" for completion pairs.
fn stat_pair(stat: &BoxScoreStatistic) -> (i64, i64) {
    split_pair(&display(stat).replace('/', "-"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(name: &str, display: &str) -> BoxScoreStatistic {
        serde_json::from_str(&format!(
            r#"{{"name":"{}","displayValue":"{}"}}"#,
            name, display
        ))
        .unwrap()
    }

    #[test]
    fn third_down_pair_and_pct() {
        let stats = vec![stat("thirdDownEff", "5-12")];
        let parsed = parse_team_statistics(&stats, "g", "t");
        assert_eq!(parsed.third_down_conversions, 5);
        assert_eq!(parsed.third_down_attempts, 12);
        assert!((parsed.third_down_pct - 41.67).abs() < 0.01);
    }

    #[test]
    fn penalties_pair_is_count_yards() {
        let stats = vec![stat("totalPenaltiesYards", "8-65")];
        let parsed = parse_team_statistics(&stats, "g", "t");
        assert_eq!(parsed.penalties, 8);
        assert_eq!(parsed.penalty_yards, 65);
    }

    #[test]
    fn possession_stored_verbatim_and_in_seconds() {
        let stats = vec![stat("possessionTime", "31:24")];
        let parsed = parse_team_statistics(&stats, "g", "t");
        assert_eq!(parsed.possession_time, "31:24");
        assert_eq!(parsed.possession_seconds, 1884);
    }

    #[test]
    fn zero_attempts_means_zero_pct() {
        let stats = vec![stat("fourthDownEff", "0-0")];
        let parsed = parse_team_statistics(&stats, "g", "t");
        assert_eq!(parsed.fourth_down_pct, 0.0);
    }

    #[test]
    fn slash_pairs_parse_like_dash_pairs() {
        let stats = vec![stat("completionAttempts", "25/30")];
        let parsed = parse_team_statistics(&stats, "g", "t");
        assert_eq!(parsed.completions, 25);
        assert_eq!(parsed.pass_attempts, 30);
    }

    #[test]
    fn numeric_value_beats_missing_display() {
        let s: BoxScoreStatistic =
            serde_json::from_str(r#"{"name":"totalYards","value":356.0}"#).unwrap();
        let parsed = parse_team_statistics(&[s], "g", "t");
        assert_eq!(parsed.total_yards, 356);
    }
}
