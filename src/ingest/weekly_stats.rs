//! Weekly player stats from the archive, aggregated into season rollups.
//! Rows are keyed by player name with a team hint; anything the resolver
//! cannot place is skipped and counted, never guessed.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::SqlitePool;

use super::csv::RowCursor;
use super::resolver::Resolver;
use super::RunReport;
use crate::clients::nflverse::NflverseClient;
use crate::db;
use crate::models::{GameStatLine, PlayerSeasonStats};
use crate::utils::passer_rating;

pub async fn sync_weekly_stats(
    pool: &SqlitePool,
    nflverse: &NflverseClient,
    season: i64,
) -> Result<RunReport> {
    let rows = match nflverse.player_stats(season).await {
        Ok(rows) => rows,
        Err(e) if e.is_not_found() => {
            tracing::info!("Player stats for {} not yet published", season);
            return Ok(RunReport::default());
        }
        Err(e) => return Err(e.into()),
    };
    ingest_rows(pool, rows, season).await
}

pub async fn ingest_rows<R: std::io::Read>(
    pool: &SqlitePool,
    mut rows: RowCursor<R>,
    season: i64,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut resolver = Resolver::new();
    let mut totals: HashMap<String, PlayerSeasonStats> = HashMap::new();

    while rows.advance()? {
        if rows.text("season_type") != "REG" {
            continue;
        }

        let name = rows.text("player_display_name").to_string();
        if name.is_empty() {
            report.record_skip();
            continue;
        }
        let gsis_id = rows.text("player_id").to_string();
        let team_abbr = rows.text("recent_team").to_string();

        let team_id = resolver.team_by_abbr(pool, &team_abbr).await?;
        let Some(player_id) = resolver
            .player_by_gsis_or_name(pool, &gsis_id, &name, team_id.as_deref())
            .await?
        else {
            tracing::debug!("Unresolved player {:?} ({})", name, team_abbr);
            report.record_skip();
            continue;
        };

        let line = read_stat_line(&rows, &player_id, season);
        match db::upsert_game_stat_line(pool, &line).await {
            Ok(()) => report.record_upsert(),
            Err(e) => {
                report.record_error(format!("{} week {}: {}", name, line.week, e));
                continue;
            }
        }

        accumulate(totals.entry(player_id.clone()).or_insert_with(|| {
            PlayerSeasonStats {
                player_id,
                season,
                ..Default::default()
            }
        }), &line);
    }

    let rollups = totals.len();
    for (_, mut season_stats) in totals {
        finalize_rollup(&mut season_stats);
        if let Err(e) = db::upsert_season_stats(pool, &season_stats).await {
            report.record_error(format!(
                "season rollup for {}: {}",
                season_stats.player_id, e
            ));
        }
    }
    tracing::info!("Season rollups recomputed for {} players", rollups);

    Ok(report.finish("weekly stats sync"))
}

fn read_stat_line(rows: &RowCursor<impl std::io::Read>, player_id: &str, season: i64) -> GameStatLine {
    GameStatLine {
        player_id: player_id.to_string(),
        season,
        week: rows.int("week"),
        completions: rows.int("completions"),
        pass_attempts: rows.int("attempts"),
        passing_yards: rows.int("passing_yards"),
        passing_tds: rows.int("passing_tds"),
        interceptions: rows.int("interceptions"),
        rushing_attempts: rows.int("carries"),
        rushing_yards: rows.int("rushing_yards"),
        rushing_tds: rows.int("rushing_tds"),
        receptions: rows.int("receptions"),
        targets: rows.int("targets"),
        receiving_yards: rows.int("receiving_yards"),
        receiving_tds: rows.int("receiving_tds"),
        tackles: rows.int("def_tackles"),
        sacks: rows.float("def_sacks"),
        defensive_ints: rows.int("def_interceptions"),
        field_goals_made: rows.int("fg_made"),
        field_goals_attempted: rows.int("fg_att"),
        extra_points_made: rows.int("pat_made"),
    }
}

fn accumulate(totals: &mut PlayerSeasonStats, line: &GameStatLine) {
    totals.games_played += 1;
    totals.completions += line.completions;
    totals.pass_attempts += line.pass_attempts;
    totals.passing_yards += line.passing_yards;
    totals.passing_tds += line.passing_tds;
    totals.interceptions += line.interceptions;
    totals.rushing_attempts += line.rushing_attempts;
    totals.rushing_yards += line.rushing_yards;
    totals.rushing_tds += line.rushing_tds;
    totals.receptions += line.receptions;
    totals.targets += line.targets;
    totals.receiving_yards += line.receiving_yards;
    totals.receiving_tds += line.receiving_tds;
    totals.tackles += line.tackles;
    totals.sacks += line.sacks;
    totals.defensive_ints += line.defensive_ints;
    totals.field_goals_made += line.field_goals_made;
    totals.field_goals_attempted += line.field_goals_attempted;
    totals.extra_points_made += line.extra_points_made;
}

fn finalize_rollup(totals: &mut PlayerSeasonStats) {
    if totals.rushing_attempts > 0 {
        totals.rushing_avg = totals.rushing_yards as f64 / totals.rushing_attempts as f64;
    }
    if totals.receptions > 0 {
        totals.receiving_avg = totals.receiving_yards as f64 / totals.receptions as f64;
    }
    if totals.pass_attempts > 0 {
        totals.passer_rating = Some(passer_rating(
            totals.completions,
            totals.pass_attempts,
            totals.passing_yards,
            totals.passing_tds,
            totals.interceptions,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(week: i64) -> GameStatLine {
        GameStatLine {
            player_id: "p1".into(),
            season: 2024,
            week,
            completions: 20,
            pass_attempts: 30,
            passing_yards: 250,
            passing_tds: 2,
            rushing_attempts: 4,
            rushing_yards: 18,
            ..Default::default()
        }
    }

    #[test]
    fn rollup_accumulates_and_derives() {
        let mut totals = PlayerSeasonStats {
            player_id: "p1".into(),
            season: 2024,
            ..Default::default()
        };
        accumulate(&mut totals, &line(1));
        accumulate(&mut totals, &line(2));
        finalize_rollup(&mut totals);

        assert_eq!(totals.games_played, 2);
        assert_eq!(totals.passing_yards, 500);
        assert!((totals.rushing_avg - 4.5).abs() < f64::EPSILON);
        let rating = totals.passer_rating.unwrap();
        assert!(rating > 0.0 && rating <= 158.4);
    }

    #[test]
    fn rollup_without_attempts_has_no_rating() {
        let mut totals = PlayerSeasonStats::default();
        accumulate(
            &mut totals,
            &GameStatLine {
                receptions: 5,
                receiving_yards: 80,
                ..Default::default()
            },
        );
        finalize_rollup(&mut totals);
        assert!(totals.passer_rating.is_none());
        assert!((totals.receiving_avg - 16.0).abs() < f64::EPSILON);
    }
}
