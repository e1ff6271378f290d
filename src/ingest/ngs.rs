//! Next Gen Stats: three per-season files (passing, rushing, receiving) with
//! stat-type-specific columns. Week 0 rows are season totals and land with
//! week NULL; only regular-season rows are kept.

use anyhow::Result;
use sqlx::SqlitePool;

use super::csv::RowCursor;
use super::resolver::Resolver;
use super::RunReport;
use crate::clients::nflverse::NflverseClient;
use crate::db;
use crate::models::AdvancedStat;

pub const STAT_TYPES: [&str; 3] = ["passing", "rushing", "receiving"];

pub async fn sync_all_ngs(
    pool: &SqlitePool,
    nflverse: &NflverseClient,
    season: i64,
) -> Result<RunReport> {
    let mut combined = RunReport::default();
    for stat_type in STAT_TYPES {
        let report = sync_ngs(pool, nflverse, season, stat_type).await?;
        combined.processed += report.processed;
        combined.upserted += report.upserted;
        combined.skipped += report.skipped;
        combined.errors.extend(report.errors);
    }
    Ok(combined)
}

pub async fn sync_ngs(
    pool: &SqlitePool,
    nflverse: &NflverseClient,
    season: i64,
    stat_type: &str,
) -> Result<RunReport> {
    let rows = match nflverse.next_gen_stats(season, stat_type).await {
        Ok(rows) => rows,
        Err(e) if e.is_not_found() => {
            tracing::info!("NGS {} for {} not yet published", stat_type, season);
            return Ok(RunReport::default());
        }
        Err(e) => return Err(e.into()),
    };
    ingest_rows(pool, rows, season, stat_type).await
}

pub async fn ingest_rows<R: std::io::Read>(
    pool: &SqlitePool,
    mut rows: RowCursor<R>,
    season: i64,
    stat_type: &str,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut resolver = Resolver::new();

    while rows.advance()? {
        if rows.text("season_type") != "REG" {
            continue;
        }

        let name = rows.text("player_display_name").to_string();
        let gsis_id = rows.text("player_gsis_id").to_string();
        let team_abbr = rows.text("team_abbr").to_string();
        let team_id = resolver.team_by_abbr(pool, &team_abbr).await?;

        let Some(player_id) = resolver
            .player_by_gsis_or_name(pool, &gsis_id, &name, team_id.as_deref())
            .await?
        else {
            report.record_skip();
            continue;
        };

        let stat = read_row(&rows, &player_id, season, stat_type);
        match db::upsert_advanced_stat(pool, &stat).await {
            Ok(()) => report.record_upsert(),
            Err(e) => report.record_error(format!("{} {:?}: {}", stat_type, name, e)),
        }
    }

    Ok(report.finish(&format!("ngs {} sync", stat_type)))
}

fn read_row(
    rows: &RowCursor<impl std::io::Read>,
    player_id: &str,
    season: i64,
    stat_type: &str,
) -> AdvancedStat {
    let mut stat = AdvancedStat {
        player_id: player_id.to_string(),
        season,
        // Week 0 is the file's season-total marker.
        week: rows.opt_int("week").filter(|&w| w > 0),
        stat_type: stat_type.to_string(),
        ..Default::default()
    };

    match stat_type {
        "passing" => {
            stat.avg_time_to_throw = rows.opt_float("avg_time_to_throw");
            stat.avg_air_yards = rows.opt_float("avg_intended_air_yards");
            stat.completion_pct_above_expectation =
                rows.opt_float("completion_percentage_above_expectation");
            stat.aggressiveness = rows.opt_float("aggressiveness");
        }
        "rushing" => {
            stat.rush_efficiency = rows.opt_float("efficiency");
            stat.rush_yards_over_expected = rows.opt_float("rush_yards_over_expected");
            stat.time_to_line_of_scrimmage = rows.opt_float("avg_time_to_los");
        }
        "receiving" => {
            stat.avg_separation = rows.opt_float("avg_separation");
            stat.avg_yac_above_expectation = rows.opt_float("avg_yac_above_expectation");
            stat.catch_pct = rows.opt_float("catch_percentage");
        }
        _ => {}
    }

    stat
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn week_zero_becomes_season_total() {
        let data = "week,avg_time_to_throw\n0,2.8\n3,2.5\n";
        let mut rows = RowCursor::new(Cursor::new(data.as_bytes().to_vec())).unwrap();

        rows.advance().unwrap();
        let total = read_row(&rows, "p1", 2024, "passing");
        assert_eq!(total.week, None);
        assert_eq!(total.avg_time_to_throw, Some(2.8));

        rows.advance().unwrap();
        let weekly = read_row(&rows, "p1", 2024, "passing");
        assert_eq!(weekly.week, Some(3));
    }
}
