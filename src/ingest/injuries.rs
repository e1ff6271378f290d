//! Injury report ingestion from the archive file. The scheduler runs this
//! once per day; re-runs are harmless because rows upsert on
//! (player, season, week).

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::resolver::Resolver;
use super::RunReport;
use crate::clients::nflverse::NflverseClient;
use crate::db;
use crate::models::PlayerInjury;

pub async fn sync_injuries(
    pool: &SqlitePool,
    nflverse: &NflverseClient,
    season: i64,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    let mut rows = match nflverse.injuries(season).await {
        Ok(rows) => rows,
        Err(e) if e.is_not_found() => {
            tracing::info!("Injury file for {} not yet published", season);
            return Ok(report);
        }
        Err(e) => return Err(e.into()),
    };

    let mut resolver = Resolver::new();

    while rows.advance()? {
        let name = rows.text("full_name").to_string();
        let gsis_id = rows.text("gsis_id").to_string();
        let team_abbr = rows.text("team").to_string();
        let week = rows.int("week");

        let team_id = resolver.team_by_abbr(pool, &team_abbr).await?;
        let Some(player_id) = resolver
            .player_by_gsis_or_name(pool, &gsis_id, &name, team_id.as_deref())
            .await?
        else {
            report.record_skip();
            continue;
        };

        let status = match rows.text("report_status") {
            "" => "unknown".to_string(),
            s => s.to_lowercase(),
        };
        let injury = PlayerInjury {
            player_id,
            season,
            week,
            status,
            injury: optional(rows.text("report_primary_injury")),
            practice_status: optional(rows.text("practice_status")),
            report_date: rows
                .text("date_modified")
                .get(..10)
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        };

        match db::upsert_injury(pool, &injury).await {
            Ok(()) => report.record_upsert(),
            Err(e) => report.record_error(format!("{} week {}: {}", name, week, e)),
        }
    }

    Ok(report.finish("injuries sync"))
}

fn optional(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
