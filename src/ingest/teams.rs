//! Team sync: skeleton rows from the events feed, then the metadata curation
//! pass fills conference/division and stadium details.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::RunReport;
use crate::clients::espn::EspnClient;
use crate::db;

pub async fn sync_teams(pool: &SqlitePool, espn: &EspnClient) -> Result<RunReport> {
    let mut report = RunReport::default();

    let teams = espn
        .teams()
        .await
        .context("teams feed fetch failed")?
        .all_teams();

    for team in teams {
        let Ok(espn_id) = team.id.parse::<i64>() else {
            report.record_error(format!("team id {:?} is not numeric", team.id));
            continue;
        };
        let Some(abbr) = team.abbreviation.as_deref().filter(|a| !a.is_empty()) else {
            report.record_error(format!("team {} has no abbreviation", espn_id));
            continue;
        };
        let name = team.display_name.as_deref().unwrap_or(abbr);
        let city = team.location.as_deref().unwrap_or("");

        match db::upsert_team(pool, espn_id, abbr, name, city).await {
            Ok(()) => report.record_upsert(),
            Err(e) => report.record_error(format!("team {} upsert: {}", abbr, e)),
        }
    }

    // Curation runs after every sync; it only touches rows that exist.
    if let Err(e) = db::nfl::curate_team_metadata(pool).await {
        tracing::error!("Team metadata curation failed: {}", e);
    }

    Ok(report.finish("teams sync"))
}
