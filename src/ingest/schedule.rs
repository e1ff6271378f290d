//! Schedule enrichment from the archive: playoff rounds, venue names for
//! older seasons, and the day/night flag when the live feed never supplied a
//! usable kickoff. Existing values are never overwritten.

use anyhow::Result;
use sqlx::SqlitePool;

use super::resolver::Resolver;
use super::RunReport;
use crate::clients::nflverse::NflverseClient;
use crate::db;

pub async fn enrich_schedule(
    pool: &SqlitePool,
    nflverse: &NflverseClient,
    season: i64,
) -> Result<RunReport> {
    let mut report = RunReport::default();

    let mut rows = match nflverse.schedule(season).await {
        Ok(rows) => rows,
        Err(e) if e.is_not_found() => {
            tracing::info!("Schedule for {} not yet published", season);
            return Ok(report);
        }
        Err(e) => return Err(e.into()),
    };

    let mut resolver = Resolver::new();

    while rows.advance()? {
        let week = rows.int("week");
        let home_abbr = rows.text("home_team").to_string();
        let Some(home_team_id) = resolver.team_by_abbr(pool, &home_abbr).await? else {
            report.record_skip();
            continue;
        };
        let Some(game_id) = resolver.game(pool, season, week, &home_team_id).await? else {
            report.record_skip();
            continue;
        };

        let playoff_round = playoff_round_for(rows.text("game_type"));
        let venue = match rows.text("stadium") {
            "" => None,
            v => Some(v.to_string()),
        };
        // Archive game times are already stadium-local "HH:MM".
        let is_day = rows
            .text("gametime")
            .split(':')
            .next()
            .and_then(|h| h.parse::<u32>().ok())
            .map(|h| h < 17);

        match db::update_game_schedule_fields(
            pool,
            &game_id,
            playoff_round,
            venue.as_deref(),
            is_day,
        )
        .await
        {
            Ok(()) => report.record_upsert(),
            Err(e) => report.record_error(format!("game {}: {}", game_id, e)),
        }
    }

    Ok(report.finish("schedule enrichment"))
}

fn playoff_round_for(game_type: &str) -> Option<&'static str> {
    match game_type {
        "WC" => Some("wildcard"),
        "DIV" => Some("divisional"),
        "CON" => Some("conference"),
        "SB" => Some("super_bowl"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_season_has_no_round() {
        assert_eq!(playoff_round_for("REG"), None);
        assert_eq!(playoff_round_for("SB"), Some("super_bowl"));
    }
}
