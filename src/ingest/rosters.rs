//! Roster sync: one feed call per team, paced to respect the upstream.

use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use super::RunReport;
use crate::clients::espn::{Athlete, EspnClient};
use crate::db;

const TEAM_CALL_GAP: Duration = Duration::from_secs(2);

pub async fn sync_rosters(pool: &SqlitePool, espn: &EspnClient) -> Result<RunReport> {
    let mut report = RunReport::default();
    let teams = db::get_all_teams(pool).await?;
    let mut first = true;

    for team in teams {
        let Some(espn_id) = team.espn_id else { continue };

        if !first {
            tokio::time::sleep(TEAM_CALL_GAP).await;
        }
        first = false;

        let roster = match espn.team_roster(espn_id).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("Roster fetch failed for {}: {}", team.abbreviation, e);
                report.record_error(format!("roster {}: {}", team.abbreviation, e));
                continue;
            }
        };

        for group in roster.athletes {
            for athlete in group.items {
                match upsert_athlete(pool, &athlete, &team.id).await {
                    Ok(()) => report.record_upsert(),
                    Err(e) => {
                        report.record_error(format!("{}: {}", team.abbreviation, e));
                    }
                }
            }
        }
    }

    Ok(report.finish("rosters sync"))
}

async fn upsert_athlete(pool: &SqlitePool, athlete: &Athlete, team_id: &str) -> Result<()> {
    let espn_id: i64 = athlete
        .id
        .parse()
        .map_err(|_| anyhow::anyhow!("athlete id {:?} is not numeric", athlete.id))?;

    let name = athlete
        .full_name
        .as_deref()
        .or(athlete.display_name.as_deref())
        .ok_or_else(|| anyhow::anyhow!("athlete {} has no name", espn_id))?;

    let upsert = db::PlayerUpsert {
        espn_id,
        name,
        position: athlete
            .position
            .as_ref()
            .and_then(|p| p.abbreviation.as_deref()),
        team_id: Some(team_id),
        jersey_number: athlete.jersey.as_deref().and_then(|j| j.parse().ok()),
        height_inches: athlete.height.map(|h| h.round() as i64),
        weight_pounds: athlete.weight.map(|w| w.round() as i64),
        birth_date: athlete.date_of_birth.as_deref().and_then(parse_birth_date),
        birth_city: athlete.birth_place.as_ref().and_then(|b| b.city.as_deref()),
        birth_state: athlete.birth_place.as_ref().and_then(|b| b.state.as_deref()),
        college: athlete.college.as_ref().and_then(|c| c.name.as_deref()),
        draft_year: athlete.draft.as_ref().and_then(|d| d.year),
        draft_round: athlete.draft.as_ref().and_then(|d| d.round),
        draft_pick: athlete.draft.as_ref().and_then(|d| d.selection),
        status: map_status(athlete),
    };
    db::upsert_player(pool, &upsert).await
}

/// Feed status types collapse onto the three states the store knows.
fn map_status(athlete: &Athlete) -> &'static str {
    let raw = athlete
        .status
        .as_ref()
        .and_then(|s| s.status_type.as_deref())
        .unwrap_or("active")
        .to_lowercase();
    if raw.contains("injur") {
        "injured"
    } else if raw.contains("inactive") || raw.contains("practice") {
        "inactive"
    } else {
        "active"
    }
}

/// Birth dates arrive as "1995-09-17T07:00Z"; the date prefix is all we keep.
fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_date_prefix_parse() {
        assert_eq!(
            parse_birth_date("1995-09-17T07:00Z"),
            NaiveDate::from_ymd_opt(1995, 9, 17)
        );
        assert_eq!(parse_birth_date("bad"), None);
    }
}
