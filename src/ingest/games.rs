//! Games sync from the scoreboard (live) and the historical week endpoint.
//! The natural key is the external event id; status transitions only move
//! forward through scheduled → in_progress → completed.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::SqlitePool;

use super::resolver::Resolver;
use super::RunReport;
use crate::clients::espn::{Competition, Competitor, EspnClient, Event};
use crate::db;
use crate::models::GameStatus;

pub async fn sync_scoreboard(pool: &SqlitePool, espn: &EspnClient) -> Result<RunReport> {
    let scoreboard = espn.scoreboard().await.context("scoreboard fetch failed")?;
    upsert_events(pool, &scoreboard.events, None, None).await
}

pub async fn sync_week(
    pool: &SqlitePool,
    espn: &EspnClient,
    season: i64,
    week: i64,
) -> Result<RunReport> {
    let scoreboard = espn
        .scoreboard_for(season, week)
        .await
        .with_context(|| format!("scoreboard fetch failed for {} week {}", season, week))?;
    upsert_events(pool, &scoreboard.events, Some(season), Some(week)).await
}

async fn upsert_events(
    pool: &SqlitePool,
    events: &[Event],
    season_hint: Option<i64>,
    week_hint: Option<i64>,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut resolver = Resolver::new();

    for event in events {
        match upsert_event(pool, &mut resolver, event, season_hint, week_hint).await {
            Ok(true) => report.record_upsert(),
            Ok(false) => report.record_skip(),
            Err(e) => report.record_error(format!("event {}: {}", event.id, e)),
        }
    }

    Ok(report.finish("games sync"))
}

/// Ok(false) means a resolvable-but-incomplete event (missing team, unknown
/// competitor) that we skip without counting as an error.
async fn upsert_event(
    pool: &SqlitePool,
    resolver: &mut Resolver,
    event: &Event,
    season_hint: Option<i64>,
    week_hint: Option<i64>,
) -> Result<bool> {
    let Some(competition) = event.competitions.first() else {
        return Ok(false);
    };
    let Some(home) = find_side(competition, "home") else {
        return Ok(false);
    };
    let Some(away) = find_side(competition, "away") else {
        return Ok(false);
    };

    let home_team_id = resolve_competitor(pool, resolver, home).await?;
    let away_team_id = resolve_competitor(pool, resolver, away).await?;
    let (Some(home_team_id), Some(away_team_id)) = (home_team_id, away_team_id) else {
        tracing::debug!("Event {} references an unknown team, skipping", event.id);
        return Ok(false);
    };
    if home_team_id == away_team_id {
        return Ok(false);
    }

    let season = event
        .season
        .as_ref()
        .map(|s| s.year)
        .or(season_hint)
        .unwrap_or(0);
    let week = event
        .week
        .as_ref()
        .map(|w| w.number)
        .or(week_hint)
        .unwrap_or(0);

    let kickoff = parse_event_instant(&event.date)
        .with_context(|| format!("unparseable kickoff {:?}", event.date))?;

    let status = competition
        .status
        .as_ref()
        .map(map_status)
        .unwrap_or(GameStatus::Scheduled);

    let upsert = db::GameUpsert {
        espn_id: &event.id,
        season,
        week,
        kickoff,
        home_team_id: &home_team_id,
        away_team_id: &away_team_id,
        home_score: home.score.as_deref().and_then(|s| s.parse().ok()),
        away_score: away.score.as_deref().and_then(|s| s.parse().ok()),
        status,
        status_detail: competition
            .status
            .as_ref()
            .and_then(|s| s.status_type.as_ref())
            .and_then(|t| t.detail.as_deref()),
        period: competition.status.as_ref().and_then(|s| s.period),
        clock: competition
            .status
            .as_ref()
            .and_then(|s| s.display_clock.as_deref()),
        venue_name: competition
            .venue
            .as_ref()
            .and_then(|v| v.full_name.as_deref()),
        venue_city: competition
            .venue
            .as_ref()
            .and_then(|v| v.address.as_ref())
            .and_then(|a| a.city.as_deref()),
        attendance: competition.attendance,
        playoff_round: None,
    };
    db::upsert_game(pool, &upsert).await?;
    Ok(true)
}

fn find_side<'a>(competition: &'a Competition, side: &str) -> Option<&'a Competitor> {
    competition.competitors.iter().find(|c| c.home_away == side)
}

async fn resolve_competitor(
    pool: &SqlitePool,
    resolver: &mut Resolver,
    competitor: &Competitor,
) -> Result<Option<String>> {
    if let Ok(espn_id) = competitor.team.id.parse::<i64>() {
        if let Some(id) = resolver.team_by_espn_id(pool, espn_id).await? {
            return Ok(Some(id));
        }
    }
    if let Some(abbr) = competitor.team.abbreviation.as_deref() {
        return resolver.team_by_abbr(pool, abbr).await;
    }
    Ok(None)
}

fn map_status(status: &crate::clients::espn::CompetitionStatus) -> GameStatus {
    let Some(status_type) = status.status_type.as_ref() else {
        return GameStatus::Scheduled;
    };
    if status_type.completed {
        return GameStatus::Completed;
    }
    match status_type.state.as_deref() {
        Some("in") => GameStatus::InProgress,
        _ => GameStatus::Scheduled,
    }
}

/// Event timestamps come as "2023-09-10T17:00Z", sometimes with seconds.
fn parse_event_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let trimmed = raw.trim_end_matches('Z');
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_instant_formats() {
        assert!(parse_event_instant("2023-09-10T17:00Z").is_some());
        assert!(parse_event_instant("2023-09-10T17:00:00Z").is_some());
        assert!(parse_event_instant("2023-09-10T17:00:00+00:00").is_some());
        assert!(parse_event_instant("Sunday").is_none());
    }
}
