//! Play-by-play ingestion for one week of a season. The archive publishes a
//! whole-season file, so rows are filtered to the requested week while
//! streaming. Team, game and player lookups are cached for the run, and the
//! two play aggregates are rebuilt once the week is in.

use std::collections::HashSet;

use anyhow::Result;
use sqlx::SqlitePool;

use super::csv::RowCursor;
use super::resolver::Resolver;
use super::RunReport;
use crate::clients::nflverse::NflverseClient;
use crate::db;
use crate::models::Play;

pub async fn sync_play_by_play(
    pool: &SqlitePool,
    nflverse: &NflverseClient,
    season: i64,
    week: i64,
) -> Result<RunReport> {
    let rows = match nflverse.play_by_play(season).await {
        Ok(rows) => rows,
        Err(e) if e.is_not_found() => {
            tracing::info!("Play-by-play for {} not yet published", season);
            return Ok(RunReport::default());
        }
        Err(e) => return Err(e.into()),
    };
    ingest_rows(pool, rows, season, week).await
}

pub async fn ingest_rows<R: std::io::Read>(
    pool: &SqlitePool,
    mut rows: RowCursor<R>,
    season: i64,
    week: i64,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut resolver = Resolver::new();
    let mut touched_games: HashSet<String> = HashSet::new();

    while rows.advance()? {
        if rows.int("week") != week {
            continue;
        }

        let home_abbr = rows.text("home_team").to_string();
        let Some(home_team_id) = resolver.team_by_abbr(pool, &home_abbr).await? else {
            report.record_skip();
            continue;
        };
        let Some(game_id) = resolver.game(pool, season, week, &home_team_id).await? else {
            // Game not ingested yet; the next games sync will pick it up.
            report.record_skip();
            continue;
        };

        let play_id = rows.text("play_id").to_string();
        if play_id.is_empty() {
            report.record_skip();
            continue;
        }

        let posteam_id = match rows.text("posteam") {
            "" => None,
            abbr => resolver.team_by_abbr(pool, abbr).await?,
        };

        let passer_id = resolve_role(pool, &mut resolver, &rows, "passer_player_id", "passer_player_name", posteam_id.as_deref()).await?;
        let rusher_id = resolve_role(pool, &mut resolver, &rows, "rusher_player_id", "rusher_player_name", posteam_id.as_deref()).await?;
        let receiver_id = resolve_role(pool, &mut resolver, &rows, "receiver_player_id", "receiver_player_name", posteam_id.as_deref()).await?;

        let play = Play {
            play_id,
            game_id: game_id.clone(),
            quarter: rows.opt_int("qtr"),
            down: rows.opt_int("down"),
            distance: rows.opt_int("ydstogo"),
            yardline: rows.opt_int("yardline_100"),
            clock: non_empty(rows.text("time")),
            play_type: non_empty(rows.text("play_type")),
            description: non_empty(rows.text("desc")),
            posteam_id,
            passer_id,
            rusher_id,
            receiver_id,
            yards_gained: rows.opt_int("yards_gained"),
            epa: rows.opt_float("epa"),
            wpa: rows.opt_float("wpa"),
            touchdown: rows.bool_flag("touchdown"),
            interception: rows.bool_flag("interception"),
            fumble: rows.bool_flag("fumble"),
            home_score_after: rows.opt_int("total_home_score"),
            away_score_after: rows.opt_int("total_away_score"),
        };

        match db::upsert_play(pool, &play).await {
            Ok(()) => {
                touched_games.insert(game_id);
                report.record_upsert();
            }
            Err(e) => report.record_error(format!("play {}: {}", play.play_id, e)),
        }
    }

    let game_ids: Vec<String> = touched_games.into_iter().collect();
    if !game_ids.is_empty() {
        db::refresh_play_aggregates(pool, &game_ids).await?;
        tracing::info!("Play aggregates refreshed for {} games", game_ids.len());
    }

    Ok(report.finish("play-by-play sync"))
}

async fn resolve_role(
    pool: &SqlitePool,
    resolver: &mut Resolver,
    rows: &RowCursor<impl std::io::Read>,
    id_col: &str,
    name_col: &str,
    team_id: Option<&str>,
) -> Result<Option<String>> {
    let gsis_id = rows.text(id_col);
    let name = rows.text(name_col);
    if gsis_id.is_empty() && name.is_empty() {
        return Ok(None);
    }
    resolver
        .player_by_gsis_or_name(pool, gsis_id, name, team_id)
        .await
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
