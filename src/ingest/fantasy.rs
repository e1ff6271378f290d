//! Fantasy rankings and projections from the Yahoo API. Players resolve by
//! name with the editorial team as the hint; a hit also stamps the Yahoo
//! player key so later projection lookups can batch by key.

use anyhow::{anyhow, Result};
use sqlx::SqlitePool;

use super::resolver::Resolver;
use super::RunReport;
use crate::clients::yahoo::YahooClient;
use crate::db;
use crate::models::FantasyRanking;

const POSITIONS: [&str; 6] = ["QB", "RB", "WR", "TE", "K", "DEF"];

pub async fn sync_fantasy_rankings(
    pool: &SqlitePool,
    yahoo: Option<&YahooClient>,
    season: i64,
    week: i64,
) -> Result<RunReport> {
    let Some(client) = yahoo else {
        return Err(anyhow!(
            "fantasy sync skipped: YAHOO_ACCESS_TOKEN is not configured"
        ));
    };

    let mut report = RunReport::default();
    let mut resolver = Resolver::new();

    for position in POSITIONS {
        let players = match client.rankings(position, week).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("Rankings fetch failed for {}: {}", position, e);
                report.record_error(format!("{}: {}", position, e));
                continue;
            }
        };

        for (rank, player) in players.iter().enumerate() {
            let team_id = match &player.team_abbr {
                Some(abbr) => resolver.team_by_abbr(pool, abbr).await?,
                None => None,
            };
            let Some(player_id) = resolver
                .player(pool, &player.name, team_id.as_deref())
                .await?
            else {
                report.record_skip();
                continue;
            };

            if let Err(e) = db::set_player_yahoo_key(pool, &player_id, &player.player_key).await {
                tracing::debug!("Yahoo key stamp failed for {}: {}", player.name, e);
            }

            let ranking = FantasyRanking {
                player_id,
                season,
                week,
                position: position.to_string(),
                rank: player.rank.or(Some(rank as i64 + 1)),
                projected_points: player.projected_points,
                source: "yahoo".to_string(),
            };
            match db::upsert_fantasy_ranking(pool, &ranking).await {
                Ok(()) => report.record_upsert(),
                Err(e) => report.record_error(format!("{}: {}", player.name, e)),
            }
        }
    }

    Ok(report.finish("fantasy rankings sync"))
}
