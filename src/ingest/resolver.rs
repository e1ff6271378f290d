//! External-reference resolution with per-run caches. A `Resolver` is built
//! at the top of each pipeline run and dropped with it — the caches are never
//! shared across runs, so a roster sync in between can't leave them stale.
//!
//! Player matching is a priority ladder calibrated against how the feeds
//! disagree about identity formatting:
//!   1. exact case-insensitive name + team,
//!   2. last-name substring + same team,
//!   3. exact case-insensitive name, any team (covers mid-season trades).
//! The substring rung is deliberately confined to a team filter to cap false
//! positives. No match is a skip for the caller, not an error.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db;
use crate::utils::{last_name, normalize_team_abbr};

#[derive(Default)]
pub struct Resolver {
    teams_by_espn: HashMap<i64, Option<String>>,
    teams_by_abbr: HashMap<String, Option<String>>,
    players: HashMap<String, Option<String>>,
    players_by_gsis: HashMap<String, Option<String>>,
    games: HashMap<String, Option<String>>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn team_by_espn_id(
        &mut self,
        pool: &SqlitePool,
        espn_id: i64,
    ) -> Result<Option<String>> {
        if let Some(cached) = self.teams_by_espn.get(&espn_id) {
            return Ok(cached.clone());
        }
        let id = db::get_team_by_espn_id(pool, espn_id).await?.map(|t| t.id);
        self.teams_by_espn.insert(espn_id, id.clone());
        Ok(id)
    }

    pub async fn team_by_abbr(&mut self, pool: &SqlitePool, abbr: &str) -> Result<Option<String>> {
        let abbr = normalize_team_abbr(abbr);
        if let Some(cached) = self.teams_by_abbr.get(&abbr) {
            return Ok(cached.clone());
        }
        let id = db::get_team_by_abbr(pool, &abbr).await?.map(|t| t.id);
        self.teams_by_abbr.insert(abbr, id.clone());
        Ok(id)
    }

    /// The name ladder. `team_id` narrows the first two rungs; rung three
    /// ignores it.
    pub async fn player(
        &mut self,
        pool: &SqlitePool,
        name: &str,
        team_id: Option<&str>,
    ) -> Result<Option<String>> {
        let key = format!("{}|{}", name.to_lowercase(), team_id.unwrap_or("-"));
        if let Some(cached) = self.players.get(&key) {
            return Ok(cached.clone());
        }

        let mut found = None;
        if let Some(team_id) = team_id {
            found = db::find_player_by_name_and_team(pool, name, team_id).await?;
            if found.is_none() {
                found = db::find_player_by_lastname_and_team(pool, last_name(name), team_id).await?;
            }
        }
        if found.is_none() {
            found = db::find_player_by_name(pool, name).await?;
        }

        let id = found.map(|p| p.id);
        self.players.insert(key, id.clone());
        Ok(id)
    }

    /// GSIS-first lookup for the archive feeds. A name-ladder hit stamps the
    /// GSIS id onto the player row so the next season's run matches exactly.
    pub async fn player_by_gsis_or_name(
        &mut self,
        pool: &SqlitePool,
        gsis_id: &str,
        name: &str,
        team_id: Option<&str>,
    ) -> Result<Option<String>> {
        if !gsis_id.is_empty() {
            if let Some(cached) = self.players_by_gsis.get(gsis_id) {
                if cached.is_some() {
                    return Ok(cached.clone());
                }
            } else {
                let id = db::get_player_by_gsis_id(pool, gsis_id).await?.map(|p| p.id);
                self.players_by_gsis.insert(gsis_id.to_string(), id.clone());
                if id.is_some() {
                    return Ok(id);
                }
            }
        }

        let resolved = self.player(pool, name, team_id).await?;
        if let (Some(player_id), false) = (&resolved, gsis_id.is_empty()) {
            db::set_player_gsis_id(pool, player_id, gsis_id).await?;
            self.players_by_gsis
                .insert(gsis_id.to_string(), Some(player_id.clone()));
        }
        Ok(resolved)
    }

    /// Game lookup for archive rows, keyed by (season, week, home team).
    pub async fn game(
        &mut self,
        pool: &SqlitePool,
        season: i64,
        week: i64,
        home_team_id: &str,
    ) -> Result<Option<String>> {
        let key = format!("{}|{}|{}", season, week, home_team_id);
        if let Some(cached) = self.games.get(&key) {
            return Ok(cached.clone());
        }
        let id = db::find_game_id(pool, season, week, home_team_id).await?;
        self.games.insert(key, id.clone());
        Ok(id)
    }
}
