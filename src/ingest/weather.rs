//! Historical weather enrichment for home games that have none recorded.
//! The provider only exposes day-level aggregates for past dates, so the
//! day-average temperature stands in for kickoff conditions. Day/night is
//! derived from the stadium-local kickoff hour.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::Timelike;
use sqlx::SqlitePool;

use super::RunReport;
use crate::clients::weather::WeatherClient;
use crate::db;
use crate::models::Team;
use crate::utils::approx_local_time;

const DAY_GAME_CUTOFF_HOUR: u32 = 17;

pub async fn enrich_weather(
    pool: &SqlitePool,
    weather: Option<&WeatherClient>,
    season: i64,
) -> Result<RunReport> {
    let Some(client) = weather else {
        return Err(anyhow!(
            "weather enrichment skipped: WEATHER_API_KEY is not configured"
        ));
    };

    let mut report = RunReport::default();
    let games = db::get_games_missing_weather(pool, season).await?;
    let mut stadiums: HashMap<String, Team> = HashMap::new();

    for game in games {
        let team = match stadiums.get(&game.home_team_id) {
            Some(t) => t.clone(),
            None => {
                let Some(t) = db::get_team_by_id(pool, &game.home_team_id).await? else {
                    report.record_skip();
                    continue;
                };
                stadiums.insert(game.home_team_id.clone(), t.clone());
                t
            }
        };
        let (Some(lat), Some(lon)) = (team.stadium_lat, team.stadium_lon) else {
            report.record_skip();
            continue;
        };

        let local_kickoff = approx_local_time(game.kickoff, lon);
        let date = local_kickoff.format("%Y-%m-%d").to_string();

        // The client paces itself between calls.
        let day = match client.history(lat, lon, &date).await {
            Ok(day) => day,
            Err(e) => {
                tracing::error!("Weather lookup failed for game {}: {}", game.id, e);
                report.record_error(format!("game {}: {}", game.id, e));
                continue;
            }
        };

        let update = db::WeatherUpdate {
            temp_f: day.avgtemp_f,
            condition: &day.condition.text,
            wind_mph: day.maxwind_mph,
            humidity: day.avghumidity,
            pressure_mb: day.avgpressure_mb.unwrap_or(0.0),
            visibility_miles: day.avgvis_miles,
            precip_in: day.totalprecip_in,
            cloud_pct: day.avgcloud.unwrap_or(0.0),
            is_day_game: local_kickoff.hour() < DAY_GAME_CUTOFF_HOUR,
        };
        match db::update_game_weather(pool, &game.id, &update).await {
            Ok(()) => report.record_upsert(),
            Err(e) => report.record_error(format!("game {}: {}", game.id, e)),
        }
    }

    Ok(report.finish("weather enrichment"))
}
