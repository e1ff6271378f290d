//! CLI commands for operators: one-shot syncs, historical backfills,
//! standings recomputation and team lookup.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::clients::espn::EspnClient;
use crate::clients::nflverse::NflverseClient;
use crate::clients::weather::WeatherClient;
use crate::clients::yahoo::YahooClient;
use crate::config::Config;
use crate::db;
use crate::ingest::{
    boxscores, fantasy, games, injuries, ngs, play_by_play, rosters, schedule, scoring_plays,
    teams, weather, weekly_stats, RunReport,
};
use crate::services::scheduler::season_info;
use crate::services::standings;

const REGULAR_SEASON_WEEKS: i64 = 18;
const BACKFILL_DATASETS: [&str; 7] =
    ["games", "boxscores", "stats", "pbp", "ngs", "injuries", "schedule"];

async fn open_pool() -> Result<(Config, SqlitePool)> {
    let config = Config::from_env()?;
    let pool = db::create_pool(&config).await?;
    db::init_schema(&pool).await?;
    Ok((config, pool))
}

pub async fn sync(target: &str) -> Result<()> {
    let (config, pool) = open_pool().await?;
    let espn = EspnClient::new();
    let nflverse = NflverseClient::new();
    let info = season_info(chrono::Local::now());

    println!("🏈 Syncing {} (season {} week {})", target, info.season, info.week);

    match target {
        "teams" => print_report(teams::sync_teams(&pool, &espn).await?),
        "rosters" => print_report(rosters::sync_rosters(&pool, &espn).await?),
        "games" => print_report(games::sync_scoreboard(&pool, &espn).await?),
        "stats" => {
            print_report(boxscores::sync_boxscores(&pool, &espn, info.season, info.week).await?);
            print_report(
                weekly_stats::sync_weekly_stats(&pool, &nflverse, info.season).await?,
            );
        }
        "scoring" => print_report(
            scoring_plays::sync_scoring_plays(&pool, &espn, info.season, info.week).await?,
        ),
        "weather" => {
            let client = config.weather_api_key.clone().map(WeatherClient::new);
            print_report(weather::enrich_weather(&pool, client.as_ref(), info.season).await?);
        }
        "fantasy" => {
            let client = config.yahoo_access_token.clone().map(YahooClient::new);
            print_report(
                fantasy::sync_fantasy_rankings(&pool, client.as_ref(), info.season, info.week)
                    .await?,
            );
        }
        "all" => {
            print_report(teams::sync_teams(&pool, &espn).await?);
            print_report(rosters::sync_rosters(&pool, &espn).await?);
            print_report(games::sync_scoreboard(&pool, &espn).await?);
            print_report(boxscores::sync_boxscores(&pool, &espn, info.season, info.week).await?);
            print_report(
                scoring_plays::sync_scoring_plays(&pool, &espn, info.season, info.week).await?,
            );
            standings::compute_standings(&pool, info.season, info.week).await?;
        }
        other => {
            println!(
                "❌ Unknown sync target: {}. Use teams, rosters, games, stats, scoring, weather, fantasy, or all",
                other
            );
        }
    }

    Ok(())
}

/// Historical backfill across seasons, with per-(season, dataset) progress
/// bookkeeping so an interrupted run can be inspected and resumed.
pub async fn backfill(
    start_season: i64,
    end_season: i64,
    datasets: Option<Vec<String>>,
) -> Result<()> {
    let (_config, pool) = open_pool().await?;
    let espn = EspnClient::new();
    let nflverse = NflverseClient::new();

    let wanted: Vec<String> = datasets.unwrap_or_else(|| {
        BACKFILL_DATASETS.iter().map(|s| s.to_string()).collect()
    });

    for season in start_season..=end_season {
        println!("📅 Backfilling season {}", season);

        for dataset in &wanted {
            db::mark_progress(&pool, season, dataset, "in_progress", 0, None).await?;

            let result = run_backfill_dataset(&pool, &espn, &nflverse, season, dataset).await;
            match result {
                Ok(report) => {
                    println!(
                        "  ✅ {}: {} upserted, {} skipped",
                        dataset, report.upserted, report.skipped
                    );
                    db::mark_progress(
                        &pool,
                        season,
                        dataset,
                        "completed",
                        report.upserted as i64,
                        None,
                    )
                    .await?;
                }
                Err(e) => {
                    println!("  ⚠️  {} failed: {}", dataset, e);
                    db::mark_progress(&pool, season, dataset, "failed", 0, Some(&e.to_string()))
                        .await?;
                }
            }
        }

        // Courtesy pacing between seasons.
        if season != end_season {
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        }
    }

    println!("✅ Backfill complete");
    Ok(())
}

async fn run_backfill_dataset(
    pool: &SqlitePool,
    espn: &EspnClient,
    nflverse: &NflverseClient,
    season: i64,
    dataset: &str,
) -> Result<RunReport> {
    match dataset {
        "games" => {
            let mut combined = RunReport::default();
            for week in 1..=REGULAR_SEASON_WEEKS {
                merge(&mut combined, games::sync_week(pool, espn, season, week).await?);
            }
            Ok(combined)
        }
        "boxscores" => {
            let mut combined = RunReport::default();
            for week in 1..=REGULAR_SEASON_WEEKS {
                merge(
                    &mut combined,
                    boxscores::sync_boxscores(pool, espn, season, week).await?,
                );
            }
            Ok(combined)
        }
        "stats" => weekly_stats::sync_weekly_stats(pool, nflverse, season).await,
        "pbp" => {
            let mut combined = RunReport::default();
            for week in 1..=REGULAR_SEASON_WEEKS {
                merge(
                    &mut combined,
                    play_by_play::sync_play_by_play(pool, nflverse, season, week).await?,
                );
            }
            Ok(combined)
        }
        "ngs" => ngs::sync_all_ngs(pool, nflverse, season).await,
        "injuries" => injuries::sync_injuries(pool, nflverse, season).await,
        "schedule" => schedule::enrich_schedule(pool, nflverse, season).await,
        other => Err(anyhow::anyhow!("unknown dataset {:?}", other)),
    }
}

fn merge(into: &mut RunReport, from: RunReport) {
    into.processed += from.processed;
    into.upserted += from.upserted;
    into.skipped += from.skipped;
    into.errors.extend(from.errors);
}

pub async fn compute_standings(season: i64, week: i64) -> Result<()> {
    let (_config, pool) = open_pool().await?;
    let written = standings::compute_standings(&pool, season, week).await?;
    println!("✅ Standings written for {} teams", written);

    let teams = db::get_all_teams(&pool).await?;
    let abbr: std::collections::HashMap<&str, &str> = teams
        .iter()
        .map(|t| (t.id.as_str(), t.abbreviation.as_str()))
        .collect();

    println!("\n🏆 Season {} through week {}:", season, week);
    for standing in db::get_standings(&pool, season, week).await? {
        let seed = standing
            .playoff_seed
            .map(|s| format!(" (seed {})", s))
            .unwrap_or_default();
        println!(
            "   {:>4} {:>2}-{:<2}-{} {:>+4} {}{}",
            abbr.get(standing.team_id.as_str()).unwrap_or(&"?"),
            standing.wins,
            standing.losses,
            standing.ties,
            standing.point_diff,
            standing.streak,
            seed
        );
    }
    Ok(())
}

/// Team lookup by name, with fuzzy suggestions when nothing matches exactly.
pub async fn team_lookup(name: &str) -> Result<()> {
    let (_config, pool) = open_pool().await?;
    let teams = db::get_all_teams(&pool).await?;

    let needle = name.to_lowercase();
    let matched: Vec<_> = teams
        .iter()
        .filter(|t| {
            t.name.to_lowercase().contains(&needle)
                || t.city.to_lowercase().contains(&needle)
                || t.abbreviation.to_lowercase() == needle
        })
        .collect();

    if matched.is_empty() {
        println!("❌ No team found matching '{}'", name);
        let mut scored: Vec<_> = teams
            .iter()
            .map(|t| (strsim::jaro_winkler(&needle, &t.name.to_lowercase()), t))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        println!("\n💡 Did you mean:");
        for (_, team) in scored.iter().take(3) {
            println!("   • {} ({})", team.name, team.abbreviation);
        }
        return Ok(());
    }

    for team in matched {
        println!("📊 {} ({})", team.name, team.abbreviation);
        if let (Some(conference), Some(division)) = (&team.conference, &team.division) {
            println!("   {} {}", conference, division);
        }
        if let Some(stadium) = &team.stadium_name {
            let roof = team.stadium_type.as_deref().unwrap_or("unknown roof");
            println!("   🏟  {} ({})", stadium, roof);
        }
    }
    Ok(())
}

fn print_report(report: RunReport) {
    println!(
        "   processed={} upserted={} skipped={}",
        report.processed, report.upserted, report.skipped
    );
}
