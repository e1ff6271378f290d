//! Adaptive sync scheduler. Cadence is a pure function of the calendar:
//! game-time windows on game days run at the live interval, game days outside
//! the windows at the active interval, in-season weekdays at the standard
//! interval, and the offseason idles. An operator override pins the mode.
//!
//! Each iteration runs the games sync, the current-week stats sync, the
//! once-a-day injuries sync, and then invalidates the read cache. Sub-steps
//! swallow their own failures; the iteration counts as successful only when
//! the games step succeeded.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike, Utc, Weekday};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::{watch, Notify, RwLock};

use crate::cache::{Cache, SYNC_PATTERNS};
use crate::clients::espn::EspnClient;
use crate::clients::nflverse::NflverseClient;
use crate::config::SchedulerConfig;
use crate::db;
use crate::ingest::{boxscores, games, injuries, scoring_plays};
use crate::services::standings;

/// Local hour at which the daily injuries sync runs.
const INJURY_SYNC_HOUR: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Live,
    Active,
    Standard,
    Idle,
    Disabled,
}

impl SyncMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Live => "live",
            SyncMode::Active => "active",
            SyncMode::Standard => "standard",
            SyncMode::Idle => "idle",
            SyncMode::Disabled => "disabled",
        }
    }

    /// None means never wake up on the timer (disabled).
    pub fn interval(&self, config: &SchedulerConfig) -> Option<Duration> {
        match self {
            SyncMode::Live => Some(config.live_interval),
            SyncMode::Active => Some(config.active_interval),
            SyncMode::Standard => Some(config.standard_interval),
            SyncMode::Idle => Some(config.idle_interval),
            SyncMode::Disabled => None,
        }
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(SyncMode::Live),
            "active" => Ok(SyncMode::Active),
            "standard" => Ok(SyncMode::Standard),
            "idle" => Ok(SyncMode::Idle),
            "disabled" => Ok(SyncMode::Disabled),
            other => Err(format!("unknown sync mode {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeasonInfo {
    pub season: i64,
    pub week: i64,
    pub offseason: bool,
    pub postseason: bool,
}

/// Season phase from the local calendar. March through August is offseason;
/// the season year is the year it kicked off in. The current week counts
/// seven-day blocks from the first Thursday of September.
pub fn season_info(now: DateTime<Local>) -> SeasonInfo {
    let month = now.month();
    let offseason = (3..=8).contains(&month);
    let season = if month >= 9 {
        now.year() as i64
    } else {
        now.year() as i64 - 1
    };

    let start = first_thursday_of_september(season as i32);
    let days = (now.date_naive() - start).num_days();
    let week = (days.div_euclid(7) + 1).clamp(1, 22);

    SeasonInfo {
        season,
        week,
        offseason,
        postseason: !offseason && week > 18,
    }
}

fn first_thursday_of_september(year: i32) -> NaiveDate {
    let sept1 = NaiveDate::from_ymd_opt(year, 9, 1).unwrap_or_default();
    let offset = (Weekday::Thu.num_days_from_monday() + 7
        - sept1.weekday().num_days_from_monday())
        % 7;
    sept1 + chrono::Duration::days(offset as i64)
}

/// Thu/Sun/Mon year-round; Saturdays join late in the season and in the
/// playoffs.
fn is_game_day(weekday: Weekday, info: &SeasonInfo) -> bool {
    match weekday {
        Weekday::Thu | Weekday::Sun | Weekday::Mon => true,
        Weekday::Sat => info.week >= 15 || info.postseason,
        _ => false,
    }
}

/// Local-hour kickoff windows per game day.
fn in_game_window(weekday: Weekday, hour: u32, info: &SeasonInfo) -> bool {
    match weekday {
        Weekday::Thu | Weekday::Mon => (17..=23).contains(&hour),
        Weekday::Sun => (10..=23).contains(&hour),
        Weekday::Sat if is_game_day(weekday, info) => (10..=23).contains(&hour),
        _ => false,
    }
}

pub fn detect_mode(now: DateTime<Local>, info: &SeasonInfo, games_today: i64) -> SyncMode {
    if info.offseason {
        return SyncMode::Idle;
    }
    let weekday = now.weekday();
    if is_game_day(weekday, info) {
        if in_game_window(weekday, now.hour(), info) && games_today > 0 {
            return SyncMode::Live;
        }
        return SyncMode::Active;
    }
    SyncMode::Standard
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SchedulerStatus {
    pub enabled: bool,
    pub running: bool,
    pub current_mode: Option<SyncMode>,
    pub next_sync_at: Option<DateTime<Utc>>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub sync_count: u64,
    pub error_count: u64,
    pub interval_secs: Option<u64>,
    pub season_info: Option<SeasonInfo>,
    pub games_today: i64,
}

/// Shared handle for the status endpoint and the manual trigger.
#[derive(Clone)]
pub struct SchedulerHandle {
    status: Arc<RwLock<SchedulerStatus>>,
    trigger: Arc<Notify>,
}

impl SchedulerHandle {
    pub async fn status(&self) -> SchedulerStatus {
        self.status.read().await.clone()
    }

    /// Queue an immediate iteration. If one is running it follows right
    /// after; the period timer is untouched.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }
}

pub struct Scheduler {
    pool: SqlitePool,
    espn: EspnClient,
    nflverse: NflverseClient,
    cache: Cache,
    config: SchedulerConfig,
    status: Arc<RwLock<SchedulerStatus>>,
    trigger: Arc<Notify>,
    shutdown: watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(
        pool: SqlitePool,
        cache: Cache,
        config: SchedulerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let enabled = config_enabled(&config);
        Self {
            pool,
            espn: EspnClient::new(),
            nflverse: NflverseClient::new(),
            cache,
            config,
            status: Arc::new(RwLock::new(SchedulerStatus {
                enabled,
                ..Default::default()
            })),
            trigger: Arc::new(Notify::new()),
            shutdown,
        }
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            status: self.status.clone(),
            trigger: self.trigger.clone(),
        }
    }

    /// The scheduler loop: sync, recompute mode, sleep the mode's interval,
    /// repeat. A manual trigger or shutdown cuts the sleep short. At most one
    /// iteration runs at a time by construction.
    pub async fn run(mut self) {
        if !config_enabled(&self.config) {
            tracing::info!("Scheduler disabled by configuration");
            return;
        }

        loop {
            let now = Local::now();
            let info = season_info(now);
            let games_today = db::count_scheduled_games_today(&self.pool)
                .await
                .unwrap_or(0);
            let mode = self
                .config
                .mode_override
                .unwrap_or_else(|| detect_mode(now, &info, games_today));

            self.run_iteration(&info, games_today, mode).await;

            let Some(interval) = mode.interval(&self.config) else {
                tracing::info!("Scheduler mode is disabled, waiting for shutdown");
                let _ = self.shutdown.changed().await;
                return;
            };

            {
                let mut status = self.status.write().await;
                status.next_sync_at = Some(
                    Utc::now()
                        + chrono::Duration::from_std(interval)
                            .unwrap_or_else(|_| chrono::Duration::zero()),
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.trigger.notified() => {
                    tracing::info!("Manual sync trigger received");
                }
                _ = self.shutdown.changed() => {
                    tracing::info!("Scheduler shutting down");
                    return;
                }
            }
        }
    }

    async fn run_iteration(&self, info: &SeasonInfo, games_today: i64, mode: SyncMode) {
        {
            let mut status = self.status.write().await;
            status.running = true;
            status.current_mode = Some(mode);
            status.interval_secs = mode.interval(&self.config).map(|d| d.as_secs());
            status.season_info = Some(*info);
            status.games_today = games_today;
        }

        tracing::info!(
            "Sync cycle starting: mode={} season={} week={}",
            mode.as_str(),
            info.season,
            info.week
        );

        let mut iteration_error: Option<String> = None;

        // 1. Games — the primary step; its failure fails the iteration.
        if self.config.sync_games && !info.offseason {
            if let Err(e) = games::sync_scoreboard(&self.pool, &self.espn).await {
                tracing::error!("Games sync failed: {}", e);
                iteration_error = Some(e.to_string());
            }
        }
        if self.cancelled() {
            return;
        }

        // 2. Current-week stats: box scores, scoring plays, standings.
        if self.config.sync_stats && !info.offseason {
            if let Err(e) =
                boxscores::sync_boxscores(&self.pool, &self.espn, info.season, info.week).await
            {
                tracing::error!("Box score sync failed: {}", e);
            }
            if let Err(e) =
                scoring_plays::sync_scoring_plays(&self.pool, &self.espn, info.season, info.week)
                    .await
            {
                tracing::error!("Scoring plays sync failed: {}", e);
            }
            if let Err(e) = standings::compute_standings(&self.pool, info.season, info.week).await {
                tracing::error!("Standings computation failed: {}", e);
            }
        }
        if self.cancelled() {
            return;
        }

        // 3. Injuries, once a day at the fixed local slot.
        if self.config.sync_injuries && Local::now().hour() == INJURY_SYNC_HOUR {
            if let Err(e) = injuries::sync_injuries(&self.pool, &self.nflverse, info.season).await {
                tracing::error!("Injuries sync failed: {}", e);
            }
        }

        // 4. Cache invalidation after writes.
        if self.config.clear_cache {
            let mut removed = 0;
            for pattern in SYNC_PATTERNS {
                removed += self.cache.delete_pattern(pattern).await;
            }
            tracing::debug!("Cache invalidated: {} entries", removed);
        }

        let mut status = self.status.write().await;
        status.running = false;
        status.last_sync_at = Some(Utc::now());
        status.sync_count += 1;
        if let Some(err) = iteration_error {
            status.error_count += 1;
            status.last_error = Some(err);
        } else {
            status.last_error = None;
        }
    }

    fn cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }
}

fn config_enabled(config: &SchedulerConfig) -> bool {
    config.enabled && config.mode_override != Some(SyncMode::Disabled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn sunday_afternoon_in_season_is_live() {
        // 2024-10-06 is a Sunday in week 5.
        let now = local(2024, 10, 6, 14);
        let info = season_info(now);
        assert!(!info.offseason);
        assert_eq!(info.season, 2024);
        assert_eq!(detect_mode(now, &info, 1), SyncMode::Live);
    }

    #[test]
    fn sunday_without_games_is_active_not_live() {
        let now = local(2024, 10, 6, 14);
        let info = season_info(now);
        assert_eq!(detect_mode(now, &info, 0), SyncMode::Active);
    }

    #[test]
    fn july_is_idle_regardless_of_weekday() {
        // 2024-07-07 is also a Sunday.
        let now = local(2024, 7, 7, 14);
        let info = season_info(now);
        assert!(info.offseason);
        assert_eq!(info.season, 2023);
        assert_eq!(detect_mode(now, &info, 3), SyncMode::Idle);
    }

    #[test]
    fn game_day_outside_window_is_active() {
        // Thursday 08:00, in season: game day but before the window.
        let now = local(2024, 10, 3, 8);
        let info = season_info(now);
        assert_eq!(detect_mode(now, &info, 2), SyncMode::Active);
    }

    #[test]
    fn midweek_is_standard() {
        // Wednesday in season.
        let now = local(2024, 10, 2, 12);
        let info = season_info(now);
        assert_eq!(detect_mode(now, &info, 0), SyncMode::Standard);
    }

    #[test]
    fn saturday_joins_late_season() {
        // 2024-12-21 is a Saturday; week >= 15 by then.
        let now = local(2024, 12, 21, 14);
        let info = season_info(now);
        assert!(info.week >= 15);
        assert_eq!(detect_mode(now, &info, 2), SyncMode::Live);

        // An early-season Saturday is a plain standard day.
        let early = local(2024, 9, 14, 14);
        let early_info = season_info(early);
        assert_eq!(detect_mode(early, &early_info, 2), SyncMode::Standard);
    }

    #[test]
    fn season_week_counts_from_first_september_thursday() {
        assert_eq!(
            first_thursday_of_september(2024),
            NaiveDate::from_ymd_opt(2024, 9, 5).unwrap()
        );
        let opener = local(2024, 9, 5, 20);
        assert_eq!(season_info(opener).week, 1);
        let week2 = local(2024, 9, 12, 20);
        assert_eq!(season_info(week2).week, 2);
        // January of the following year is deep in the same season.
        let january = local(2025, 1, 12, 13);
        let info = season_info(january);
        assert_eq!(info.season, 2024);
        assert!(info.week > 18);
        assert!(info.postseason);
    }

    #[test]
    fn intervals_follow_mode() {
        let config = SchedulerConfig::default();
        assert_eq!(
            SyncMode::Live.interval(&config),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            SyncMode::Idle.interval(&config),
            Some(Duration::from_secs(3600))
        );
        assert_eq!(SyncMode::Disabled.interval(&config), None);
    }

    #[test]
    fn mode_parses_from_config_strings() {
        assert_eq!("live".parse::<SyncMode>(), Ok(SyncMode::Live));
        assert_eq!("DISABLED".parse::<SyncMode>(), Ok(SyncMode::Disabled));
        assert!("sometimes".parse::<SyncMode>().is_err());
    }
}
