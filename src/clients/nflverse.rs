//! Bulk CSV archive client. Files live on GitHub release assets addressed as
//! `<base>/<dataset>/<file>_<season>.csv`; a 404 means the file is not yet
//! published for that season and is treated as a soft miss by every caller.

use std::io::Cursor;

use super::{build_client, get_with_retry, FetchError, BULK_TIMEOUT};
use crate::ingest::csv::RowCursor;

const BASE: &str = "https://github.com/nflverse/nflverse-data/releases/download";

#[derive(Clone)]
pub struct NflverseClient {
    client: reqwest::Client,
    base: String,
}

impl NflverseClient {
    pub fn new() -> Self {
        Self {
            client: build_client(BULK_TIMEOUT),
            base: BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base(base: &str) -> Self {
        Self {
            client: build_client(BULK_TIMEOUT),
            base: base.to_string(),
        }
    }

    /// Download one dataset file and hand back a header-indexed row cursor.
    pub async fn dataset(
        &self,
        dataset: &str,
        file: &str,
        season: i64,
    ) -> Result<RowCursor<Cursor<Vec<u8>>>, FetchError> {
        let url = format!("{}/{}/{}_{}.csv", self.base, dataset, file, season);
        let response = get_with_retry(&self.client, &url).await?;
        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: e,
        })?;
        RowCursor::new(Cursor::new(body.to_vec())).map_err(|e| FetchError::Status {
            status: 0,
            url,
            body: format!("unreadable CSV: {}", e),
        })
    }

    pub async fn player_stats(
        &self,
        season: i64,
    ) -> Result<RowCursor<Cursor<Vec<u8>>>, FetchError> {
        self.dataset("player_stats", "player_stats", season).await
    }

    pub async fn play_by_play(
        &self,
        season: i64,
    ) -> Result<RowCursor<Cursor<Vec<u8>>>, FetchError> {
        self.dataset("pbp", "play_by_play", season).await
    }

    pub async fn rosters(&self, season: i64) -> Result<RowCursor<Cursor<Vec<u8>>>, FetchError> {
        self.dataset("rosters", "roster", season).await
    }

    pub async fn schedule(&self, season: i64) -> Result<RowCursor<Cursor<Vec<u8>>>, FetchError> {
        self.dataset("schedules", "sched", season).await
    }

    pub async fn injuries(&self, season: i64) -> Result<RowCursor<Cursor<Vec<u8>>>, FetchError> {
        self.dataset("injuries", "injuries", season).await
    }

    /// Next Gen Stats: one file per stat type ("passing" | "rushing" |
    /// "receiving"), published from 2016 onwards.
    pub async fn next_gen_stats(
        &self,
        season: i64,
        stat_type: &str,
    ) -> Result<RowCursor<Cursor<Vec<u8>>>, FetchError> {
        let file = format!("ngs_{}", season);
        let url = format!(
            "{}/nextgen_stats/{}_{}.csv",
            self.base, file, stat_type
        );
        let response = get_with_retry(&self.client, &url).await?;
        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            url: url.clone(),
            source: e,
        })?;
        RowCursor::new(Cursor::new(body.to_vec())).map_err(|e| FetchError::Status {
            status: 0,
            url,
            body: format!("unreadable CSV: {}", e),
        })
    }
}

impl Default for NflverseClient {
    fn default() -> Self {
        Self::new()
    }
}
