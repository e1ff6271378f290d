pub mod espn;
pub mod nflverse;
pub mod weather;
pub mod yahoo;

use std::time::Duration;

use thiserror::Error;

pub const USER_AGENT: &str = concat!("gridfeed/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for the JSON APIs.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Bulk CSV downloads get longer.
pub const BULK_TIMEOUT: Duration = Duration::from_secs(60);

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}: {body}")]
    Status {
        status: u16,
        url: String,
        body: String,
    },
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// 404 from the archive means "not yet published" — callers treat it as
    /// a soft skip, not a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Status { status: 429, .. })
    }
}

pub fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// GET with linear-backoff retries on transport errors and 5xx. 4xx is
/// returned to the caller on the first attempt — retrying a bad request or a
/// missing file never helps.
pub async fn get_with_retry(
    client: &reqwest::Client,
    url: &str,
) -> Result<reqwest::Response, FetchError> {
    let mut last_err = None;

    for attempt in 1..=MAX_RETRIES {
        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }
                let code = status.as_u16();
                let body = response.text().await.unwrap_or_default();
                let err = FetchError::Status {
                    status: code,
                    url: url.to_string(),
                    body: truncate_body(body),
                };
                if !status.is_server_error() {
                    return Err(err);
                }
                tracing::warn!("HTTP {} for {}, attempt {}/{}", code, url, attempt, MAX_RETRIES);
                last_err = Some(err);
            }
            Err(e) => {
                tracing::warn!("Request failed for {}: {}, attempt {}/{}", url, e, attempt, MAX_RETRIES);
                last_err = Some(FetchError::Transport {
                    url: url.to_string(),
                    source: e,
                });
            }
        }

        if attempt < MAX_RETRIES {
            tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
        }
    }

    Err(last_err.unwrap_or_else(|| FetchError::Status {
        status: 0,
        url: url.to_string(),
        body: "retries exhausted".into(),
    }))
}

pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<T, FetchError> {
    let response = get_with_retry(client, url).await?;
    response.json::<T>().await.map_err(|e| FetchError::Transport {
        url: url.to_string(),
        source: e,
    })
}

fn truncate_body(body: String) -> String {
    if body.len() > 512 {
        body.chars().take(512).collect()
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        let err = FetchError::Status {
            status: 404,
            url: "http://example/file_2024.csv".into(),
            body: String::new(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn body_is_truncated() {
        assert_eq!(truncate_body("x".repeat(2000)).len(), 512);
        assert_eq!(truncate_body("short".into()), "short");
    }
}
