//! Yahoo fantasy API client. Consumes an already-obtained OAuth bearer token;
//! the refresh dance lives outside this service. The JSON rendering of the
//! feed nests players inside position-keyed maps, so responses are walked as
//! loose values instead of fully typed structs.

use std::time::Duration;

use serde_json::Value;

use super::{build_client, FetchError, DEFAULT_TIMEOUT};

const BASE: &str = "https://fantasysports.yahooapis.com/fantasy/v2";
const MAX_ATTEMPTS: u32 = 3;

pub struct YahooClient {
    client: reqwest::Client,
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct YahooPlayer {
    pub player_key: String,
    pub name: String,
    pub position: Option<String>,
    pub team_abbr: Option<String>,
    pub rank: Option<i64>,
    pub projected_points: Option<f64>,
}

impl YahooClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            access_token,
        }
    }

    /// Positional rankings for one week.
    pub async fn rankings(&self, position: &str, week: i64) -> Result<Vec<YahooPlayer>, FetchError> {
        let url = format!(
            "{}/game/nfl/players;position={};sort=AR;sort_type=week;sort_week={};count=50?format=json",
            BASE, position, week
        );
        let body = self.get(&url).await?;
        Ok(extract_players(&body))
    }

    /// Projected points for a batch of player keys.
    pub async fn projections(
        &self,
        player_keys: &[String],
        week: i64,
    ) -> Result<Vec<YahooPlayer>, FetchError> {
        if player_keys.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!(
            "{}/players;player_keys={}/stats;type=week;week={}?format=json",
            BASE,
            player_keys.join(","),
            week
        );
        let body = self.get(&url).await?;
        Ok(extract_players(&body))
    }

    /// Bearer GET with linear backoff; a 429 sleeps 2·(attempt+1) seconds
    /// before the next try. Only a 200 counts as success.
    async fn get(&self, url: &str) -> Result<Value, FetchError> {
        let mut last_err = None;

        for attempt in 0..MAX_ATTEMPTS {
            let result = self
                .client
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await;

            match result {
                Ok(response) if response.status().as_u16() == 200 => {
                    return response.json().await.map_err(|e| FetchError::Transport {
                        url: url.to_string(),
                        source: e,
                    });
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    if status == 429 {
                        tokio::time::sleep(Duration::from_secs(2 * (attempt as u64 + 1))).await;
                    }
                    last_err = Some(FetchError::Status {
                        status,
                        url: url.to_string(),
                        body: super::truncate_body(body),
                    });
                }
                Err(e) => {
                    last_err = Some(FetchError::Transport {
                        url: url.to_string(),
                        source: e,
                    });
                }
            }

            if attempt + 1 < MAX_ATTEMPTS {
                tokio::time::sleep(Duration::from_secs(attempt as u64 + 1)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| FetchError::Status {
            status: 0,
            url: url.to_string(),
            body: "retries exhausted".into(),
        }))
    }
}

/// Walk the fantasy_content tree and pull out every player object. The feed
/// wraps each player in an array of single-key fragments; any fragment that
/// fails to yield a key or a name is dropped.
fn extract_players(body: &Value) -> Vec<YahooPlayer> {
    let mut out = Vec::new();
    collect_players(body, &mut out);
    out
}

fn collect_players(value: &Value, out: &mut Vec<YahooPlayer>) {
    match value {
        Value::Object(map) => {
            if let Some(fragments) = map.get("player").and_then(Value::as_array) {
                if let Some(player) = player_from_fragments(fragments) {
                    out.push(player);
                }
            }
            for v in map.values() {
                collect_players(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_players(v, out);
            }
        }
        _ => {}
    }
}

fn player_from_fragments(fragments: &[Value]) -> Option<YahooPlayer> {
    let mut player_key = None;
    let mut name = None;
    let mut position = None;
    let mut team_abbr = None;
    let mut rank = None;
    let mut projected_points = None;

    let mut visit = |obj: &Value| {
        if let Some(k) = obj.get("player_key").and_then(Value::as_str) {
            player_key = Some(k.to_string());
        }
        if let Some(n) = obj.get("name").and_then(|n| n.get("full")).and_then(Value::as_str) {
            name = Some(n.to_string());
        }
        if let Some(p) = obj.get("display_position").and_then(Value::as_str) {
            position = Some(p.to_string());
        }
        if let Some(t) = obj.get("editorial_team_abbr").and_then(Value::as_str) {
            team_abbr = Some(t.to_uppercase());
        }
        if let Some(r) = obj.get("player_advanced_stats").and_then(|s| s.get("rank")) {
            rank = r.as_i64().or_else(|| r.as_str().and_then(|s| s.parse().ok()));
        }
        if let Some(pts) = obj
            .get("player_points")
            .and_then(|p| p.get("total"))
        {
            projected_points = pts
                .as_f64()
                .or_else(|| pts.as_str().and_then(|s| s.parse().ok()));
        }
    };

    for fragment in fragments {
        match fragment {
            Value::Array(inner) => inner.iter().for_each(&mut visit),
            obj => visit(obj),
        }
    }

    Some(YahooPlayer {
        player_key: player_key?,
        name: name?,
        position,
        team_abbr,
        rank,
        projected_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_players_from_nested_fragments() {
        let body: Value = serde_json::from_str(
            r#"{
            "fantasy_content": {"game": [{"players": {
                "0": {"player": [[
                    {"player_key": "nfl.p.31833"},
                    {"name": {"full": "Ja'Marr Chase"}},
                    {"display_position": "WR"},
                    {"editorial_team_abbr": "cin"}
                ]]},
                "count": 1
            }}]}
        }"#,
        )
        .unwrap();
        let players = extract_players(&body);
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Ja'Marr Chase");
        assert_eq!(players[0].team_abbr.as_deref(), Some("CIN"));
    }

    #[test]
    fn fragment_without_key_is_dropped() {
        let body: Value =
            serde_json::from_str(r#"{"players": {"0": {"player": [{"name": {"full": "Nobody"}}]}}}"#)
                .unwrap();
        assert!(extract_players(&body).is_empty());
    }
}
