//! WeatherAPI client. Historical lookups only expose day-level aggregates,
//! which is what the enrichment pipeline stores. The provider rate-limits
//! aggressively, so the client enforces a minimum gap between calls and backs
//! off once on 429.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{build_client, get_json, FetchError, DEFAULT_TIMEOUT};

const BASE: &str = "https://api.weatherapi.com/v1";
const MIN_GAP: Duration = Duration::from_millis(500);
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(2);

pub struct WeatherClient {
    client: reqwest::Client,
    api_key: String,
    last_call: Mutex<Option<Instant>>,
}

impl WeatherClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
            api_key,
            last_call: Mutex::new(None),
        }
    }

    /// Day-level history at a coordinate. `date` is "YYYY-MM-DD".
    pub async fn history(&self, lat: f64, lon: f64, date: &str) -> Result<DaySummary, FetchError> {
        let url = format!(
            "{}/history.json?key={}&q={:.4},{:.4}&dt={}",
            BASE, self.api_key, lat, lon, date
        );
        let response: HistoryResponse = self.paced_get(&url).await?;
        response
            .forecast
            .forecastday
            .into_iter()
            .next()
            .map(|d| d.day)
            .ok_or(FetchError::Status {
                status: 0,
                url,
                body: "history response had no forecastday".into(),
            })
    }

    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions, FetchError> {
        let url = format!(
            "{}/current.json?key={}&q={:.4},{:.4}",
            BASE, self.api_key, lat, lon
        );
        let response: CurrentResponse = self.paced_get(&url).await?;
        Ok(response.current)
    }

    pub async fn forecast(&self, lat: f64, lon: f64, days: u8) -> Result<Vec<DaySummary>, FetchError> {
        let url = format!(
            "{}/forecast.json?key={}&q={:.4},{:.4}&days={}",
            BASE, self.api_key, lat, lon, days
        );
        let response: HistoryResponse = self.paced_get(&url).await?;
        Ok(response.forecast.forecastday.into_iter().map(|d| d.day).collect())
    }

    async fn paced_get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        self.pace().await;
        match get_json(&self.client, url).await {
            Err(e) if e.is_rate_limited() => {
                tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                get_json(&self.client, url).await
            }
            other => other,
        }
    }

    /// Keep at least MIN_GAP between outgoing calls, across tasks.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < MIN_GAP {
                tokio::time::sleep(MIN_GAP - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    forecast: Forecast,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(default)]
    forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
struct ForecastDay {
    day: DaySummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaySummary {
    pub avgtemp_f: f64,
    pub maxwind_mph: f64,
    pub avghumidity: f64,
    #[serde(default)]
    pub avgpressure_mb: Option<f64>,
    pub avgvis_miles: f64,
    pub totalprecip_in: f64,
    #[serde(default)]
    pub avgcloud: Option<f64>,
    pub condition: Condition,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentConditions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub temp_f: f64,
    pub wind_mph: f64,
    pub humidity: f64,
    pub condition: Condition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_day_shape() {
        let json = r#"{
            "forecast": {"forecastday": [{"date": "2023-12-25", "day": {
                "avgtemp_f": 28.4, "maxwind_mph": 14.1, "avghumidity": 71.0,
                "avgvis_miles": 8.7, "totalprecip_in": 0.02, "avgcloud": 63.0,
                "condition": {"text": "Light snow"}
            }}]}
        }"#;
        let resp: HistoryResponse = serde_json::from_str(json).unwrap();
        let day = &resp.forecast.forecastday[0].day;
        assert_eq!(day.condition.text, "Light snow");
        assert!(day.avgpressure_mb.is_none());
        assert!((day.avgtemp_f - 28.4).abs() < f64::EPSILON);
    }
}
