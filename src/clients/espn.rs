//! Typed fetches against the ESPN site API. The scoreboard nests everything
//! under `events[].competitions[0]`, with home/away decided by a `homeAway`
//! discriminator on each competitor; box scores arrive as loose
//! `{name, displayValue, value}` stat arrays where `value` may be a number, a
//! string, or absent.

use serde::{Deserialize, Deserializer};

use super::{build_client, get_json, FetchError, DEFAULT_TIMEOUT};

const BASE: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";

#[derive(Clone)]
pub struct EspnClient {
    client: reqwest::Client,
}

impl EspnClient {
    pub fn new() -> Self {
        Self {
            client: build_client(DEFAULT_TIMEOUT),
        }
    }

    /// Current scoreboard: live plus today's scheduled games.
    pub async fn scoreboard(&self) -> Result<Scoreboard, FetchError> {
        get_json(&self.client, &format!("{}/scoreboard", BASE)).await
    }

    /// Historical scoreboard for one regular-season week.
    pub async fn scoreboard_for(&self, season: i64, week: i64) -> Result<Scoreboard, FetchError> {
        let url = format!(
            "{}/scoreboard?dates={}&seasontype=2&week={}",
            BASE, season, week
        );
        get_json(&self.client, &url).await
    }

    pub async fn teams(&self) -> Result<TeamsResponse, FetchError> {
        get_json(&self.client, &format!("{}/teams", BASE)).await
    }

    pub async fn team_roster(&self, espn_team_id: i64) -> Result<RosterResponse, FetchError> {
        let url = format!("{}/teams/{}/roster", BASE, espn_team_id);
        get_json(&self.client, &url).await
    }

    /// Full game summary: box score plus scoring plays.
    pub async fn game_summary(&self, espn_game_id: &str) -> Result<GameSummary, FetchError> {
        let url = format!("{}/summary?event={}", BASE, espn_game_id);
        get_json(&self.client, &url).await
    }
}

impl Default for EspnClient {
    fn default() -> Self {
        Self::new()
    }
}

// ── Scoreboard ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Scoreboard {
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
pub struct Event {
    pub id: String,
    pub date: String, // ISO-8601
    #[serde(default)]
    pub season: Option<EventSeason>,
    #[serde(default)]
    pub week: Option<EventWeek>,
    #[serde(default)]
    pub competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
pub struct EventSeason {
    pub year: i64,
}

#[derive(Debug, Deserialize)]
pub struct EventWeek {
    pub number: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    #[serde(default)]
    pub attendance: Option<i64>,
    #[serde(default)]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub status: Option<CompetitionStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub full_name: Option<String>,
    #[serde(default)]
    pub address: Option<VenueAddress>,
}

#[derive(Debug, Deserialize)]
pub struct VenueAddress {
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competitor {
    pub home_away: String, // "home" | "away"
    pub score: Option<String>,
    pub team: CompetitorTeam,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorTeam {
    pub id: String,
    pub abbreviation: Option<String>,
    pub display_name: Option<String>,
    pub location: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionStatus {
    #[serde(default)]
    pub period: Option<i64>,
    pub display_clock: Option<String>,
    #[serde(rename = "type")]
    pub status_type: Option<StatusType>,
}

#[derive(Debug, Deserialize)]
pub struct StatusType {
    pub state: Option<String>, // "pre" | "in" | "post"
    pub detail: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

// ── Teams ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TeamsResponse {
    #[serde(default)]
    pub sports: Vec<TeamsSport>,
}

#[derive(Debug, Deserialize)]
pub struct TeamsSport {
    #[serde(default)]
    pub leagues: Vec<TeamsLeague>,
}

#[derive(Debug, Deserialize)]
pub struct TeamsLeague {
    #[serde(default)]
    pub teams: Vec<TeamEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TeamEntry {
    pub team: TeamDetail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    pub id: String,
    pub abbreviation: Option<String>,
    pub display_name: Option<String>,
    pub location: Option<String>,
}

impl TeamsResponse {
    /// Flatten the sports/leagues nesting the feed insists on.
    pub fn all_teams(self) -> Vec<TeamDetail> {
        self.sports
            .into_iter()
            .flat_map(|s| s.leagues)
            .flat_map(|l| l.teams)
            .map(|t| t.team)
            .collect()
    }
}

// ── Rosters ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RosterResponse {
    #[serde(default)]
    pub athletes: Vec<RosterGroup>,
}

/// The roster endpoint groups athletes by position ("offense", "defense", ...).
#[derive(Debug, Deserialize)]
pub struct RosterGroup {
    #[serde(default)]
    pub items: Vec<Athlete>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Athlete {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub jersey: Option<String>,
    pub height: Option<f64>, // inches
    pub weight: Option<f64>, // pounds
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub birth_place: Option<BirthPlace>,
    #[serde(default)]
    pub college: Option<College>,
    #[serde(default)]
    pub draft: Option<Draft>,
    #[serde(default)]
    pub position: Option<AthletePosition>,
    #[serde(default)]
    pub status: Option<AthleteStatus>,
}

#[derive(Debug, Deserialize)]
pub struct BirthPlace {
    pub city: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct College {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Draft {
    pub year: Option<i64>,
    pub round: Option<i64>,
    pub selection: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AthletePosition {
    pub abbreviation: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AthleteStatus {
    #[serde(rename = "type")]
    pub status_type: Option<String>, // "active" | "inactive" | "injured" ...
}

// ── Game summary ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    #[serde(default)]
    pub boxscore: Option<BoxScore>,
    #[serde(default)]
    pub scoring_plays: Vec<SummaryScoringPlay>,
}

#[derive(Debug, Deserialize)]
pub struct BoxScore {
    #[serde(default)]
    pub teams: Vec<BoxScoreTeam>,
}

#[derive(Debug, Deserialize)]
pub struct BoxScoreTeam {
    pub team: CompetitorTeam,
    #[serde(default)]
    pub statistics: Vec<BoxScoreStatistic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxScoreStatistic {
    pub name: String,
    pub display_value: Option<String>,
    #[serde(default)]
    pub value: StatValue,
}

/// The feed emits stat values as number-or-string-or-absent; everything
/// downstream converts per statistic with explicit rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StatValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl StatValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StatValue::Number(n) => Some(*n),
            StatValue::Text(s) => s.trim().parse().ok(),
            StatValue::Missing => None,
        }
    }
}

impl<'de> Deserialize<'de> for StatValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::Number(n)) => {
                StatValue::Number(n.as_f64().unwrap_or_default())
            }
            Some(serde_json::Value::String(s)) => StatValue::Text(s),
            _ => StatValue::Missing,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryScoringPlay {
    pub text: Option<String>,
    #[serde(default)]
    pub period: Option<ScoringPeriod>,
    #[serde(default)]
    pub clock: Option<ScoringClock>,
    #[serde(default)]
    pub team: Option<ScoringTeam>,
    #[serde(default)]
    pub scoring_type: Option<ScoringType>,
    #[serde(default)]
    pub home_score: Option<i64>,
    #[serde(default)]
    pub away_score: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ScoringPeriod {
    pub number: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringClock {
    pub display_value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoringTeam {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScoringType {
    pub name: Option<String>, // "touchdown", "field-goal", ...
    pub abbreviation: Option<String>, // "TD", "FG", ...
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_value_deserializes_all_three_shapes() {
        let stat: BoxScoreStatistic =
            serde_json::from_str(r#"{"name":"totalYards","displayValue":"356","value":356.0}"#)
                .unwrap();
        assert_eq!(stat.value, StatValue::Number(356.0));

        let stat: BoxScoreStatistic =
            serde_json::from_str(r#"{"name":"thirdDownEff","displayValue":"5-12","value":"5-12"}"#)
                .unwrap();
        assert_eq!(stat.value, StatValue::Text("5-12".into()));

        let stat: BoxScoreStatistic =
            serde_json::from_str(r#"{"name":"possessionTime","displayValue":"31:24"}"#).unwrap();
        assert_eq!(stat.value, StatValue::Missing);
    }

    #[test]
    fn scoreboard_competitor_shape() {
        let json = r#"{
            "events": [{
                "id": "401547630",
                "date": "2023-09-10T17:00Z",
                "season": {"year": 2023},
                "week": {"number": 1},
                "competitions": [{
                    "attendance": 73000,
                    "venue": {"fullName": "GEHA Field at Arrowhead Stadium", "address": {"city": "Kansas City"}},
                    "competitors": [
                        {"homeAway": "home", "score": "20", "team": {"id": "12", "abbreviation": "KC", "location": "Kansas City", "displayName": "Kansas City Chiefs"}},
                        {"homeAway": "away", "score": "21", "team": {"id": "8", "abbreviation": "DET", "location": "Detroit", "displayName": "Detroit Lions"}}
                    ],
                    "status": {"period": 4, "displayClock": "0:00", "type": {"state": "post", "detail": "Final", "completed": true}}
                }]
            }]
        }"#;
        let sb: Scoreboard = serde_json::from_str(json).unwrap();
        assert_eq!(sb.events.len(), 1);
        let comp = &sb.events[0].competitions[0];
        assert_eq!(comp.competitors[0].home_away, "home");
        assert_eq!(comp.competitors[1].team.abbreviation.as_deref(), Some("DET"));
        assert!(comp.status.as_ref().unwrap().status_type.as_ref().unwrap().completed);
    }
}
