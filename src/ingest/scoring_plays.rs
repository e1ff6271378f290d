//! Scoring-play extraction. For every completed game the prior rows are
//! dropped and the list reinserted so sequence numbers stay contiguous. The
//! scorer and assist come out of the play description via an ordered regex
//! ladder; strictness beats recall — an unmatched description stays
//! unattributed rather than mis-attributed.

use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use sqlx::SqlitePool;

use super::resolver::Resolver;
use super::RunReport;
use crate::clients::espn::{EspnClient, SummaryScoringPlay};
use crate::db;
use crate::models::ScoringPlay;

const FETCH_GAP: Duration = Duration::from_millis(500);

// Name token: capitalized word allowing periods, apostrophes and hyphens
// ("C.J. Stroud", "Ja'Marr Chase", "Amon-Ra St. Brown").
const NAME: &str = r"[A-Z][A-Za-z.'\-]*(?: [A-Z][A-Za-z.'\-]*)*";

/// One rung of the ladder: the pattern and whether its second capture is an
/// assisting player (the passer on a touchdown pass).
struct Rung {
    pattern: Regex,
    has_assist: bool,
}

pub struct DescriptionParser {
    rungs: Vec<Rung>,
}

impl DescriptionParser {
    pub fn new() -> Self {
        let rung = |raw: &str, has_assist: bool| Rung {
            pattern: Regex::new(&raw.replace("NAME", NAME)).expect("hardcoded pattern"),
            has_assist,
        };
        Self {
            rungs: vec![
                rung(r"^(NAME) \d+ [Yy]d [Pp]ass [Ff]rom (NAME)", true),
                rung(r"^(NAME) \d+ [Yy]d [Rr]un", false),
                rung(r"^(NAME) \d+ [Yy]d [Ff]ield [Gg]oal", false),
                rung(
                    r"^(NAME) \d+ [Yy]d (?:[Ii]nterception [Rr]eturn|[Ff]umble [Rr]eturn|[Ff]umble [Rr]ecovery|[Bb]locked [Pp]unt [Rr]eturn|[Pp]unt [Rr]eturn|[Kk]ickoff [Rr]eturn)",
                    false,
                ),
                // Fallback: leading name token before a number.
                rung(r"^(NAME) \d+", false),
            ],
        }
    }

    /// (scoring player, assisting player), first matching rung wins.
    pub fn extract(&self, description: &str) -> (Option<String>, Option<String>) {
        for rung in &self.rungs {
            if let Some(caps) = rung.pattern.captures(description) {
                let scorer = caps.get(1).map(|m| m.as_str().to_string());
                let assist = if rung.has_assist {
                    caps.get(2).map(|m| m.as_str().to_string())
                } else {
                    None
                };
                return (scorer, assist);
            }
        }
        (None, None)
    }
}

impl Default for DescriptionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Point value from the scoring type. Unusual plays the feed does not
/// classify (defensive two-point tries, one-point safeties) come back as
/// ("unknown", 0) rather than a guessed value.
fn classify(play: &SummaryScoringPlay) -> (String, i64) {
    let abbrev = play
        .scoring_type
        .as_ref()
        .and_then(|t| t.abbreviation.as_deref())
        .unwrap_or("")
        .to_uppercase();
    match abbrev.as_str() {
        "TD" => return ("TD".into(), 6),
        "FG" => return ("FG".into(), 3),
        "XP" | "PAT" => return ("XP".into(), 1),
        "2PT" => return ("2PT".into(), 2),
        "SF" => return ("SF".into(), 2),
        _ => {}
    }

    let name = play
        .scoring_type
        .as_ref()
        .and_then(|t| t.name.as_deref())
        .unwrap_or("")
        .to_lowercase();
    if name.contains("touchdown") {
        ("TD".into(), 6)
    } else if name.contains("field") {
        ("FG".into(), 3)
    } else if name.contains("extra") {
        ("XP".into(), 1)
    } else if name.contains("two") {
        ("2PT".into(), 2)
    } else if name.contains("safety") {
        ("SF".into(), 2)
    } else {
        ("unknown".into(), 0)
    }
}

pub async fn sync_scoring_plays(
    pool: &SqlitePool,
    espn: &EspnClient,
    season: i64,
    week: i64,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    let mut resolver = Resolver::new();
    let parser = DescriptionParser::new();
    let games = db::get_completed_games_for_week(pool, season, week).await?;
    let mut first = true;

    for game in games {
        if !first {
            tokio::time::sleep(FETCH_GAP).await;
        }
        first = false;

        let summary = match espn.game_summary(&game.espn_id).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Summary fetch failed for game {}: {}", game.espn_id, e);
                report.record_error(format!("game {}: {}", game.espn_id, e));
                continue;
            }
        };
        if summary.scoring_plays.is_empty() {
            report.record_skip();
            continue;
        }

        let mut plays = Vec::with_capacity(summary.scoring_plays.len());
        for (i, raw) in summary.scoring_plays.iter().enumerate() {
            plays.push(build_play(pool, &mut resolver, &parser, &game.id, i as i64 + 1, raw).await?);
        }

        match db::replace_scoring_plays(pool, &game.id, &plays).await {
            Ok(()) => report.record_upsert(),
            Err(e) => report.record_error(format!("game {}: {}", game.id, e)),
        }
    }

    Ok(report.finish("scoring plays sync"))
}

async fn build_play(
    pool: &SqlitePool,
    resolver: &mut Resolver,
    parser: &DescriptionParser,
    game_id: &str,
    sequence_number: i64,
    raw: &SummaryScoringPlay,
) -> Result<ScoringPlay> {
    let description = raw.text.clone().unwrap_or_default();
    let (play_type, points) = classify(raw);

    let team_id = match raw
        .team
        .as_ref()
        .and_then(|t| t.id.as_deref())
        .and_then(|id| id.parse::<i64>().ok())
    {
        Some(espn_id) => resolver.team_by_espn_id(pool, espn_id).await?,
        None => None,
    };

    let (scorer_name, assist_name) = parser.extract(&description);

    // Name resolution is team-scoped; a miss stores the name verbatim with a
    // null ref.
    let scoring_player_id = match &scorer_name {
        Some(name) => resolver.player(pool, name, team_id.as_deref()).await?,
        None => None,
    };
    let assist_player_id = match &assist_name {
        Some(name) => resolver.player(pool, name, team_id.as_deref()).await?,
        None => None,
    };

    Ok(ScoringPlay {
        game_id: game_id.to_string(),
        sequence_number,
        quarter: raw.period.as_ref().and_then(|p| p.number),
        clock: raw.clock.as_ref().and_then(|c| c.display_value.clone()),
        team_id,
        play_type,
        points,
        scoring_player_id,
        assist_player_id,
        scoring_player_name: scorer_name,
        assist_player_name: assist_name,
        description,
        home_score_after: raw.home_score.unwrap_or(0),
        away_score_after: raw.away_score.unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touchdown_pass_yields_receiver_and_passer() {
        let parser = DescriptionParser::new();
        let (scorer, assist) = parser
            .extract("Travis Kelce 8 Yd pass from Patrick Mahomes (Harrison Butker Kick)");
        assert_eq!(scorer.as_deref(), Some("Travis Kelce"));
        assert_eq!(assist.as_deref(), Some("Patrick Mahomes"));
    }

    #[test]
    fn run_and_field_goal_have_no_assist() {
        let parser = DescriptionParser::new();
        let (scorer, assist) = parser.extract("Derrick Henry 12 Yd Run (Justin Tucker Kick)");
        assert_eq!(scorer.as_deref(), Some("Derrick Henry"));
        assert_eq!(assist, None);

        let (scorer, _) = parser.extract("Harrison Butker 52 Yd Field Goal");
        assert_eq!(scorer.as_deref(), Some("Harrison Butker"));
    }

    #[test]
    fn defensive_return_matches() {
        let parser = DescriptionParser::new();
        let (scorer, assist) = parser.extract("Trevon Diggs 59 Yd Interception Return (Brandon Aubrey Kick)");
        assert_eq!(scorer.as_deref(), Some("Trevon Diggs"));
        assert_eq!(assist, None);
    }

    #[test]
    fn punctuated_names_survive() {
        let parser = DescriptionParser::new();
        let (scorer, assist) = parser.extract("Amon-Ra St. Brown 10 Yd pass from Jared Goff (Run Failed)");
        assert_eq!(scorer.as_deref(), Some("Amon-Ra St. Brown"));
        assert_eq!(assist.as_deref(), Some("Jared Goff"));

        let (scorer, _) = parser.extract("Ja'Marr Chase 45 Yd pass from Joe Burrow (Kick Good)");
        assert_eq!(scorer.as_deref(), Some("Ja'Marr Chase"));
    }

    #[test]
    fn fallback_takes_leading_name_before_number() {
        let parser = DescriptionParser::new();
        let (scorer, assist) = parser.extract("Justin Tucker 23 Yard Boot");
        assert_eq!(scorer.as_deref(), Some("Justin Tucker"));
        assert_eq!(assist, None);
    }

    #[test]
    fn unmatched_description_stays_unattributed() {
        let parser = DescriptionParser::new();
        let (scorer, assist) = parser.extract("Team Safety, tackled in the end zone");
        assert_eq!(scorer, None);
        assert_eq!(assist, None);
    }

    fn play_of(abbrev: Option<&str>, name: Option<&str>) -> SummaryScoringPlay {
        let mut json = serde_json::json!({"text": "x"});
        json["scoringType"] = serde_json::json!({
            "abbreviation": abbrev,
            "name": name,
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn point_values_by_type() {
        assert_eq!(classify(&play_of(Some("TD"), None)), ("TD".into(), 6));
        assert_eq!(classify(&play_of(Some("FG"), None)), ("FG".into(), 3));
        assert_eq!(classify(&play_of(Some("PAT"), None)), ("XP".into(), 1));
        assert_eq!(classify(&play_of(Some("2PT"), None)), ("2PT".into(), 2));
        assert_eq!(classify(&play_of(Some("SF"), None)), ("SF".into(), 2));
    }

    #[test]
    fn unclassified_type_is_inferred_or_zero() {
        assert_eq!(
            classify(&play_of(None, Some("touchdown"))),
            ("TD".into(), 6)
        );
        assert_eq!(
            classify(&play_of(None, Some("two-point-conversion"))),
            ("2PT".into(), 2)
        );
        assert_eq!(classify(&play_of(None, None)), ("unknown".into(), 0));
    }
}
