//! Standings, division ranks and playoff seeds, replayed from completed
//! games. The two ranking passes run back to back inside one call so the
//! seeding pass always sees the division ranks it just assigned.

use std::collections::HashMap;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::db;
use crate::models::{Game, Team, TeamStanding};
use crate::utils::current_streak;

#[derive(Default)]
struct Counters {
    wins: i64,
    losses: i64,
    ties: i64,
    home_wins: i64,
    home_losses: i64,
    away_wins: i64,
    away_losses: i64,
    division_wins: i64,
    division_losses: i64,
    conference_wins: i64,
    conference_losses: i64,
    points_for: i64,
    points_against: i64,
    history: Vec<char>,
}

struct Row {
    standing: TeamStanding,
    conference: String,
    division: String,
}

/// Compute and persist one standings row per team for (season, week).
/// Returns how many rows were written.
pub async fn compute_standings(pool: &SqlitePool, season: i64, week: i64) -> Result<usize> {
    let teams = db::get_all_teams(pool).await?;
    let games = db::get_completed_games_through_week(pool, season, week).await?;

    let mut rows = build_standings(&teams, &games, season, week);
    rank_divisions(&mut rows);
    assign_seeds(&mut rows);

    for row in &rows {
        db::upsert_standing(pool, &row.standing).await?;
    }
    tracing::info!(
        "Standings computed for {} teams, season {} week {}",
        rows.len(),
        season,
        week
    );
    Ok(rows.len())
}

/// Counter accumulation over games already ordered by (week, kickoff).
fn build_standings(teams: &[Team], games: &[Game], season: i64, week: i64) -> Vec<Row> {
    let team_info: HashMap<&str, (&str, &str)> = teams
        .iter()
        .map(|t| {
            (
                t.id.as_str(),
                (
                    t.conference.as_deref().unwrap_or(""),
                    t.division.as_deref().unwrap_or(""),
                ),
            )
        })
        .collect();

    let mut counters: HashMap<&str, Counters> = HashMap::new();

    for game in games {
        let (Some(home_score), Some(away_score)) = (game.home_score, game.away_score) else {
            tracing::warn!("Completed game {} has no scores, skipping", game.id);
            continue;
        };
        let Some(&(home_conf, home_div)) = team_info.get(game.home_team_id.as_str()) else {
            continue;
        };
        let Some(&(away_conf, away_div)) = team_info.get(game.away_team_id.as_str()) else {
            continue;
        };

        let same_conference = !home_conf.is_empty() && home_conf == away_conf;
        let same_division = same_conference && home_div == away_div;

        let (home_result, away_result) = if home_score > away_score {
            ('W', 'L')
        } else if home_score < away_score {
            ('L', 'W')
        } else {
            ('T', 'T')
        };

        let home = counters.entry(game.home_team_id.as_str()).or_default();
        apply_result(home, home_result, true, same_division, same_conference);
        home.points_for += home_score;
        home.points_against += away_score;

        let away = counters.entry(game.away_team_id.as_str()).or_default();
        apply_result(away, away_result, false, same_division, same_conference);
        away.points_for += away_score;
        away.points_against += home_score;
    }

    teams
        .iter()
        .map(|team| {
            let c = counters.remove(team.id.as_str()).unwrap_or_default();
            let games_played = c.wins + c.losses + c.ties;
            let win_pct = if games_played == 0 {
                0.0
            } else {
                (c.wins as f64 + 0.5 * c.ties as f64) / games_played as f64
            };
            Row {
                conference: team.conference.clone().unwrap_or_default(),
                division: team.division.clone().unwrap_or_default(),
                standing: TeamStanding {
                    team_id: team.id.clone(),
                    season,
                    week,
                    wins: c.wins,
                    losses: c.losses,
                    ties: c.ties,
                    win_pct,
                    home_wins: c.home_wins,
                    home_losses: c.home_losses,
                    away_wins: c.away_wins,
                    away_losses: c.away_losses,
                    division_wins: c.division_wins,
                    division_losses: c.division_losses,
                    conference_wins: c.conference_wins,
                    conference_losses: c.conference_losses,
                    points_for: c.points_for,
                    points_against: c.points_against,
                    point_diff: c.points_for - c.points_against,
                    streak: current_streak(&c.history),
                    division_rank: None,
                    conference_rank: None,
                    playoff_seed: None,
                },
            }
        })
        .collect()
}

fn apply_result(
    c: &mut Counters,
    result: char,
    is_home: bool,
    same_division: bool,
    same_conference: bool,
) {
    c.history.push(result);
    match result {
        'W' => {
            c.wins += 1;
            if is_home {
                c.home_wins += 1;
            } else {
                c.away_wins += 1;
            }
            if same_division {
                c.division_wins += 1;
            }
            if same_conference {
                c.conference_wins += 1;
            }
        }
        'L' => {
            c.losses += 1;
            if is_home {
                c.home_losses += 1;
            } else {
                c.away_losses += 1;
            }
            if same_division {
                c.division_losses += 1;
            }
            if same_conference {
                c.conference_losses += 1;
            }
        }
        _ => c.ties += 1,
    }
}

/// Dense 1..N rank inside each (conference, division), ordered by
/// (win_pct desc, division wins desc, point diff desc).
fn rank_divisions(rows: &mut [Row]) {
    let mut by_division: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        by_division
            .entry((row.conference.clone(), row.division.clone()))
            .or_default()
            .push(i);
    }

    for indices in by_division.values_mut() {
        indices.sort_by(|&a, &b| {
            let a = &rows[a].standing;
            let b = &rows[b].standing;
            b.win_pct
                .total_cmp(&a.win_pct)
                .then_with(|| b.division_wins.cmp(&a.division_wins))
                .then_with(|| b.point_diff.cmp(&a.point_diff))
        });
        for (rank, &i) in indices.iter().enumerate() {
            rows[i].standing.division_rank = Some(rank as i64 + 1);
        }
    }
}

/// Conference ranks and playoff seeds: division winners sort first, then
/// everyone by (win_pct desc, conference wins desc, point diff desc). The
/// top seven get seeds. Must run after `rank_divisions` — the winner flag is
/// the rank it just assigned.
fn assign_seeds(rows: &mut [Row]) {
    let mut by_conference: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        by_conference
            .entry(row.conference.clone())
            .or_default()
            .push(i);
    }

    for indices in by_conference.values_mut() {
        indices.sort_by(|&a, &b| {
            let a = &rows[a].standing;
            let b = &rows[b].standing;
            let a_winner = a.division_rank == Some(1);
            let b_winner = b.division_rank == Some(1);
            b_winner
                .cmp(&a_winner)
                .then_with(|| b.win_pct.total_cmp(&a.win_pct))
                .then_with(|| b.conference_wins.cmp(&a.conference_wins))
                .then_with(|| b.point_diff.cmp(&a.point_diff))
        });
        for (pos, &i) in indices.iter().enumerate() {
            let rank = pos as i64 + 1;
            rows[i].standing.conference_rank = Some(rank);
            rows[i].standing.playoff_seed = if rank <= 7 { Some(rank) } else { None };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn team(id: &str, conference: &str, division: &str) -> Team {
        Team {
            id: id.to_string(),
            espn_id: None,
            abbreviation: id.to_uppercase(),
            name: id.to_string(),
            city: String::new(),
            conference: Some(conference.to_string()),
            division: Some(division.to_string()),
            stadium_name: None,
            stadium_lat: None,
            stadium_lon: None,
            stadium_surface: None,
            stadium_type: None,
            stadium_capacity: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn row(team_id: &str, conference: &str, division: &str, standing: TeamStanding) -> Row {
        Row {
            standing: TeamStanding {
                team_id: team_id.to_string(),
                ..standing
            },
            conference: conference.to_string(),
            division: division.to_string(),
        }
    }

    fn record(wins: i64, losses: i64, division_wins: i64, conference_wins: i64, point_diff: i64) -> TeamStanding {
        TeamStanding {
            wins,
            losses,
            win_pct: wins as f64 / (wins + losses) as f64,
            division_wins,
            conference_wins,
            point_diff,
            ..Default::default()
        }
    }

    #[test]
    fn division_wins_beat_point_differential() {
        // Two 3-1 teams: div-wins 2 / diff +30 must outrank div-wins 1 / diff +80.
        let mut rows = vec![
            row("a", "AFC", "West", record(3, 1, 1, 2, 80)),
            row("b", "AFC", "West", record(3, 1, 2, 2, 30)),
        ];
        rank_divisions(&mut rows);
        let rank_of = |id: &str| {
            rows.iter()
                .find(|r| r.standing.team_id == id)
                .unwrap()
                .standing
                .division_rank
        };
        assert_eq!(rank_of("b"), Some(1));
        assert_eq!(rank_of("a"), Some(2));
    }

    #[test]
    fn division_winners_seed_first_then_wildcards() {
        // Eight AFC teams, two per division; the winner of each division must
        // take seeds 1-4 even when a runner-up has a better record.
        let mut rows = vec![
            row("w1", "AFC", "East", record(12, 5, 5, 10, 120)),
            row("w2", "AFC", "North", record(11, 6, 5, 9, 90)),
            row("w3", "AFC", "South", record(9, 8, 4, 7, 10)),
            row("w4", "AFC", "West", record(8, 9, 4, 6, -20)),
            row("r1", "AFC", "East", record(11, 6, 3, 9, 100)),
            row("r2", "AFC", "North", record(10, 7, 3, 8, 60)),
            row("r3", "AFC", "South", record(10, 7, 2, 8, 40)),
            row("r4", "AFC", "West", record(7, 10, 2, 5, -50)),
        ];
        rank_divisions(&mut rows);
        assign_seeds(&mut rows);

        let seed_of = |id: &str| {
            rows.iter()
                .find(|r| r.standing.team_id == id)
                .unwrap()
                .standing
                .playoff_seed
        };
        let conf_rank_of = |id: &str| {
            rows.iter()
                .find(|r| r.standing.team_id == id)
                .unwrap()
                .standing
                .conference_rank
        };

        // Division winners: seeds 1-4 by conference criteria.
        assert_eq!(seed_of("w1"), Some(1));
        assert_eq!(seed_of("w2"), Some(2));
        assert_eq!(seed_of("w3"), Some(3));
        assert_eq!(seed_of("w4"), Some(4));
        // Best three non-winners: 5-7.
        assert_eq!(seed_of("r1"), Some(5));
        assert_eq!(seed_of("r2"), Some(6));
        assert_eq!(seed_of("r3"), Some(7));
        // The eighth team gets a conference rank but no seed.
        assert_eq!(conf_rank_of("r4"), Some(8));
        assert_eq!(seed_of("r4"), None);
    }

    #[test]
    fn accumulation_and_streaks() {
        use crate::models::Game;

        let teams = vec![team("h", "AFC", "West"), team("a", "AFC", "West")];
        let mk_game = |id: &str, week: i64, hs: i64, as_: i64| Game {
            id: id.to_string(),
            espn_id: id.to_string(),
            season: 2024,
            week,
            kickoff: Utc::now(),
            home_team_id: "h".into(),
            away_team_id: "a".into(),
            home_score: Some(hs),
            away_score: Some(as_),
            status: "completed".into(),
            status_detail: None,
            period: None,
            clock: None,
            venue_name: None,
            venue_city: None,
            attendance: None,
            playoff_round: None,
            weather_temp: None,
            weather_condition: None,
            weather_wind_mph: None,
            weather_humidity: None,
            weather_pressure_mb: None,
            weather_visibility_miles: None,
            weather_precip_in: None,
            weather_cloud_pct: None,
            is_day_game: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let games = vec![
            mk_game("g1", 1, 21, 14),
            mk_game("g2", 2, 17, 17),
            mk_game("g3", 3, 10, 24),
        ];
        let rows = build_standings(&teams, &games, 2024, 3);

        let h = &rows.iter().find(|r| r.standing.team_id == "h").unwrap().standing;
        assert_eq!((h.wins, h.losses, h.ties), (1, 1, 1));
        assert!((h.win_pct - 0.5).abs() < f64::EPSILON);
        assert_eq!(h.points_for, 48);
        assert_eq!(h.points_against, 55);
        assert_eq!(h.streak, "L1");
        assert_eq!(h.division_wins, 1);
        assert_eq!(h.home_wins, 1);
        assert_eq!(h.home_losses, 1);

        let a = &rows.iter().find(|r| r.standing.team_id == "a").unwrap().standing;
        assert_eq!((a.wins, a.losses, a.ties), (1, 1, 1));
        assert_eq!(a.streak, "W1");
        assert_eq!(a.away_wins, 1);
        // Wins + losses + ties never exceeds games played.
        assert!(a.wins + a.losses + a.ties <= 3);
    }
}
