use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// League reference data the events feed does not carry: conference/division
/// membership and stadium metadata. Applied onto skeleton team rows by
/// abbreviation after a team sync.
struct TeamMeta {
    abbr: &'static str,
    conference: &'static str,
    division: &'static str,
    stadium: &'static str,
    lat: f64,
    lon: f64,
    surface: &'static str,
    roof: &'static str, // "outdoor" | "dome" | "retractable"
    capacity: i64,
}

const TEAM_METADATA: &[TeamMeta] = &[
    // AFC East
    TeamMeta { abbr: "BUF", conference: "AFC", division: "East", stadium: "Highmark Stadium", lat: 42.7738, lon: -78.7870, surface: "turf", roof: "outdoor", capacity: 71_608 },
    TeamMeta { abbr: "MIA", conference: "AFC", division: "East", stadium: "Hard Rock Stadium", lat: 25.9580, lon: -80.2389, surface: "grass", roof: "outdoor", capacity: 65_326 },
    TeamMeta { abbr: "NE", conference: "AFC", division: "East", stadium: "Gillette Stadium", lat: 42.0909, lon: -71.2643, surface: "turf", roof: "outdoor", capacity: 64_628 },
    TeamMeta { abbr: "NYJ", conference: "AFC", division: "East", stadium: "MetLife Stadium", lat: 40.8135, lon: -74.0745, surface: "turf", roof: "outdoor", capacity: 82_500 },
    // AFC North
    TeamMeta { abbr: "BAL", conference: "AFC", division: "North", stadium: "M&T Bank Stadium", lat: 39.2780, lon: -76.6227, surface: "grass", roof: "outdoor", capacity: 71_008 },
    TeamMeta { abbr: "CIN", conference: "AFC", division: "North", stadium: "Paycor Stadium", lat: 39.0954, lon: -84.5160, surface: "turf", roof: "outdoor", capacity: 65_515 },
    TeamMeta { abbr: "CLE", conference: "AFC", division: "North", stadium: "Huntington Bank Field", lat: 41.5061, lon: -81.6995, surface: "grass", roof: "outdoor", capacity: 67_431 },
    TeamMeta { abbr: "PIT", conference: "AFC", division: "North", stadium: "Acrisure Stadium", lat: 40.4468, lon: -80.0158, surface: "grass", roof: "outdoor", capacity: 68_400 },
    // AFC South
    TeamMeta { abbr: "HOU", conference: "AFC", division: "South", stadium: "NRG Stadium", lat: 29.6847, lon: -95.4107, surface: "turf", roof: "retractable", capacity: 72_220 },
    TeamMeta { abbr: "IND", conference: "AFC", division: "South", stadium: "Lucas Oil Stadium", lat: 39.7601, lon: -86.1639, surface: "turf", roof: "retractable", capacity: 67_000 },
    TeamMeta { abbr: "JAX", conference: "AFC", division: "South", stadium: "EverBank Stadium", lat: 30.3240, lon: -81.6373, surface: "grass", roof: "outdoor", capacity: 67_814 },
    TeamMeta { abbr: "TEN", conference: "AFC", division: "South", stadium: "Nissan Stadium", lat: 36.1665, lon: -86.7713, surface: "turf", roof: "outdoor", capacity: 69_143 },
    // AFC West
    TeamMeta { abbr: "DEN", conference: "AFC", division: "West", stadium: "Empower Field at Mile High", lat: 39.7439, lon: -105.0201, surface: "grass", roof: "outdoor", capacity: 76_125 },
    TeamMeta { abbr: "KC", conference: "AFC", division: "West", stadium: "GEHA Field at Arrowhead Stadium", lat: 39.0489, lon: -94.4839, surface: "grass", roof: "outdoor", capacity: 76_416 },
    TeamMeta { abbr: "LV", conference: "AFC", division: "West", stadium: "Allegiant Stadium", lat: 36.0909, lon: -115.1833, surface: "grass", roof: "dome", capacity: 65_000 },
    TeamMeta { abbr: "LAC", conference: "AFC", division: "West", stadium: "SoFi Stadium", lat: 33.9535, lon: -118.3392, surface: "turf", roof: "dome", capacity: 70_240 },
    // NFC East
    TeamMeta { abbr: "DAL", conference: "NFC", division: "East", stadium: "AT&T Stadium", lat: 32.7473, lon: -97.0945, surface: "turf", roof: "retractable", capacity: 80_000 },
    TeamMeta { abbr: "NYG", conference: "NFC", division: "East", stadium: "MetLife Stadium", lat: 40.8135, lon: -74.0745, surface: "turf", roof: "outdoor", capacity: 82_500 },
    TeamMeta { abbr: "PHI", conference: "NFC", division: "East", stadium: "Lincoln Financial Field", lat: 39.9008, lon: -75.1675, surface: "grass", roof: "outdoor", capacity: 69_596 },
    TeamMeta { abbr: "WSH", conference: "NFC", division: "East", stadium: "Northwest Stadium", lat: 38.9076, lon: -76.8645, surface: "grass", roof: "outdoor", capacity: 62_000 },
    // NFC North
    TeamMeta { abbr: "CHI", conference: "NFC", division: "North", stadium: "Soldier Field", lat: 41.8623, lon: -87.6167, surface: "grass", roof: "outdoor", capacity: 61_500 },
    TeamMeta { abbr: "DET", conference: "NFC", division: "North", stadium: "Ford Field", lat: 42.3400, lon: -83.0456, surface: "turf", roof: "dome", capacity: 65_000 },
    TeamMeta { abbr: "GB", conference: "NFC", division: "North", stadium: "Lambeau Field", lat: 44.5013, lon: -88.0622, surface: "grass", roof: "outdoor", capacity: 81_441 },
    TeamMeta { abbr: "MIN", conference: "NFC", division: "North", stadium: "U.S. Bank Stadium", lat: 44.9738, lon: -93.2577, surface: "turf", roof: "dome", capacity: 66_655 },
    // NFC South
    TeamMeta { abbr: "ATL", conference: "NFC", division: "South", stadium: "Mercedes-Benz Stadium", lat: 33.7554, lon: -84.4008, surface: "turf", roof: "retractable", capacity: 71_000 },
    TeamMeta { abbr: "CAR", conference: "NFC", division: "South", stadium: "Bank of America Stadium", lat: 35.2258, lon: -80.8528, surface: "turf", roof: "outdoor", capacity: 74_867 },
    TeamMeta { abbr: "NO", conference: "NFC", division: "South", stadium: "Caesars Superdome", lat: 29.9511, lon: -90.0812, surface: "turf", roof: "dome", capacity: 73_208 },
    TeamMeta { abbr: "TB", conference: "NFC", division: "South", stadium: "Raymond James Stadium", lat: 27.9759, lon: -82.5033, surface: "grass", roof: "outdoor", capacity: 65_890 },
    // NFC West
    TeamMeta { abbr: "ARI", conference: "NFC", division: "West", stadium: "State Farm Stadium", lat: 33.5276, lon: -112.2626, surface: "grass", roof: "retractable", capacity: 63_400 },
    TeamMeta { abbr: "LAR", conference: "NFC", division: "West", stadium: "SoFi Stadium", lat: 33.9535, lon: -118.3392, surface: "turf", roof: "dome", capacity: 70_240 },
    TeamMeta { abbr: "SF", conference: "NFC", division: "West", stadium: "Levi's Stadium", lat: 37.4030, lon: -121.9697, surface: "grass", roof: "outdoor", capacity: 68_500 },
    TeamMeta { abbr: "SEA", conference: "NFC", division: "West", stadium: "Lumen Field", lat: 47.5952, lon: -122.3316, surface: "turf", roof: "outdoor", capacity: 68_740 },
];

/// Fill conference, division and stadium columns for every known team row.
/// Teams the feed has not created yet are skipped and picked up next run.
pub async fn curate_team_metadata(pool: &SqlitePool) -> Result<u32> {
    let mut updated = 0u32;
    for meta in TEAM_METADATA {
        let result = sqlx::query(
            r#"UPDATE teams SET
                   conference = ?, division = ?, stadium_name = ?, stadium_lat = ?,
                   stadium_lon = ?, stadium_surface = ?, stadium_type = ?,
                   stadium_capacity = ?, updated_at = ?
               WHERE abbreviation = ?"#,
        )
        .bind(meta.conference)
        .bind(meta.division)
        .bind(meta.stadium)
        .bind(meta.lat)
        .bind(meta.lon)
        .bind(meta.surface)
        .bind(meta.roof)
        .bind(meta.capacity)
        .bind(Utc::now())
        .bind(meta.abbr)
        .execute(pool)
        .await?;
        updated += result.rows_affected() as u32;
    }
    tracing::info!("Team metadata curated for {} teams", updated);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_covers_all_32_teams() {
        assert_eq!(TEAM_METADATA.len(), 32);
        let afc = TEAM_METADATA.iter().filter(|t| t.conference == "AFC").count();
        assert_eq!(afc, 16);
        for div in ["North", "South", "East", "West"] {
            let n = TEAM_METADATA
                .iter()
                .filter(|t| t.conference == "NFC" && t.division == div)
                .count();
            assert_eq!(n, 4, "NFC {} should have 4 teams", div);
        }
    }
}
