use std::collections::HashMap;

/// Map historical or cross-source team abbreviations to the ones the events
/// feed uses.
pub fn normalize_team_abbr(abbr: &str) -> String {
    let mapping: HashMap<&str, &str> = [
        ("STL", "LAR"), // St. Louis Rams relocation (2016)
        ("SD", "LAC"),  // San Diego Chargers relocation (2017)
        ("OAK", "LV"),  // Oakland Raiders relocation (2020)
        ("LA", "LAR"),  // archive files use LA for the Rams
        ("WAS", "WSH"),
        ("JAC", "JAX"),
        ("BLT", "BAL"),
        ("CLV", "CLE"),
        ("HST", "HOU"),
        ("ARZ", "ARI"),
    ]
    .into_iter()
    .collect();

    mapping
        .get(abbr.to_uppercase().as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| abbr.to_uppercase())
}

/// Convert height string (e.g. "6-2") to inches.
pub fn height_to_inches(height_str: &str) -> Option<i64> {
    let parts: Vec<&str> = height_str.split('-').collect();
    if parts.len() == 2 {
        let feet = parts[0].trim().parse::<i64>().ok()?;
        let inches = parts[1].trim().parse::<i64>().ok()?;
        Some(feet * 12 + inches)
    } else {
        height_str.trim().parse::<i64>().ok()
    }
}

/// Parse an "A-B" pair stat ("5-12", "8-65"). Anything that does not look
/// like a pair comes back as (0, 0).
pub fn split_pair(value: &str) -> (i64, i64) {
    let mut parts = value.trim().splitn(2, '-');
    let a = parts.next().and_then(|p| p.trim().parse().ok());
    let b = parts.next().and_then(|p| p.trim().parse().ok());
    match (a, b) {
        (Some(a), Some(b)) => (a, b),
        _ => (0, 0),
    }
}

/// Possession "MM:SS" to seconds; malformed input is 0.
pub fn possession_to_seconds(clock: &str) -> i64 {
    let mut parts = clock.trim().splitn(2, ':');
    let minutes: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let seconds: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    minutes * 60 + seconds
}

/// Conversion percentage, 0 when there were no attempts.
pub fn pct(conversions: i64, attempts: i64) -> f64 {
    if attempts == 0 {
        0.0
    } else {
        (conversions as f64 / attempts as f64) * 100.0
    }
}

/// NFL passer rating: four components each clamped to [0, 2.375], summed,
/// divided by 6, times 100.
pub fn passer_rating(completions: i64, attempts: i64, yards: i64, tds: i64, ints: i64) -> f64 {
    if attempts == 0 {
        return 0.0;
    }
    let att = attempts as f64;
    let clamp = |v: f64| v.clamp(0.0, 2.375);

    let a = clamp((completions as f64 / att - 0.3) * 5.0);
    let b = clamp((yards as f64 / att - 3.0) * 0.25);
    let c = clamp(tds as f64 / att * 25.0);
    let d = clamp(2.375 - (ints as f64 / att * 25.0));

    (a + b + c + d) / 6.0 * 100.0
}

/// Current streak from a chronological result history, e.g. ['W','W','L'] → "L1".
pub fn current_streak(history: &[char]) -> String {
    let Some(&last) = history.last() else {
        return String::new();
    };
    let count = history.iter().rev().take_while(|&&r| r == last).count();
    format!("{}{}", last, count)
}

/// Stadium-local time approximated from longitude (15 degrees per hour).
/// Civil timezones track solar time closely enough for a day/night flag and
/// a calendar date.
pub fn approx_local_time(utc: chrono::DateTime<chrono::Utc>, lon: f64) -> chrono::NaiveDateTime {
    let offset_hours = (lon / 15.0).round() as i64;
    utc.naive_utc() + chrono::Duration::hours(offset_hours)
}

/// Clean player name (remove suffixes like Jr., III, etc.)
pub fn clean_player_name(name: &str) -> String {
    name.replace(" Jr.", "")
        .replace(" Sr.", "")
        .replace(" III", "")
        .replace(" II", "")
        .replace(" IV", "")
        .trim()
        .to_string()
}

/// Last whitespace-separated token of a name, used for the last-name lookup.
pub fn last_name(name: &str) -> &str {
    name.trim().rsplit(' ').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_mapping() {
        assert_eq!(normalize_team_abbr("STL"), "LAR");
        assert_eq!(normalize_team_abbr("SD"), "LAC");
        assert_eq!(normalize_team_abbr("OAK"), "LV");
        assert_eq!(normalize_team_abbr("WAS"), "WSH");
        assert_eq!(normalize_team_abbr("KC"), "KC");
    }

    #[test]
    fn test_height_conversion() {
        assert_eq!(height_to_inches("6-2"), Some(74));
        assert_eq!(height_to_inches("5-11"), Some(71));
        assert_eq!(height_to_inches("73"), Some(73));
        assert_eq!(height_to_inches("tall"), None);
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("5-12"), (5, 12));
        assert_eq!(split_pair("8-65"), (8, 65));
        assert_eq!(split_pair(""), (0, 0));
        assert_eq!(split_pair("7"), (0, 0));
    }

    #[test]
    fn test_possession_to_seconds() {
        assert_eq!(possession_to_seconds("31:24"), 1884);
        assert_eq!(possession_to_seconds("00:45"), 45);
        assert_eq!(possession_to_seconds(""), 0);
    }

    #[test]
    fn test_pct_zero_attempts() {
        assert_eq!(pct(5, 12), 500.0 / 12.0);
        assert_eq!(pct(0, 0), 0.0);
    }

    #[test]
    fn test_passer_rating_three_touchdown_line() {
        // 25/30, 300 yards, 3 TD, 0 INT
        let rating = passer_rating(25, 30, 300, 3, 0);
        assert!((rating - 147.9).abs() < 0.1, "got {}", rating);
    }

    #[test]
    fn test_passer_rating_bounds() {
        assert_eq!(passer_rating(0, 0, 0, 0, 0), 0.0);
        // A perfect line clamps every component
        let max = passer_rating(30, 30, 500, 10, 0);
        assert!(max <= 158.4);
        // All interceptions bottoms out at zero, never negative
        let min = passer_rating(0, 30, 0, 0, 10);
        assert!(min >= 0.0);
    }

    #[test]
    fn test_current_streak() {
        assert_eq!(current_streak(&['W', 'L', 'W', 'W', 'W']), "W3");
        assert_eq!(current_streak(&['W', 'L']), "L1");
        assert_eq!(current_streak(&['T', 'T']), "T2");
        assert_eq!(current_streak(&[]), "");
    }

    #[test]
    fn test_approx_local_time() {
        use chrono::{Datelike, TimeZone, Timelike, Utc};
        // 18:00 UTC at Arrowhead (lon -94.5, offset -6) is noon local.
        let utc = Utc.with_ymd_and_hms(2024, 10, 6, 18, 0, 0).unwrap();
        assert_eq!(approx_local_time(utc, -94.4839).hour(), 12);
        // 01:00 UTC on the east coast is still the previous evening.
        let late = Utc.with_ymd_and_hms(2024, 10, 7, 1, 0, 0).unwrap();
        let local = approx_local_time(late, -74.0745);
        assert_eq!(local.hour(), 20);
        assert_eq!(local.date().day(), 6);
    }

    #[test]
    fn test_clean_player_name() {
        assert_eq!(clean_player_name("Odell Beckham Jr."), "Odell Beckham");
        assert_eq!(clean_player_name("Robert Griffin III"), "Robert Griffin");
        assert_eq!(last_name("Patrick Mahomes"), "Mahomes");
    }
}
