use std::cmp::Ordering;

use serde_json::Value;

use crate::state::StatRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn indicator(self) -> &'static str {
        match self {
            SortDirection::Ascending => " ▲",
            SortDirection::Descending => " ▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub width: u16,
}

const fn col(key: &'static str, label: &'static str, sortable: bool, width: u16) -> Column {
    Column {
        key,
        label,
        sortable,
        width,
    }
}

pub const TEAM_COLUMNS: &[Column] = &[
    col("TEAM_NAME", "Team", false, 24),
    col("GP", "Games", false, 7),
    col("W", "Wins", false, 6),
    col("L", "Losses", false, 8),
    col("W_PCT", "Win %", false, 8),
    col("PTS", "PPG", false, 7),
    col("FG_PCT", "FG%", false, 7),
    col("FG3_PCT", "3P%", false, 7),
    col("FT_PCT", "FT%", false, 7),
    col("REB", "Rebounds", false, 10),
    col("AST", "Assists", false, 9),
    col("STL", "Steals", false, 8),
    col("BLK", "Blocks", false, 8),
    col("TOV", "Turnovers", false, 11),
];

pub const PLAYER_COLUMNS: &[Column] = &[
    col("PLAYER_NAME", "Player", false, 24),
    col("TEAM_ABBREVIATION", "Team", false, 6),
    col("GP", "Games", false, 7),
    col("MIN", "Minutes", false, 9),
    col("PTS", "Points", false, 8),
    col("FG_PCT", "FG%", false, 7),
    col("FG3_PCT", "3P%", false, 7),
    col("FT_PCT", "FT%", false, 7),
    col("REB", "Rebounds", false, 10),
    col("AST", "Assists", false, 9),
    col("STL", "Steals", false, 8),
    col("BLK", "Blocks", false, 8),
    col("TOV", "Turnovers", false, 11),
    col("PLUS_MINUS", "+/-", false, 7),
];

pub const LEAGUE_COLUMNS: &[Column] = &[
    col("TEAM_NAME", "Team", true, 24),
    col("GP", "Games", true, 7),
    col("W", "Wins", true, 6),
    col("L", "Losses", true, 8),
    col("W_PCT", "Win %", true, 9),
    col("PTS", "PPG", true, 7),
    col("FG_PCT", "FG%", true, 7),
    col("FG3_PCT", "3P%", true, 7),
    col("FT_PCT", "FT%", true, 7),
    col("REB", "RPG", true, 7),
    col("AST", "APG", true, 7),
    col("STL", "SPG", true, 7),
    col("BLK", "BPG", true, 7),
    col("TOV", "TOPG", true, 7),
];

/// Per-game averages shown with one fractional digit.
const ONE_DECIMAL_KEYS: [&str; 7] = ["PTS", "REB", "AST", "STL", "BLK", "TOV", "PLUS_MINUS"];

/// Comparison for one stat column. Columns are homogeneously typed across
/// all records, so mixed or absent values only show up on malformed input
/// and compare equal rather than coercing.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Pure projection: returns a re-ordered copy, the input is untouched.
/// `slice::sort_by` is a stable sort, so records comparing equal on `key`
/// keep their original relative order; descending flips the comparator,
/// not the output, which preserves that tie order.
pub fn sort_records(records: &[StatRecord], key: &str, direction: SortDirection) -> Vec<StatRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| {
        let ord = compare_values(a.get(key), b.get(key));
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    });
    out
}

/// Repeated request on the same key flips Ascending to Descending; every
/// other case starts Ascending on the requested key.
pub fn toggle_sort(current: &SortConfig, requested_key: &str) -> SortConfig {
    let direction =
        if current.key == requested_key && current.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
    SortConfig {
        key: requested_key.to_string(),
        direction,
    }
}

/// Render-time formatting only; the stored value keeps its raw type so
/// later sorts are unaffected.
pub fn format_value(value: Option<&Value>, key: &str) -> String {
    let Some(value) = value else {
        return "-".to_string();
    };
    if let Some(num) = value.as_f64() {
        if key.contains("PCT") {
            return format!("{:.1}%", num * 100.0);
        }
        if ONE_DECIMAL_KEYS.contains(&key) {
            return format!("{num:.1}");
        }
    }
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

pub fn team_summary(record: &StatRecord) -> Vec<String> {
    vec![
        format!(
            "Record: {}-{}",
            format_value(record.get("W"), "W"),
            format_value(record.get("L"), "L")
        ),
        format!("Win %: {}", format_value(record.get("W_PCT"), "W_PCT")),
        format!("PPG: {}", format_value(record.get("PTS"), "PTS")),
    ]
}

pub fn player_summary(record: &StatRecord) -> Vec<String> {
    vec![
        format!(
            "Team: {}",
            format_value(record.get("TEAM_ABBREVIATION"), "TEAM_ABBREVIATION")
        ),
        format!("PPG: {}", format_value(record.get("PTS"), "PTS")),
        format!("RPG: {}", format_value(record.get("REB"), "REB")),
        format!("APG: {}", format_value(record.get("AST"), "AST")),
    ]
}
