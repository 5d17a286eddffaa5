use fastbreak_terminal::state::StatRecord;
use fastbreak_terminal::table::{
    SortConfig, SortDirection, format_value, sort_records, toggle_sort,
};
use serde_json::json;

fn record(value: serde_json::Value) -> StatRecord {
    StatRecord::from_map(value.as_object().expect("test record should be an object").clone())
}

fn names(records: &[StatRecord]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r.text("TEAM_NAME").expect("record should have a name"))
        .collect()
}

fn sample() -> Vec<StatRecord> {
    vec![
        record(json!({"TEAM_NAME": "A", "W_PCT": 0.61, "PTS": 110.0})),
        record(json!({"TEAM_NAME": "B", "W_PCT": 0.78, "PTS": 120.6})),
        record(json!({"TEAM_NAME": "C", "W_PCT": 0.61, "PTS": 114.2})),
        record(json!({"TEAM_NAME": "D", "W_PCT": 0.30, "PTS": 105.1})),
    ]
}

#[test]
fn ascending_is_stable_for_ties() {
    let sorted = sort_records(&sample(), "W_PCT", SortDirection::Ascending);
    // A and C tie on W_PCT and must keep their original relative order.
    assert_eq!(names(&sorted), vec!["D", "A", "C", "B"]);
}

#[test]
fn descending_reverses_ascending_blocks_keeping_tie_order() {
    let asc = sort_records(&sample(), "W_PCT", SortDirection::Ascending);
    let desc = sort_records(&asc, "W_PCT", SortDirection::Descending);
    assert_eq!(names(&desc), vec!["B", "A", "C", "D"]);
}

#[test]
fn sorting_already_sorted_input_is_idempotent() {
    let once = sort_records(&sample(), "W_PCT", SortDirection::Ascending);
    let twice = sort_records(&once, "W_PCT", SortDirection::Ascending);
    assert_eq!(once, twice);
}

#[test]
fn sort_does_not_mutate_the_input() {
    let input = sample();
    let _ = sort_records(&input, "PTS", SortDirection::Descending);
    assert_eq!(names(&input), vec!["A", "B", "C", "D"]);
}

#[test]
fn string_columns_sort_lexicographically() {
    let mut input = sample();
    input.reverse();
    let sorted = sort_records(&input, "TEAM_NAME", SortDirection::Ascending);
    assert_eq!(names(&sorted), vec!["A", "B", "C", "D"]);
}

#[test]
fn missing_keys_leave_order_untouched() {
    let input = vec![
        record(json!({"TEAM_NAME": "A"})),
        record(json!({"TEAM_NAME": "B"})),
    ];
    let sorted = sort_records(&input, "W_PCT", SortDirection::Ascending);
    assert_eq!(names(&sorted), vec!["A", "B"]);
}

#[test]
fn toggle_same_key_ascending_flips_to_descending() {
    let current = SortConfig {
        key: "W_PCT".to_string(),
        direction: SortDirection::Ascending,
    };
    let next = toggle_sort(&current, "W_PCT");
    assert_eq!(next.key, "W_PCT");
    assert_eq!(next.direction, SortDirection::Descending);
}

#[test]
fn toggle_same_key_descending_resets_to_ascending() {
    let current = SortConfig {
        key: "W_PCT".to_string(),
        direction: SortDirection::Descending,
    };
    let next = toggle_sort(&current, "W_PCT");
    assert_eq!(next.key, "W_PCT");
    assert_eq!(next.direction, SortDirection::Ascending);
}

#[test]
fn toggle_different_key_starts_ascending() {
    let current = SortConfig {
        key: "W_PCT".to_string(),
        direction: SortDirection::Ascending,
    };
    let next = toggle_sort(&current, "PTS");
    assert_eq!(next.key, "PTS");
    assert_eq!(next.direction, SortDirection::Ascending);
}

#[test]
fn pct_keys_format_as_percentages() {
    assert_eq!(format_value(Some(&json!(0.61)), "W_PCT"), "61.0%");
    assert_eq!(format_value(Some(&json!(0.498)), "FG_PCT"), "49.8%");
}

#[test]
fn per_game_keys_format_with_one_decimal() {
    assert_eq!(format_value(Some(&json!(114.2)), "PTS"), "114.2");
    assert_eq!(format_value(Some(&json!(7.0)), "REB"), "7.0");
    assert_eq!(format_value(Some(&json!(4.25)), "PLUS_MINUS"), "4.2");
}

#[test]
fn other_values_pass_through() {
    assert_eq!(format_value(Some(&json!(50)), "W"), "50");
    assert_eq!(format_value(Some(&json!("Lakers")), "TEAM_NAME"), "Lakers");
    assert_eq!(format_value(None, "W"), "-");
}

#[test]
fn formatting_does_not_change_the_stored_value() {
    let rec = record(json!({"TEAM_NAME": "A", "W_PCT": 0.61}));
    let _ = format_value(rec.get("W_PCT"), "W_PCT");
    assert_eq!(rec.number("W_PCT"), Some(0.61));
}
