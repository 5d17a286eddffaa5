use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;

use fastbreak_terminal::stats_fetch::parse_league_stats_json;
use fastbreak_terminal::table::{SortDirection, sort_records};

fn league_json(teams: usize) -> String {
    let rows: Vec<_> = (0..teams)
        .map(|idx| {
            json!({
                "TEAM_ID": 1_610_612_700 + idx,
                "TEAM_NAME": format!("Team {idx}"),
                "GP": 82,
                "W": 20 + (idx * 7) % 45,
                "L": 82 - (20 + (idx * 7) % 45),
                "W_PCT": ((20 + (idx * 7) % 45) as f64) / 82.0,
                "PTS": 105.0 + (idx as f64) * 0.4,
                "FG_PCT": 0.45 + (idx as f64) * 0.001,
                "FG3_PCT": 0.34 + (idx as f64) * 0.001,
                "FT_PCT": 0.75 + (idx as f64) * 0.001,
                "REB": 40.0 + (idx as f64) * 0.2,
                "AST": 24.0 + (idx as f64) * 0.1,
                "STL": 6.0 + (idx as f64) * 0.05,
                "BLK": 4.0 + (idx as f64) * 0.05,
                "TOV": 12.0 + (idx as f64) * 0.05,
            })
        })
        .collect();
    serde_json::to_string(&rows).expect("bench fixture should serialize")
}

fn bench_league_parse(c: &mut Criterion) {
    let raw = league_json(30);
    c.bench_function("league_parse", |b| {
        b.iter(|| {
            let rows = parse_league_stats_json(black_box(&raw)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_sort_projection(c: &mut Criterion) {
    let raw = league_json(30);
    let rows = parse_league_stats_json(&raw).expect("bench fixture should parse");
    c.bench_function("sort_projection", |b| {
        b.iter(|| {
            let sorted = sort_records(black_box(&rows), "W_PCT", SortDirection::Descending);
            black_box(sorted.len());
        })
    });
}

criterion_group!(benches, bench_league_parse, bench_sort_projection);
criterion_main!(benches);
