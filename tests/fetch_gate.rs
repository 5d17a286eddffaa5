use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use fastbreak_terminal::config::ApiConfig;
use fastbreak_terminal::state::BackendStatus;
use fastbreak_terminal::stats_fetch::{FetchError, StatsClient, Transport, WireResponse};
use fastbreak_terminal::table;
use reqwest::Url;
use serde_json::json;

/// Canned transport that counts calls and remembers the last URL, so tests
/// can assert that refused fetches never reach the wire.
struct StubTransport {
    calls: Arc<AtomicUsize>,
    last_url: Arc<Mutex<Option<String>>>,
    status: u16,
    body: String,
}

impl StubTransport {
    fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            last_url: Arc::new(Mutex::new(None)),
            status,
            body: body.into(),
        }
    }

    fn counters(&self) -> (Arc<AtomicUsize>, Arc<Mutex<Option<String>>>) {
        (self.calls.clone(), self.last_url.clone())
    }
}

impl Transport for StubTransport {
    fn get(&self, url: &Url) -> Result<WireResponse, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().expect("url lock should not be poisoned") = Some(url.to_string());
        Ok(WireResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

fn lakers_body() -> String {
    json!({
        "TEAM_NAME": "Lakers",
        "GP": 82,
        "W": 50,
        "L": 32,
        "W_PCT": 0.61,
        "PTS": 114.2,
        "FG_PCT": 0.498,
        "FG3_PCT": 0.366,
        "FT_PCT": 0.781,
        "REB": 43.1,
        "AST": 26.4,
        "STL": 7.6,
        "BLK": 4.9,
        "TOV": 13.7
    })
    .to_string()
}

fn local_config() -> ApiConfig {
    ApiConfig::with_base_url("http://localhost:5000")
}

#[test]
fn not_running_refuses_without_a_network_call() {
    let transport = StubTransport::new(200, lakers_body());
    let (calls, _) = transport.counters();
    let client = StatsClient::with_transport(local_config(), transport);

    let err = client
        .team_stats(BackendStatus::NotRunning, "LAL", "2024-25")
        .expect_err("gated fetch should refuse");
    assert_eq!(err, FetchError::NotRunning);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn checking_also_refuses() {
    let transport = StubTransport::new(200, lakers_body());
    let (calls, _) = transport.counters();
    let client = StatsClient::with_transport(local_config(), transport);

    let err = client
        .league_stats(BackendStatus::Checking, "2024-25")
        .expect_err("gated fetch should refuse");
    assert_eq!(err, FetchError::NotRunning);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn blank_input_is_a_validation_error_without_a_network_call() {
    let transport = StubTransport::new(200, lakers_body());
    let (calls, _) = transport.counters();
    let client = StatsClient::with_transport(local_config(), transport);

    let err = client
        .team_stats(BackendStatus::Running, "   ", "2024-25")
        .expect_err("blank team should be rejected");
    assert!(matches!(err, FetchError::Validation(_)));

    let err = client
        .player_stats(BackendStatus::Running, "", "2024-25")
        .expect_err("blank player should be rejected");
    assert!(matches!(err, FetchError::Validation(_)));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn placeholder_base_url_is_never_dereferenced() {
    let transport = StubTransport::new(200, lakers_body());
    let (calls, _) = transport.counters();
    let client = StatsClient::with_transport(ApiConfig::placeholder(), transport);

    let err = client
        .team_stats(BackendStatus::Running, "LAL", "2024-25")
        .expect_err("placeholder config should refuse");
    assert_eq!(err, FetchError::NotRunning);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn successful_team_fetch_renders_record_and_win_pct() {
    let transport = StubTransport::new(200, lakers_body());
    let (calls, last_url) = transport.counters();
    let client = StatsClient::with_transport(local_config(), transport);

    let record = client
        .team_stats(BackendStatus::Running, "LAL", "2024-25")
        .expect("stubbed fetch should succeed");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let url = last_url
        .lock()
        .expect("url lock should not be poisoned")
        .clone()
        .expect("transport should have seen a url");
    assert!(url.starts_with("http://localhost:5000/api/team-stats?"));
    assert!(url.contains("team=LAL"));
    assert!(url.contains("season=2024-25"));

    let summary = table::team_summary(&record);
    assert!(summary.contains(&"Record: 50-32".to_string()));
    assert!(summary.contains(&"Win %: 61.0%".to_string()));
}

#[test]
fn query_parameters_are_url_escaped() {
    let transport = StubTransport::new(200, lakers_body());
    let (_, last_url) = transport.counters();
    let client = StatsClient::with_transport(local_config(), transport);

    client
        .team_stats(BackendStatus::Running, "Los Angeles Lakers", "2024-25")
        .expect("stubbed fetch should succeed");

    let url = last_url
        .lock()
        .expect("url lock should not be poisoned")
        .clone()
        .expect("transport should have seen a url");
    assert!(!url.contains(' '), "raw space leaked into url: {url}");
}

#[test]
fn non_2xx_surfaces_the_backend_error_message() {
    let transport = StubTransport::new(404, r#"{"error": "Team 'XYZ' not found"}"#);
    let client = StatsClient::with_transport(local_config(), transport);

    let err = client
        .team_stats(BackendStatus::Running, "XYZ", "2024-25")
        .expect_err("404 should fail");
    assert_eq!(
        err,
        FetchError::HttpStatus {
            status: 404,
            message: "Team 'XYZ' not found".to_string(),
        }
    );
}

#[test]
fn non_2xx_without_json_body_keeps_the_raw_text() {
    let transport = StubTransport::new(500, "internal blowup");
    let client = StatsClient::with_transport(local_config(), transport);

    let err = client
        .league_stats(BackendStatus::Running, "2024-25")
        .expect_err("500 should fail");
    assert_eq!(
        err,
        FetchError::HttpStatus {
            status: 500,
            message: "internal blowup".to_string(),
        }
    );
}

#[test]
fn unparseable_success_body_is_a_parse_error() {
    let transport = StubTransport::new(200, "<html>definitely not json</html>");
    let client = StatsClient::with_transport(local_config(), transport);

    let err = client
        .team_stats(BackendStatus::Running, "LAL", "2024-25")
        .expect_err("html body should fail");
    assert!(matches!(err, FetchError::Parse(_)));
}

#[test]
fn wrong_shape_success_body_is_a_shape_error() {
    // League endpoint answering with a single object instead of an array.
    let transport = StubTransport::new(200, lakers_body());
    let client = StatsClient::with_transport(local_config(), transport);

    let err = client
        .league_stats(BackendStatus::Running, "2024-25")
        .expect_err("object body should fail the league shape");
    assert!(matches!(err, FetchError::Shape(_)));
}
