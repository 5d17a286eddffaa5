use reqwest::Url;
use reqwest::header::ACCEPT;
use serde_json::Value;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::http_client::http_client;
use crate::state::{BackendStatus, StatRecord};
use crate::table::{Column, LEAGUE_COLUMNS, PLAYER_COLUMNS, TEAM_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("local stats server is not running")]
    NotRunning,
    #[error("backend returned http {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error("invalid json from backend: {0}")]
    Parse(String),
    #[error("unexpected response shape: {0}")]
    Shape(String),
    #[error("{0}")]
    Validation(String),
    #[error("request failed: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

/// Seam between the client and the wire so tests can count or stub calls.
pub trait Transport {
    fn get(&self, url: &Url) -> Result<WireResponse, String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<WireResponse, String> {
        let client = http_client().map_err(|err| err.to_string())?;
        let resp = client
            .get(url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| err.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(|err| err.to_string())?;
        Ok(WireResponse { status, body })
    }
}

/// Fetch orchestration over the local stats backend. Every call is gated on
/// the caller's view of `BackendStatus`: anything other than Running refuses
/// before a request is built.
pub struct StatsClient<T: Transport = HttpTransport> {
    config: ApiConfig,
    transport: T,
}

impl StatsClient<HttpTransport> {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            transport: HttpTransport,
        }
    }
}

impl<T: Transport> StatsClient<T> {
    pub fn with_transport(config: ApiConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn team_stats(
        &self,
        status: BackendStatus,
        team: &str,
        season: &str,
    ) -> Result<StatRecord, FetchError> {
        if team.trim().is_empty() {
            return Err(FetchError::Validation(
                "Please enter a team name or abbreviation".to_string(),
            ));
        }
        let body = self.get_checked(
            status,
            "/api/team-stats",
            &[("team", team.trim()), ("season", season)],
        )?;
        parse_team_stats_json(&body)
    }

    pub fn player_stats(
        &self,
        status: BackendStatus,
        player: &str,
        season: &str,
    ) -> Result<StatRecord, FetchError> {
        if player.trim().is_empty() {
            return Err(FetchError::Validation(
                "Please enter a player name".to_string(),
            ));
        }
        let body = self.get_checked(
            status,
            "/api/player-stats",
            &[("player", player.trim()), ("season", season)],
        )?;
        parse_player_stats_json(&body)
    }

    pub fn league_stats(
        &self,
        status: BackendStatus,
        season: &str,
    ) -> Result<Vec<StatRecord>, FetchError> {
        let body = self.get_checked(status, "/api/team-stats/league", &[("season", season)])?;
        parse_league_stats_json(&body)
    }

    fn get_checked(
        &self,
        status: BackendStatus,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<String, FetchError> {
        if status != BackendStatus::Running {
            return Err(FetchError::NotRunning);
        }
        // A placeholder base URL is never a live target.
        if self.config.is_placeholder() {
            return Err(FetchError::NotRunning);
        }
        let url = Url::parse_with_params(&self.config.endpoint(path), params)
            .map_err(|err| FetchError::Transport(format!("invalid url: {err}")))?;
        let resp = self.transport.get(&url).map_err(FetchError::Transport)?;
        if !(200..300).contains(&resp.status) {
            return Err(http_status_error(resp.status, resp.body));
        }
        Ok(resp.body)
    }
}

/// The backend reports failures as `{"error": "..."}`; surface that message
/// when present, the raw body text otherwise.
fn http_status_error(status: u16, body: String) -> FetchError {
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(Value::as_str)
                .map(|s| s.to_string())
        })
        .unwrap_or(body);
    FetchError::HttpStatus { status, message }
}

pub fn parse_team_stats_json(raw: &str) -> Result<StatRecord, FetchError> {
    record_with_columns(&parse_json(raw)?, TEAM_COLUMNS)
}

pub fn parse_player_stats_json(raw: &str) -> Result<StatRecord, FetchError> {
    record_with_columns(&parse_json(raw)?, PLAYER_COLUMNS)
}

pub fn parse_league_stats_json(raw: &str) -> Result<Vec<StatRecord>, FetchError> {
    let value = parse_json(raw)?;
    let Some(entries) = value.as_array() else {
        return Err(FetchError::Shape(
            "league response must be an array".to_string(),
        ));
    };
    entries
        .iter()
        .map(|entry| record_with_columns(entry, LEAGUE_COLUMNS))
        .collect()
}

fn parse_json(raw: &str) -> Result<Value, FetchError> {
    serde_json::from_str(raw).map_err(|err| FetchError::Parse(err.to_string()))
}

/// Stat schemas are fixed per view, so a record is only accepted when every
/// statically known column key is present.
fn record_with_columns(value: &Value, columns: &[Column]) -> Result<StatRecord, FetchError> {
    let Some(map) = value.as_object() else {
        return Err(FetchError::Shape("expected a json object".to_string()));
    };
    for column in columns {
        if !map.contains_key(column.key) {
            return Err(FetchError::Shape(format!("missing key {}", column.key)));
        }
    }
    Ok(StatRecord::from_map(map.clone()))
}
