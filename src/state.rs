use std::collections::VecDeque;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::stats_fetch::FetchError;
use crate::table::{self, SortConfig, SortDirection};

pub const SEASONS: [&str; 5] = ["2024-25", "2023-24", "2022-23", "2021-22", "2020-21"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Checking,
    Running,
    NotRunning,
}

impl BackendStatus {
    pub fn label(self) -> &'static str {
        match self {
            BackendStatus::Checking => "CHECKING",
            BackendStatus::Running => "RUNNING",
            BackendStatus::NotRunning => "NOT RUNNING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Team,
    Player,
    League,
}

/// One row of statistics as returned by the backend: a flat map from stat
/// abbreviation to number or string. Replaced wholesale by each fetch,
/// never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatRecord(Map<String, Value>);

impl StatRecord {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }
}

/// Team and Player views share the same shape: free-text entity input plus
/// one fetched record.
#[derive(Debug, Clone, Default)]
pub struct EntityView {
    pub input: String,
    pub input_active: bool,
    pub season_idx: usize,
    pub stats: Option<StatRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_request: u64,
}

#[derive(Debug, Clone)]
pub struct LeagueView {
    pub season_idx: usize,
    pub rows: Option<Vec<StatRecord>>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_request: u64,
    pub sort: SortConfig,
    pub col_idx: usize,
    pub scroll: u16,
}

impl Default for LeagueView {
    fn default() -> Self {
        Self {
            season_idx: 0,
            rows: None,
            loading: false,
            error: None,
            last_request: 0,
            sort: SortConfig {
                key: "W_PCT".to_string(),
                direction: SortDirection::Descending,
            },
            col_idx: 0,
            scroll: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub backend: BackendStatus,
    pub last_probe_at: Option<SystemTime>,
    pub team: EntityView,
    pub player: EntityView,
    pub league: LeagueView,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    request_counter: u64,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Team,
            backend: BackendStatus::Checking,
            last_probe_at: None,
            team: EntityView::default(),
            player: EntityView::default(),
            league: LeagueView::default(),
            logs: VecDeque::new(),
            help_overlay: false,
            request_counter: 0,
        }
    }

    pub fn next_request_id(&mut self) -> u64 {
        self.request_counter += 1;
        self.request_counter
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn active_season(&self) -> &'static str {
        let idx = match self.screen {
            Screen::Team => self.team.season_idx,
            Screen::Player => self.player.season_idx,
            Screen::League => self.league.season_idx,
        };
        SEASONS[idx % SEASONS.len()]
    }

    pub fn cycle_season(&mut self) {
        match self.screen {
            Screen::Team => {
                self.team.season_idx = (self.team.season_idx + 1) % SEASONS.len();
            }
            Screen::Player => {
                self.player.season_idx = (self.player.season_idx + 1) % SEASONS.len();
            }
            Screen::League => {
                self.league.season_idx = (self.league.season_idx + 1) % SEASONS.len();
                // A new season invalidates the table; the refresh hook in the
                // main loop re-fetches once the view is empty.
                self.league.rows = None;
                self.league.error = None;
                self.league.scroll = 0;
            }
        }
    }

    /// Toggles sort on the league column under the cursor and re-projects
    /// the stored rows.
    pub fn toggle_league_sort(&mut self) {
        let Some(column) = table::LEAGUE_COLUMNS.get(self.league.col_idx) else {
            return;
        };
        if !column.sortable {
            return;
        }
        self.league.sort = table::toggle_sort(&self.league.sort, column.key);
        if let Some(rows) = &self.league.rows {
            self.league.rows = Some(table::sort_records(
                rows,
                &self.league.sort.key,
                self.league.sort.direction,
            ));
        }
    }

    pub fn league_col_next(&mut self) {
        if self.league.col_idx + 1 < table::LEAGUE_COLUMNS.len() {
            self.league.col_idx += 1;
        }
    }

    pub fn league_col_prev(&mut self) {
        self.league.col_idx = self.league.col_idx.saturating_sub(1);
    }

    pub fn scroll_league_down(&mut self) {
        let total = self.league.rows.as_ref().map(Vec::len).unwrap_or(0) as u16;
        if self.league.scroll + 1 < total {
            self.league.scroll += 1;
        }
    }

    pub fn scroll_league_up(&mut self) {
        self.league.scroll = self.league.scroll.saturating_sub(1);
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    BackendStatus(BackendStatus),
    TeamStats {
        request_id: u64,
        result: Result<StatRecord, FetchError>,
    },
    PlayerStats {
        request_id: u64,
        result: Result<StatRecord, FetchError>,
    },
    LeagueStats {
        request_id: u64,
        result: Result<Vec<StatRecord>, FetchError>,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum FeedCommand {
    CheckBackend,
    FetchTeam {
        request_id: u64,
        team: String,
        season: String,
    },
    FetchPlayer {
        request_id: u64,
        player: String,
        season: String,
    },
    FetchLeague {
        request_id: u64,
        season: String,
    },
    Shutdown,
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::BackendStatus(status) => {
            if state.backend != status {
                state.push_log(format!("[INFO] Backend {}", status.label()));
            }
            state.backend = status;
            state.last_probe_at = Some(SystemTime::now());
        }
        Delta::TeamStats { request_id, result } => {
            apply_entity_result(&mut state.team, request_id, result);
        }
        Delta::PlayerStats { request_id, result } => {
            apply_entity_result(&mut state.player, request_id, result);
        }
        Delta::LeagueStats { request_id, result } => {
            // Cancel-and-replace: only the most recently issued request may
            // update the view; stale responses are discarded on arrival.
            if request_id != state.league.last_request {
                return;
            }
            state.league.loading = false;
            match result {
                Ok(rows) => {
                    state.league.error = None;
                    state.league.rows = Some(table::sort_records(
                        &rows,
                        &state.league.sort.key,
                        state.league.sort.direction,
                    ));
                    state.league.scroll = 0;
                }
                Err(err) => {
                    state.league.rows = None;
                    state.league.error = Some(err.to_string());
                }
            }
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

fn apply_entity_result(
    view: &mut EntityView,
    request_id: u64,
    result: Result<StatRecord, FetchError>,
) {
    if request_id != view.last_request {
        return;
    }
    view.loading = false;
    match result {
        Ok(record) => {
            view.error = None;
            view.stats = Some(record);
        }
        Err(err) => {
            view.stats = None;
            view.error = Some(err.to_string());
        }
    }
}
