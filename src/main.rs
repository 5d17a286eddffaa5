use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Local};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use fastbreak_terminal::config::ApiConfig;
use fastbreak_terminal::feed;
use fastbreak_terminal::state::{
    AppState, BackendStatus, Delta, EntityView, FeedCommand, Screen, SEASONS, StatRecord,
    apply_delta,
};
use fastbreak_terminal::table::{self, Column, SortConfig};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<FeedCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<FeedCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn input_active(&self) -> bool {
        match self.state.screen {
            Screen::Team => self.state.team.input_active,
            Screen::Player => self.state.player.input_active,
            Screen::League => false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.input_active() {
            self.on_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Team,
            KeyCode::Char('2') => self.state.screen = Screen::Player,
            KeyCode::Char('3') => self.state.screen = Screen::League,
            KeyCode::Tab => self.next_screen(),
            KeyCode::Char('c') | KeyCode::Char('C') => self.check_backend(),
            KeyCode::Char('s') => self.state.cycle_season(),
            KeyCode::Char('e') | KeyCode::Char('i') => self.begin_input(),
            KeyCode::Char('r') => self.refresh_current(),
            KeyCode::Enter => match self.state.screen {
                Screen::Team => self.fetch_team(),
                Screen::Player => self.fetch_player(),
                Screen::League => self.state.toggle_league_sort(),
            },
            KeyCode::Left | KeyCode::Char('h') => {
                if self.state.screen == Screen::League {
                    self.state.league_col_prev();
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                if self.state.screen == Screen::League {
                    self.state.league_col_next();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.state.screen == Screen::League {
                    self.state.scroll_league_down();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if self.state.screen == Screen::League {
                    self.state.scroll_league_up();
                }
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        let view = match self.state.screen {
            Screen::Team => &mut self.state.team,
            Screen::Player => &mut self.state.player,
            Screen::League => return,
        };
        match key.code {
            KeyCode::Esc => view.input_active = false,
            KeyCode::Enter => {
                view.input_active = false;
                match self.state.screen {
                    Screen::Team => self.fetch_team(),
                    Screen::Player => self.fetch_player(),
                    Screen::League => {}
                }
            }
            KeyCode::Backspace => {
                view.input.pop();
            }
            KeyCode::Char(c) => view.input.push(c),
            _ => {}
        }
    }

    fn next_screen(&mut self) {
        self.state.screen = match self.state.screen {
            Screen::Team => Screen::Player,
            Screen::Player => Screen::League,
            Screen::League => Screen::Team,
        };
    }

    fn begin_input(&mut self) {
        match self.state.screen {
            Screen::Team => self.state.team.input_active = true,
            Screen::Player => self.state.player.input_active = true,
            Screen::League => {}
        }
    }

    fn check_backend(&mut self) {
        if self.cmd_tx.send(FeedCommand::CheckBackend).is_err() {
            self.state.push_log("[WARN] Stats feed unavailable");
        } else {
            self.state.push_log("[INFO] Backend check requested");
        }
    }

    fn refresh_current(&mut self) {
        match self.state.screen {
            Screen::Team => self.fetch_team(),
            Screen::Player => self.fetch_player(),
            Screen::League => {
                self.state.league.rows = None;
                self.state.league.error = None;
                self.fetch_league();
            }
        }
    }

    fn fetch_team(&mut self) {
        let request_id = self.state.next_request_id();
        let view = &mut self.state.team;
        view.last_request = request_id;
        view.loading = true;
        view.error = None;
        let team = view.input.clone();
        let season = SEASONS[view.season_idx].to_string();
        if self
            .cmd_tx
            .send(FeedCommand::FetchTeam {
                request_id,
                team,
                season,
            })
            .is_err()
        {
            self.state.team.loading = false;
            self.state.push_log("[WARN] Stats feed unavailable");
        }
    }

    fn fetch_player(&mut self) {
        let request_id = self.state.next_request_id();
        let view = &mut self.state.player;
        view.last_request = request_id;
        view.loading = true;
        view.error = None;
        let player = view.input.clone();
        let season = SEASONS[view.season_idx].to_string();
        if self
            .cmd_tx
            .send(FeedCommand::FetchPlayer {
                request_id,
                player,
                season,
            })
            .is_err()
        {
            self.state.player.loading = false;
            self.state.push_log("[WARN] Stats feed unavailable");
        }
    }

    fn fetch_league(&mut self) {
        let request_id = self.state.next_request_id();
        self.state.league.last_request = request_id;
        self.state.league.loading = true;
        self.state.league.error = None;
        let season = SEASONS[self.state.league.season_idx].to_string();
        if self
            .cmd_tx
            .send(FeedCommand::FetchLeague { request_id, season })
            .is_err()
        {
            self.state.league.loading = false;
            self.state.push_log("[WARN] Stats feed unavailable");
        }
    }

    /// League view fetches on its own once the backend reports Running:
    /// on first entry, after a season change, and after a manual refresh
    /// cleared it. A displayed error holds the view until the user acts.
    fn maybe_fetch_league(&mut self) {
        if self.state.screen != Screen::League {
            return;
        }
        if self.state.backend != BackendStatus::Running {
            return;
        }
        let league = &self.state.league;
        if league.rows.is_some() || league.loading || league.error.is_some() {
            return;
        }
        self.fetch_league();
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    feed::spawn_feed(ApiConfig::from_env(), tx, cmd_rx);

    let mut app = App::new(cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    // Stops the feed and, through it, the poller timer.
    let _ = app.cmd_tx.send(FeedCommand::Shutdown);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_fetch_league();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    render_header(frame, chunks[0], &app.state);

    match app.state.screen {
        Screen::Team => render_entity(
            frame,
            chunks[1],
            &app.state.team,
            table::TEAM_COLUMNS,
            "Team name or abbreviation",
            table::team_summary,
        ),
        Screen::Player => render_entity(
            frame,
            chunks[1],
            &app.state.player,
            table::PLAYER_COLUMNS,
            "Player name",
            table::player_summary,
        ),
        Screen::League => render_league(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let title = format!(
        "FASTBREAK TERMINAL | {} | Season {}",
        screen_label(state.screen),
        state.active_season()
    );
    frame.render_widget(
        Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD)),
        rows[0],
    );

    let status_style = match state.backend {
        BackendStatus::Checking => Style::default().fg(Color::Yellow),
        BackendStatus::Running => Style::default().fg(Color::Green),
        BackendStatus::NotRunning => Style::default().fg(Color::Red),
    };
    let mut spans = vec![
        Span::raw("Backend: "),
        Span::styled(state.backend.label(), status_style),
    ];
    if let Some(at) = state.last_probe_at {
        spans.push(Span::raw(format!("  last check {}", clock_label(at))));
    }
    if state.backend == BackendStatus::NotRunning {
        spans.push(Span::styled(
            "  press c to check again",
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), rows[1]);
}

fn clock_label(at: SystemTime) -> String {
    let local: DateTime<Local> = at.into();
    local.format("%H:%M:%S").to_string()
}

fn render_entity(
    frame: &mut Frame,
    area: Rect,
    view: &EntityView,
    columns: &[Column],
    input_label: &str,
    summary: fn(&StatRecord) -> Vec<String>,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Min(2),
        ])
        .split(area);

    let mut input_line = format!("{input_label}: {}", view.input);
    if view.input_active {
        input_line.push('_');
    } else {
        input_line.push_str("   (e edit, Enter fetch)");
    }
    frame.render_widget(Paragraph::new(input_line), rows[0]);

    render_view_status(frame, rows[1], view.loading, view.error.as_deref());

    if let Some(record) = &view.stats {
        let block = Block::default().title("Summary").borders(Borders::ALL);
        let inner = block.inner(rows[2]);
        frame.render_widget(block, rows[2]);
        frame.render_widget(Paragraph::new(summary(record).join("\n")), inner);

        let records = [record];
        render_stats_table(frame, rows[3], columns, &records, None, None, 0);
    } else if !view.loading && view.error.is_none() {
        frame.render_widget(
            Paragraph::new("No data yet").style(Style::default().fg(Color::DarkGray)),
            rows[2],
        );
    }
}

fn render_league(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(2)])
        .split(area);

    render_view_status(
        frame,
        rows[0],
        state.league.loading,
        state.league.error.as_deref(),
    );

    let Some(league_rows) = &state.league.rows else {
        if !state.league.loading && state.league.error.is_none() {
            let hint = if state.backend == BackendStatus::Running {
                "Loading league data"
            } else {
                "Waiting for the local stats server"
            };
            frame.render_widget(
                Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
                rows[1],
            );
        }
        return;
    };

    let records: Vec<&StatRecord> = league_rows.iter().collect();
    render_stats_table(
        frame,
        rows[1],
        table::LEAGUE_COLUMNS,
        &records,
        Some(&state.league.sort),
        Some(state.league.col_idx),
        state.league.scroll,
    );
}

fn render_view_status(frame: &mut Frame, area: Rect, loading: bool, error: Option<&str>) {
    if loading {
        frame.render_widget(
            Paragraph::new("Loading...").style(Style::default().fg(Color::Yellow)),
            area,
        );
    } else if let Some(error) = error {
        frame.render_widget(
            Paragraph::new(error.to_string()).style(Style::default().fg(Color::Red)),
            area,
        );
    }
}

fn render_stats_table(
    frame: &mut Frame,
    area: Rect,
    columns: &[Column],
    records: &[&StatRecord],
    sort: Option<&SortConfig>,
    col_cursor: Option<usize>,
    scroll: u16,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|column| Constraint::Length(column.width))
        .collect();

    let header_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.clone())
        .split(sections[0]);
    for (idx, column) in columns.iter().enumerate() {
        let mut label = column.label.to_string();
        if let Some(sort) = sort {
            if sort.key == column.key {
                label.push_str(sort.direction.indicator());
            }
        }
        let mut style = Style::default().add_modifier(Modifier::BOLD);
        if col_cursor == Some(idx) {
            style = style.fg(Color::Cyan);
        }
        frame.render_widget(Paragraph::new(label).style(style), header_cols[idx]);
    }

    let list_area = sections[1];
    if list_area.height == 0 || records.is_empty() {
        return;
    }
    let visible = list_area.height as usize;
    let max_start = records.len().saturating_sub(visible);
    let start = (scroll as usize).min(max_start);
    let end = (start + visible).min(records.len());

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths.clone())
            .split(row_area);
        let record = records[idx];
        for (c, column) in columns.iter().enumerate() {
            let text = table::format_value(record.get(column.key), column.key);
            frame.render_widget(Paragraph::new(text), cols[c]);
        }
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Team => "TEAM STATS",
        Screen::Player => "PLAYER STATS",
        Screen::League => "LEAGUE OVERVIEW",
    }
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Team | Screen::Player => {
            "1/2/3 View | e Edit | Enter Fetch | s Season | c Check server | ? Help | q Quit"
                .to_string()
        }
        Screen::League => {
            "1/2/3 View | ←/→ Column | Enter Sort | j/k Scroll | s Season | r Refresh | c Check server | ? Help | q Quit"
                .to_string()
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Fastbreak Terminal - Help",
        "",
        "Global:",
        "  1 / 2 / 3    Team / Player / League view",
        "  Tab          Next view",
        "  s            Cycle season",
        "  c            Check backend again",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Team / Player:",
        "  e            Edit name input",
        "  Enter        Fetch stats",
        "  r            Re-fetch",
        "",
        "League:",
        "  ←/→ or h/l   Move sort column",
        "  Enter        Toggle sort direction",
        "  j/k or ↑/↓   Scroll",
        "  r            Refresh table",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
