use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::config::{self, ApiConfig};
use crate::poller::{self, HttpProbe};
use crate::state::{BackendStatus, Delta, FeedCommand};
use crate::stats_fetch::StatsClient;

const COMMAND_POLL: Duration = Duration::from_millis(200);

/// Worker thread owning the availability poller and the stats client.
/// Poller transitions are mirrored locally for gating and forwarded to the
/// UI; fetch commands run serially, so combined with the stale-request drop
/// in `apply_delta` rapid re-requests can never interleave out of order.
pub fn spawn_feed(api: ApiConfig, tx: Sender<Delta>, cmd_rx: Receiver<FeedCommand>) {
    thread::spawn(move || {
        let probe = match HttpProbe::new(&api) {
            Ok(probe) => probe,
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Probe setup failed: {err}")));
                return;
            }
        };
        let (status_tx, status_rx) = mpsc::channel();
        let poller = poller::start_polling(config::ping_interval(), probe, status_tx);
        let client = StatsClient::new(api);
        let mut backend = BackendStatus::Checking;

        loop {
            while let Ok(status) = status_rx.try_recv() {
                backend = status;
                if tx.send(Delta::BackendStatus(status)).is_err() {
                    poller.stop();
                    return;
                }
            }

            match cmd_rx.recv_timeout(COMMAND_POLL) {
                Ok(FeedCommand::CheckBackend) => poller.check_now(),
                Ok(FeedCommand::FetchTeam {
                    request_id,
                    team,
                    season,
                }) => {
                    let result = client.team_stats(backend, &team, &season);
                    if let Err(err) = &result {
                        let _ = tx.send(Delta::Log(format!("[WARN] Team fetch: {err}")));
                    }
                    if tx.send(Delta::TeamStats { request_id, result }).is_err() {
                        break;
                    }
                }
                Ok(FeedCommand::FetchPlayer {
                    request_id,
                    player,
                    season,
                }) => {
                    let result = client.player_stats(backend, &player, &season);
                    if let Err(err) = &result {
                        let _ = tx.send(Delta::Log(format!("[WARN] Player fetch: {err}")));
                    }
                    if tx.send(Delta::PlayerStats { request_id, result }).is_err() {
                        break;
                    }
                }
                Ok(FeedCommand::FetchLeague { request_id, season }) => {
                    let result = client.league_stats(backend, &season);
                    if let Err(err) = &result {
                        let _ = tx.send(Delta::Log(format!("[WARN] League fetch: {err}")));
                    }
                    if tx.send(Delta::LeagueStats { request_id, result }).is_err() {
                        break;
                    }
                }
                Ok(FeedCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        poller.stop();
    });
}
