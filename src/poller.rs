use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::{self, ApiConfig};
use crate::state::BackendStatus;

/// One availability check. Every failure mode reads as `false`; a probe
/// never escalates an error to the caller.
pub trait Probe: Send + 'static {
    fn check(&mut self) -> bool;
}

impl<F> Probe for F
where
    F: FnMut() -> bool + Send + 'static,
{
    fn check(&mut self) -> bool {
        self()
    }
}

/// GETs `{base}/api/ping` with a short timeout; any 2xx means running.
pub struct HttpProbe {
    ping_url: Option<String>,
    client: Client,
}

impl HttpProbe {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config::probe_timeout())
            .build()
            .context("failed to build probe client")?;
        // A placeholder base URL probes false without touching the network.
        let ping_url = (!api.is_placeholder()).then(|| api.endpoint("/api/ping"));
        Ok(Self { ping_url, client })
    }
}

impl Probe for HttpProbe {
    fn check(&mut self) -> bool {
        let Some(url) = &self.ping_url else {
            return false;
        };
        // Non-2xx, connection errors and timeouts all fold into "not
        // running"; the bounded timeout keeps a hung backend from blocking
        // the poller past one interval.
        self.client
            .get(url)
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }
}

/// Pure availability state machine, independent of timers and threads.
/// Transition methods return whether a probe should be launched; results
/// arriving after `on_stop` are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerMachine {
    status: BackendStatus,
    stopped: bool,
}

impl Default for PollerMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PollerMachine {
    pub fn new() -> Self {
        Self {
            status: BackendStatus::Checking,
            stopped: false,
        }
    }

    pub fn status(&self) -> BackendStatus {
        self.status
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn on_start(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.status = BackendStatus::Checking;
        true
    }

    /// Periodic re-probe. The previous status stands until the result
    /// arrives; only start and manual checks reset to Checking.
    pub fn on_tick(&mut self) -> bool {
        !self.stopped
    }

    pub fn on_manual_check(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.status = BackendStatus::Checking;
        true
    }

    pub fn on_stop(&mut self) {
        self.stopped = true;
    }

    pub fn on_probe_result(&mut self, ok: bool) -> Option<BackendStatus> {
        if self.stopped {
            return None;
        }
        self.status = if ok {
            BackendStatus::Running
        } else {
            BackendStatus::NotRunning
        };
        Some(self.status)
    }
}

enum PollerCommand {
    CheckNow,
    Stop,
}

/// Stops the poller thread when told to, or when dropped, so repeated
/// mounts never leak a timer.
pub struct PollerHandle {
    cmd_tx: Sender<PollerCommand>,
}

impl PollerHandle {
    /// Immediate re-probe; also resets the interval clock. The driver
    /// thread serializes probes, so this can never double-schedule.
    pub fn check_now(&self) {
        let _ = self.cmd_tx.send(PollerCommand::CheckNow);
    }

    pub fn stop(&self) {
        let _ = self.cmd_tx.send(PollerCommand::Stop);
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(PollerCommand::Stop);
    }
}

/// Probes immediately, then every `interval` until stopped, emitting status
/// transitions to `tx`. One driver thread owns the machine and probes
/// synchronously, so at most one probe is ever in flight.
pub fn start_polling(
    interval: Duration,
    mut probe: impl Probe,
    tx: Sender<BackendStatus>,
) -> PollerHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    thread::spawn(move || run_poller(interval, &mut probe, &tx, &cmd_rx));
    PollerHandle { cmd_tx }
}

fn run_poller(
    interval: Duration,
    probe: &mut dyn Probe,
    tx: &Sender<BackendStatus>,
    cmd_rx: &Receiver<PollerCommand>,
) {
    let mut machine = PollerMachine::new();

    if machine.on_start() {
        if tx.send(machine.status()).is_err() {
            return;
        }
        if !probe_once(&mut machine, probe, tx, cmd_rx) {
            return;
        }
    }

    let mut last_probe = Instant::now();
    loop {
        let remaining = interval
            .checked_sub(last_probe.elapsed())
            .unwrap_or(Duration::ZERO);
        match cmd_rx.recv_timeout(remaining) {
            Ok(PollerCommand::Stop) => {
                machine.on_stop();
                return;
            }
            Ok(PollerCommand::CheckNow) => {
                if machine.on_manual_check() {
                    if tx.send(machine.status()).is_err() {
                        return;
                    }
                    if !probe_once(&mut machine, probe, tx, cmd_rx) {
                        return;
                    }
                }
                last_probe = Instant::now();
            }
            Err(RecvTimeoutError::Timeout) => {
                if machine.on_tick() && !probe_once(&mut machine, probe, tx, cmd_rx) {
                    return;
                }
                last_probe = Instant::now();
            }
            Err(RecvTimeoutError::Disconnected) => {
                machine.on_stop();
                return;
            }
        }
    }
}

/// Runs one probe and publishes the transition. Returns false once the
/// poller should wind down: a stop issued while the probe was in flight
/// wins over the result, so a late result never reaches the subscriber.
fn probe_once(
    machine: &mut PollerMachine,
    probe: &mut dyn Probe,
    tx: &Sender<BackendStatus>,
    cmd_rx: &Receiver<PollerCommand>,
) -> bool {
    let ok = probe.check();
    while let Ok(cmd) = cmd_rx.try_recv() {
        match cmd {
            PollerCommand::Stop => {
                machine.on_stop();
                return false;
            }
            // A manual check that raced the probe is satisfied by the
            // result we are about to publish.
            PollerCommand::CheckNow => {}
        }
    }
    match machine.on_probe_result(ok) {
        Some(status) => tx.send(status).is_ok(),
        None => false,
    }
}
