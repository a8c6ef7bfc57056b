//! Dedicated switch thread.
//!
//! A switch can block for the length of a retry loop, so switch commands are
//! handed to one worker thread instead of running on the command loop.  Each
//! submission takes a fresh [`SwitchToken`] before it is queued, which
//! cancels whatever switch is still running or waiting: the latest request
//! wins, and queued requests that were superseded are dropped unexecuted.

use crate::command::{Command, SpaceIndex, SpaceRef};
use crate::manager::{report_outcome, SpaceManager};
use crate::retry::SwitchToken;
use crate::traits::SwitchOutcome;
use log::{debug, info};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;

/// A switch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchRequest {
    Index(u32),
    Id(String),
}

impl SwitchRequest {
    /// The request carried by a switch command, `None` for anything else.
    pub fn from_command(cmd: &Command) -> Option<Self> {
        match cmd {
            Command::SwitchToIndex(SpaceIndex(n)) => Some(SwitchRequest::Index(*n)),
            Command::SwitchTo(SpaceRef(id)) => Some(SwitchRequest::Id(id.clone())),
            _ => None,
        }
    }
}

/// Execute one request under `token`.
pub fn run_request(manager: &SpaceManager, request: &SwitchRequest, token: &SwitchToken) -> SwitchOutcome {
    if token.is_cancelled() {
        debug!("dropping superseded {:?}", request);
        return SwitchOutcome::Cancelled;
    }
    match request {
        SwitchRequest::Index(n) => manager.switch_to_index_with(*n, token),
        SwitchRequest::Id(id) => manager.switch_to_id_with(id, token),
    }
}

type Job = (SwitchRequest, SwitchToken);

/// Handle to the switch thread.  Dropping it (or calling
/// [`shutdown`](SwitchWorker::shutdown)) stops the thread after the current
/// job.
pub struct SwitchWorker {
    manager: Arc<SpaceManager>,
    tx: Option<mpsc::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl SwitchWorker {
    /// Start the thread.  Outcomes are logged, and also sent to `outcomes`
    /// when given.
    pub fn spawn(
        manager: Arc<SpaceManager>,
        outcomes: Option<mpsc::Sender<(SwitchRequest, SwitchOutcome)>>,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let worker_manager = manager.clone();
        let handle = std::thread::Builder::new()
            .name("spacecmd-switch".into())
            .spawn(move || {
                for (request, token) in rx {
                    let outcome = run_request(&worker_manager, &request, &token);
                    report_outcome(outcome);
                    if let Some(out) = &outcomes {
                        let _ = out.send((request, outcome));
                    }
                }
                debug!("switch worker exiting");
            })?;
        Ok(Self {
            manager,
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue `request`, cancelling every earlier one.  Returns `false` if the
    /// worker has stopped.
    pub fn submit(&self, request: SwitchRequest) -> bool {
        let token = self.manager.begin_switch();
        info!("queued switch {:?}", request);
        match &self.tx {
            Some(tx) => tx.send((request, token)).is_ok(),
            None => false,
        }
    }

    /// Cancel the running switch and wait for the thread to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.manager.begin_switch();
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SwitchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
