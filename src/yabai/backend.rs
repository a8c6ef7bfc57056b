//! [`SpaceBackend`] implementation backed by the yabai CLI.
//!
//! Every call spawns a short-lived `yabai -m …` process.  Spawn failures,
//! non-zero exits, timeouts and unparseable output are all folded into "no
//! output": the backend never raises, it just reports itself unavailable so
//! the manager can fall back to the native backend.

use crate::config::YabaiConfig;
use crate::labels::ScopedLabels;
use crate::process::{find_executable, CommandRunner, ProcessOutput, SystemRunner};
use crate::retry::SwitchToken;
use crate::space::{ensure_current, Space};
use crate::traits::{BackendKind, SpaceBackend, SwitchOutcome};
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::PathBuf;

/// Label-store scope for yabai space ids.
pub const LABEL_SCOPE: &str = "yabai";

/// yabai-backed space control.
pub struct YabaiBackend {
    binary: Option<PathBuf>,
    runner: Box<dyn CommandRunner>,
    labels: ScopedLabels,
}

//  Minimal serde struct for the JSON we care about

/// Subset of one element of `yabai -m query --spaces`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct YabaiSpaceJson {
    pub id: u64,
    #[serde(default)]
    pub uuid: String,
    pub index: u32,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "has-focus", default)]
    pub has_focus: bool,
}

/// Parse the output of `yabai -m query --spaces`.
pub fn parse_spaces(json: &str) -> Result<Vec<YabaiSpaceJson>, serde_json::Error> {
    serde_json::from_str(json)
}

impl YabaiBackend {
    /// Locate yabai (configured binary, well-known paths, then `PATH`) and
    /// build a backend that runs it with the configured timeout.
    pub fn locate(config: &YabaiConfig, labels: ScopedLabels) -> Self {
        let candidates: Vec<PathBuf> = config
            .binary
            .iter()
            .chain(config.search_paths.iter())
            .cloned()
            .collect();
        let binary = find_executable("yabai", &candidates);
        match &binary {
            Some(path) => info!("found yabai at {}", path.display()),
            None => info!("yabai not found"),
        }
        Self::with_runner(binary, Box::new(SystemRunner::new(config.timeout())), labels)
    }

    pub fn with_runner(
        binary: Option<PathBuf>,
        runner: Box<dyn CommandRunner>,
        labels: ScopedLabels,
    ) -> Self {
        Self {
            binary,
            runner,
            labels,
        }
    }

    /// Run `yabai <args>`.  `None` if yabai is missing or could not run.
    fn yabai(&self, args: &[&str]) -> Option<ProcessOutput> {
        let binary = self.binary.as_deref()?;
        match self.runner.run(binary, args) {
            Ok(out) => Some(out),
            Err(e) => {
                debug!("yabai {:?}: {}", args, e);
                None
            }
        }
    }

    /// Parsed `query --spaces` output.  `None` when the output is empty or
    /// not the expected JSON, which callers treat as "unavailable".
    fn query_spaces(&self) -> Option<Vec<YabaiSpaceJson>> {
        let out = self.yabai(&["-m", "query", "--spaces"])?;
        if out.stdout.trim().is_empty() {
            return None;
        }
        match parse_spaces(&out.stdout) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!("unparseable yabai output ({}), treating as unavailable", e);
                None
            }
        }
    }
}

impl SpaceBackend for YabaiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Yabai
    }

    fn is_available(&self) -> bool {
        self.binary.is_some() && self.query_spaces().is_some()
    }

    fn spaces(&self) -> Vec<Space> {
        let Some(parsed) = self.query_spaces() else {
            return Vec::new();
        };
        let mut spaces: Vec<Space> = parsed
            .into_iter()
            .map(|s| {
                let id = s.id.to_string();
                let label = self.labels.resolve(&id, Some(&s.label));
                Space::new(id, s.index, label, s.has_focus)
            })
            .collect();
        ensure_current(&mut spaces);
        spaces
    }

    fn switch_to(&self, space: &Space, _token: &SwitchToken) -> SwitchOutcome {
        let index = space.index.to_string();
        let by_index = self.yabai(&["-m", "space", "--focus", &index]);
        let failed = by_index.as_ref().map_or(true, ProcessOutput::failed);

        if failed {
            if let Some(label) = space.label.as_deref().filter(|l| !l.is_empty()) {
                debug!("focus by index {} failed, retrying by label {:?}", index, label);
                if let Some(out) = self.yabai(&["-m", "space", "--focus", label]) {
                    if out.failed() {
                        warn!("yabai could not focus {:?}: {}", label, out.stderr.trim());
                    }
                }
            } else if let Some(out) = by_index {
                warn!("yabai could not focus space {}: {}", index, out.stderr.trim());
            }
        }
        SwitchOutcome::Unverified
    }

    fn rename_space(&self, space: &Space, name: &str) {
        // The store is written first so the label survives even when yabai
        // is gone.
        self.labels.set(&space.id, name);
        let index = space.index.to_string();
        if let Some(out) = self.yabai(&["-m", "space", &index, "--label", name]) {
            if out.failed() {
                debug!("yabai label for space {} not set: {}", index, out.stderr.trim());
            }
        }
    }
}
