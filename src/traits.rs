//! Core traits that decouple spacecmd from any specific control mechanism or
//! transport.
//!
//! Every concrete backend (yabai, the native display server, a test harness,
//! …) implements [`SpaceBackend`].  The [`SpaceManager`](crate::manager::SpaceManager)
//! only depends on this abstraction.

use crate::command::Command;
use crate::retry::SwitchToken;
use crate::space::{current_of, Space};
use serde::Serialize;
use std::fmt;
use std::sync::mpsc;

/// Which mechanism a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    /// The yabai CLI, driven as a subprocess.
    Yabai,
    /// Direct display-server calls and synthetic input.
    Native,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Yabai => write!(f, "Yabai"),
            BackendKind::Native => write!(f, "Native"),
        }
    }
}

/// Result of a switch request.  Never an error: switching is best-effort and
/// "nothing happened" is a normal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The target was observed as current afterwards.
    Switched,
    /// The action was issued but the target never became current.
    Unverified,
    /// No permission was granted; a permission prompt was triggered instead.
    PermissionRequested,
    /// Superseded by a newer switch request.
    Cancelled,
    /// No backend is available.
    NoBackend,
    /// No space matched the request.
    NoSuchSpace,
}

/// Whether a backend is ready to actuate a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preflight {
    Ready,
    /// Actuation would certainly fail; a permission request was issued.
    PermissionRequested,
}

/// Abstraction over one mechanism for querying and controlling spaces.
///
/// Implementations absorb every mechanism-level failure: unavailability is
/// reported through [`is_available`](SpaceBackend::is_available) and empty
/// query results, never as errors.
pub trait SpaceBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Cheap enough to call before every operation.
    fn is_available(&self) -> bool;

    /// Fresh snapshot of every space, labels resolved through the label
    /// store.  Empty when the backend is unusable.
    fn spaces(&self) -> Vec<Space>;

    fn current_space(&self) -> Option<Space> {
        current_of(&self.spaces()).cloned()
    }

    /// Try to make `space` current.
    ///
    /// Backends that do not verify their own actions return
    /// [`SwitchOutcome::Unverified`] after issuing them and leave
    /// verification to the caller.
    fn switch_to(&self, space: &Space, token: &SwitchToken) -> SwitchOutcome;

    /// `true` if [`switch_to`](SpaceBackend::switch_to) already runs its own
    /// verify/retry loop.
    fn verifies_switch(&self) -> bool {
        false
    }

    fn rename_space(&self, space: &Space, name: &str);

    /// Check, right before a switch, whether actuation can possibly succeed.
    fn preflight(&self) -> Preflight {
        Preflight::Ready
    }

    /// One-time permission setup at process start.
    fn prepare_permissions(&self) {}
}

impl<T: SpaceBackend + ?Sized> SpaceBackend for std::sync::Arc<T> {
    fn kind(&self) -> BackendKind {
        (**self).kind()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn spaces(&self) -> Vec<Space> {
        (**self).spaces()
    }

    fn current_space(&self) -> Option<Space> {
        (**self).current_space()
    }

    fn switch_to(&self, space: &Space, token: &SwitchToken) -> SwitchOutcome {
        (**self).switch_to(space, token)
    }

    fn verifies_switch(&self) -> bool {
        (**self).verifies_switch()
    }

    fn rename_space(&self, space: &Space, name: &str) {
        (**self).rename_space(space, name)
    }

    fn preflight(&self) -> Preflight {
        (**self).preflight()
    }

    fn prepare_permissions(&self) {
        (**self).prepare_permissions()
    }
}

//  Panel

/// What a selector panel needs to render, captured at toggle time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSnapshot {
    pub spaces: Vec<Space>,
    pub active_backend: String,
}

/// Events sent from the manager to an external selector panel over an
/// [`mpsc`] channel.
///
/// The manager does not track panel visibility; the panel owns that state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Show the panel if hidden, hide it if shown.
    Toggle(PanelSnapshot),
}

//  Command Source

/// A source of [`Command`]s.
///
/// Implementations listen on some transport (a Unix socket, a hotkey
/// handler, a test harness) and forward parsed commands into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](CommandSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received command must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait CommandSource: Send {
    type Error: std::error::Error + Send + 'static;

    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}
