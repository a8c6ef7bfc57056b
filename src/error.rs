//! Caller-facing failure classification.
//!
//! Nothing in spacecmd surfaces failures as errors to its callers: backends
//! fold mechanism failures into empty results and [`SwitchOutcome`]s.  When a
//! failure does need a human-readable explanation (a log line, a toast), it is
//! classified into the closed [`ErrorKind`] set and mapped to text by the
//! pure functions below.

use crate::traits::SwitchOutcome;
use std::fmt;

/// The permission a [`ErrorKind::PermissionMissing`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Accessibility,
    Automation,
    /// Neither permission is granted.
    Any,
}

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The executable is missing or every query came back empty.
    BackendUnavailable,
    /// An action was issued but its effect was never observed.
    ActionUnverified,
    PermissionMissing(Permission),
    /// External output could not be parsed.
    MalformedData,
    /// No space matched the requested index or id.
    SpaceNotFound,
}

impl SwitchOutcome {
    /// Classify a switch outcome, `None` for success and cancellation.
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            SwitchOutcome::Switched | SwitchOutcome::Cancelled => None,
            SwitchOutcome::Unverified => Some(ErrorKind::ActionUnverified),
            SwitchOutcome::PermissionRequested => {
                Some(ErrorKind::PermissionMissing(Permission::Any))
            }
            SwitchOutcome::NoBackend => Some(ErrorKind::BackendUnavailable),
            SwitchOutcome::NoSuchSpace => Some(ErrorKind::SpaceNotFound),
        }
    }
}

/// Short user-facing description of `kind`.
pub fn user_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::BackendUnavailable => {
            "No space backend is available: yabai was not found and native control is not permitted"
        }
        ErrorKind::ActionUnverified => "The space switch could not be confirmed",
        ErrorKind::PermissionMissing(Permission::Accessibility) => {
            "Required permission denied: Accessibility"
        }
        ErrorKind::PermissionMissing(Permission::Automation) => {
            "Required permission denied: Automation"
        }
        ErrorKind::PermissionMissing(Permission::Any) => {
            "Space switching needs Accessibility or Automation permission"
        }
        ErrorKind::MalformedData => "A backend returned output that could not be read",
        ErrorKind::SpaceNotFound => "No matching space was found",
    }
}

/// What the user can do about `kind`, if anything.
pub fn recovery_suggestion(kind: ErrorKind) -> Option<&'static str> {
    match kind {
        ErrorKind::BackendUnavailable => Some("Install yabai using: brew install yabai"),
        ErrorKind::PermissionMissing(Permission::Accessibility) | ErrorKind::PermissionMissing(Permission::Any) => {
            Some("Grant Accessibility permission in System Settings > Privacy & Security > Accessibility")
        }
        ErrorKind::PermissionMissing(Permission::Automation) => Some(
            "Grant Automation permission in System Settings > Privacy & Security > Automation for System Events",
        ),
        ErrorKind::SpaceNotFound => Some("Check that the space exists and refresh the space list"),
        ErrorKind::ActionUnverified | ErrorKind::MalformedData => None,
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(user_message(*self))
    }
}
