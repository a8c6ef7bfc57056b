//! The operating-system surface the native backend drives.
//!
//! Everything platform-specific (private display-server calls, synthetic
//! input, UI scripting, permission checks) sits behind these two traits, so
//! the actuation and retry logic in [`backend`](super::backend) is the same
//! on every target and can be exercised against a scripted double.

use super::keymap::KeyChord;
use std::time::Duration;

/// One space as the display server reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSpace {
    /// Managed space id, stable for the lifetime of the space.
    pub id: u64,
    /// Full-screen spaces carry a tiling-layout sub-structure.
    pub is_fullscreen: bool,
    /// Name of the application owning a full-screen space, if known.
    pub owner: Option<String>,
}

impl RawSpace {
    pub fn desktop(id: u64) -> Self {
        Self {
            id,
            is_fullscreen: false,
            owner: None,
        }
    }

    pub fn fullscreen(id: u64, owner: Option<&str>) -> Self {
        Self {
            id,
            is_fullscreen: true,
            owner: owner.map(str::to_string),
        }
    }
}

/// One display and its spaces, in compositor order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySpaces {
    pub display_id: String,
    /// Id of the space currently shown on this display.
    pub current_space: Option<u64>,
    pub spaces: Vec<RawSpace>,
}

/// Permission checks the native backend must pass before acting.
///
/// The OS is the only authority: implementations report what the OS says
/// and never assume a grant.
pub trait PermissionProbe: Send + Sync {
    /// Trusted-process check.  Never prompts.
    fn accessibility_trusted(&self) -> bool;

    /// Show the OS trust prompt.  The answer only becomes visible to a later
    /// [`accessibility_trusted`](PermissionProbe::accessibility_trusted).
    fn request_accessibility(&self);

    /// Attempt a lightweight privileged automation call.  May show a
    /// one-time consent prompt on the failure path.
    fn automation_granted(&self) -> bool;

    /// Trigger the automation consent prompt by attempting the privileged
    /// call once.
    fn request_automation(&self) {
        let _ = self.automation_granted();
    }
}

/// Display-server topology, synthetic input and UI scripting.
pub trait Platform: PermissionProbe {
    /// Full display → space topology.  Empty when it cannot be read.
    fn display_spaces(&self) -> Vec<DisplaySpaces>;

    /// Post a key-down / key-up pair at the lowest event-injection level,
    /// holding the key for `hold`.  Returns `false` if the events could not
    /// be created.
    fn post_key_chord(&self, chord: KeyChord, hold: Duration) -> bool;

    /// Run a UI-automation script.  Returns `false` if it failed to run.
    fn run_script(&self, source: &str) -> bool;
}
