//! [`SpaceBackend`] implementation driving the display server directly.
//!
//! Topology comes from the display server; switching goes through two
//! layered mechanisms, each with its own verify/retry loop:
//!
//! 1. **Key synthesis** (needs Accessibility): post the "Switch to Desktop N"
//!    chord at the HID tap.
//! 2. **UI scripting** (needs Automation): press the same chord through
//!    System Events, or navigate Mission Control for targets without a
//!    chord (full-screen spaces, indices beyond the shortcut table).
//!
//! Labels live only in the label store; the display server has no notion of
//! a space name.

use super::keymap::{chord_for_index, KeyChord};
use super::permissions::{PermissionGate, PermissionState};
use super::platform::{DisplaySpaces, Platform};
use super::script::{keystroke_script, overview_navigation_script};
use crate::config::NativeConfig;
use crate::labels::ScopedLabels;
use crate::retry::{run_verified, RetryResult, SwitchToken};
use crate::space::{ensure_current, Space};
use crate::traits::{BackendKind, Preflight, SpaceBackend, SwitchOutcome};
use log::{debug, info, warn};
use std::sync::Arc;

/// Label-store scope for native space ids.
pub const LABEL_SCOPE: &str = "native";

/// Number the topology into [`Space`]s.
///
/// Two counters run across all displays in order: a position counter for
/// every space and a desktop counter for non-full-screen spaces only.
/// Desktops are addressed by the desktop counter (matching the "Desktop N"
/// shortcuts); full-screen spaces by their overall position.  The two
/// sequences can collide.
///
/// Full-screen spaces are labelled with their owning application, if known.
pub fn number_spaces(displays: &[DisplaySpaces]) -> Vec<Space> {
    let mut position = 0;
    let mut desktop = 0;
    let mut spaces = Vec::new();
    for display in displays {
        for raw in &display.spaces {
            position += 1;
            let index = if raw.is_fullscreen {
                position
            } else {
                desktop += 1;
                desktop
            };
            let label = if raw.is_fullscreen { raw.owner.clone() } else { None };
            let is_current = display.current_space == Some(raw.id);
            spaces.push(
                Space::new(raw.id.to_string(), index, label, is_current)
                    .on_display(display.display_id.clone())
                    .fullscreen(raw.is_fullscreen),
            );
        }
    }
    spaces
}

/// Arrow presses needed in Mission Control to reach `target` from the
/// current space of its display.  `None` if `target` is not in the topology.
pub fn navigation_steps(displays: &[DisplaySpaces], target: u64) -> Option<i64> {
    let display = displays.iter().find(|d| d.spaces.iter().any(|s| s.id == target))?;
    let to = display.spaces.iter().position(|s| s.id == target)? as i64;
    let from = display
        .current_space
        .and_then(|cur| display.spaces.iter().position(|s| s.id == cur))
        .unwrap_or(0) as i64;
    Some(to - from)
}

/// Native space control over a [`Platform`].
pub struct NativeBackend<P: Platform> {
    platform: Arc<P>,
    gate: PermissionGate<P>,
    labels: ScopedLabels,
    config: NativeConfig,
}

impl<P: Platform> NativeBackend<P> {
    pub fn new(platform: Arc<P>, labels: ScopedLabels, config: NativeConfig) -> Self {
        let gate = PermissionGate::new(platform.clone());
        Self {
            platform,
            gate,
            labels,
            config,
        }
    }

    pub fn permissions(&self) -> &PermissionGate<P> {
        &self.gate
    }

    fn is_current(&self, target: u64) -> bool {
        self.platform
            .display_spaces()
            .iter()
            .any(|d| d.current_space == Some(target))
    }

    /// Layer 1: post the chord at the HID tap.
    fn synthesize(&self, chord: KeyChord, target: u64, token: &SwitchToken) -> RetryResult {
        run_verified(
            &self.config.synthesis_policy(),
            token,
            |attempt| {
                debug!("key synthesis attempt {} for space {}", attempt, target);
                self.platform.post_key_chord(chord, self.config.key_hold())
            },
            || self.is_current(target),
        )
    }

    /// Layer 2: keystroke script when there is a chord, Mission Control
    /// navigation otherwise.
    fn script(&self, chord: Option<KeyChord>, target: u64, token: &SwitchToken) -> RetryResult {
        run_verified(
            &self.config.script_policy(),
            token,
            |attempt| {
                debug!("scripted attempt {} for space {}", attempt, target);
                let source = match chord {
                    Some(chord) => keystroke_script(chord),
                    None => match navigation_steps(&self.platform.display_spaces(), target) {
                        Some(steps) => overview_navigation_script(steps),
                        None => {
                            warn!("space {} is no longer in the topology", target);
                            return false;
                        }
                    },
                };
                self.platform.run_script(&source)
            },
            || self.is_current(target),
        )
    }
}

impl<P: Platform> SpaceBackend for NativeBackend<P> {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn is_available(&self) -> bool {
        !self.platform.display_spaces().is_empty() && self.gate.probe().any()
    }

    fn spaces(&self) -> Vec<Space> {
        let mut spaces = number_spaces(&self.platform.display_spaces());
        for space in &mut spaces {
            // Stored labels win over the owner-name fallback, which is
            // never written back.
            if let Some(stored) = self.labels.get(&space.id) {
                space.label = Some(stored);
            }
        }
        ensure_current(&mut spaces);
        spaces
    }

    fn switch_to(&self, space: &Space, token: &SwitchToken) -> SwitchOutcome {
        let Ok(target) = space.id.parse::<u64>() else {
            warn!("not a native space id: {:?}", space.id);
            return SwitchOutcome::NoSuchSpace;
        };

        let state = self.gate.probe();
        if state == PermissionState::Neither {
            self.gate.request_accessibility();
            return SwitchOutcome::PermissionRequested;
        }

        let chord = if space.is_fullscreen {
            None
        } else {
            chord_for_index(space.index, self.config.shortcut_range)
        };

        if let (true, Some(chord)) = (state.accessibility(), chord) {
            match self.synthesize(chord, target, token) {
                RetryResult::Verified { attempt } => {
                    info!("switched to {} by key synthesis (attempt {})", space, attempt);
                    return SwitchOutcome::Switched;
                }
                RetryResult::Cancelled => return SwitchOutcome::Cancelled,
                RetryResult::Exhausted => debug!("key synthesis exhausted for {}", space),
            }
        }

        if state.automation() {
            match self.script(chord, target, token) {
                RetryResult::Verified { attempt } => {
                    info!("switched to {} by scripting (attempt {})", space, attempt);
                    return SwitchOutcome::Switched;
                }
                RetryResult::Cancelled => return SwitchOutcome::Cancelled,
                RetryResult::Exhausted => debug!("scripted switch exhausted for {}", space),
            }
        }

        if !state.accessibility() {
            self.gate.request_accessibility();
        }
        warn!("could not switch to {}", space);
        SwitchOutcome::Unverified
    }

    fn verifies_switch(&self) -> bool {
        true
    }

    fn rename_space(&self, space: &Space, name: &str) {
        self.labels.set(&space.id, name);
    }

    fn preflight(&self) -> Preflight {
        if self.gate.probe().any() {
            Preflight::Ready
        } else {
            self.gate.request_accessibility();
            Preflight::PermissionRequested
        }
    }

    fn prepare_permissions(&self) {
        let state = self.gate.ensure_on_first_launch();
        info!("native permissions after first-launch check: {:?}", state);
    }
}
