//! Accessibility / Automation permission tracking.
//!
//! The gate holds two independent flags and is driven only by probes against
//! the OS: nothing here can grant a permission, and a request never changes
//! state by itself.  The next [`PermissionGate::probe`] observes the result.

use super::platform::PermissionProbe;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What the native backend may currently do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Neither,
    AccessibilityOnly,
    AutomationOnly,
    Both,
}

impl PermissionState {
    pub fn from_flags(accessibility: bool, automation: bool) -> Self {
        match (accessibility, automation) {
            (false, false) => PermissionState::Neither,
            (true, false) => PermissionState::AccessibilityOnly,
            (false, true) => PermissionState::AutomationOnly,
            (true, true) => PermissionState::Both,
        }
    }

    pub fn accessibility(self) -> bool {
        matches!(self, PermissionState::AccessibilityOnly | PermissionState::Both)
    }

    pub fn automation(self) -> bool {
        matches!(self, PermissionState::AutomationOnly | PermissionState::Both)
    }

    /// At least one actuation path is open.
    pub fn any(self) -> bool {
        self != PermissionState::Neither
    }
}

/// Cached result of the last permission probe.
pub struct PermissionGate<P: PermissionProbe + ?Sized> {
    probe: Arc<P>,
    accessibility: AtomicBool,
    automation: AtomicBool,
}

impl<P: PermissionProbe + ?Sized> PermissionGate<P> {
    /// A gate that has not probed yet and therefore assumes nothing.
    pub fn new(probe: Arc<P>) -> Self {
        Self {
            probe,
            accessibility: AtomicBool::new(false),
            automation: AtomicBool::new(false),
        }
    }

    /// Re-evaluate both permissions against the OS.
    pub fn probe(&self) -> PermissionState {
        let accessibility = self.probe.accessibility_trusted();
        let automation = self.probe.automation_granted();
        self.accessibility.store(accessibility, Ordering::SeqCst);
        self.automation.store(automation, Ordering::SeqCst);
        let state = PermissionState::from_flags(accessibility, automation);
        debug!("permission probe: {:?}", state);
        state
    }

    /// State as of the last probe.
    pub fn state(&self) -> PermissionState {
        PermissionState::from_flags(
            self.accessibility.load(Ordering::SeqCst),
            self.automation.load(Ordering::SeqCst),
        )
    }

    pub fn can_act(&self) -> bool {
        self.state().any()
    }

    pub fn request_accessibility(&self) {
        info!("requesting Accessibility permission");
        self.probe.request_accessibility();
    }

    pub fn request_automation(&self) {
        info!("requesting Automation permission");
        self.probe.request_automation();
    }

    /// First-launch flow: ask for Automation first, then Accessibility, and
    /// re-probe so later checks see whatever the user already granted.
    pub fn ensure_on_first_launch(&self) -> PermissionState {
        let state = self.probe();
        if !state.automation() {
            self.request_automation();
        }
        if !state.accessibility() {
            self.request_accessibility();
        }
        self.probe()
    }
}
