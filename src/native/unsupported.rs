//! [`Platform`] for targets without a native space API.  Reports no
//! topology and no permissions, so the native backend is never available.

use super::keymap::KeyChord;
use super::platform::{DisplaySpaces, PermissionProbe, Platform};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct UnsupportedPlatform;

impl PermissionProbe for UnsupportedPlatform {
    fn accessibility_trusted(&self) -> bool {
        false
    }

    fn request_accessibility(&self) {}

    fn automation_granted(&self) -> bool {
        false
    }
}

impl Platform for UnsupportedPlatform {
    fn display_spaces(&self) -> Vec<DisplaySpaces> {
        Vec::new()
    }

    fn post_key_chord(&self, _chord: KeyChord, _hold: Duration) -> bool {
        false
    }

    fn run_script(&self, _source: &str) -> bool {
        false
    }
}
