//! Native backend: display-server topology, synthetic key chords and UI
//! scripting, gated on the Accessibility and Automation permissions.

pub mod backend;
pub mod keymap;
#[cfg(target_os = "macos")]
pub mod macos;
pub mod permissions;
pub mod platform;
pub mod script;
pub mod unsupported;

use crate::process::SystemRunner;

#[cfg(target_os = "macos")]
pub type SystemPlatform = macos::MacPlatform;
#[cfg(not(target_os = "macos"))]
pub type SystemPlatform = unsupported::UnsupportedPlatform;

/// The platform of the running OS.  `runner` executes automation scripts.
#[cfg(target_os = "macos")]
pub fn system_platform(runner: SystemRunner) -> SystemPlatform {
    macos::MacPlatform::new(runner)
}

#[cfg(not(target_os = "macos"))]
pub fn system_platform(_runner: SystemRunner) -> SystemPlatform {
    log::info!("no native space API on this platform");
    unsupported::UnsupportedPlatform
}
