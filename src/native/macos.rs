//! macOS [`Platform`]: the CoreGraphics private space API for topology,
//! CGEvent for key chords, `osascript` for UI scripting, and the
//! Accessibility trust API.

use super::keymap::KeyChord;
use super::platform::{DisplaySpaces, PermissionProbe, Platform, RawSpace};
use super::script::{run_osascript, AUTOMATION_PROBE};
use crate::process::SystemRunner;
use core_foundation::array::{CFArray, CFArrayRef};
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::event::{CGEvent, CGEventFlags, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use log::{debug, warn};
use std::ffi::c_void;
use std::time::Duration;

#[link(name = "CoreGraphics", kind = "framework")]
extern "C" {
    fn CGSMainConnectionID() -> i32;
    fn CGSCopyManagedDisplaySpaces(cid: i32) -> CFArrayRef;
}

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
    fn AXIsProcessTrustedWithOptions(options: *const c_void) -> bool;
}

const AX_TRUSTED_CHECK_OPTION_PROMPT: &str = "AXTrustedCheckOptionPrompt";

type Dict = CFDictionary<CFString, CFType>;

fn as_dict(value: &CFType) -> Option<Dict> {
    let untyped = value.downcast::<CFDictionary>()?;
    // SAFETY: the reference is retained by `wrap_under_get_rule`; keys of
    // display-server dictionaries are strings.
    Some(unsafe { Dict::wrap_under_get_rule(untyped.as_concrete_TypeRef()) })
}

fn get(dict: &Dict, key: &'static str) -> Option<CFType> {
    dict.find(&CFString::from_static_string(key)).map(|v| (*v).clone())
}

fn get_dict(dict: &Dict, key: &'static str) -> Option<Dict> {
    as_dict(&get(dict, key)?)
}

fn get_array(dict: &Dict, key: &'static str) -> Option<CFArray<CFType>> {
    let untyped = get(dict, key)?.downcast::<CFArray>()?;
    // SAFETY: retained by `wrap_under_get_rule`; every element is a CF object.
    Some(unsafe { CFArray::<CFType>::wrap_under_get_rule(untyped.as_concrete_TypeRef()) })
}

fn get_u64(dict: &Dict, key: &'static str) -> Option<u64> {
    let n = get(dict, key)?.downcast::<CFNumber>()?.to_i64()?;
    u64::try_from(n).ok()
}

fn get_string(dict: &Dict, key: &'static str) -> Option<String> {
    get(dict, key)?.downcast::<CFString>().map(|s| s.to_string())
}

/// Best-effort owner of a full-screen space: the first tile's app name.
fn fullscreen_owner(tiling: &Dict) -> Option<String> {
    let tiles = get_array(tiling, "TileSpaces")?;
    tiles
        .iter()
        .filter_map(|tile| as_dict(&tile))
        .find_map(|tile| get_string(&tile, "appName").or_else(|| get_string(&tile, "name")))
        .filter(|name| !name.is_empty())
}

fn parse_space(dict: &Dict) -> Option<RawSpace> {
    let id = get_u64(dict, "ManagedSpaceID").or_else(|| get_u64(dict, "id64"))?;
    Some(match get_dict(dict, "TileLayoutManager") {
        Some(tiling) => RawSpace {
            id,
            is_fullscreen: true,
            owner: fullscreen_owner(&tiling),
        },
        None => RawSpace::desktop(id),
    })
}

fn parse_display(dict: &Dict) -> DisplaySpaces {
    let current_space = get_dict(dict, "Current Space").and_then(|cur| get_u64(&cur, "ManagedSpaceID"));
    let spaces = get_array(dict, "Spaces")
        .map(|arr| {
            arr.iter()
                .filter_map(|item| as_dict(&item))
                .filter_map(|space| parse_space(&space))
                .collect()
        })
        .unwrap_or_default();
    DisplaySpaces {
        display_id: get_string(dict, "Display Identifier").unwrap_or_else(|| "unknown".to_string()),
        current_space,
        spaces,
    }
}

/// The real thing.
pub struct MacPlatform {
    runner: SystemRunner,
}

impl MacPlatform {
    pub fn new(runner: SystemRunner) -> Self {
        Self { runner }
    }

    fn post_key(source: &CGEventSource, chord: KeyChord, down: bool) -> bool {
        match CGEvent::new_keyboard_event(source.clone(), chord.key_code, down) {
            Ok(event) => {
                event.set_flags(CGEventFlags::from_bits_truncate(chord.flags()));
                event.post(CGEventTapLocation::HID);
                true
            }
            Err(()) => false,
        }
    }
}

impl PermissionProbe for MacPlatform {
    fn accessibility_trusted(&self) -> bool {
        // SAFETY: no arguments, no side effects.
        unsafe { AXIsProcessTrusted() }
    }

    fn request_accessibility(&self) {
        let key = CFString::new(AX_TRUSTED_CHECK_OPTION_PROMPT);
        let value = CFBoolean::true_value();
        let options = CFDictionary::from_CFType_pairs(&[(key.as_CFType(), value.as_CFType())]);
        // SAFETY: `options` outlives the call.
        let _ = unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef().cast()) };
    }

    fn automation_granted(&self) -> bool {
        match run_osascript(&self.runner, AUTOMATION_PROBE) {
            Ok(()) => true,
            Err(e) => {
                debug!("automation probe failed: {}", e);
                false
            }
        }
    }
}

impl Platform for MacPlatform {
    fn display_spaces(&self) -> Vec<DisplaySpaces> {
        // SAFETY: both calls are plain queries; a null array means the
        // display server refused.
        let raw = unsafe { CGSCopyManagedDisplaySpaces(CGSMainConnectionID()) };
        if raw.is_null() {
            warn!("CGSCopyManagedDisplaySpaces returned null");
            return Vec::new();
        }
        // SAFETY: the "Copy" call transfers ownership to us.
        let displays: CFArray<CFType> = unsafe { CFArray::wrap_under_create_rule(raw) };
        displays
            .iter()
            .filter_map(|item| as_dict(&item))
            .map(|display| parse_display(&display))
            .collect()
    }

    fn post_key_chord(&self, chord: KeyChord, hold: Duration) -> bool {
        let Ok(source) = CGEventSource::new(CGEventSourceStateID::HIDSystemState) else {
            warn!("could not create HID event source");
            return false;
        };
        if !Self::post_key(&source, chord, true) {
            return false;
        }
        std::thread::sleep(hold);
        Self::post_key(&source, chord, false)
    }

    fn run_script(&self, source: &str) -> bool {
        match run_osascript(&self.runner, source) {
            Ok(()) => true,
            Err(e) => {
                warn!("script failed: {}", e);
                false
            }
        }
    }
}
