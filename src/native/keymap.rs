//! Key chords for "Switch to Desktop N".
//!
//! The stock shortcuts are ⌃1 … ⌃9 and ⌃0 for desktops 1–10.  With the
//! extended table, ⌃⌥1 … ⌃⌥0 address desktops 11–20.

/// macOS virtual key codes for the digits `0`–`9`, indexed by digit.
pub const DIGIT_KEY_CODES: [u16; 10] = [0x1D, 0x12, 0x13, 0x14, 0x15, 0x17, 0x16, 0x1A, 0x1C, 0x19];

pub const KEY_RETURN: u16 = 0x24;
pub const KEY_LEFT_ARROW: u16 = 0x7B;
pub const KEY_RIGHT_ARROW: u16 = 0x7C;
pub const KEY_UP_ARROW: u16 = 0x7E;

/// `kCGEventFlagMaskControl`.
pub const FLAG_CONTROL: u64 = 0x0004_0000;
/// `kCGEventFlagMaskAlternate`.
pub const FLAG_OPTION: u64 = 0x0008_0000;

/// Largest shortcut table supported.
pub const MAX_SHORTCUT_RANGE: u32 = 20;

/// A key code plus modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key_code: u16,
    pub control: bool,
    pub option: bool,
}

impl KeyChord {
    pub fn control(key_code: u16) -> Self {
        Self {
            key_code,
            control: true,
            option: false,
        }
    }

    pub fn control_option(key_code: u16) -> Self {
        Self {
            key_code,
            control: true,
            option: true,
        }
    }

    /// Event flag mask for posting the chord.
    pub fn flags(&self) -> u64 {
        let mut flags = 0;
        if self.control {
            flags |= FLAG_CONTROL;
        }
        if self.option {
            flags |= FLAG_OPTION;
        }
        flags
    }

    /// AppleScript `using {…}` clause, empty when there are no modifiers.
    pub fn applescript_modifiers(&self) -> String {
        let mut mods = Vec::new();
        if self.control {
            mods.push("control down");
        }
        if self.option {
            mods.push("option down");
        }
        if mods.is_empty() {
            String::new()
        } else {
            format!(" using {{{}}}", mods.join(", "))
        }
    }
}

/// The chord that switches to desktop `index`, if `index` is within the
/// directly addressable `range` (10 or 20; other values are clamped).
pub fn chord_for_index(index: u32, range: u32) -> Option<KeyChord> {
    let range = if range > 10 { MAX_SHORTCUT_RANGE } else { 10 };
    if index == 0 || index > range {
        return None;
    }
    let digit = (index % 10) as usize;
    let key_code = DIGIT_KEY_CODES[digit];
    if index <= 10 {
        Some(KeyChord::control(key_code))
    } else {
        Some(KeyChord::control_option(key_code))
    }
}
