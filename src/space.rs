//! The [`Space`] value type shared by every backend.
//!
//! A `Space` is a snapshot: it is produced by a backend query and never
//! mutated afterwards.  Renames and switches are observed by querying again.

use serde::Serialize;
use std::fmt;

/// One virtual desktop as reported by a backend at query time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Space {
    /// Backend-local identifier.  Only meaningful to the backend that
    /// produced it; never compare ids across backends.
    pub id: String,
    /// 1-based display number used for direct addressing (hotkeys 1–20).
    pub index: u32,
    /// User- or auto-assigned name.  `None` when unset; never `Some("")`.
    pub label: Option<String>,
    pub is_current: bool,
    /// Display the space lives on (native backend only).
    pub display_id: Option<String>,
    pub is_fullscreen: bool,
}

impl Space {
    /// Build a regular (non-full-screen) space.  An empty `label` is stored
    /// as `None`.
    pub fn new(id: impl Into<String>, index: u32, label: Option<String>, is_current: bool) -> Self {
        Self {
            id: id.into(),
            index,
            label: normalize_label(label),
            is_current,
            display_id: None,
            is_fullscreen: false,
        }
    }

    pub fn on_display(mut self, display_id: impl Into<String>) -> Self {
        self.display_id = Some(display_id.into());
        self
    }

    pub fn fullscreen(mut self, is_fullscreen: bool) -> Self {
        self.is_fullscreen = is_fullscreen;
        self
    }

    /// Human-readable name: the label when it has visible content, otherwise
    /// `"Fullscreen {index}"` or `"Space {index}"`.
    pub fn display_name(&self) -> String {
        match self.label.as_deref() {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ if self.is_fullscreen => format!("Fullscreen {}", self.index),
            _ => format!("Space {}", self.index),
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{} id={})", self.display_name(), self.index, self.id)
    }
}

/// Map `Some("")` to `None`.
pub fn normalize_label(label: Option<String>) -> Option<String> {
    label.filter(|l| !l.is_empty())
}

/// Guarantee at least one space is marked current.
///
/// Backends occasionally report no focused space (e.g. while Mission Control
/// is animating).  By convention the first space is then treated as current.
pub fn ensure_current(spaces: &mut [Space]) {
    if !spaces.iter().any(|s| s.is_current) {
        if let Some(first) = spaces.first_mut() {
            first.is_current = true;
        }
    }
}

/// The current space of a query result: the first marked current, or the
/// first space overall.
pub fn current_of(spaces: &[Space]) -> Option<&Space> {
    spaces.iter().find(|s| s.is_current).or_else(|| spaces.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_label() {
        let s = Space::new("1", 1, Some("Work".into()), false);
        assert_eq!(s.display_name(), "Work");
    }

    #[test]
    fn display_name_without_label() {
        let s = Space::new("1", 3, None, false);
        assert_eq!(s.display_name(), "Space 3");
    }

    #[test]
    fn empty_label_is_normalized_to_none() {
        let s = Space::new("1", 1, Some(String::new()), false);
        assert_eq!(s.label, None);
        assert_eq!(s.display_name(), "Space 1");
    }

    #[test]
    fn whitespace_label_falls_back_to_index() {
        let s = Space::new("1", 2, Some("   ".into()), false);
        assert_eq!(s.display_name(), "Space 2");
    }

    #[test]
    fn fullscreen_display_name() {
        let s = Space::new("9", 4, None, false).fullscreen(true);
        assert_eq!(s.display_name(), "Fullscreen 4");
        let named = Space::new("9", 4, Some("Safari".into()), false).fullscreen(true);
        assert_eq!(named.display_name(), "Safari");
    }

    #[test]
    fn ensure_current_marks_first_when_none() {
        let mut spaces = vec![Space::new("1", 1, None, false), Space::new("2", 2, None, false)];
        ensure_current(&mut spaces);
        assert!(spaces[0].is_current);
        assert!(!spaces[1].is_current);
    }

    #[test]
    fn ensure_current_keeps_existing() {
        let mut spaces = vec![Space::new("1", 1, None, false), Space::new("2", 2, None, true)];
        ensure_current(&mut spaces);
        assert!(!spaces[0].is_current);
        assert!(spaces[1].is_current);
    }

    #[test]
    fn current_of_empty_is_none() {
        assert!(current_of(&[]).is_none());
    }
}
