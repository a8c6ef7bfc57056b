//! Commands accepted by the daemon.
//!
//! This module defines the vocabulary shared by every command source:
//! [`Command`] describes each caller-facing operation, and [`SpaceIndex`] /
//! [`SpaceRef`] are lenient wire types for addressing a space.
//!
//! Hotkey helpers and scripts tend to forward raw arguments, so numbers are
//! accepted either as JSON numbers or as strings.

use crate::manager::SpaceMode;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Wire format for SwitchToIndex: accepts a positive number or a numeric
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpaceIndex(pub u32);

impl<'de> Deserialize<'de> for SpaceIndex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = SpaceIndex;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "positive integer or numeric string")
            }
            fn visit_u64<E>(self, n: u64) -> Result<SpaceIndex, E>
            where
                E: DeError,
            {
                u32::try_from(n)
                    .ok()
                    .filter(|n| *n > 0)
                    .map(SpaceIndex)
                    .ok_or_else(|| DeError::custom(format!("SwitchToIndex: {} is out of range", n)))
            }
            fn visit_i64<E>(self, n: i64) -> Result<SpaceIndex, E>
            where
                E: DeError,
            {
                let n = u64::try_from(n)
                    .map_err(|_| DeError::custom("SwitchToIndex: index must be positive"))?;
                self.visit_u64(n)
            }
            fn visit_str<E>(self, s: &str) -> Result<SpaceIndex, E>
            where
                E: DeError,
            {
                let n: u64 = s
                    .trim()
                    .parse()
                    .map_err(|_| DeError::custom(format!("SwitchToIndex: expected a number, got {:?}", s)))?;
                self.visit_u64(n)
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Wire format for a space id: accepts `"3"` or `3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpaceRef(pub String);

impl<'de> Deserialize<'de> for SpaceRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = SpaceRef;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "space id as string or integer")
            }
            fn visit_u64<E>(self, n: u64) -> Result<SpaceRef, E>
            where
                E: DeError,
            {
                Ok(SpaceRef(n.to_string()))
            }
            fn visit_i64<E>(self, n: i64) -> Result<SpaceRef, E>
            where
                E: DeError,
            {
                Ok(SpaceRef(n.to_string()))
            }
            fn visit_str<E>(self, s: &str) -> Result<SpaceRef, E>
            where
                E: DeError,
            {
                let s = s.trim();
                if s.is_empty() {
                    return Err(DeError::custom("space id cannot be empty"));
                }
                Ok(SpaceRef(s.to_string()))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Payload of [`Command::Rename`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameTarget {
    pub id: SpaceRef,
    /// New label.  Empty clears it.
    pub name: String,
}

/// Every operation the daemon can perform.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by the
/// [`SpaceManager`](crate::manager::SpaceManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Re-probe backends and re-query the space list.
    Refresh,

    /// Switch to the space with this backend id.
    SwitchTo(SpaceRef),

    /// Switch to the space whose display number is `n` (hotkeys 1–20).
    SwitchToIndex(SpaceIndex),

    /// Set or clear the label of a space.
    Rename(RenameTarget),

    /// Set or clear the label of the current space.
    RenameCurrent(String),

    /// Change the backend selection mode.
    SetMode(SpaceMode),

    /// Show or hide the selector panel.
    ToggleVisibility,

    /// Run the first-launch permission flow again.
    EnsurePermissions,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Refresh => write!(f, "refresh"),
            Command::SwitchTo(SpaceRef(id)) => write!(f, "switch to id {}", id),
            Command::SwitchToIndex(SpaceIndex(n)) => write!(f, "switch to #{}", n),
            Command::Rename(t) => write!(f, "rename {} to {:?}", t.id.0, t.name),
            Command::RenameCurrent(name) => write!(f, "rename current to {:?}", name),
            Command::SetMode(mode) => write!(f, "set mode {:?}", mode),
            Command::ToggleVisibility => write!(f, "toggle visibility"),
            Command::EnsurePermissions => write!(f, "ensure permissions"),
        }
    }
}
