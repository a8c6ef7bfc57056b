//! Observable runtime settings.
//!
//! Components that care about a setting register for change events with
//! [`Settings::subscribe`] and receive them over an [`mpsc`] channel, so the
//! dependency shows up in the types instead of through a global notification
//! bus.

use crate::manager::SpaceMode;
use log::debug;
use std::sync::{mpsc, Mutex, MutexGuard};

/// A change to a setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsEvent {
    ModeChanged(SpaceMode),
}

/// Settings shared between the command handlers and the manager.
#[derive(Debug, Default)]
pub struct Settings {
    mode: Mutex<SpaceMode>,
    subscribers: Mutex<Vec<mpsc::Sender<SettingsEvent>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Settings {
    pub fn new(mode: SpaceMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn mode(&self) -> SpaceMode {
        *lock(&self.mode)
    }

    /// Register for change events.  Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> mpsc::Receiver<SettingsEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    /// Update the mode, notifying subscribers if it changed.
    pub fn set_mode(&self, mode: SpaceMode) -> bool {
        {
            let mut current = lock(&self.mode);
            if *current == mode {
                return false;
            }
            *current = mode;
        }
        self.publish(SettingsEvent::ModeChanged(mode));
        true
    }

    fn publish(&self, event: SettingsEvent) {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        debug!("published {:?} to {} subscriber(s)", event, subscribers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_mode_changes() {
        let settings = Settings::new(SpaceMode::Auto);
        let a = settings.subscribe();
        let b = settings.subscribe();
        assert!(settings.set_mode(SpaceMode::Native));
        assert_eq!(a.try_recv().unwrap(), SettingsEvent::ModeChanged(SpaceMode::Native));
        assert_eq!(b.try_recv().unwrap(), SettingsEvent::ModeChanged(SpaceMode::Native));
        assert_eq!(settings.mode(), SpaceMode::Native);
    }

    #[test]
    fn unchanged_mode_is_not_published() {
        let settings = Settings::new(SpaceMode::Yabai);
        let rx = settings.subscribe();
        assert!(!settings.set_mode(SpaceMode::Yabai));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let settings = Settings::new(SpaceMode::Auto);
        drop(settings.subscribe());
        let live = settings.subscribe();
        settings.set_mode(SpaceMode::Yabai);
        assert_eq!(lock(&settings.subscribers).len(), 1);
        assert!(live.try_recv().is_ok());
    }
}
