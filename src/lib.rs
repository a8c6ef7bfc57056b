//! **spacecmd**: a virtual desktop ("space") switcher and labeller for
//! macOS.
//!
//! Spaces are listed, switched and renamed through one of two backends:
//!
//! * [`yabai`]: the yabai window manager's CLI, driven as a subprocess.
//!   Fast and reliable, but optional.
//! * [`native`]: direct display-server queries plus synthetic key chords
//!   and UI scripting.  Always present, but gated on the Accessibility and
//!   Automation permissions and less reliable.
//!
//! Neither mechanism can switch spaces synchronously, so every switch is
//! *act → settle → verify → retry* with a bounded budget ([`retry`]), and
//! only the most recent switch request is ever pursued.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::SpaceBackend`] abstracts listing, switching and renaming so
//!   the [`manager::SpaceManager`] is not coupled to any mechanism.
//! * [`traits::CommandSource`] abstracts the transport that delivers
//!   user intent (a Unix socket, a hotkey daemon, …) so the main loop is not
//!   coupled to any specific IPC mechanism.
//!
//! Labels live in a [`labels::LabelStore`] scoped per backend; backends only
//! overlay it onto what they observe.

pub mod command;
pub mod config;
pub mod error;
pub mod ipc;
pub mod labels;
pub mod manager;
pub mod native;
pub mod process;
pub mod retry;
pub mod settings;
pub mod space;
pub mod traits;
pub mod worker;
pub mod yabai;
