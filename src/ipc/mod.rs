//! IPC listener that accepts commands over a Unix socket.
//!
//! Hotkey daemons, scripts and the selector panel connect to the socket and
//! send newline-delimited JSON [`Command`](crate::command::Command)s.

pub mod listener;
