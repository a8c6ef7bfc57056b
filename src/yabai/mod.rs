//! yabai-specific implementation.
//!
//! This module provides the subprocess-driven
//! [`SpaceBackend`](crate::traits::SpaceBackend), which uses the yabai CLI
//! both as an oracle for space state and as an actuator for switch/rename.
//!
//! Nothing outside this module should reference yabai's command syntax.

pub mod backend;
