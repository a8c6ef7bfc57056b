//! AppleScript UI automation through `osascript`.
//!
//! This is the fallback actuation path of the native backend and the probe
//! for the Automation permission: any `System Events` call fails until the
//! user has allowed this process to control it.

use super::keymap::{KeyChord, KEY_LEFT_ARROW, KEY_RETURN, KEY_RIGHT_ARROW, KEY_UP_ARROW};
use crate::process::{CommandRunner, ProcessError};
use std::fmt::Write;
use std::path::Path;

pub const OSASCRIPT: &str = "/usr/bin/osascript";

/// Cheapest privileged call; triggers the consent prompt the first time.
pub const AUTOMATION_PROBE: &str =
    r#"tell application "System Events" to get name of first process"#;

/// Errors from running a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("osascript exited with {status:?}: {stderr}")]
    Failed { status: Option<i32>, stderr: String },
}

/// Run `source` with `osascript -e`.
pub fn run_osascript(runner: &dyn CommandRunner, source: &str) -> Result<(), ScriptError> {
    let out = runner.run(Path::new(OSASCRIPT), &["-e", source])?;
    if out.success() {
        Ok(())
    } else {
        Err(ScriptError::Failed {
            status: out.status,
            stderr: out.stderr.trim().to_string(),
        })
    }
}

/// Press `chord` through System Events.
pub fn keystroke_script(chord: KeyChord) -> String {
    format!(
        r#"tell application "System Events" to key code {}{}"#,
        chord.key_code,
        chord.applescript_modifiers()
    )
}

/// Open Mission Control, move `steps` spaces (negative = left) and confirm.
pub fn overview_navigation_script(steps: i64) -> String {
    let arrow = KeyChord::control(if steps < 0 {
        KEY_LEFT_ARROW
    } else {
        KEY_RIGHT_ARROW
    });
    let open = KeyChord::control(KEY_UP_ARROW);

    let mut script = String::from("tell application \"System Events\"\n");
    let _ = writeln!(script, "    key code {}{}", open.key_code, open.applescript_modifiers());
    script.push_str("    delay 0.4\n");
    if steps != 0 {
        let _ = writeln!(script, "    repeat {} times", steps.unsigned_abs());
        let _ = writeln!(script, "        key code {}{}", arrow.key_code, arrow.applescript_modifiers());
        script.push_str("        delay 0.15\n");
        script.push_str("    end repeat\n");
    }
    let _ = writeln!(script, "    key code {}", KEY_RETURN);
    script.push_str("end tell");
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessOutput;
    use std::sync::Mutex;

    struct FixedRunner {
        status: i32,
        seen: Mutex<Vec<String>>,
    }

    impl CommandRunner for FixedRunner {
        fn run(&self, program: &Path, args: &[&str]) -> Result<ProcessOutput, ProcessError> {
            let mut seen = self.seen.lock().unwrap();
            seen.push(program.display().to_string());
            seen.extend(args.iter().map(|a| a.to_string()));
            Ok(ProcessOutput {
                status: Some(self.status),
                stdout: String::new(),
                stderr: if self.status == 0 { String::new() } else { "not allowed".into() },
            })
        }
    }

    #[test]
    fn keystroke_script_for_desktop_three() {
        assert_eq!(
            keystroke_script(KeyChord::control(0x14)),
            r#"tell application "System Events" to key code 20 using {control down}"#
        );
    }

    #[test]
    fn navigation_script_moves_right() {
        let s = overview_navigation_script(3);
        assert!(s.contains("key code 126 using {control down}"));
        assert!(s.contains("repeat 3 times"));
        assert!(s.contains("key code 124 using {control down}"));
        assert!(s.trim_end().ends_with("end tell"));
        assert!(s.contains("key code 36"));
    }

    #[test]
    fn navigation_script_moves_left() {
        let s = overview_navigation_script(-2);
        assert!(s.contains("repeat 2 times"));
        assert!(s.contains("key code 123 using {control down}"));
    }

    #[test]
    fn navigation_script_without_steps_only_confirms() {
        let s = overview_navigation_script(0);
        assert!(!s.contains("repeat"));
        assert!(s.contains("key code 36"));
    }

    #[test]
    fn run_osascript_passes_source_as_single_argument() {
        let runner = FixedRunner {
            status: 0,
            seen: Mutex::new(Vec::new()),
        };
        run_osascript(&runner, AUTOMATION_PROBE).unwrap();
        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[0], OSASCRIPT);
        assert_eq!(seen[1], "-e");
        assert_eq!(seen[2], AUTOMATION_PROBE);
    }

    #[test]
    fn run_osascript_reports_failure() {
        let runner = FixedRunner {
            status: 1,
            seen: Mutex::new(Vec::new()),
        };
        let err = run_osascript(&runner, AUTOMATION_PROBE).unwrap_err();
        assert!(matches!(err, ScriptError::Failed { status: Some(1), .. }));
    }
}
