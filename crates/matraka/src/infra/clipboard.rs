//! System clipboard access.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// Clipboard handle that prefers the native backend and drops to shell
/// utilities in headless environments (SSH sessions, CI).
pub struct Clipboard {
    native: Option<arboard::Clipboard>,
}

impl Clipboard {
    pub fn new() -> Self {
        let native = match arboard::Clipboard::new() {
            Ok(handle) => Some(handle),
            Err(err) => {
                debug!(%err, "native clipboard unavailable, shell fallbacks only");
                None
            }
        };
        Self { native }
    }

    /// Replace the clipboard contents with `text`.
    pub fn copy(&mut self, text: &str) -> Result<()> {
        if let Some(native) = self.native.as_mut() {
            match native.set_text(text.to_owned()) {
                Ok(()) => return Ok(()),
                Err(err) => {
                    // A backend that failed once rarely recovers within the
                    // session; stop asking it.
                    debug!(%err, "native clipboard write failed, switching to shell fallbacks");
                    self.native = None;
                }
            }
        }
        copy_via_shell(text)
    }
}

impl Default for Clipboard {
    fn default() -> Self {
        Self::new()
    }
}

fn copy_via_shell(text: &str) -> Result<()> {
    let mut last_error = None;
    for command in SHELL_FALLBACKS {
        match pipe_through(command, text) {
            Ok(()) => return Ok(()),
            Err(err) => {
                debug!(command = command[0], %err, "clipboard fallback failed");
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| anyhow!("no clipboard backend available")))
}

fn pipe_through(command: &[&str], text: &str) -> Result<()> {
    let (program, args) = command
        .split_first()
        .context("clipboard command missing program")?;

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn clipboard command: {program}"))?;

    child
        .stdin
        .take()
        .context("clipboard command has no stdin")?
        .write_all(text.as_bytes())
        .context("failed to write clipboard contents")?;

    let status = child
        .wait()
        .with_context(|| format!("clipboard command did not exit cleanly: {program}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("clipboard command exited with status {status}"))
    }
}

#[cfg(target_os = "macos")]
const SHELL_FALLBACKS: &[&[&str]] = &[&["pbcopy"]];

#[cfg(all(unix, not(target_os = "macos")))]
const SHELL_FALLBACKS: &[&[&str]] = &[
    &["wl-copy"],
    &["xclip", "-selection", "clipboard"],
    &["xsel", "--clipboard", "--input"],
];

#[cfg(target_os = "windows")]
const SHELL_FALLBACKS: &[&[&str]] =
    &[&["powershell.exe", "-NoProfile", "-Command", "Set-Clipboard"]];

#[cfg(not(any(unix, target_os = "windows")))]
const SHELL_FALLBACKS: &[&[&str]] = &[];
