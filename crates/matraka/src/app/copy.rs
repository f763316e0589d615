//! The copy-to-clipboard flow: plan, bind, finalize, write.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

use crate::app::tags::{self, Token};
use crate::app::variables;
use crate::infra::clipboard::Clipboard;
use crate::infra::config::Config;

/// Options controlling payload preparation.
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Strip `[key:...]` / `[wait...]` replay tags for human-facing text.
    /// Off by default: the payload is input to a downstream macro player.
    pub strip_replay: bool,
    /// Decode HTML entities after substitution.
    pub decode_entities: bool,
}

impl CopyOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            strip_replay: config.copy.strip_replay(),
            decode_entities: config.copy.decode_entities(),
        }
    }
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            strip_replay: false,
            decode_entities: true,
        }
    }
}

/// First step of the copy state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyPlan {
    /// No input variables: the payload is ready as-is.
    Direct(String),
    /// Input variables must be bound first, presented in this order.
    AwaitInput(Vec<String>),
}

/// Decide whether a macro copies directly or needs variable input. The direct
/// path carries the stored text verbatim; non-input tags are never stripped
/// unless `strip_replay` asks for it.
pub fn plan_copy(raw_text: &str, options: &CopyOptions) -> CopyPlan {
    let names = variables::extract_variables(raw_text);
    if names.is_empty() {
        let payload = if options.strip_replay {
            strip_replay_tags(raw_text)
        } else {
            raw_text.to_owned()
        };
        CopyPlan::Direct(payload)
    } else {
        CopyPlan::AwaitInput(names)
    }
}

/// Produce the final clipboard payload from bound variables: substitute, then
/// decode entities, then optionally strip replay tags. Entity decoding runs
/// only on this path; the direct path copies the stored text untouched.
pub fn finalize(
    raw_text: &str,
    bindings: &HashMap<String, String>,
    options: &CopyOptions,
) -> String {
    let mut payload = variables::substitute(raw_text, bindings);
    if options.decode_entities {
        payload = variables::decode_entities(&payload);
    }
    if options.strip_replay {
        payload = strip_replay_tags(&payload);
    }
    payload
}

/// Bindings covering every extracted variable: unfilled names default to the
/// empty string, so a missing binding is impossible by construction.
pub fn complete_bindings(
    names: &[String],
    values: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    let mut bindings: HashMap<String, String> = names
        .iter()
        .map(|name| (name.clone(), String::new()))
        .collect();
    for (name, value) in values {
        if let Some(slot) = bindings.get_mut(&name) {
            *slot = value;
        } else {
            debug!(name, "ignoring binding for unknown variable");
        }
    }
    bindings
}

/// Remove replay tags, keeping every other span byte-for-byte.
pub fn strip_replay_tags(text: &str) -> String {
    tags::tokenize(text)
        .iter()
        .filter(|token| !matches!(token, Token::Tag(tag) if tag.kind.is_replay()))
        .map(Token::span)
        .collect()
}

/// Owns the clipboard handle for the lifetime of the application.
pub struct Copier {
    clipboard: Mutex<Clipboard>,
}

impl Copier {
    pub fn new() -> Self {
        Self {
            clipboard: Mutex::new(Clipboard::new()),
        }
    }

    /// Write the payload to the system clipboard. Failure is recoverable: the
    /// caller keeps its state and may retry.
    pub fn copy_payload(&self, payload: &str) -> Result<()> {
        self.clipboard
            .lock()
            .unwrap()
            .copy(payload)
            .context("failed to write macro payload to clipboard")?;
        debug!(bytes = payload.len(), "macro payload copied");
        Ok(())
    }
}

impl Default for Copier {
    fn default() -> Self {
        Self::new()
    }
}
