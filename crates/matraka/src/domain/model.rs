//! Domain models for macros.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Application category a macro targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lower")]
pub enum MacroCategory {
    /// Canned replies and plain snippets.
    #[default]
    Text,
    /// AI prompts; the `{selection}` tag is contextually relevant here.
    Ai,
    /// Code snippets.
    Code,
}

impl MacroCategory {
    /// Stable identifier for configuration and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            MacroCategory::Text => "text",
            MacroCategory::Ai => "ai",
            MacroCategory::Code => "code",
        }
    }

    /// Uppercase display label used in list and detail panes.
    pub fn label(&self) -> &'static str {
        match self {
            MacroCategory::Text => "TEXT",
            MacroCategory::Ai => "AI",
            MacroCategory::Code => "CODE",
        }
    }
}

impl fmt::Display for MacroCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MacroCategory {
    type Err = CategoryParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(MacroCategory::Text),
            "ai" | "prompt" => Ok(MacroCategory::Ai),
            "code" => Ok(MacroCategory::Code),
            other => Err(CategoryParseError::UnknownCategory(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`MacroCategory`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CategoryParseError {
    #[error("unknown macro category '{0}'")]
    UnknownCategory(String),
}

/// Who can see a macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lower")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored, reusable text template with embedded tags.
///
/// `raw_text` is the interchange format: plain UTF-8 with the bracket/brace
/// tag syntax from [`crate::app::tags`]. It must round-trip byte-for-byte
/// through the library; the core only derives substituted copies from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    pub id: u64,
    pub title: String,
    pub raw_text: String,
    pub shortcut: Option<String>,
    pub category: MacroCategory,
    pub visibility: Visibility,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Macro {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_aliases() {
        assert_eq!("TEXT".parse::<MacroCategory>().unwrap(), MacroCategory::Text);
        assert_eq!("prompt".parse::<MacroCategory>().unwrap(), MacroCategory::Ai);
        assert_eq!(" code ".parse::<MacroCategory>().unwrap(), MacroCategory::Code);
        assert!("markdown".parse::<MacroCategory>().is_err());
    }

    #[test]
    fn category_round_trips_through_identifier() {
        for category in [MacroCategory::Text, MacroCategory::Ai, MacroCategory::Code] {
            assert_eq!(category.as_str().parse::<MacroCategory>().unwrap(), category);
        }
    }
}
