//! JSON-backed macro library.
//!
//! Records are validated and converted into typed [`Macro`] values at the
//! storage boundary; the rest of the application never sees untyped blobs.
//! `raw_text` round-trips byte-for-byte through the store.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::domain::errors::DomainError;
use crate::domain::model::{Macro, MacroCategory, Visibility};

const LIBRARY_DIR: &str = ".matraka";
const LIBRARY_FILE: &str = "library.json";

/// Fields supplied when creating a macro.
#[derive(Debug, Clone)]
pub struct MacroDraft {
    pub title: String,
    pub raw_text: String,
    pub shortcut: Option<String>,
    pub category: MacroCategory,
    pub visibility: Visibility,
}

/// Partial update applied to an existing macro.
#[derive(Debug, Clone, Default)]
pub struct MacroPatch {
    pub title: Option<String>,
    pub raw_text: Option<String>,
    /// `Some(None)` clears the shortcut.
    pub shortcut: Option<Option<String>>,
    pub category: Option<MacroCategory>,
    pub visibility: Option<Visibility>,
}

/// On-disk layout of the library file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LibraryFile {
    next_id: u64,
    macros: Vec<MacroRecord>,
}

/// Serializable representation of a [`Macro`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MacroRecord {
    id: u64,
    title: String,
    raw_text: String,
    #[serde(default)]
    shortcut: Option<String>,
    category: MacroCategory,
    visibility: Visibility,
    created_at: String,
    updated_at: String,
}

impl MacroRecord {
    fn from_macro(value: &Macro) -> Result<Self> {
        Ok(Self {
            id: value.id,
            title: value.title.clone(),
            raw_text: value.raw_text.clone(),
            shortcut: value.shortcut.clone(),
            category: value.category,
            visibility: value.visibility,
            created_at: format_timestamp(value.created_at)?,
            updated_at: format_timestamp(value.updated_at)?,
        })
    }

    fn into_macro(self) -> Result<Macro> {
        let created_at = parse_timestamp(&self.created_at)?;
        let updated_at = parse_timestamp(&self.updated_at)?;
        Ok(Macro {
            id: self.id,
            title: self.title,
            raw_text: self.raw_text,
            shortcut: self.shortcut,
            category: self.category,
            visibility: self.visibility,
            created_at,
            updated_at,
        })
    }
}

fn format_timestamp(value: OffsetDateTime) -> Result<String> {
    value
        .format(&Rfc3339)
        .context("failed to format macro timestamp")
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339)
        .with_context(|| format!("invalid macro timestamp '{value}'"))
}

/// In-memory macro collection with explicit persistence under
/// `.matraka/library.json`.
#[derive(Debug)]
pub struct MacroLibrary {
    path: PathBuf,
    next_id: u64,
    macros: Vec<Macro>,
}

impl MacroLibrary {
    /// Open (or lazily create) the library rooted at the provided directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let path = root.into().join(LIBRARY_DIR).join(LIBRARY_FILE);
        if !path.exists() {
            return Ok(Self {
                path,
                next_id: 1,
                macros: Vec::new(),
            });
        }

        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read library file at {}", path.display()))?;
        let file: LibraryFile = serde_json::from_str(&data)
            .with_context(|| format!("invalid library data in {}", path.display()))?;

        let mut macros = Vec::with_capacity(file.macros.len());
        for record in file.macros {
            macros.push(record.into_macro()?);
        }
        let highest = macros.iter().map(|entry| entry.id + 1).max().unwrap_or(1);
        Ok(Self {
            path,
            next_id: file.next_id.max(highest),
            macros,
        })
    }

    /// Location of the persisted library file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the current state, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create library directory {}", dir.display()))?;
        }

        let mut records = Vec::with_capacity(self.macros.len());
        for entry in &self.macros {
            records.push(MacroRecord::from_macro(entry)?);
        }
        let file = LibraryFile {
            next_id: self.next_id,
            macros: records,
        };
        let data = serde_json::to_string_pretty(&file).context("failed to serialize library")?;
        fs::write(&self.path, data)
            .with_context(|| format!("failed to write library file to {}", self.path.display()))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.macros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.macros.is_empty()
    }

    pub fn macros(&self) -> &[Macro] {
        &self.macros
    }

    pub fn get(&self, id: u64) -> Option<&Macro> {
        self.macros.iter().find(|entry| entry.id == id)
    }

    pub fn require(&self, id: u64) -> Result<&Macro, DomainError> {
        self.get(id).ok_or(DomainError::MacroNotFound(id))
    }

    /// Append a new macro and return it.
    pub fn add(&mut self, draft: MacroDraft) -> Macro {
        let now = OffsetDateTime::now_utc();
        let entry = Macro {
            id: self.next_id,
            title: draft.title,
            raw_text: draft.raw_text,
            shortcut: draft.shortcut.and_then(clean_shortcut),
            category: draft.category,
            visibility: draft.visibility,
            created_at: now,
            updated_at: now,
        };
        self.next_id += 1;
        self.macros.push(entry.clone());
        entry
    }

    /// Apply a partial update, refreshing `updated_at`.
    pub fn update(&mut self, id: u64, patch: MacroPatch) -> Result<Macro, DomainError> {
        let entry = self
            .macros
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or(DomainError::MacroNotFound(id))?;

        if let Some(title) = patch.title {
            entry.title = title;
        }
        if let Some(raw_text) = patch.raw_text {
            entry.raw_text = raw_text;
        }
        if let Some(shortcut) = patch.shortcut {
            entry.shortcut = shortcut.and_then(clean_shortcut);
        }
        if let Some(category) = patch.category {
            entry.category = category;
        }
        if let Some(visibility) = patch.visibility {
            entry.visibility = visibility;
        }
        entry.updated_at = OffsetDateTime::now_utc();
        Ok(entry.clone())
    }

    /// Remove a macro. Returns `true` when something was deleted.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.macros.len();
        self.macros.retain(|entry| entry.id != id);
        self.macros.len() != before
    }

    /// Duplicate a macro into a private copy, suffixing the title and
    /// shortcut so the clone is distinguishable and conflict-free.
    pub fn clone_macro(&mut self, id: u64) -> Result<Macro, DomainError> {
        let source = self.require(id)?.clone();
        Ok(self.add(MacroDraft {
            title: format!("{} (Copy)", source.title),
            raw_text: source.raw_text,
            shortcut: source.shortcut.map(|shortcut| format!("{shortcut}_copy")),
            category: source.category,
            visibility: Visibility::Private,
        }))
    }

    /// Macros matching the optional category and case-insensitive query over
    /// title, body, and shortcut, in insertion order.
    pub fn filter(
        &self,
        category: Option<MacroCategory>,
        query: &str,
        show_private: bool,
    ) -> Vec<&Macro> {
        let needle = query.trim().to_lowercase();
        self.macros
            .iter()
            .filter(|entry| show_private || entry.is_public())
            .filter(|entry| category.is_none_or(|wanted| entry.category == wanted))
            .filter(|entry| needle.is_empty() || matches_query(entry, &needle))
            .collect()
    }
}

fn matches_query(entry: &Macro, needle: &str) -> bool {
    entry.title.to_lowercase().contains(needle)
        || entry.raw_text.to_lowercase().contains(needle)
        || entry
            .shortcut
            .as_ref()
            .is_some_and(|shortcut| shortcut.to_lowercase().contains(needle))
}

fn clean_shortcut(shortcut: String) -> Option<String> {
    let trimmed = shortcut.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn draft(title: &str, text: &str, category: MacroCategory) -> MacroDraft {
        MacroDraft {
            title: title.into(),
            raw_text: text.into(),
            shortcut: None,
            category,
            visibility: Visibility::Private,
        }
    }

    fn empty_library() -> MacroLibrary {
        MacroLibrary {
            path: PathBuf::from("unused/library.json"),
            next_id: 1,
            macros: Vec::new(),
        }
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut library = empty_library();
        let first = library.add(draft("one", "a", MacroCategory::Text));
        let second = library.add(draft("two", "b", MacroCategory::Ai));
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(library.len(), 2);
    }

    #[test]
    fn require_reports_missing_macros() {
        let library = empty_library();
        assert_eq!(library.require(7), Err(DomainError::MacroNotFound(7)));
    }

    #[test]
    fn update_patches_fields_and_refreshes_timestamp() {
        let mut library = empty_library();
        let created = library.add(draft("old", "body", MacroCategory::Text));

        let updated = library
            .update(
                created.id,
                MacroPatch {
                    title: Some("new".into()),
                    category: Some(MacroCategory::Code),
                    ..MacroPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "new");
        assert_eq!(updated.category, MacroCategory::Code);
        assert_eq!(updated.raw_text, "body");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn clone_macro_copies_with_suffixes_and_goes_private() {
        let mut library = empty_library();
        let source = library.add(MacroDraft {
            title: "Greeting".into(),
            raw_text: "hi [input:Name]".into(),
            shortcut: Some("gr".into()),
            category: MacroCategory::Ai,
            visibility: Visibility::Public,
        });

        let copy = library.clone_macro(source.id).unwrap();
        assert_eq!(copy.title, "Greeting (Copy)");
        assert_eq!(copy.shortcut.as_deref(), Some("gr_copy"));
        assert_eq!(copy.raw_text, source.raw_text);
        assert_eq!(copy.visibility, Visibility::Private);
        assert_ne!(copy.id, source.id);
    }

    #[test]
    fn filter_applies_category_query_and_visibility() {
        let mut library = empty_library();
        library.add(MacroDraft {
            title: "Public greeting".into(),
            raw_text: "hello there".into(),
            shortcut: Some("hi".into()),
            category: MacroCategory::Text,
            visibility: Visibility::Public,
        });
        library.add(draft("Secret prompt", "summarize {selection}", MacroCategory::Ai));

        assert_eq!(library.filter(None, "", true).len(), 2);
        assert_eq!(library.filter(None, "", false).len(), 1);
        assert_eq!(library.filter(Some(MacroCategory::Ai), "", true).len(), 1);
        assert_eq!(library.filter(None, "GREETING", true).len(), 1);
        assert_eq!(library.filter(None, "selection", true).len(), 1);
        assert_eq!(library.filter(None, "hi", true).len(), 1);
        assert!(library.filter(Some(MacroCategory::Code), "", true).is_empty());
    }

    #[test]
    fn save_and_reopen_round_trips_macros() -> Result<()> {
        let dir = tempdir()?;
        let mut library = MacroLibrary::open(dir.path())?;
        let saved = library.add(MacroDraft {
            title: "Round trip".into(),
            raw_text: "keep [wait:5] tags &amp; entities verbatim".into(),
            shortcut: Some("rt".into()),
            category: MacroCategory::Code,
            visibility: Visibility::Public,
        });
        library.save()?;

        let reopened = MacroLibrary::open(dir.path())?;
        assert_eq!(reopened.len(), 1);
        let loaded = reopened.require(saved.id).unwrap();
        assert_eq!(loaded.raw_text, saved.raw_text);
        assert_eq!(loaded.shortcut, saved.shortcut);
        assert_eq!(loaded.category, MacroCategory::Code);

        let next = MacroLibrary::open(dir.path())?.add(draft("next", "x", MacroCategory::Text));
        assert_eq!(next.id, saved.id + 1);
        Ok(())
    }

    #[test]
    fn corrupted_library_file_returns_error() -> Result<()> {
        let dir = tempdir()?;
        fs::create_dir_all(dir.path().join(LIBRARY_DIR))?;
        fs::write(
            dir.path().join(LIBRARY_DIR).join(LIBRARY_FILE),
            "not json at all",
        )?;
        assert!(MacroLibrary::open(dir.path()).is_err());
        Ok(())
    }
}
