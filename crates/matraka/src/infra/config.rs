//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".matraka/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub copy: CopyPrefs,
    #[serde(default)]
    pub keybindings: Keybindings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Startup category filter: "all" or a macro category identifier.
    #[serde(default = "Defaults::default_category")]
    pub category: String,
    #[serde(default = "Defaults::default_show_private")]
    pub show_private: bool,
}

impl Defaults {
    fn default_category() -> String {
        "all".into()
    }

    fn default_show_private() -> bool {
        true
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            category: Self::default_category(),
            show_private: Self::default_show_private(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyPrefs {
    #[serde(default)]
    strip_replay: Option<bool>,
    #[serde(default)]
    decode_entities: Option<bool>,
}

impl CopyPrefs {
    fn default_strip_replay() -> bool {
        false
    }

    fn default_decode_entities() -> bool {
        true
    }

    pub fn strip_replay(&self) -> bool {
        self.strip_replay.unwrap_or_else(Self::default_strip_replay)
    }

    pub fn decode_entities(&self) -> bool {
        self.decode_entities
            .unwrap_or_else(Self::default_decode_entities)
    }
}

impl Default for CopyPrefs {
    fn default() -> Self {
        Self {
            strip_replay: Some(Self::default_strip_replay()),
            decode_entities: Some(Self::default_decode_entities()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keybindings {
    #[serde(default = "Keybindings::default_up")]
    pub up: String,
    #[serde(default = "Keybindings::default_down")]
    pub down: String,
    #[serde(default = "Keybindings::default_copy")]
    pub copy: String,
    #[serde(default = "Keybindings::default_filter")]
    pub filter: String,
}

impl Keybindings {
    fn default_up() -> String {
        "k".into()
    }

    fn default_down() -> String {
        "j".into()
    }

    fn default_copy() -> String {
        "enter".into()
    }

    fn default_filter() -> String {
        "/".into()
    }
}

impl Default for Keybindings {
    fn default() -> Self {
        Self {
            up: Self::default_up(),
            down: Self::default_down(),
            copy: Self::default_copy(),
            filter: Self::default_filter(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    category: Option<String>,
    strip_replay: Option<bool>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            category: env::var("MATRAKA_CATEGORY").ok(),
            strip_replay: env::var("MATRAKA_STRIP_REPLAY")
                .ok()
                .map(|value| matches!(value.trim(), "1" | "true" | "yes")),
        }
    }

    #[cfg(test)]
    fn for_tests(category: &str, strip_replay: bool) -> Self {
        Self {
            category: Some(category.to_owned()),
            strip_replay: Some(strip_replay),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config,
    /// and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            copy: merge_copy(self.copy, other.copy),
            keybindings: merge_keybindings(self.keybindings, other.keybindings),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        category: if overlay.category != Defaults::default_category() {
            overlay.category
        } else {
            base.category
        },
        show_private: if overlay.show_private != Defaults::default_show_private() {
            overlay.show_private
        } else {
            base.show_private
        },
    }
}

fn merge_copy(mut base: CopyPrefs, overlay: CopyPrefs) -> CopyPrefs {
    if let Some(value) = overlay.strip_replay {
        base.strip_replay = Some(value);
    }
    if let Some(value) = overlay.decode_entities {
        base.decode_entities = Some(value);
    }
    base
}

fn merge_keybindings(base: Keybindings, overlay: Keybindings) -> Keybindings {
    Keybindings {
        up: choose_keybinding(base.up, overlay.up, Keybindings::default_up),
        down: choose_keybinding(base.down, overlay.down, Keybindings::default_down),
        copy: choose_keybinding(base.copy, overlay.copy, Keybindings::default_copy),
        filter: choose_keybinding(base.filter, overlay.filter, Keybindings::default_filter),
    }
}

fn choose_keybinding(base: String, overlay: String, default_fn: fn() -> String) -> String {
    if overlay != default_fn() { overlay } else { base }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("matraka/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    Ok(Some(
        workspace_root()?.join(DEFAULT_WORKSPACE_CONFIG_PATH),
    ))
}

/// Directory the library and workspace config live under: the nearest
/// ancestor carrying a `.matraka/` or `.git/` entry, else the working
/// directory itself.
pub fn workspace_root() -> Result<PathBuf> {
    let cwd = env::current_dir().context("unable to determine working directory")?;
    Ok(find_workspace_root(&cwd).unwrap_or(cwd))
}

fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".matraka").exists() || current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(category) = env.category {
        config.defaults.category = category;
    }
    if let Some(strip_replay) = env.strip_replay {
        config.copy.strip_replay = Some(strip_replay);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.defaults.category, "all");
        assert!(config.defaults.show_private);
        assert!(!config.copy.strip_replay());
        assert!(config.copy.decode_entities());
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[defaults]
category = "ai"
[copy]
decode_entities = false
"#,
        )?;

        let workspace_dir = temp.path().join("repo");
        fs::create_dir_all(workspace_dir.join(".matraka"))?;
        fs::write(
            workspace_dir.join(".matraka/config.toml"),
            r#"
[defaults]
show_private = false
[copy]
strip_replay = true
"#,
        )?;

        let config = Config::load_with_layers(
            Some(global),
            Some(workspace_dir.join(".matraka/config.toml")),
            EnvOverrides::default(),
        )?;

        assert_eq!(config.defaults.category, "ai");
        assert!(!config.defaults.show_private);
        assert!(config.copy.strip_replay());
        assert!(!config.copy.decode_entities());

        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("code", true);
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.defaults.category, "code");
        assert!(config.copy.strip_replay());
        Ok(())
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        assert!(Config::from_file(&file).is_err());
        Ok(())
    }
}
