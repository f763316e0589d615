use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use matraka::app::chat::format_as_chat;
use matraka::app::copy::{Copier, CopyOptions, CopyPlan, complete_bindings, finalize, plan_copy};
use matraka::app::library::{MacroDraft, MacroLibrary, MacroPatch};
use matraka::app::tags::tokenize;
use matraka::app::variables::extract_variables;
use matraka::domain::model::{MacroCategory, Visibility};
use matraka::infra::config::{self, Config};
use matraka::ui::app::UiApp;

#[derive(Parser)]
#[command(name = "matraka", version, about = "Macro manager with chat-style previews")]
struct Cli {
    /// Directory holding the macro library (defaults to the workspace root).
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a macro from a flag, a file, or stdin
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, value_enum, default_value_t = MacroCategory::Text)]
        category: MacroCategory,
        #[arg(long)]
        shortcut: Option<String>,
        #[arg(long)]
        public: bool,
        /// Macro body. Mutually exclusive with --file; stdin is read when
        /// neither is given.
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List macros, optionally filtered
    List {
        #[arg(long, value_enum)]
        category: Option<MacroCategory>,
        #[arg(long)]
        query: Option<String>,
    },
    /// Render a macro as its chat preview
    Show { id: u64 },
    /// Print the input variables of a macro
    Vars { id: u64 },
    /// Copy a macro to the clipboard
    Copy {
        id: u64,
        /// Bind an input variable, NAME=VALUE. Repeatable.
        #[arg(long = "set", value_parser = parse_binding)]
        bindings: Vec<(String, String)>,
        #[arg(long)]
        strip_replay: bool,
        /// Print the payload instead of touching the clipboard.
        #[arg(long)]
        stdout: bool,
    },
    /// Update fields of an existing macro
    Edit {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, conflicts_with = "clear_shortcut")]
        shortcut: Option<String>,
        #[arg(long)]
        clear_shortcut: bool,
        #[arg(long, value_enum)]
        category: Option<MacroCategory>,
        #[arg(long, conflicts_with = "private")]
        public: bool,
        #[arg(long)]
        private: bool,
    },
    /// Duplicate a macro as a private copy
    Clone { id: u64 },
    /// Delete a macro
    Rm { id: u64 },
    /// Generate shell completions
    Completions { shell: Shell },
    /// Launch the interactive browser (the default)
    Ui,
}

fn main() -> Result<()> {
    matraka::init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let root = match cli.library {
        Some(path) => path,
        None => config::workspace_root()?,
    };

    match cli.command.unwrap_or(Commands::Ui) {
        Commands::Add {
            title,
            category,
            shortcut,
            public,
            text,
            file,
        } => add(&root, title, category, shortcut, public, text, file),
        Commands::List { category, query } => list(&root, &config, category, query),
        Commands::Show { id } => show(&root, id),
        Commands::Vars { id } => vars(&root, id),
        Commands::Copy {
            id,
            bindings,
            strip_replay,
            stdout,
        } => copy(&root, &config, id, bindings, strip_replay, stdout),
        Commands::Edit {
            id,
            title,
            text,
            shortcut,
            clear_shortcut,
            category,
            public,
            private,
        } => edit(
            &root,
            id,
            MacroPatch {
                title,
                raw_text: text,
                shortcut: if clear_shortcut {
                    Some(None)
                } else {
                    shortcut.map(Some)
                },
                category,
                visibility: match (public, private) {
                    (true, _) => Some(Visibility::Public),
                    (_, true) => Some(Visibility::Private),
                    _ => None,
                },
            },
        ),
        Commands::Clone { id } => clone(&root, id),
        Commands::Rm { id } => rm(&root, id),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "matraka", &mut std::io::stdout());
            Ok(())
        }
        Commands::Ui => UiApp::new(config, root)?.run(),
    }
}

fn add(
    root: &Path,
    title: String,
    category: MacroCategory,
    shortcut: Option<String>,
    public: bool,
    text: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let raw_text = match (text, file) {
        (Some(text), None) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read macro body from {}", path.display()))?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read macro body from stdin")?;
            buffer
        }
        (Some(_), Some(_)) => unreachable!("clap rejects --text with --file"),
    };

    let mut library = MacroLibrary::open(root)?;
    let entry = library.add(MacroDraft {
        title,
        raw_text,
        shortcut,
        category,
        visibility: if public {
            Visibility::Public
        } else {
            Visibility::Private
        },
    });
    library.save()?;
    println!("added macro {} ({})", entry.id, entry.title);
    Ok(())
}

fn list(
    root: &Path,
    config: &Config,
    category: Option<MacroCategory>,
    query: Option<String>,
) -> Result<()> {
    let library = MacroLibrary::open(root)?;
    let entries = library.filter(
        category,
        query.as_deref().unwrap_or(""),
        config.defaults.show_private,
    );
    if entries.is_empty() {
        println!("no macros");
        return Ok(());
    }
    for entry in entries {
        let shortcut = entry
            .shortcut
            .as_deref()
            .map(|shortcut| format!(" ·{shortcut}"))
            .unwrap_or_default();
        let marker = if entry.is_public() { " ◆" } else { "" };
        println!(
            "{:>4}  [{}] {}{}{}",
            entry.id,
            entry.category.label(),
            entry.title,
            shortcut,
            marker
        );
    }
    Ok(())
}

fn show(root: &Path, id: u64) -> Result<()> {
    let library = MacroLibrary::open(root)?;
    let entry = library.require(id)?;
    let bubbles = format_as_chat(&tokenize(&entry.raw_text));
    for (index, bubble) in bubbles.iter().enumerate() {
        if index > 0 {
            println!();
        }
        println!("message {}", index + 1);
        for line in bubble.plain_text().lines() {
            println!("  {line}");
        }
    }
    Ok(())
}

fn vars(root: &Path, id: u64) -> Result<()> {
    let library = MacroLibrary::open(root)?;
    let entry = library.require(id)?;
    for name in extract_variables(&entry.raw_text) {
        println!("{name}");
    }
    Ok(())
}

fn copy(
    root: &Path,
    config: &Config,
    id: u64,
    bindings: Vec<(String, String)>,
    strip_replay: bool,
    stdout: bool,
) -> Result<()> {
    let library = MacroLibrary::open(root)?;
    let entry = library.require(id)?;

    let mut options = CopyOptions::from_config(config);
    options.strip_replay = options.strip_replay || strip_replay;

    let payload = match plan_copy(&entry.raw_text, &options) {
        CopyPlan::Direct(payload) => payload,
        CopyPlan::AwaitInput(names) => {
            let bound = complete_bindings(&names, bindings);
            finalize(&entry.raw_text, &bound, &options)
        }
    };

    if stdout {
        print!("{payload}");
        return Ok(());
    }

    Copier::new().copy_payload(&payload)?;
    println!("copied macro {} to clipboard", entry.id);
    Ok(())
}

fn edit(root: &Path, id: u64, patch: MacroPatch) -> Result<()> {
    let mut library = MacroLibrary::open(root)?;
    let entry = library.update(id, patch)?;
    library.save()?;
    println!("updated macro {} ({})", entry.id, entry.title);
    Ok(())
}

fn clone(root: &Path, id: u64) -> Result<()> {
    let mut library = MacroLibrary::open(root)?;
    let copy = library.clone_macro(id)?;
    library.save()?;
    println!("cloned macro {} into {} ({})", id, copy.id, copy.title);
    Ok(())
}

fn rm(root: &Path, id: u64) -> Result<()> {
    let mut library = MacroLibrary::open(root)?;
    if !library.remove(id) {
        bail!("no macro with id {id}");
    }
    library.save()?;
    println!("removed macro {id}");
    Ok(())
}

fn parse_binding(value: &str) -> Result<(String, String), String> {
    let (name, bound) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("variable name must not be empty".to_owned());
    }
    Ok((name.to_owned(), bound.to_owned()))
}
