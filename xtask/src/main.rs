use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Build a release binary and stage it under dist/
    Dist,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Dist => run_dist()?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_dist() -> Result<()> {
    let status = Command::new("cargo")
        .args(["build", "--release", "-p", "matraka"])
        .status()?;
    if !status.success() {
        anyhow::bail!("cargo build --release failed");
    }

    let binary = if cfg!(windows) {
        "matraka.exe"
    } else {
        "matraka"
    };
    let source = Path::new("target/release").join(binary);
    fs::create_dir_all("dist")?;
    fs::copy(&source, Path::new("dist").join(binary))?;
    println!("staged dist/{binary}");
    Ok(())
}
