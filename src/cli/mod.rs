pub mod check;
pub mod completions;
pub mod get;
pub mod ids;
pub mod init;
pub mod tree;
pub mod watch;

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::discovery::{discover, DiscoveryResult};
use crate::error::Result;
use crate::loader::{load, Loaded, Package};
use crate::output::{display_path, plural, Printer};

/// moddef - Load mod-style data definitions into a typed tree
#[derive(Parser, Debug)]
#[command(name = "moddef")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a project and report problems
    Check(check::CheckArgs),

    /// Print the loaded tree in definition syntax
    Tree(tree::TreeArgs),

    /// Print a property's values and their typed readings
    Get(get::GetArgs),

    /// Assign registry ids and persist them
    Ids(ids::IdsArgs),

    /// Reload on file changes and report registry rebuilds
    Watch(watch::WatchArgs),

    /// Initialize a moddef project (generates moddef.yaml)
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// A discovered project and its loaded content.
pub(crate) struct Project {
    pub discovery: DiscoveryResult,
    pub loaded: Loaded,
}

/// Discover the project at `path` and read its packages.
pub(crate) fn read_project(path: &Path, printer: &Printer) -> Result<(DiscoveryResult, Vec<Package>)> {
    printer.status("Scanning", &printer.cyan(&display_path(path)));
    let discovery = discover(path)?;
    let packages = discovery.read_packages()?;
    for package in &packages {
        printer.status(
            "Loading",
            &format!("{} ({})", package.name, plural(package.files.len(), "file", "files")),
        );
    }
    Ok((discovery, packages))
}

/// Discover and load the project at `path`.
pub(crate) fn load_project(path: &Path, printer: &Printer) -> Result<Project> {
    let (discovery, packages) = read_project(path, printer)?;
    let loaded = load(&packages)?;
    Ok(Project { discovery, loaded })
}
