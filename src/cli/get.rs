//! Get command implementation.
//!
//! Looks up one property by dotted path and prints each value with its
//! integer, float and colour readings.

use std::fmt::Display;
use std::path::PathBuf;

use clap::Args;

use crate::error::{DefError, Result};
use crate::output::Printer;
use crate::tree::{Property, ValueState};

/// Print a property's values and their typed readings
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted path from the document root, e.g. `unit:soldier.stats.hp`
    pub path: String,

    /// Project directory (default: current directory)
    #[arg(long, short, default_value = ".")]
    pub project: PathBuf,
}

pub fn run(args: GetArgs, printer: &Printer) -> Result<()> {
    let project = super::load_project(&args.project, printer)?;

    let property = project
        .loaded
        .tree
        .property(&args.path)
        .ok_or_else(|| DefError::NotFound {
            path: args.path.clone(),
        })?;

    for line in describe(property) {
        println!("{}", line);
    }
    Ok(())
}

fn reading<T: Display>(state: Option<ValueState<T>>) -> String {
    match state {
        Some(ValueState::Parsed(v)) => v.to_string(),
        Some(ValueState::NotComputed) => "?".to_string(),
        Some(ValueState::Unparseable) | None => "-".to_string(),
    }
}

/// One header line, then one line per value.
fn describe(property: &Property) -> Vec<String> {
    let mut lines = vec![property.to_string()];
    for (index, value) in property.values().iter().enumerate() {
        lines.push(format!(
            "  [{}] {:?} int={} float={} colour={}",
            index,
            value,
            reading(property.int_at(index)),
            reading(property.float_at(index)),
            reading(property.colour_at(index)),
        ));
    }
    lines
}
