//! Ids command implementation.
//!
//! Rebuilds one registry per requested category, seeded from the persisted
//! id file, prints the resulting tables to stdout and writes them back.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::output::{display_path, Printer};
use crate::registry::{rebuild_all, DefinitionRegistry, IdFile, Rebuild, Record, SlotPolicy};
use crate::validation::check_vacancies;

/// Assign registry ids and persist them
#[derive(Args, Debug)]
pub struct IdsArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Category to build a registry for (repeatable)
    #[arg(long = "category", short, required = true)]
    pub categories: Vec<String>,

    /// Id file to read and write (default: ids_file from moddef.yaml)
    #[arg(long)]
    pub ids_file: Option<PathBuf>,

    /// Print the id tables without writing them
    #[arg(long)]
    pub dry_run: bool,
}

/// One `Record` registry per category, seeded from `ids`.
pub(crate) fn seeded_registries(
    categories: &[String],
    ids: &IdFile,
    policy: SlotPolicy,
) -> Vec<DefinitionRegistry<Record>> {
    categories
        .iter()
        .map(|category| {
            let registry = DefinitionRegistry::new(category.clone()).with_policy(policy);
            match ids.get(category) {
                Some(table) => registry.with_ids(table.clone()),
                None => registry,
            }
        })
        .collect()
}

/// Record every registry's current table in `ids`.
pub(crate) fn snapshot_into(ids: &mut IdFile, registries: &[DefinitionRegistry<Record>]) {
    for registry in registries {
        ids.insert(registry.category(), registry.snapshot());
    }
}

pub fn run(args: IdsArgs, printer: &Printer) -> Result<()> {
    let project = super::load_project(&args.path, printer)?;
    let ids_path = args.ids_file.clone().or_else(|| project.discovery.ids_path());

    let mut ids = match &ids_path {
        Some(path) => IdFile::load(path)?,
        None => IdFile::default(),
    };

    let mut registries =
        seeded_registries(&args.categories, &ids, project.discovery.manifest.slot_policy);
    let reports = {
        let mut targets: Vec<&mut dyn Rebuild> =
            registries.iter_mut().map(|r| r as &mut dyn Rebuild).collect();
        rebuild_all(&project.loaded.tree, &mut targets)?
    };

    for report in &reports {
        printer.info("Rebuilt", &report.to_string());
    }
    for diagnostic in check_vacancies(&reports).iter() {
        printer.diagnostic(diagnostic);
    }

    for registry in &registries {
        for (id, name) in registry.snapshot().iter() {
            println!("{}\t{}\t{}", registry.category(), id, name);
        }
    }
    snapshot_into(&mut ids, &registries);

    if args.dry_run {
        printer.info("Skipped", "writing ids (dry run)");
        return Ok(());
    }
    match ids_path {
        Some(path) => {
            ids.save(&path)?;
            printer.status("Wrote", &printer.cyan(&display_path(&path)));
        }
        None => printer.warning(
            "Skipped",
            "writing ids: set ids_file in moddef.yaml or pass --ids-file",
        ),
    }
    Ok(())
}
