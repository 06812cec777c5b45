//! Watch command implementation.
//!
//! Loads the project once, then reloads it whenever a watched file changes.
//! Registries live for the whole session so ids stay stable across reloads.
//! A reload that fails leaves the previous tree and registries in place.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use clap::Args;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::error::{DefError, Result};
use crate::loader::Package;
use crate::output::{display_path, plural, Printer};
use crate::registry::{DefinitionRegistry, IdFile, Rebuild, Record};
use crate::tree::ContentStore;
use crate::validation::check_vacancies;

use super::ids::{seeded_registries, snapshot_into};

/// Events arriving within this window of each other trigger one reload.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Reload on file changes and report registry rebuilds
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Category to keep a registry for (repeatable)
    #[arg(long = "category", short)]
    pub categories: Vec<String>,
}

/// Long-lived state of a watch session.
struct Session {
    handle: String,
    store: ContentStore,
    registries: Vec<DefinitionRegistry<Record>>,
    ids: IdFile,
    ids_path: Option<PathBuf>,
}

impl Session {
    /// Reload `packages`, print what changed and persist ids. Returns
    /// whether the reload was published.
    fn reload(&mut self, packages: &[Package], printer: &Printer) -> bool {
        let result = {
            let mut targets: Vec<&mut dyn Rebuild> =
                self.registries.iter_mut().map(|r| r as &mut dyn Rebuild).collect();
            self.store.reload(&self.handle, packages, &mut targets)
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                printer.error("Failed", &e.to_string());
                printer.warning("Keeping", "previous content");
                return false;
            }
        };

        printer.status(
            "Reloaded",
            &format!(
                "{}, {}",
                plural(report.stats.packages, "package", "packages"),
                plural(report.stats.files, "file", "files")
            ),
        );
        for rebuild in &report.registries {
            printer.info("Rebuilt", &rebuild.to_string());
        }
        for diagnostic in report.diagnostics.iter() {
            printer.diagnostic(diagnostic);
        }
        for diagnostic in check_vacancies(&report.registries).iter() {
            printer.diagnostic(diagnostic);
        }

        if let Some(path) = &self.ids_path {
            snapshot_into(&mut self.ids, &self.registries);
            if let Err(e) = self.ids.save(path) {
                printer.error("Failed", &e.to_string());
            }
        }
        true
    }
}

fn watch_error(path: &Path, err: notify::Error) -> DefError {
    DefError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to watch: {}", err),
    }
}

fn is_change(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(event) => matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ),
        Err(_) => false,
    }
}

pub fn run(args: WatchArgs, printer: &Printer) -> Result<()> {
    let (discovery, packages) = super::read_project(&args.path, printer)?;

    let ids_path = discovery.ids_path();
    let ids = match &ids_path {
        Some(path) => IdFile::load(path)?,
        None => IdFile::default(),
    };
    let mut session = Session {
        handle: discovery.manifest.root.clone(),
        store: ContentStore::new(),
        registries: seeded_registries(&args.categories, &ids, discovery.manifest.slot_policy),
        ids,
        ids_path,
    };
    session.reload(&packages, printer);

    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = notify::recommended_watcher(tx).map_err(|e| watch_error(&args.path, e))?;
    let paths = discovery.watch_paths();
    for path in &paths {
        watcher
            .watch(path, RecursiveMode::Recursive)
            .map_err(|e| watch_error(path, e))?;
    }
    printer.info(
        "Watching",
        &format!("{} (Ctrl-C to stop)", plural(paths.len(), "path", "paths")),
    );

    while let Ok(event) = rx.recv() {
        if !is_change(&event) {
            continue;
        }
        while rx.recv_timeout(DEBOUNCE).is_ok() {}

        printer.info("Changed", &display_path(&args.path));
        match super::read_project(&args.path, printer) {
            Ok((_, packages)) => {
                session.reload(&packages, printer);
            }
            Err(e) => {
                printer.error("Failed", &e.to_string());
                printer.warning("Keeping", "previous content");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SourceFile;
    use crate::registry::DefId;
    use crate::tree::DOCUMENT_ROOT;

    fn packages(source: &str) -> Vec<Package> {
        vec![Package::new("core", vec![SourceFile::from_source("units.txt", source)])]
    }

    fn session(ids_path: Option<PathBuf>) -> Session {
        Session {
            handle: DOCUMENT_ROOT.to_string(),
            store: ContentStore::new(),
            registries: vec![DefinitionRegistry::new("unit")],
            ids: IdFile::default(),
            ids_path,
        }
    }

    #[test]
    fn test_failed_reload_keeps_previous_content() {
        let printer = Printer::plain();
        let mut session = session(None);

        assert!(session.reload(&packages("unit:a{hp=1;}unit:b{hp=2;}"), &printer));
        assert!(!session.reload(&packages("unit:a{hp=@nowhere.hp;}"), &printer));

        let root = session.store.root(DOCUMENT_ROOT).unwrap();
        assert_eq!(root.int("b.hp"), Ok(2));
        assert_eq!(session.registries[0].id_of("b"), Some(DefId(1)));
    }

    #[test]
    fn test_reload_persists_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.json");
        let printer = Printer::plain();
        let mut session = session(Some(path.clone()));

        assert!(session.reload(&packages("unit:a{hp=1;}unit:b{hp=2;}"), &printer));
        assert!(session.reload(&packages("unit:b{hp=2;}unit:c{hp=3;}"), &printer));

        let ids = IdFile::load(&path).unwrap();
        let table = ids.get("unit").unwrap();
        assert_eq!(table.id_of("c"), Some(DefId(0)));
        assert_eq!(table.id_of("b"), Some(DefId(1)));
    }
}
