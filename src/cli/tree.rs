//! Tree command implementation.
//!
//! Prints loaded content in definition syntax to stdout.

use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::output::{plural, Printer};
use crate::tree::ContentTree;

/// Print the loaded tree in definition syntax
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Project directory (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Only print top-level definitions of this category
    #[arg(long, short)]
    pub category: Option<String>,
}

pub fn run(args: TreeArgs, printer: &Printer) -> Result<()> {
    let project = super::load_project(&args.path, printer)?;
    let tree = &project.loaded.tree;

    match &args.category {
        Some(category) => {
            let dump = dump_category(tree, category);
            print!("{}", dump.text);
            printer.info(
                "Listed",
                &format!("{} in '{}'", plural(dump.count, "definition", "definitions"), category),
            );
        }
        None => print!("{}", tree),
    }

    Ok(())
}

struct CategoryDump {
    text: String,
    count: usize,
}

fn dump_category(tree: &ContentTree, category: &str) -> CategoryDump {
    let mut text = String::new();
    let mut count = 0;
    for node in tree.all_of(category) {
        text.push_str(&tree.dump(node));
        count += 1;
    }
    CategoryDump { text, count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    #[test]
    fn test_dump_category() {
        let mut tree = ContentTree::new();
        parse_source(&mut tree, "unit:a{hp=1;}item:b{w=2;}unit:c{hp=3;}").unwrap();

        let dump = dump_category(&tree, "unit");
        assert_eq!(dump.count, 2);
        assert_eq!(dump.text, "unit:a {\n    hp = 1;\n}\nunit:c {\n    hp = 3;\n}\n");
        assert_eq!(dump_category(&tree, "spell").count, 0);
    }
}
