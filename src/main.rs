use clap::Parser;
use miette::Result;
use moddef::cli::{Cli, Commands};
use moddef::output::Printer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let printer = Printer::new();

    match cli.command {
        Commands::Check(args) => moddef::cli::check::run(args, &printer)?,
        Commands::Tree(args) => moddef::cli::tree::run(args, &printer)?,
        Commands::Get(args) => moddef::cli::get::run(args, &printer)?,
        Commands::Ids(args) => moddef::cli::ids::run(args, &printer)?,
        Commands::Watch(args) => moddef::cli::watch::run(args, &printer)?,
        Commands::Init(args) => moddef::cli::init::run(args, &printer)?,
        Commands::Completions(args) => moddef::cli::completions::run(args)?,
    }

    Ok(())
}
