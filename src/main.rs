mod browser;
mod cli;
mod committer;
mod db;
mod decoder;
mod demo;
mod error;
mod fmt;
mod importer;
mod listing;
mod mapper;
mod models;
mod preview;
mod reports;
mod settings;
mod store;
mod template;
mod tui;
mod validator;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

/// Log to stderr, filtered by RUST_LOG (default: warnings only).
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import {
            file,
            yes,
            allow_duplicate,
        } => cli::import::run(&file, yes, allow_duplicate),
        Commands::Students {
            search,
            grade,
            section,
            grade_level,
            status,
            sort,
            desc,
            page,
        } => cli::students::run(cli::students::StudentsArgs {
            search,
            grade,
            section,
            grade_level,
            status,
            sort,
            desc,
            page,
        }),
        Commands::Browse => cli::browse::run(),
        Commands::Report { kind, demo } => cli::report::run(kind, demo),
        Commands::Template { output, extended } => cli::template::run(output, extended),
        Commands::Demo { count, seed } => cli::demo::run(count, seed),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
