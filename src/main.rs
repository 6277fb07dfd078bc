mod cli;
mod commands;
mod config;
mod dates;
mod model;
mod session;
mod snapshot;
mod storage;
mod ui;
mod view;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = config::load_config()?;
    init_tracing(config.log.as_deref());

    let store = args.store.or(config.store_dir);
    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Init => commands::init(),
        cli::Command::Show { after } => commands::show(store, after),
        cli::Command::Dump => commands::dump(store),
        cli::Command::Clear => commands::clear(store),
        cli::Command::Group(cmd) => commands::group(store, cmd),
        cli::Command::List(cmd) => commands::list(store, cmd),
        cli::Command::Task(cmd) => commands::task(store, cmd),
        cli::Command::Tui => commands::tui(store),
    }
}

// RUST_LOG wins over the config file; logging stays off otherwise.
fn init_tracing(configured: Option<&str>) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .as_deref()
        .or(configured)
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
