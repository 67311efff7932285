mod classifier;
mod cli;
mod error;
mod export;
mod fmt;
mod importer;
mod ledger;
mod models;
mod normalize;
mod reports;
mod settings;
mod workbook;

use clap::Parser;

use cli::{Cli, Commands, ConfigCommands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Summary { load } => cli::summary::run(&load),
        Commands::List {
            load,
            segment,
            json,
        } => cli::list::run(&load, &segment, json),
        Commands::Filters { load } => cli::filters::run(&load),
        Commands::Export { load, output } => cli::export::run(&load, output.as_deref()),
        Commands::Config { command } => match command {
            ConfigCommands::Show => cli::config::show(),
            ConfigCommands::Set {
                salary,
                months,
                export_dir,
            } => cli::config::set(salary, months, export_dir),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
