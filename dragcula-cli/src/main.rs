//! `Dragcula` CLI - drives the drag-and-drop ordering engine from a terminal
//!
//! Tabs, notebooks and notes live in a JSON workspace file. Move commands run
//! a simulated drag gesture through the coordinator, so the same zone
//! resolution, pin policy and order persistence apply as in the app.

mod cli;
mod commands;
mod error;
mod gesture;
mod util;
mod workspace;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let settings = match util::load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e}");
            }
            std::process::exit(e.exit_code());
        }
    };
    util::init_logging(&settings.logging, cli.verbose, cli.quiet);

    let context = util::Context::new(cli.config.as_deref(), cli.workspace.as_deref(), settings);
    let result = commands::dispatch(&context, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
