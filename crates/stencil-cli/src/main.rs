// stencil CLI entry point

use anyhow::Context;
use clap::Parser;
use stencil_cli::{engine_from_config, init_logging, Cli, CommandRouter};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let engine = engine_from_config(cli.config.as_deref()).context("failed to load engine configuration")?;

    match CommandRouter::route(&cli.command, &engine) {
        Ok(output) => {
            print!("{}", output);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.user_message());
            std::process::exit(1);
        }
    }
}
