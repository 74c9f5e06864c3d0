use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use mailvet::Engine;

mod args;
mod batch;
mod output;

use args::{Cli, Commands, validate_options};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // logs sur stderr pour ne pas polluer la sortie json/ndjson/csv
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let engine = Engine::new(cli.engine_config()).context("initialise validation engine")?;

    let any_invalid = match &cli.cmd {
        Commands::Validate {
            email,
            smtp,
            tier,
            no_advanced,
            format,
        } => {
            let options = validate_options(*smtp, *tier, *no_advanced);
            let result = engine.validate(email, &options)?;
            output::write_result(&result, format)?;
            !result.valid
        }
        Commands::Batch {
            file,
            stdin: _,
            smtp,
            workers: _,
            no_advanced,
            format,
        } => {
            let emails = batch::read_emails(file.as_deref())?;
            let options = validate_options(*smtp, None, *no_advanced);
            let summary = batch::run(&engine, emails, options, format)?;
            summary.invalid > 0
        }
    };

    // codes de sortie : 0 OK, 2 invalids, 1 fatal
    if any_invalid {
        std::process::exit(2);
    }
    Ok(())
}
