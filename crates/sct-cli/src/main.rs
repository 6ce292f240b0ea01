//! SCT CLI entry point

use clap::Parser;
use sct_cli::{Cli, CliOverrides, Config, ExitCode, OutputFormat, OutputFormatter};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Parse CLI arguments; usage errors exit with INVALID_INPUT
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = ExitCode::from_clap_error(&e);
            if code == ExitCode::Success {
                e.exit();
            }
            let _ = e.print();
            return code.to_exit_code();
        }
    };

    // Create default config on first run
    if let Err(e) = Config::create_default_if_missing() {
        eprintln!("Warning: Could not create default config: {e}");
    }

    // Config errors are fatal; [kdf] must match the stored envelope
    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let formatter = OutputFormatter::new(cli.output.unwrap_or_default(), false);
            let error = anyhow::Error::from(e).context("failed to load configuration");
            return report(&formatter, &error);
        }
    };

    let overrides = CliOverrides {
        output_format: cli.output.map(|format| format.to_string()),
        verbose: if cli.verbose { Some(true) } else { None },
        debug: if cli.debug { Some(true) } else { None },
        data_dir: cli.data_dir.clone(),
    };
    let config = config.with_overrides(&overrides);

    // Initialize logging based on config (with CLI override)
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let formatter = OutputFormatter::new(
        config.output.format.parse().unwrap_or(OutputFormat::Table),
        config.output.verbose,
    );

    // Execute command with resolved config
    match cli.execute_with_config(config).await {
        Ok(code) => code.to_exit_code(),
        Err(e) => report(&formatter, &e),
    }
}

/// Print a failure in the selected format and pick its exit code.
fn report(formatter: &OutputFormatter, error: &anyhow::Error) -> std::process::ExitCode {
    let code = ExitCode::from_error(error);
    let message = format!("{error:#}");
    match formatter.format() {
        OutputFormat::Json => println!("{}", formatter.format_error_with_code(&message, code)),
        OutputFormat::Table => eprintln!("{}", formatter.format_error_with_code(&message, code)),
        OutputFormat::Quiet => {}
    }
    code.to_exit_code()
}
