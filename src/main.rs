use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use jkskit::config::{Config, DEFAULT_CONFIG_PATH};
use jkskit::pipeline;

#[derive(Parser, Debug)]
#[command(name = "jkskit")]
#[command(about = "Issue a self-signed signing certificate into a JKS keystore", version)]
struct Cli {
    /// JSON configuration; built-in defaults are used if it cannot be loaded
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print and save `********` instead of the keystore passwords
    #[arg(long)]
    redact_passwords: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config);

    let output = pipeline::run(&config, cli.redact_passwords)
        .context("Failed to generate signing certificate")?;

    print!("{}", output.report.display(cli.redact_passwords));
    Ok(())
}
