use anyhow::Result;
use clap::Parser;
use remod::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    if cli.print_config {
        print!("{}", remod::infra::config::default_toml()?);
        return Ok(());
    }

    // Build a context once, pass everywhere
    let ctx = cli.context();
    remod::core::rename::run(cli, &ctx)
}
