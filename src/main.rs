use anyhow::Result;
use clap::Parser;
use dialang::cli::Cli;
use dialang::core::finish_with_exit;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.no_color);

    // Build a context once, pass everywhere
    let ctx = cli.context();

    let result: Result<()> = if cli.print_config {
        print_config(&cli)
    } else {
        dialang::grammar_run(&cli, &ctx)
    };
    finish_with_exit(result)
}

/// Logs go to stderr; RUST_LOG wins over -v
fn init_tracing(verbose: u8, no_color: bool) {
    let default = match verbose {
        0 => "warn",
        1 => "dialang=debug",
        _ => "dialang=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .with_target(false)
        .init();
}

fn print_config(cli: &Cli) -> Result<()> {
    let config = dialang::load_config()?.overlay(cli);
    print!("{}", config.to_toml()?);
    Ok(())
}
