use clap::Parser;
use murk_cli::commands::{Cmd, Command};

/// Murk CLI
///
/// Murk is a Lua source obfuscator. It encrypts literals, renames identifiers,
/// routes globals through a lookup table, flattens the program into a
/// dispatch loop and wraps the result in reversible encoding layers.
#[derive(Parser)]
#[command(name = "murk")]
#[command(about = "Murk: Lua source obfuscator")]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

/// Runs the Murk CLI with the provided arguments.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
