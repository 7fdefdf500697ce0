use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::process;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the built-in double-well ensemble under replica exchange.
    Run(cmd::run::RunArgs),
    /// Print the temperature ladder a configuration resolves to.
    Ladder(cmd::ladder::LadderArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚀 replex {}", env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Commands::Run(args) => match matches.subcommand_matches("run") {
            Some(sub) => cmd::run::run(args, sub),
            None => Ok(()),
        },
        Commands::Ladder(args) => cmd::ladder::run(args),
    };

    if let Err(e) = result {
        error!("❌ {}", e);
        process::exit(1);
    }
}
