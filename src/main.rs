use clap::Parser;
use stagesync::cli::commands::Cli;
use stagesync::cli::handlers;
use stagesync::cli::logging;

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
