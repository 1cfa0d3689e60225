// hashledger CLI

use hashledger::{Cli, CliHandler};
use clap::Parser;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let config = match cli.ledger_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let mut handler = match CliHandler::new(&config) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error initializing: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = handler.handle(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
