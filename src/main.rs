use clap::Parser;
use vault2notion::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = vault2notion::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = cli::commands::sync(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
