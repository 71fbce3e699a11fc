use std::process;
use clap::Parser;

use ai_news_cache::cli::Cli;
use ai_news_cache::Error;

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to read .env: {}", e);
        }
    }

    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        eprintln!("Error: {}", e);
        process::exit(exit_code(&e));
    }
}

fn exit_code(err: &Error) -> i32 {
    if err.is_user_error() {
        2
    } else {
        1
    }
}
