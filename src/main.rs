use std::{error::Error, process};

use bridge_scanner::cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    if cli::start().await.is_err() {
        process::exit(1);
    }

    Ok(())
}
