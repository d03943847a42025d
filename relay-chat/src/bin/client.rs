use anyhow::Result;
use clap::Parser;

use relay_chat::{cli::ClientArgs, client, logging::init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout belongs to the chat console.
    init_tracing(std::io::stderr);

    let args = ClientArgs::parse();
    client::run(args).await
}
