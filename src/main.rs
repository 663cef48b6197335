//! # Vault kit
//!
//! Views MetaMorpho vault positions and bundles deposits and withdrawals.
use clap::Parser;
use vault_kit::cli::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(err) = args.run().await {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
