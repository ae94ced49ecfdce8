//! ORMDB Admin Command-Line Client

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ormadmin_cli::{run, Args};

fn main() {
    // Initialize tracing; logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ormadmin=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
