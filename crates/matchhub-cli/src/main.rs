//! MatchHub command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Sign up, then confirm with the emailed code
//! matchhub register me@college.edu --password hunter2
//! matchhub verify me@college.edu 123456
//!
//! # Browse and chat
//! matchhub discover
//! matchhub match <user-uuid> --mode friend
//! matchhub rooms
//! matchhub chat <room-id>
//! ```

use clap::Parser;
use matchhub_cli::{Args, Context};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let context = Context::from_args(&args)?;
    tracing::debug!(api = %context.config.api_url, "matchhub starting");

    let mut stdout = std::io::stdout();
    matchhub_cli::run(args.command, &context, &mut stdout).await?;

    Ok(())
}
