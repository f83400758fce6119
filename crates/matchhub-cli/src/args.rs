//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use matchhub_client::{
    config::{ENV_API_URL, ENV_WS_URL},
    models::{MatchMode, PaymentMethod},
};

/// Default token file, relative to the working directory.
pub const DEFAULT_TOKEN_FILE: &str = ".matchhub/tokens.json";

/// MatchHub command-line client
#[derive(Parser, Debug)]
#[command(name = "matchhub")]
#[command(about = "Anonymous campus matchmaking from the terminal")]
#[command(version)]
pub struct Args {
    /// API base URL
    #[arg(long, env = ENV_API_URL)]
    pub api_url: Option<String>,

    /// WebSocket base URL (derived from the API URL when unset)
    #[arg(long, env = ENV_WS_URL)]
    pub ws_url: Option<String>,

    /// Where login tokens are kept
    #[arg(long, env = "MATCHHUB_TOKEN_FILE", default_value = DEFAULT_TOKEN_FILE)]
    pub token_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create an account; a one-time code is emailed
    Register {
        /// College email address
        email: String,
        /// Account password
        #[arg(long, env = "MATCHHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Confirm the emailed code and log in
    Verify {
        /// Email the code was sent to
        email: String,
        /// One-time code
        otp: String,
    },

    /// Email a new code
    Resend {
        /// Email to send it to
        email: String,
    },

    /// Forget the saved login
    Logout,

    /// Show the own profile
    Profile,

    /// List chat rooms
    Rooms,

    /// Print a room's message history
    History {
        /// Room id
        room_id: String,
        /// Page, 1 is the newest
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show the discover feed
    Discover,

    /// Ask to match with a user
    Match {
        /// User id from the discover feed
        target_user_id: String,
        /// friend or hookup
        #[arg(long, default_value = "friend")]
        mode: MatchMode,
    },

    /// Pay to unlock a chat room
    Pay {
        /// Room to unlock
        room_id: String,
        /// upi or card
        #[arg(long, default_value = "upi")]
        method: PaymentMethod,
    },

    /// Upload an image or voice note and print its URL
    Upload {
        /// File to upload
        path: PathBuf,
    },

    /// Chat in a room interactively
    Chat {
        /// Room id
        room_id: String,
    },
}
