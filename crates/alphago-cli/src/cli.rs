use std::path::PathBuf;

use alphago_core::OrderStatus;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "alphago")]
#[command(about = "Queue delivery orders offline and sync them when the network returns")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name holding the order service configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue a new order
    #[command(alias = "new")]
    Create(CreateArgs),
    /// Queue changes to an existing order
    Update(UpdateArgs),
    /// Queue an order deletion
    Delete {
        /// Order ID (server or temporary)
        id: String,
    },
    /// List cached orders
    List {
        /// Number of orders to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show queued actions waiting for the order service
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay queued actions against the order service
    Sync {
        /// Output the drain report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the cached orders with the order service's list
    Refresh,
    /// Show sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// List abandoned actions and clear the failed indicator
        #[arg(long)]
        acknowledge: bool,
    },
    /// Forget queued actions and cached orders for the profile
    Clear {
        /// Skip the pending-actions safety check
        #[arg(long)]
        force: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    /// Customer name
    #[arg(long, value_name = "NAME")]
    pub customer: String,
    /// Customer phone number
    #[arg(long, value_name = "PHONE")]
    pub phone: String,
    /// Delivery zone code
    #[arg(long, value_name = "CODE")]
    pub zone_code: String,
    /// Delivery zone display name
    #[arg(long, value_name = "NAME")]
    pub zone_name: String,
    /// Latitude of the drop-off point
    #[arg(long, allow_negative_numbers = true, default_value = "0")]
    pub lat: f64,
    /// Longitude of the drop-off point
    #[arg(long, allow_negative_numbers = true, default_value = "0")]
    pub lng: f64,
    /// Price in Tunisian dinars
    #[arg(long, value_name = "TND")]
    pub price: f64,
    /// Line item (repeatable)
    #[arg(long = "item", value_name = "ITEM")]
    pub items: Vec<String>,
    /// Free-text note for the driver
    #[arg(long)]
    pub note: Option<String>,
    /// Creator id (defaults to the profile session)
    #[arg(long, value_name = "USER")]
    pub created_by: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct UpdateArgs {
    /// Order ID (server or temporary)
    pub id: String,
    #[arg(long, value_name = "NAME")]
    pub customer: Option<String>,
    #[arg(long, value_name = "PHONE")]
    pub phone: Option<String>,
    #[arg(long, value_name = "CODE")]
    pub zone_code: Option<String>,
    #[arg(long, value_name = "NAME")]
    pub zone_name: Option<String>,
    #[arg(long, value_name = "TND")]
    pub price: Option<f64>,
    /// New status: pending, in_progress, done, cancelled
    #[arg(long)]
    pub status: Option<OrderStatus>,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Order service base URL (e.g. <https://api.example.com/v1>)
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Bearer token for the order service
        #[arg(long, value_name = "TOKEN")]
        api_token: Option<String>,
        /// URL probed to decide whether the device is online
        #[arg(long, value_name = "URL")]
        health_url: Option<String>,
        /// Logged-in user; scopes the local queue per user
        #[arg(long, value_name = "USER")]
        session: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile
    Show,
}
