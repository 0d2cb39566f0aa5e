use crate::preferences::Pace;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ttimes")]
#[command(about = "Ranks nearby MBTA departures by when you need to leave")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve commute options over HTTP
    Serve(ServeArgs),
    /// Show a live dashboard in the terminal
    Watch(WatchArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to run the HTTP server on
    #[arg(short, long, env = "SERVER_PORT", default_value = "8080")]
    pub port: u16,

    #[arg(long, env = "MBTA_API_KEY", default_value = "", hide_env_values = true)]
    pub mbta_api_key: String,

    #[arg(long, env = "ORS_API_KEY", default_value = "", hide_env_values = true)]
    pub ors_api_key: String,
}

#[derive(clap::Args)]
pub struct WatchArgs {
    /// Base URL of a running `ttimes serve`
    #[arg(long, env = "TTIMES_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    pub server_url: String,

    #[arg(long, env = "TTIMES_LAT", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    #[arg(long, env = "TTIMES_LON", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Where pinned routes and pace are kept
    #[arg(long, env = "TTIMES_PREFERENCES", default_value = "ttimes_preferences.json")]
    pub preferences: PathBuf,

    /// Keep preferences in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Change and save the walking pace; applied before the dashboard starts
    #[arg(long, value_enum)]
    pub pace: Option<Pace>,

    /// Pin or unpin a line (repeatable); applied before the dashboard starts
    #[arg(long = "toggle-pin", value_name = "LINE")]
    pub toggle_pin: Vec<String>,

    /// Show the detail panel for a line
    #[arg(long, value_name = "LINE")]
    pub detail: Option<String>,

    #[arg(long, env = "TTIMES_TIMEZONE", default_value = "America/New_York")]
    pub timezone: String,

    #[arg(long, default_value = "30")]
    pub poll_interval_secs: u64,

    #[arg(long, default_value = "1")]
    pub redraw_interval_secs: u64,

    /// Fetch and print once, then exit
    #[arg(long)]
    pub once: bool,
}
