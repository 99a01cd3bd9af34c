use clap::Parser;

/// Traffic forecast service CLI arguments
///
/// Every flag overrides the matching environment variable.
#[derive(Debug, Default, Parser)]
#[command(
    name = "traffic-forecast",
    version,
    about = "Next-interval directional traffic volume forecasts"
)]
pub struct Cli {
    /// Database URL (overrides DATABASE_URL and DB_*)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Path to the exported model artifact
    #[arg(long)]
    pub model_path: Option<String>,

    /// Path to the exported scaler artifact
    #[arg(long)]
    pub scaler_path: Option<String>,

    /// HTTP listen port
    #[arg(long)]
    pub port: Option<u16>,

    /// Location used when a request names none
    #[arg(long)]
    pub location: Option<String>,
}
