use clap::Parser;

/// Command-line arguments; every option can also come from the environment
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about = "Telegram bot for notes, reminders and daily messages"
)]
pub struct Cli {
    /// Telegram bot token
    #[clap(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// Public URL of this service, pinged periodically to keep the host awake
    #[clap(long, env = "RENDER_URL")]
    pub public_url: Option<String>,

    /// Port of the health-check web server
    #[clap(long, env = "PORT", default_value_t = 10000)]
    pub port: u16,

    /// IANA timezone used for all time-of-day decisions
    #[clap(long, env = "TIMEZONE", default_value = "Asia/Yekaterinburg")]
    pub timezone: String,

    /// Seconds between scheduler checks
    #[clap(long, default_value_t = 300)]
    pub check_interval: u64,

    /// Seconds between keep-alive pings
    #[clap(long, default_value_t = 600)]
    pub ping_interval: u64,

    /// Per-message send timeout in seconds
    #[clap(long, default_value_t = 10)]
    pub delivery_timeout: u64,

    /// Initial morning broadcast time, HH:MM
    #[clap(long, default_value = "09:00")]
    pub morning: String,

    /// Initial evening broadcast time, HH:MM
    #[clap(long, default_value = "18:00")]
    pub evening: String,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,
}
