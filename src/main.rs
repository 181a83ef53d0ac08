use std::{process, sync::Arc};

use clap::Parser;
use log::{error, info, warn};
use teloxide::Bot;

use daybot::{
    run_polling, web, App, BotStorage, Cli, Config, NotificationScheduler, SystemClock,
    TelegramNotifier, TickRunner,
};

pub fn initialize_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    info!("Application starting up");

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    let storage = BotStorage::new(config.schedule);
    let clock = Arc::new(SystemClock::new(config.timezone));
    let bot = Bot::new(config.bot_token.clone());

    let notifier = Arc::new(TelegramNotifier::new(bot.clone(), config.delivery_timeout));
    let runner = TickRunner::new(
        storage.clone(),
        notifier,
        clock.clone(),
        config.tolerance_minutes,
    );
    let mut scheduler = NotificationScheduler::new(runner, config.check_interval);
    if let Err(e) = scheduler.start() {
        error!("Failed to start notification scheduler: {}", e);
        process::exit(1);
    }

    match config.public_url.clone() {
        Some(url) => {
            let period = config.ping_interval;
            tokio::spawn(async move {
                if let Err(e) = web::keep_alive(url, period).await {
                    error!("Keep-alive pinger stopped: {}", e);
                }
            });
        }
        None => warn!("Keep-alive pinger disabled"),
    }

    let web_state = web::WebState {
        clock,
        timezone: config.timezone,
        check_interval: config.check_interval,
        scheduler: scheduler.status_handle(),
    };
    let port = config.port;
    tokio::spawn(async move {
        if let Err(e) = web::serve(port, web_state).await {
            error!("Web server stopped: {}", e);
        }
    });

    let app = Arc::new(App::new(storage, config.tolerance_minutes));
    info!("All systems started, checks every {}s", config.check_interval.as_secs());
    run_polling(bot, app).await;

    if let Err(e) = scheduler.stop().await {
        warn!("{}", e);
    }
    info!("Application shutting down");
}
