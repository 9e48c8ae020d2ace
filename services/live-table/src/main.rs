use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::{Arg, Command};
use roulette_neo_execution::{BotFeed, JsonFileLayoutStore, RoundEngine, Table, TableEvent};
use tokio::sync::broadcast;
use tracing::info;

mod config;
mod driver;
mod server;

use config::TableConfig;
use driver::{lock, publish, Clock};
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("roulette-neo-live-table")
        .about("Serves a live roulette table over WebSocket.")
        .arg(
            Arg::new("config")
                .long("config")
                .required(false)
                .help("Path to a YAML configuration file"),
        )
        .get_matches();
    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = TableConfig::load(config_path.as_deref())?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level())
        .init();

    let clock = Clock::start();
    let engine = match config.seed {
        Some(seed) => RoundEngine::seeded(
            config.phase_config(),
            config.quantum.clone(),
            seed,
            clock.now_ms(),
        ),
        None => RoundEngine::new(config.phase_config(), config.quantum.clone(), clock.now_ms()),
    }
    .context("invalid round configuration")?;
    let layouts = JsonFileLayoutStore::new(&config.layout_dir);
    let table = Table::new(config.table_settings(), engine, Box::new(layouts))
        .context("invalid table configuration")?;
    let table = Arc::new(Mutex::new(table));
    let (broadcaster, _) = broadcast::channel::<TableEvent>(1024);

    publish(&broadcaster, lock(&table).start(clock.now_ms()));
    tokio::spawn(driver::run_rounds(table.clone(), broadcaster.clone(), clock));

    if config.bot_count > 0 {
        let bot_seed = config.seed.map(|seed| seed.wrapping_add(1)).unwrap_or_else(rand::random);
        let feed = BotFeed::seeded(config.bot_feed(), bot_seed).context("invalid bot feed")?;
        tokio::spawn(driver::run_bots(
            table.clone(),
            broadcaster.clone(),
            feed,
            config.bot_interval_ms,
        ));
    }

    let app = server::router(AppState { table, broadcaster });

    let addr: SocketAddr = config.listen_addr().parse().context("invalid listen addr")?;
    info!(%addr, "roulette table listening");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
