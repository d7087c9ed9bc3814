//! `eisenhower`: tag mail and web pages from saved snapshots and browse the
//! matrix of stored priorities.

mod app;
mod cli;
mod commands;
mod session;

use anyhow::Context;
use app::App;
use clap::Parser;
use cli::Cli;
use eisenhower_rs_config::EisenhowerConfig;
use log::{debug, error, info};

/// Entry point for the Eisenhower CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
    install_panic_hook();

    let cli = Cli::parse();
    info!(
        "starting cli (config_set={}, store_set={})",
        cli.config.is_some(),
        cli.store.is_some()
    );
    let config = if let Some(path) = cli.config.as_ref() {
        EisenhowerConfig::load_from_path(path).context("failed to load config")?
    } else {
        let cwd = std::env::current_dir().context("cwd")?;
        info!("loading layered config from cwd: {}", cwd.display());
        let layered =
            EisenhowerConfig::load_layered(&cwd).context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        layered.config
    };

    let app = App::open(config, cli.store.as_deref())?;
    let mut stdout = std::io::stdout().lock();
    commands::run(&app, cli.command, &mut stdout).await
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("unhandled panic: {info}");
        default_hook(info);
    }));
}
