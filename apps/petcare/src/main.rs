mod api;
mod config;
mod controller;
mod screens;
mod ui;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;
use view_core::QueryCache;

use crate::{api::MockApi, controller::events::Route, ui::app::PetcareApp};

#[derive(Parser, Debug)]
#[command(about = "Terminal pet-care booking screens")]
struct Args {
    /// Screen to open first.
    #[arg(long, value_enum, default_value_t = Route::Home)]
    screen: Route,
    /// Config file; defaults to ./petcare.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Button numbers to press in order instead of reading stdin.
    #[arg(long, value_delimiter = ',')]
    script: Vec<usize>,
    /// Print the last submitted reservation as JSON on exit.
    #[arg(long)]
    dump: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = config::load_settings(args.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .with_writer(io::stderr)
        .init();
    tracing::info!(
        screen = %args.screen,
        fetch_delay_ms = settings.fetch_delay_ms,
        scripted = !args.script.is_empty(),
        "starting petcare"
    );

    let cache = QueryCache::try_current()?;
    let api = MockApi::from_settings(&settings);
    let mut app = PetcareApp::new(cache, api, args.screen);

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    ui::app::run(&mut app, stdin, &mut stdout, args.script).await?;

    if args.dump {
        let json = serde_json::to_string_pretty(&app.last_booking())
            .context("failed to serialize reservation")?;
        println!("{json}");
    }
    tracing::info!(screen = %app.route(), "petcare stopped");
    Ok(())
}
