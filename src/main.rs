mod api;
mod commute;
mod config;
mod lines;
mod mbta;
mod ors;
mod preferences;
mod ranker;
mod render;
mod session;

use anyhow::Context;
use clap::Parser;
use config::{Args, Command, ServeArgs, WatchArgs};
use preferences::{JsonFileStore, MemoryStore, PreferenceStore, PreferencesManager};
use ranker::RankerConfig;
use render::RenderOptions;
use session::location::{FixedLocation, LOCATE_TIMEOUT, acquire_position};
use session::source::HttpCommuteSource;
use session::{Session, View};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Command::Serve(serve) => run_serve(serve).await,
        Command::Watch(watch) => {
            if watch.ephemeral {
                run_watch(watch, MemoryStore::default()).await
            } else {
                let store = JsonFileStore::new(&watch.preferences);
                run_watch(watch, store).await
            }
        }
    }
}

fn non_empty(key: String) -> Option<String> {
    (!key.is_empty()).then_some(key)
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Starting ttimes commute service...");

    let mbta = mbta::MbtaClient::new(non_empty(args.mbta_api_key))?;
    let ors = ors::OrsClient::new(non_empty(args.ors_api_key))?;

    let state = Arc::new(api::server::AppState {
        service: commute::CommuteService::new(mbta, ors),
        ranker: RankerConfig::default(),
    });

    api::server::run_server(state, args.port)
        .await
        .context("HTTP server failed")
}

async fn run_watch<S: PreferenceStore>(args: WatchArgs, store: S) -> anyhow::Result<()> {
    let mut prefs = PreferencesManager::open(store)?;
    if let Some(pace) = args.pace {
        prefs.set_pace(pace)?;
        info!("Pace set to {:?}", pace);
    }
    for line in &args.toggle_pin {
        let pinned = prefs.toggle_pin(line)?;
        info!("{} {}", if pinned { "Pinned" } else { "Unpinned" }, line);
    }

    let timezone: chrono_tz::Tz = args
        .timezone
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid timezone {}: {}", args.timezone, e))?;

    let position = acquire_position(&FixedLocation::new(args.lat, args.lon), LOCATE_TIMEOUT).await?;
    info!("Watching departures near {:.4}, {:.4}", position.lat, position.lon);

    let source = Arc::new(HttpCommuteSource::new(&args.server_url)?);
    let session = Arc::new(RwLock::new(Session::new(position)));
    let view = View {
        preferences: prefs.preferences().clone(),
        ranker: RankerConfig::default(),
        render: RenderOptions {
            timezone,
            ..RenderOptions::default()
        },
        detail: args.detail,
    };

    if args.once {
        session::refresh(source.as_ref(), &session).await;
        print!("{}", session::frame(&*session.read().await, &view, chrono::Utc::now()));
        return Ok(());
    }

    let poller_session = session.clone();
    let poll_every = Duration::from_secs(args.poll_interval_secs.max(1));
    let poller_handle = tokio::spawn(async move {
        session::run_poller(source, poller_session, poll_every).await;
    });

    let redraw_every = Duration::from_secs(args.redraw_interval_secs.max(1));
    let redraw_handle = tokio::spawn(async move {
        session::run_redraw(session, view, redraw_every).await;
    });

    tokio::select! {
        _ = poller_handle => error!("Poller task exited"),
        _ = redraw_handle => error!("Redraw task exited"),
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }
    Ok(())
}
