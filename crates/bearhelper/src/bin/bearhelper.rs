//! Menu-bar helper for Bear.
//!
//! Reads one command per line on stdin. The platform shell forwards
//! `fodabear://` callback URLs on the same channel.

use std::sync::Arc;

use bearhelper::calendar::{
    default_calendar_store, ensure_access, watch_authorization, AUTHORIZATION_POLL_PERIOD,
};
use bearhelper::command::{serve, SHUTDOWN_GRACE};
use bearhelper::platform::default_platform;
use bearhelper::settings::{default_settings_dir, load_or_create_settings, settings_path};
use bearhelper::{CallbackRouter, HelperContext, HelperResult, NoteWorkflows};
use tokio::io::BufReader;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(error) = run().await {
        tracing::error!("bearhelper failed: {error}");
        std::process::exit(1);
    }
}

async fn run() -> HelperResult<()> {
    let settings_dir = default_settings_dir()?;
    let settings = load_or_create_settings(&settings_dir)?;

    let platform = default_platform();
    if !platform.is_bear_installed() {
        eprintln!("Bear is not installed. Install Bear from the App Store and try again.");
        std::process::exit(1);
    }

    let store = default_calendar_store();
    let ctx = Arc::new(
        HelperContext::new(settings, platform, store.clone())?
            .with_settings_path(settings_path(&settings_dir)),
    );
    if let Err(error) = ctx.apply_launch_at_login().await {
        tracing::warn!("launch at login not applied: {error}");
    }
    let router = Arc::new(CallbackRouter::new(NoteWorkflows::new(ctx)));

    let watcher = match ensure_access(&store).await {
        Ok(true) => None,
        Ok(false) => Some(watch_authorization(
            store.clone(),
            AUTHORIZATION_POLL_PERIOD,
            || tracing::info!("calendar events will be included from now on"),
        )),
        Err(error) => {
            tracing::warn!("calendar access unavailable: {error}");
            None
        }
    };

    tracing::info!("bearhelper ready (settings in {})", settings_dir.display());
    let aborted = serve(router, BufReader::new(tokio::io::stdin()), SHUTDOWN_GRACE).await;
    if aborted > 0 {
        tracing::warn!("{aborted} commands did not finish before shutdown");
    }

    if let Some(watcher) = watcher {
        watcher.abort();
    }
    tracing::info!("bearhelper stopped");
    Ok(())
}
