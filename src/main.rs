//! CLI entry point for tack.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tack_core::portal::{DEFAULT_BASE_URL, Timeouts};
use tack_core::server::{self, DEFAULT_BIND};
use tack_core::{Credentials, PortalClient, PortalConfig, QueryOptions, RetryPolicy};
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{FileConfig, load_config};
use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the JSON output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(command = ?args.command, "CLI arguments parsed");

    let loaded = load_config(args.config.as_deref())?;
    if let Some(path) = loaded.config.as_ref().and(loaded.path.as_ref()) {
        debug!(path = %path.display(), "loaded config file");
    }
    let file = loaded.file_config();

    let client = PortalClient::connect(portal_config(&args, &file)?)
        .await
        .context("Failed to create portal client")?;

    match args.command {
        Command::Serve { bind } => {
            let addr = match bind.or(file.bind) {
                Some(addr) => addr,
                None => DEFAULT_BIND
                    .parse::<SocketAddr>()
                    .context("Invalid default bind address")?,
            };
            info!(%addr, "starting server");
            server::serve(Arc::new(client), addr)
                .await
                .with_context(|| format!("Server on {addr} failed"))?;
        }
        Command::Locations => print_json(&client.locations().await?, args.pretty)?,
        Command::Location { id } => print_json(&client.location(&id).await?, args.pretty)?,
        Command::Classifications { location_id } => {
            print_json(&client.classifications(&location_id).await?, args.pretty)?;
        }
        Command::All { location_id, query } => {
            let reservations = client.all(&location_id, QueryOptions::from(query)).await?;
            print_json(&reservations, args.pretty)?;
        }
        Command::Available {
            location_id,
            vessel_id,
            query,
        } => {
            let available = client
                .available(&location_id, &vessel_id, QueryOptions::from(query))
                .await?;
            print_json(&available, args.pretty)?;
        }
        Command::Vessels { location_id, query } => {
            let vessels = client.vessels(&location_id, QueryOptions::from(query)).await?;
            print_json(&vessels, args.pretty)?;
        }
        Command::Vessel {
            location_id,
            vessel_id,
            query,
        } => {
            let vessel = client
                .vessel(&location_id, &vessel_id, QueryOptions::from(query))
                .await?;
            print_json(&vessel, args.pretty)?;
        }
        Command::Reservations => print_json(&client.reservations().await?, args.pretty)?,
    }

    Ok(())
}

/// Merges flags over file config. Flags win.
fn portal_config(args: &Args, file: &FileConfig) -> Result<PortalConfig> {
    let username = args
        .username
        .clone()
        .or_else(|| file.username.clone())
        .context("Missing username: pass --username or set FBC_USERNAME")?;
    let password = args
        .password
        .clone()
        .context("Missing password: pass --password or set FBC_PASSWORD")?;

    let base_url = args
        .base_url
        .clone()
        .or_else(|| file.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let defaults = Timeouts::default();
    let timeouts = Timeouts {
        connect: file
            .connect_timeout_secs
            .map_or(defaults.connect, Duration::from_secs),
        read: file
            .read_timeout_secs
            .map_or(defaults.read, Duration::from_secs),
    };

    let mut retry = RetryPolicy::default();
    if let Some(max_relogins) = args.max_relogins.or(file.max_relogins) {
        retry = retry.with_max_relogins(max_relogins);
    }

    Ok(PortalConfig::new(Credentials::new(username, password))
        .with_base_url(base_url)
        .with_timeouts(timeouts)
        .with_retry(retry))
}

fn print_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
