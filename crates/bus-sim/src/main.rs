//! Bus position simulator.
//!
//! Replays a fixed route by overwriting a Firebase Realtime Database
//! reference with a timestamped position every few seconds, providing live
//! data for clients that display bus locations.

mod publisher;

use std::sync::Arc;

use anyhow::{Context, Result};
use bus_common::firebase::{FirebaseDatabase, ServiceAccount};
use bus_common::route::campus_loop;
use bus_common::{init_tracing, Config, Route};
use tokio::signal;

use crate::publisher::Publisher;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load config
    let config = Config::from_env()?;

    // 2. Initialize logging
    init_tracing("bus-sim", &config.log_level);

    // 3. Authenticate against the database
    let account = ServiceAccount::load(&config.firebase_credentials_path).with_context(|| {
        format!(
            "Failed to load credentials from {}",
            config.firebase_credentials_path
        )
    })?;
    tracing::info!(
        project_id = %account.project_id,
        client_email = %account.client_email,
        "Loaded service account"
    );

    let database = Arc::new(
        FirebaseDatabase::new(&config.firebase_database_url, account)
            .context("Failed to create database client")?,
    );
    database
        .authenticate()
        .await
        .context("Failed to authenticate with Firebase")?;
    tracing::info!("Connected to {}", database.base_url());

    // 4. Load the route
    let route = load_route(&config)?;
    tracing::info!(
        "Route ready: {} waypoints, {:.0} m per loop",
        route.len(),
        route.length_meters()
    );

    let bus_ref = database.reference(&config.bus_ref_path);
    let mut publisher = Publisher::new(bus_ref, route, config.tick_interval());

    // 5. Stop cleanly on Ctrl+C
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::warn!("Received shutdown signal");
    };

    // 6. Run the loop
    tracing::info!(
        "Starting simulation. Updating every {} seconds…",
        config.tick_interval_secs
    );
    tokio::select! {
        result = publisher.run() => {
            if let Err(e) = result {
                tracing::error!("Simulation error: {}", e);
                return Err(e).with_context(|| format!("Failed to update {}", config.bus_ref_path));
            }
        }
        _ = shutdown => {
            tracing::info!("Shutting down...");
        }
    }

    Ok(())
}

fn load_route(config: &Config) -> Result<Route> {
    match &config.route_file {
        Some(path) => {
            Route::load_from_json(path).with_context(|| format!("Failed to load route from {path}"))
        }
        None => Ok(campus_loop()),
    }
}
