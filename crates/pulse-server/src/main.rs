// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pulse server binary.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pulse_server::{create_app_state, create_router, cors::cors_layer};
use pulse_server_config::{LogFormat, ServerConfig};
use pulse_server_health::{JobRecordRepository, SqliteJobRecordRepository};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pulse server - job health and real-time events.
#[derive(Parser, Debug)]
#[command(name = "pulse-server", about = "Pulse job health and real-time event server", version)]
struct Args {
	/// Path to a TOML config file (defaults to /etc/pulse/server.toml)
	#[arg(long, env = "PULSE_SERVER_CONFIG")]
	config: Option<PathBuf>,

	/// Subcommands for pulse-server (e.g., `version`)
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

fn init_tracing(config: &ServerConfig) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
	let registry = tracing_subscriber::registry().with(filter);

	match config.logging.format {
		LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

async fn open_repository(
	config: &ServerConfig,
) -> anyhow::Result<Option<Arc<dyn JobRecordRepository>>> {
	let Some(url) = &config.database.url else {
		tracing::info!("No database configured, job health is kept in memory only");
		return Ok(None);
	};

	let pool = pulse_server_health::create_pool(url)
		.await
		.context("failed to open job health database")?;
	pulse_server_health::run_migrations(&pool)
		.await
		.context("failed to migrate job health database")?;

	Ok(Some(Arc::new(SqliteJobRecordRepository::new(pool))))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("pulse-server version: {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => pulse_server_config::load_config_with_file(path),
		None => pulse_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	init_tracing(&config);

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		environment = %config.http.environment,
		"starting pulse-server"
	);

	let repository = open_repository(&config).await?;
	let state = create_app_state(&config, repository)
		.await
		.context("failed to initialize job health registry")?;
	let broker = state.broker.clone();

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(cors_layer(&config.http, &config.cors));

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;

	// Run server with graceful shutdown
	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	broker.shutdown().await;

	tracing::info!("Server shutdown complete");
	Ok(())
}
