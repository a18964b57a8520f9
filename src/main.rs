//! Server binary: environment loading, logging, router wiring, graceful shutdown.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
// self
use x_post_gateway::{api, config::Config, session::Gateway};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let _ = dotenvy::dotenv();

	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| "x_post_gateway=info".into()),
		)
		.init();

	let config = Config::from_env()?;

	info!("x-post-gateway v{}", env!("CARGO_PKG_VERSION"));

	let gateway = Arc::new(Gateway::new(&config)?);
	let app = api::router(gateway);
	let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;

	info!("Listening on {}:{}", config.host, config.port);

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

	info!("Shut down cleanly.");

	Ok(())
}

async fn shutdown_signal() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};

		let mut terminate = match signal(SignalKind::terminate()) {
			Ok(stream) => stream,
			Err(_) => {
				let _ = tokio::signal::ctrl_c().await;

				return;
			},
		};

		tokio::select! {
			_ = tokio::signal::ctrl_c() => {},
			_ = terminate.recv() => {},
		}
	}
	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
	}

	info!("Shutdown signal received.");
}
