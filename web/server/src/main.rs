use std::{fs, path::PathBuf};

use analyzer_backend_service::BackendServices;
use anyhow::{Context, Result, bail};
use clap::Parser;
use config::AnalyzerConfig;
use tokio::{
	net::{TcpListener, UnixListener},
	signal,
};
use tracing::info;

mod config;
mod flash;
mod routes;
mod views;

#[derive(clap::Parser)]
#[command(version, about = "Web service checking sites for SEO suitability")]
struct Args {
	/// Configuration file; built-in defaults are used without one.
	#[arg(short, long)]
	config: Option<PathBuf>,
	/// Port to listen on, on all interfaces.
	#[arg(long, env = "PORT")]
	port: Option<u16>,
	/// Database URL, overriding the configuration file.
	#[arg(long, env = "DATABASE_URL")]
	database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	tracing::subscriber::set_global_default(
		tracing_subscriber::FmtSubscriber::builder()
			.with_max_level(tracing::Level::INFO)
			.finish(),
	)?;

	let mut config = AnalyzerConfig::load(args.config.as_deref())?;
	match &args.config {
		Some(path) => info!("loaded configuration from file: {:?}", path),
		None => info!("using default configuration"),
	}
	config.apply_overrides(args.port, args.database_url);

	info!("initializing backend services ...");
	let backend_services = BackendServices::new(config.clone().try_into()?).await?;
	info!("initialized backend services");

	let router = routes::make_router(backend_services);

	let listen_addr = config.web.listen;
	if let Some(path) = listen_addr.strip_prefix("unix://") {
		let path = PathBuf::from(path);
		_ = fs::remove_file(&path);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)?;
		}

		let listener = UnixListener::bind(&path)?;
		info!("listening on UDS: {:?}", path);
		axum::serve(listener, router)
			.with_graceful_shutdown(shutdown_signal())
			.await?;
	} else if let Some(addr) = listen_addr.strip_prefix("tcp://") {
		let listener = TcpListener::bind(addr)
			.await
			.with_context(|| format!("failed to bind {addr}"))?;
		info!("listening on TCP {}", listener.local_addr()?);
		axum::serve(listener, router)
			.with_graceful_shutdown(shutdown_signal())
			.await?;
	} else {
		bail!("unsupported web.listen schema")
	}

	info!("server stopped");
	Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(error) = signal::ctrl_c().await {
			tracing::error!(%error, "failed to install Ctrl+C handler");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(error) => {
				tracing::error!(%error, "failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
	info!("shutdown signal received, stopping server");
}
