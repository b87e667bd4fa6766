//! Naming-server binary: parse flags, load configuration, run both accept
//! loops.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dfs_naming::client::RemoteStorage;
use dfs_naming::config::Config;
use dfs_naming::naming::NamingServer;
use dfs_naming::server;

/// Naming server of the distributed filesystem.
#[derive(Debug, Parser)]
#[command(name = "dfs-naming", version, about)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the Service port.
    #[arg(long)]
    service_port: Option<u16>,

    /// Overrides the Registration port.
    #[arg(long)]
    registration_port: Option<u16>,

    /// Overrides the shared-read count that triggers replication.
    #[arg(long)]
    replication_threshold: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("cannot load {}: {err:?}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    if let Some(port) = args.service_port {
        config.service_port = port;
    }
    if let Some(port) = args.registration_port {
        config.registration_port = port;
    }
    if let Some(threshold) = args.replication_threshold {
        config.replication_threshold = threshold;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("naming server failed: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> std::io::Result<()> {
    let any = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    let service = TcpListener::bind(SocketAddr::new(any, config.service_port)).await?;
    let registration =
        TcpListener::bind(SocketAddr::new(any, config.registration_port)).await?;
    info!(
        service = %service.local_addr()?,
        registration = %registration.local_addr()?,
        threshold = config.replication_threshold,
        "naming server listening"
    );

    let naming = Arc::new(NamingServer::new(
        config.replication_threshold,
        Arc::new(RemoteStorage),
    ));
    tokio::try_join!(
        server::serve_service(service, naming.clone()),
        server::serve_registration(registration, naming),
    )?;
    Ok(())
}
