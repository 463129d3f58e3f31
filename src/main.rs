use buchi_bridge::{
    config::{Config, ConfigLoader},
    logging,
    rest_api::{self, RestContext},
    DeviceLink, LinkError, LinkService, LinkSettings, PortProvider, SystemPorts,
};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "buchi-bridge",
    version,
    about = "HTTP bridge to a BUCHI device on a serial port.",
    long_about = "Finds the BUCHI device by sending BUCHI:WHO to every serial port, keeps the answering port open, and relays /write-url and /validate-token requests to it as line-based commands."
)]
struct Args {
    /// Configuration file. Standard locations are searched when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the serial baud rate.
    #[arg(short, long, global = true)]
    baud: Option<u32>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Connect to the device and serve HTTP (default).
    Serve {
        /// Address to bind the HTTP server to.
        #[arg(long)]
        host: Option<String>,

        /// Port for the HTTP server.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List the serial ports visible to the system.
    Ports,
    /// Run the handshake and report which port answered.
    Probe {
        /// Only try this port instead of scanning.
        #[arg(short, long)]
        port: Option<String>,
    },
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, Box<dyn Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    config.validate()?;

    logging::init(config.logging.format, &config.server.log_level)?;

    match args.command.unwrap_or(Cmd::Serve {
        host: None,
        port: None,
    }) {
        Cmd::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Cmd::Ports => list_ports(),
        Cmd::Probe { port } => probe(config, port).await,
    }
}

fn link_service(config: &Config, pinned_port: Option<String>) -> LinkService {
    LinkService::new(DeviceLink::system(LinkSettings::from(&config.serial)))
        .with_pinned_port(pinned_port)
}

async fn serve(config: Config) -> Result<ExitCode, Box<dyn Error>> {
    let service = link_service(&config, config.serial.port.clone());

    if config.serial.enabled {
        match service.connect().await {
            Ok(port) => info!(port = %port, "BUCHI device ready"),
            Err(e) => error!(
                error = %e,
                "CRITICAL: Could not connect to BUCHI device. The bridge will run without device communication."
            ),
        }
    } else {
        warn!("Serial communication disabled; device requests will fail until POST /discover");
    }

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!(address = %listener.local_addr()?, "Starting BUCHI bridge");

    let ctx = RestContext {
        service: service.clone(),
    };
    rest_api::serve(listener, ctx, shutdown_signal()).await?;

    service.close().await?;
    info!("Server stopped gracefully.");
    Ok(ExitCode::SUCCESS)
}

fn list_ports() -> Result<ExitCode, Box<dyn Error>> {
    let ports = SystemPorts.candidates()?;
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        let details: Vec<&str> = [port.manufacturer.as_deref(), port.product.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if details.is_empty() {
            println!("{}\t{}", port.port_name, port.transport);
        } else {
            println!("{}\t{}\t{}", port.port_name, port.transport, details.join(" "));
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn probe(config: Config, port: Option<String>) -> Result<ExitCode, Box<dyn Error>> {
    let service = link_service(&config, port.or_else(|| config.serial.port.clone()));

    let result = service.connect().await;
    service.close().await?;

    match result {
        Ok(port_name) => {
            println!("BUCHI device answered on {port_name}");
            Ok(ExitCode::SUCCESS)
        }
        Err(LinkError::DeviceNotFound) => {
            println!("No BUCHI device found.");
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}

// --- Graceful Shutdown Handler ---
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Signal received, starting graceful shutdown...");
}
