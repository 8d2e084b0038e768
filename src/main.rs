//! CLI for snbroker
//!
//! Subcommands:
//! - `server`: run the UDP gateway until Ctrl-C
//! - `client`: connect, register a topic, publish once and disconnect (smoke test)

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use snbroker::broker::Broker;
use snbroker::config::{Settings, load_config};
use snbroker::persistence::open_store;
use snbroker::transport::Server;
use snbroker::transport::client::publish_once;
use snbroker::utils::{BrokerError, logging};

#[derive(Parser)]
#[command(name = "snbroker", version, about = "UDP pub/sub gateway for sensor networks")]
struct Cli {
    /// Configuration file (defaults to config/default.* when present)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the UDP gateway
    Server,
    /// Publish one message through a running gateway
    Client {
        /// Gateway address
        #[arg(long, default_value = "127.0.0.1:1884")]
        addr: String,
        #[arg(long, default_value = "snbroker-smoke")]
        client_id: String,
        #[arg(long, default_value = "snbroker/smoke")]
        topic: String,
        #[arg(long, default_value = "hello")]
        payload: String,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let settings = match load_config(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&settings.log) {
        eprintln!("Cannot open log file: {}", e);
    }

    let result = match cli.command {
        Command::Server => run_server(settings).await,
        Command::Client {
            addr,
            client_id,
            topic,
            payload,
        } => run_client(&addr, &client_id, &topic, &payload).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let sessions = open_store(&settings.session)?;
    let broker = Arc::new(Broker::new(Arc::clone(&sessions), settings.broker.gateway_id));

    if let Some(tcp) = &settings.server.tcp_address {
        warn!("TCP listener on {} is not implemented; serving UDP only", tcp);
    }

    let server = Server::bind(
        &settings.server.listen_addr(),
        broker,
        &settings.broker,
    )
    .await?;

    tokio::select! {
        _ = server.run() => {
            error!("Gateway exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    sessions.close()?;
    Ok(())
}

async fn run_client(
    addr: &str,
    client_id: &str,
    topic: &str,
    payload: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let gateway: SocketAddr = addr
        .parse()
        .map_err(|_| BrokerError::Address(addr.to_string()))?;

    let topic_id = publish_once(gateway, client_id, topic, payload.as_bytes()).await?;
    info!("Published to {} (topic id {})", topic, topic_id);
    Ok(())
}
