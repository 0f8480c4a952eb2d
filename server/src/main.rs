use clap::Parser;
use log::{error, info};
use server::beacon::Beacon;
use server::config::{ServerConfig, SessionConfig, DEFAULT_MAX_SESSIONS, DEFAULT_RANKINGS_PATH};
use server::network::Server;
use server::rankings::{RankingStore, DEFAULT_CAPACITY};
use server::resolver::{AddressResolver, FixedResolver, InterfaceResolver};
use shared::{IpVersion, DEFAULT_PORT};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "LAN Blackjack server", long_about = None)]
struct Args {
    /// IP version to serve and announce on (6 for IPv6, anything else IPv4)
    #[arg(default_value = "4")]
    ip_version: u8,

    /// TCP port for sessions and UDP port for announcements
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Rankings file
    #[arg(short, long, default_value = DEFAULT_RANKINGS_PATH)]
    rankings: PathBuf,

    /// Maximum number of concurrent sessions
    #[arg(long, default_value_t = DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,

    /// Maximum number of players kept in the rankings
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    max_players: usize,

    /// Seconds between two announcements
    #[arg(long, default_value = "5")]
    beacon_interval: u64,

    /// Announce this address instead of looking one up
    #[arg(long)]
    advertise: Option<IpAddr>,

    /// Ask again when a player enters an empty name
    #[arg(long)]
    reject_empty_names: bool,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::for_version(IpVersion::from_number(self.ip_version));
        config.port = self.port;
        config.rankings_path = self.rankings;
        config.max_sessions = self.max_sessions;
        config.max_players = self.max_players;
        config.beacon_interval = Duration::from_secs(self.beacon_interval.max(1));
        config.advertise = self.advertise;
        config.session = SessionConfig {
            reject_empty_names: self.reject_empty_names,
        };
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Args::parse().into_config();
    info!(
        "Starting {} server, rankings in {}",
        config.version,
        config.rankings_path.display()
    );

    let store = Arc::new(RankingStore::new(
        config.rankings_path.clone(),
        config.max_players,
    ));
    let server = Server::bind(&config, store).await?;

    let resolver: Box<dyn AddressResolver> = match config.advertise {
        Some(addr) => Box::new(FixedResolver(addr)),
        None => Box::new(InterfaceResolver),
    };
    let beacon = Beacon::new(&config.beacon(), resolver)?;

    let beacon_handle = tokio::spawn(beacon.run());
    let server_handle = tokio::spawn(server.run());

    tokio::select! {
        result = server_handle => {
            if let Err(e) = result {
                error!("Accept loop panicked: {}", e);
            }
        }
        result = beacon_handle => {
            if let Err(e) = result {
                error!("Beacon task panicked: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
