use clap::Parser;
use client::discovery::listen_for_server;
use client::input::InputManager;
use client::network::{connect, Client};
use client::{ClientConfig, IDLE_TIMEOUT};
use log::info;
use shared::{IpVersion, DEFAULT_PORT};
use std::net::{IpAddr, SocketAddr};

#[derive(Parser, Debug)]
#[command(author, version, about = "LAN Blackjack client", long_about = None)]
struct Args {
    /// IP version to discover the server on (6 for IPv6, anything else IPv4)
    #[arg(short, long)]
    ip_version: Option<u8>,

    /// Connect to this server instead of waiting for an announcement
    #[arg(short, long)]
    server: Option<IpAddr>,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

impl Args {
    fn into_config(self) -> ClientConfig {
        ClientConfig {
            version: self.ip_version.map(IpVersion::from_number),
            server: self.server,
            port: self.port,
            idle_timeout: IDLE_TIMEOUT,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = Args::parse().into_config();
    let mut input = InputManager::stdin();

    let version = match config.version {
        Some(version) => version,
        None => input.choose_ip_version(&mut std::io::stdout()).await?,
    };

    let ip = match config.server {
        Some(ip) => ip,
        None => {
            println!("Waiting for a server announcement ({})...", version);
            listen_for_server(version, config.port).await?
        }
    };

    let stream = connect(SocketAddr::new(ip, config.port)).await?;
    println!("Successfully connected using {}", IpVersion::of(&ip));
    info!("Connected to {}", ip);

    let mut client = Client::new(input, std::io::stdout(), config.idle_timeout);
    client.play(stream).await?;

    Ok(())
}
