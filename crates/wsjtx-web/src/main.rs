//! wsjtx-web - relays WSJT-X UDP traffic to browsers over WebSocket.

use clap::Parser;
use wsjtx_bridge::{BridgeConfig, BridgeServer};

#[derive(Parser, Debug)]
#[command(name = "wsjtx-web")]
#[command(author, version, about = "Bridge WSJT-X UDP messages to WebSocket clients", long_about = None)]
struct Cli {
    /// UDP address to receive WSJT-X datagrams on
    #[arg(long, default_value = "0.0.0.0:2237")]
    udp: String,

    /// Address to accept browser WebSocket connections on
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Request path upgraded to a WebSocket
    #[arg(long, default_value = "/ws")]
    ws_path: String,

    /// Receive buffer size per datagram, in bytes
    #[arg(long, default_value_t = 4096)]
    max_datagram: usize,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            udp_bind: self.udp.clone(),
            ws_bind: self.listen.clone(),
            ws_path: self.ws_path.clone(),
            max_datagram_size: self.max_datagram,
            ..BridgeConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let server = BridgeServer::builder()
        .config(cli.bridge_config())
        .build()
        .await?;

    let udp = server.udp_local_addr()?;
    let ws = server.ws_local_addr()?;
    tracing::info!(%udp, %ws, path = %cli.ws_path, "starting WSJT-X web bridge");

    server.run().await?;
    Ok(())
}
