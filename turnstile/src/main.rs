use std::net::{Ipv4Addr, SocketAddr};

use args::Args;
use clap::Parser;
use config::Config;
use server::ServeConfig;

mod args;

const DEFAULT_LISTEN_ADDRESS: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    server::logger::init(&args.log_filter);

    let config = Config::load(&args.config)?;

    let listen_address = args
        .listen_address
        .or(config.server.listen_address)
        .unwrap_or(DEFAULT_LISTEN_ADDRESS);

    server::serve(ServeConfig { listen_address, config }).await?;

    log::info!("shut down cleanly");

    Ok(())
}
