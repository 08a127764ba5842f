//! MTP Responder - Entry Point
//!
//! A device-side MTP responder exposing a local directory as a single
//! storage over an emulated bulk transport.

use log::info;

use mtp_responder::config::ResponderConfig;
use mtp_responder::Server;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching MTP responder...");

    let config = ResponderConfig::load();
    let server = Server::new(config).await;
    server.start().await;
}
