//! prescreen-server binary
//!
//! HTTP proxy between the careers front end and the Salesforce org: candidate
//! pre-screening chat sessions, job listings, and application submission.

use clap::Parser;
use prescreen_server::{shutdown_signal, AppState, ProxyServer, ServerConfig};
use std::net::SocketAddr;

use prescreen_core::SalesforceConfig;

/// Command line arguments for the proxy server.
#[derive(Parser, Debug)]
#[command(name = "prescreen-server")]
#[command(about = "HTTP proxy for the candidate pre-screening chat agent")]
#[command(version)]
struct Args {
    /// Server bind address
    #[arg(short, long, default_value = "127.0.0.1:3001")]
    bind: String,

    /// Enable CORS
    #[arg(long, default_value = "true")]
    cors: bool,

    /// CORS allowed origins (comma-separated)
    #[arg(long)]
    cors_origins: Option<String>,

    /// Enable request logging
    #[arg(long, default_value = "true")]
    logging: bool,

    /// Mark session cookies Secure (set behind TLS)
    #[arg(long)]
    secure_cookies: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    let bind_addr: SocketAddr = args
        .bind
        .parse()
        .map_err(|e| format!("Invalid bind address '{}': {}", args.bind, e))?;

    let salesforce = SalesforceConfig::from_env()?;

    let mut config = ServerConfig::new()
        .with_bind_addr(bind_addr)
        .with_cors(args.cors)
        .with_logging(args.logging)
        .with_secure_cookies(args.secure_cookies);
    if let Some(origins) = args.cors_origins {
        config = config.with_cors_origins(
            origins.split(',').map(|s| s.trim().to_string()).collect(),
        );
    }

    log::info!("Starting prescreen server...");
    log::info!("Configuration:");
    log::info!("  Bind address: {}", bind_addr);
    log::info!("  Org domain: {}", salesforce.domain);
    log::info!("  Agent API host: {}", salesforce.api_host);
    log::info!("  CORS enabled: {}", args.cors);
    log::info!("  Logging enabled: {}", args.logging);
    log::info!("  Secure cookies: {}", args.secure_cookies);

    let state = AppState::from_salesforce(salesforce, config);
    let server = ProxyServer::new(state);

    server.serve_with_shutdown(shutdown_signal()).await?;

    Ok(())
}
