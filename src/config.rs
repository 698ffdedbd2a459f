//! Server configuration
//!
//! Parsed from command-line flags with environment fallbacks; `Default`
//! mirrors the flag defaults for tests and embedding.

use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;

/// Default request body cap (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Default listen address.
pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(
    std::net::IpAddr::V4(Ipv4Addr::LOCALHOST),
    8080,
);

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone, Parser)]
#[command(name = "sinklab")]
#[command(about = "Backend for scripted behavioral experiments")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "SINKLAB_LISTEN", default_value_t = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Largest accepted request body in bytes.
    #[arg(long, env = "SINKLAB_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// `tracing` filter directive, e.g. `info` or `sinklab=debug,tower_http=info`.
    #[arg(long = "log", env = "SINKLAB_LOG", default_value = "info")]
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            log_filter: "info".to_string(),
        }
    }
}
