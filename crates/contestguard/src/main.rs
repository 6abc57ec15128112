//! ContestGuard relay server binary.

use std::time::Duration;

use clap::Parser;
use contestguard::{Server, init_logging};
use contestguard_session::SessionConfig;

/// ContestGuard relay: contest lockdown policy and activity logs
#[derive(Debug, Parser)]
#[command(name = "contestguard")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(long, env = "CONTESTGUARD_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "CONTESTGUARD_PORT", default_value_t = 5000)]
    port: u16,

    /// Log level (error, warn, info, debug, trace); RUST_LOG overrides
    #[arg(long, env = "CONTESTGUARD_LOG", default_value = "info")]
    log_level: String,

    /// Evict sessions this many seconds after they end (default: never)
    #[arg(long, env = "CONTESTGUARD_RETENTION_SECS")]
    retention_secs: Option<u64>,

    /// Seconds between eviction sweeps
    #[arg(long, env = "CONTESTGUARD_SWEEP_SECS", default_value_t = 300)]
    sweep_secs: u64,
}

impl Args {
    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ended_retention: self.retention_secs.map(Duration::from_secs),
            ..SessionConfig::default()
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    let server = match Server::builder()
        .bind(&args.address())
        .session_config(args.session_config())
        .sweep_interval(Duration::from_secs(args.sweep_secs))
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
