use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use simmesh_broker::BrokerConfig;

/// Command-line and environment configuration for the aggregator binary.
#[derive(Debug, Parser)]
#[command(name = "simmesh-aggregator", version, about = "Aggregates results and telemetry into running statistics, served over HTTP")]
pub struct AggregatorArgs {
    /// Address to bind the HTTP snapshot/export server to.
    #[arg(long, env = "DASHBOARD_HOST", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port for the HTTP snapshot/export server.
    #[arg(long, env = "DASHBOARD_PORT", default_value_t = 8050)]
    pub port: u16,

    /// UI poll cadence advertised to HTTP clients; distinct from the
    /// aggregator's own fixed 0.5s broker poll cadence.
    #[arg(long, env = "DASHBOARD_REFRESH_INTERVAL", default_value_t = 2000)]
    pub refresh_interval_ms: u64,

    /// Broker host.
    #[arg(long, env = "RABBITMQ_HOST", default_value = "localhost")]
    pub rabbitmq_host: String,

    /// Broker port.
    #[arg(long, env = "RABBITMQ_PORT", default_value_t = 5672)]
    pub rabbitmq_port: u16,

    /// Broker virtual host.
    #[arg(long, env = "RABBITMQ_VHOST", default_value = "/")]
    pub rabbitmq_vhost: String,

    /// Increase log verbosity; may be repeated.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity; may be repeated.
    #[arg(short = 'q', long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl AggregatorArgs {
    /// The socket address the HTTP server binds to.
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    /// The UI refresh interval as a [`Duration`], reported via `/snapshot`.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Builds a [`BrokerConfig`], layering the aggregator's own broker
    /// flags over the environment-derived defaults.
    pub fn broker_config(&self) -> BrokerConfig {
        let mut config = BrokerConfig::from_env();
        config.host = self.rabbitmq_host.clone();
        config.port = self.rabbitmq_port;
        config.vhost = self.rabbitmq_vhost.clone();
        config
    }
}
