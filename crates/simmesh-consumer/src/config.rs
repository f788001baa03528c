use std::time::Duration;

use clap::Parser;
use simmesh_broker::BrokerConfig;

/// Command-line and environment configuration for the consumer binary.
#[derive(Debug, Parser)]
#[command(name = "simmesh-consumer", version, about = "Evaluates scenarios against a published model")]
pub struct ConsumerArgs {
    /// Explicit consumer id; a random `C-xxxxxxxx` id is generated if
    /// omitted.
    #[arg(long)]
    pub consumer_id: Option<String>,

    /// Stop after processing this many scenarios (default: unbounded).
    #[arg(long)]
    pub max_escenarios: Option<u64>,

    /// Broker host.
    #[arg(long, env = "RABBITMQ_HOST", default_value = "localhost")]
    pub rabbitmq_host: String,

    /// Broker port.
    #[arg(long, env = "RABBITMQ_PORT", default_value_t = 5672)]
    pub rabbitmq_port: u16,

    /// Broker virtual host.
    #[arg(long, env = "RABBITMQ_VHOST", default_value = "/")]
    pub rabbitmq_vhost: String,

    /// QoS prefetch count; `1` gives fair dispatch across consumers.
    #[arg(long, env = "CONSUMER_PREFETCH_COUNT", default_value_t = 1)]
    pub prefetch_count: u16,

    /// Wall-clock budget for one scenario's sandboxed evaluation.
    #[arg(long, env = "CONSUMER_TIMEOUT", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Maximum republications for a transient failure before dead-lettering.
    #[arg(long, env = "CONSUMER_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Seconds between throttled consumer-telemetry publications.
    #[arg(long, env = "CONSUMER_STATS_INTERVAL", default_value_t = 5)]
    pub stats_interval_secs: u64,

    /// Increase log verbosity; may be repeated.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity; may be repeated.
    #[arg(short = 'q', long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl ConsumerArgs {
    /// The sandbox wall-clock budget as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The throttled-telemetry interval as a [`Duration`].
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }

    /// Builds a [`BrokerConfig`], layering the consumer's own broker flags
    /// over the environment-derived defaults.
    pub fn broker_config(&self) -> BrokerConfig {
        let mut config = BrokerConfig::from_env();
        config.host = self.rabbitmq_host.clone();
        config.port = self.rabbitmq_port;
        config.vhost = self.rabbitmq_vhost.clone();
        config
    }

    /// Resolves the consumer id, generating a random one if none was given.
    pub fn resolve_consumer_id(&self) -> String {
        self.consumer_id.clone().unwrap_or_else(|| format!("C-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]))
    }
}
