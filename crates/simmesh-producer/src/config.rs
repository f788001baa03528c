use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use simmesh_broker::BrokerConfig;

/// Command-line and environment configuration for the producer binary.
#[derive(Debug, Parser)]
#[command(name = "simmesh-producer", version, about = "Publishes a model and generates its scenario stream")]
pub struct ProducerArgs {
    /// Path to the `.ini` model file to load.
    pub model_path: PathBuf,

    /// Overrides `[SIMULACION] numero_escenarios` from the model file.
    #[arg(long = "num-escenarios")]
    pub num_escenarios: Option<u64>,

    /// Broker host.
    #[arg(long, env = "RABBITMQ_HOST", default_value = "localhost")]
    pub rabbitmq_host: String,

    /// Broker port.
    #[arg(long, env = "RABBITMQ_PORT", default_value_t = 5672)]
    pub rabbitmq_port: u16,

    /// Broker virtual host.
    #[arg(long, env = "RABBITMQ_VHOST", default_value = "/")]
    pub rabbitmq_vhost: String,

    /// Seconds between throttled producer-telemetry publications.
    #[arg(long, env = "PRODUCER_STATS_INTERVAL", default_value_t = 5)]
    pub stats_interval_secs: u64,

    /// Increase log verbosity; may be repeated.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease log verbosity; may be repeated.
    #[arg(short = 'q', long, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl ProducerArgs {
    /// The throttled-telemetry interval as a [`Duration`].
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_secs)
    }

    /// Builds a [`BrokerConfig`], layering the producer's own broker flags
    /// over the environment-derived defaults.
    pub fn broker_config(&self) -> BrokerConfig {
        let mut config = BrokerConfig::from_env();
        config.host = self.rabbitmq_host.clone();
        config.port = self.rabbitmq_port;
        config.vhost = self.rabbitmq_vhost.clone();
        config
    }
}
