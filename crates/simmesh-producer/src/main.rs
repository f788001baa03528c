use clap::Parser;
use simmesh_broker::BrokerClient;
use simmesh_core::otel::init_tracing;
use simmesh_core::shutdown::GracefulShutdown;
use simmesh_producer::{Producer, ProducerArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ProducerArgs::parse();
    let _guard = init_tracing("simmesh-producer")?;

    let broker_config = args.broker_config();
    let client = BrokerClient::connect(&broker_config).await?;

    let shutdown = GracefulShutdown::new();
    let token = shutdown.token();
    tokio::spawn(async move {
        shutdown.wait().await;
    });

    let mut producer = Producer::load(&client, &args.model_path, args.num_escenarios)?;
    producer.publish_model().await?;
    producer.run_scenarios(args.stats_interval(), &token).await?;

    client.disconnect().await?;
    Ok(())
}
