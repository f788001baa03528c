use std::time::Duration;

use clap::Parser;
use simmesh_broker::BrokerClient;
use simmesh_core::otel::init_tracing;
use simmesh_core::shutdown::GracefulShutdown;
use simmesh_consumer::{Consumer, ConsumerArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ConsumerArgs::parse();
    let _guard = init_tracing("simmesh-consumer")?;

    let broker_config = args.broker_config();
    let client = BrokerClient::connect(&broker_config).await?;
    client.set_prefetch(args.prefetch_count).await?;

    let mut consumer = Consumer::new(&client, args.resolve_consumer_id(), args.max_retries, args.timeout());
    consumer.load_model(5, Duration::from_secs(2)).await?;

    let shutdown = GracefulShutdown::new();
    let mut token = shutdown.token();
    tokio::spawn(async move {
        shutdown.wait().await;
    });

    let mut processed = 0u64;
    loop {
        if token.is_shutdown() {
            break;
        }
        if let Some(max) = args.max_escenarios {
            if processed >= max {
                break;
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            delivery = client.get_one(simmesh_broker::topology::ESCENARIOS) => {
                match delivery? {
                    Some(delivery) => {
                        consumer.process_delivery(delivery).await?;
                        processed += 1;
                    }
                    None => tokio::time::sleep(Duration::from_millis(100)).await,
                }
            }
        }
    }

    consumer.publish_final_telemetry().await?;
    client.disconnect().await?;
    Ok(())
}
