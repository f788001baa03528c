use std::sync::Arc;

use clap::Parser;
use simmesh_aggregator::state::Capacities;
use simmesh_aggregator::{http, poller, AggregatorArgs, AggregatorState};
use simmesh_broker::BrokerClient;
use simmesh_core::otel::init_tracing;
use simmesh_core::shutdown::GracefulShutdown;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AggregatorArgs::parse();
    let _guard = init_tracing("simmesh-aggregator")?;

    let broker_config = args.broker_config();
    let client = BrokerClient::connect(&broker_config).await?;
    client.declare_topology().await?;

    let state = Arc::new(AggregatorState::new(Capacities::default()));

    let shutdown = GracefulShutdown::new();
    let poller_token = shutdown.token();
    let http_token = shutdown.token();
    tokio::spawn(async move {
        shutdown.wait().await;
    });

    info!(addr = %args.http_addr(), refresh_interval_ms = args.refresh_interval_ms, "starting aggregator");

    let http_addr = args.http_addr();
    let refresh_interval_ms = args.refresh_interval_ms;
    let http_state = Arc::clone(&state);
    let http_handle = tokio::spawn(async move {
        if let Err(err) = http::serve(http_addr, http_state, refresh_interval_ms, http_token).await {
            tracing::error!(error = %err, "aggregator http server exited with an error");
        }
    });

    poller::run(&client, &state, poller_token).await;

    http_handle.await?;
    client.disconnect().await?;
    info!("aggregator shut down cleanly");
    Ok(())
}
