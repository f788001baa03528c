//! The aggregator's background poll loop: drains telemetry and result
//! queues every `POLL_PERIOD`, recomputing statistics as results arrive.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use simmesh_broker::BrokerClient;
use simmesh_core::shutdown::ShutdownToken;
use simmesh_model::{ConsumerTelemetry, Model, ProducerTelemetry, ScenarioResult};
use tracing::{debug, error, warn};

use crate::state::AggregatorState;

/// Broker poll cadence, fixed per §4.F — distinct from the HTTP-facing
/// `DASHBOARD_REFRESH_INTERVAL`.
const POLL_PERIOD: Duration = Duration::from_millis(500);

/// Backoff applied after a cycle that raised a broker error.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

const MONITORED_QUEUES: [&str; 5] = [
    simmesh_broker::topology::MODELO,
    simmesh_broker::topology::ESCENARIOS,
    simmesh_broker::topology::RESULTADOS,
    simmesh_broker::topology::STATS_PRODUCTOR,
    simmesh_broker::topology::STATS_CONSUMIDORES,
];

fn unix_timestamp() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

/// Runs the poll loop until `shutdown` reports a requested shutdown.
/// Every cycle's own errors are caught, logged and backed off; the loop
/// itself never returns early on an error, only on shutdown.
pub async fn run(client: &BrokerClient, state: &AggregatorState, mut shutdown: ShutdownToken) {
    loop {
        if shutdown.is_shutdown() {
            break;
        }

        if let Err(err) = run_one_cycle(client, state).await {
            error!(error = %err, "aggregator poll cycle failed, backing off");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(ERROR_BACKOFF) => {}
            }
            continue;
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(POLL_PERIOD) => {}
        }
    }
}

async fn run_one_cycle(client: &BrokerClient, state: &AggregatorState) -> simmesh_broker::Result<()> {
    drain_producer_stats(client, state).await?;
    drain_consumer_stats(client, state).await?;
    let new_results = drain_results(client, state).await?;
    refresh_queue_sizes(client, state).await;
    if !state.has_model() {
        refresh_model_snapshot(client, state).await?;
    }

    if new_results > 0 {
        debug!(new_results, "recomputed statistics");
    }
    state.mark_updated(unix_timestamp());
    Ok(())
}

async fn drain_producer_stats(client: &BrokerClient, state: &AggregatorState) -> simmesh_broker::Result<()> {
    if let Some(delivery) = client.get_one(simmesh_broker::topology::STATS_PRODUCTOR).await? {
        delivery.ack().await?;
        match delivery.json::<ProducerTelemetry>() {
            Ok(telemetry) => state.record_producer_stats(telemetry),
            Err(err) => warn!(error = %err, "malformed producer telemetry, dropped"),
        }
    }
    Ok(())
}

async fn drain_consumer_stats(client: &BrokerClient, state: &AggregatorState) -> simmesh_broker::Result<()> {
    loop {
        let Some(delivery) = client.get_one(simmesh_broker::topology::STATS_CONSUMIDORES).await? else {
            return Ok(());
        };
        delivery.ack().await?;
        match delivery.json::<ConsumerTelemetry>() {
            Ok(telemetry) => state.record_consumer_stats(telemetry),
            Err(err) => warn!(error = %err, "malformed consumer telemetry, dropped"),
        }
    }
}

async fn drain_results(client: &BrokerClient, state: &AggregatorState) -> simmesh_broker::Result<u64> {
    let mut drained = 0u64;
    loop {
        let Some(delivery) = client.get_one(simmesh_broker::topology::RESULTADOS).await? else {
            return Ok(drained);
        };
        delivery.ack().await?;
        match delivery.json::<ScenarioResult>() {
            Ok(result) => {
                state.record_result(result, unix_timestamp());
                drained += 1;
            }
            Err(err) => warn!(error = %err, "malformed result message, dropped"),
        }
    }
}

async fn refresh_queue_sizes(client: &BrokerClient, state: &AggregatorState) {
    let mut sizes = BTreeMap::new();
    for queue in MONITORED_QUEUES {
        match client.queue_depth(queue).await {
            Ok(depth) => {
                sizes.insert(queue.to_string(), depth);
            }
            Err(err) => {
                warn!(queue, error = %err, "failed to read queue depth");
                sizes.insert(queue.to_string(), 0);
            }
        }
    }
    state.set_queue_sizes(sizes);
}

async fn refresh_model_snapshot(client: &BrokerClient, state: &AggregatorState) -> simmesh_broker::Result<()> {
    if let Some(delivery) = client.get_one(simmesh_broker::topology::MODELO).await? {
        let model: Model = delivery.json()?;
        client.publish(simmesh_broker::topology::MODELO, &model, simmesh_broker::DeliveryMode::Persistent).await?;
        delivery.ack().await?;
        state.set_model_if_absent(&model);
    }
    Ok(())
}
