//! Declares the fixed queue topology shared by every binary in the fabric.
//!
//! Queue names and arguments are fixed by the wire contract, not
//! configurable: changing them would desynchronize producers and
//! consumers that were not redeployed together.

use lapin::options::QueueDeclareOptions;
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::Channel;

use crate::error::Result;

/// The model queue: holds at most one message (the current model),
/// overwritten on every `purge_and_republish`.
pub const MODELO: &str = "cola_modelo";
/// The scenario work queue consumed by simulation workers.
pub const ESCENARIOS: &str = "cola_escenarios";
/// The result queue consumed by the aggregator.
pub const RESULTADOS: &str = "cola_resultados";
/// Producer telemetry, non-durable with a short message TTL.
pub const STATS_PRODUCTOR: &str = "cola_stats_productor";
/// Consumer telemetry, non-durable with a short message TTL.
pub const STATS_CONSUMIDORES: &str = "cola_stats_consumidores";
/// Dead-letter sink for scenarios that exhausted their retry budget.
pub const DLQ_ESCENARIOS: &str = "cola_dlq_escenarios";
/// Dead-letter sink for results that could not be delivered.
pub const DLQ_RESULTADOS: &str = "cola_dlq_resultados";

/// Declares every queue used by the fabric, in dependency order: the two
/// dead-letter queues first (so the data queues' `x-dead-letter-exchange`
/// arguments resolve against an existing target queue bound to the
/// default exchange under its own name), then the data and telemetry
/// queues.
pub async fn declare_topology(channel: &Channel) -> Result<()> {
    declare_dlq(channel, DLQ_ESCENARIOS).await?;
    declare_dlq(channel, DLQ_RESULTADOS).await?;

    declare_bounded(channel, MODELO, 1, None).await?;
    declare_bounded(channel, ESCENARIOS, 100_000, Some(DLQ_ESCENARIOS)).await?;
    declare_bounded(channel, RESULTADOS, 100_000, Some(DLQ_RESULTADOS)).await?;

    declare_stats(channel, STATS_PRODUCTOR).await?;
    declare_stats(channel, STATS_CONSUMIDORES).await?;

    Ok(())
}

async fn declare_dlq(channel: &Channel, name: &str) -> Result<()> {
    let mut args = FieldTable::default();
    args.insert(ShortString::from("x-max-length"), AMQPValue::LongLongInt(10_000i64));
    channel
        .queue_declare(name, QueueDeclareOptions { durable: true, ..Default::default() }, args)
        .await?;
    Ok(())
}

async fn declare_bounded(channel: &Channel, name: &str, max_length: i64, dlq: Option<&str>) -> Result<()> {
    let mut args = FieldTable::default();
    args.insert(ShortString::from("x-max-length"), AMQPValue::LongLongInt(max_length));
    if let Some(dlq) = dlq {
        args.insert(ShortString::from("x-dead-letter-exchange"), AMQPValue::LongString("".into()));
        args.insert(ShortString::from("x-dead-letter-routing-key"), AMQPValue::LongString(dlq.into()));
    }
    channel
        .queue_declare(name, QueueDeclareOptions { durable: true, ..Default::default() }, args)
        .await?;
    Ok(())
}

async fn declare_stats(channel: &Channel, name: &str) -> Result<()> {
    let mut args = FieldTable::default();
    args.insert(ShortString::from("x-max-length"), AMQPValue::LongLongInt(1_000i64));
    args.insert(ShortString::from("x-message-ttl"), AMQPValue::LongUInt(60_000));
    channel
        .queue_declare(name, QueueDeclareOptions { durable: false, ..Default::default() }, args)
        .await?;
    Ok(())
}

/// All queue names, in declaration order — used by tests and by
/// `--describe-topology`-style diagnostics.
pub fn all_queue_names() -> [&'static str; 7] {
    [DLQ_ESCENARIOS, DLQ_RESULTADOS, MODELO, ESCENARIOS, RESULTADOS, STATS_PRODUCTOR, STATS_CONSUMIDORES]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_names_match_the_wire_contract() {
        assert_eq!(MODELO, "cola_modelo");
        assert_eq!(ESCENARIOS, "cola_escenarios");
        assert_eq!(RESULTADOS, "cola_resultados");
        assert_eq!(STATS_PRODUCTOR, "cola_stats_productor");
        assert_eq!(STATS_CONSUMIDORES, "cola_stats_consumidores");
        assert_eq!(DLQ_ESCENARIOS, "cola_dlq_escenarios");
        assert_eq!(DLQ_RESULTADOS, "cola_dlq_resultados");
    }

    #[test]
    fn all_queue_names_lists_every_queue_once() {
        let names = all_queue_names();
        assert_eq!(names.len(), 7);
        let mut sorted = names.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 7);
    }
}
