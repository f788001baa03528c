//! Consumer: loads a published model once, then evaluates scenarios
//! against it one at a time, publishing results and routing failures
//! through a header-driven retry scheme before dead-lettering them.

#![deny(missing_docs)]

mod config;
mod error;

pub use config::ConsumerArgs;
pub use error::{ConsumerError, ErrorClass, Result, ScenarioFailure};

use std::collections::BTreeMap;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use simmesh_broker::{BrokerClient, Delivery, DeliveryMode};
use simmesh_model::{ConsumerTelemetry, Model, Scenario, ScenarioResult};
use tracing::{debug, error, info, warn};

fn unix_timestamp() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

/// The consumer's lifecycle state, mirroring `booting -> loading_model ->
/// idle -> processing -> terminating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    /// Not yet attempted to load a model.
    Booting,
    /// Polling `cola_modelo` for the current model.
    LoadingModel,
    /// Model loaded, waiting for the next scenario.
    Idle,
    /// Evaluating one scenario.
    Processing,
    /// Shutting down; final telemetry about to be emitted.
    Terminating,
}

impl ConsumerState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Booting => "booting",
            Self::LoadingModel => "loading_model",
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Terminating => "terminating",
        }
    }
}

#[derive(Default)]
struct Counters {
    processed: u64,
    errors_total: u64,
    retries_total: u64,
    messages_to_dlq: u64,
    errors_by_kind: BTreeMap<String, u64>,
    duration_sum: f64,
    last_duration: f64,
}

/// Drives one consumer's lifecycle against an already-connected
/// [`BrokerClient`].
pub struct Consumer<'a> {
    client: &'a BrokerClient,
    consumer_id: String,
    state: ConsumerState,
    model: Option<Model>,
    started_at: Instant,
    counters: Counters,
    max_retries: u32,
    timeout: Duration,
}

impl<'a> Consumer<'a> {
    /// Builds a consumer bound to `client`, not yet loaded.
    pub fn new(client: &'a BrokerClient, consumer_id: String, max_retries: u32, timeout: Duration) -> Self {
        Self {
            client,
            consumer_id,
            state: ConsumerState::Booting,
            model: None,
            started_at: Instant::now(),
            counters: Counters::default(),
            max_retries,
            timeout,
        }
    }

    /// The consumer's own id, used as `consumer_id` on published results.
    pub fn id(&self) -> &str {
        &self.consumer_id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Attempts to read the model up to `max_attempts` times, `wait`
    /// apart. On success, republishes it (so other consumers can still
    /// load it) before the read is implicitly consumed.
    pub async fn load_model(&mut self, max_attempts: u32, wait: Duration) -> Result<()> {
        self.state = ConsumerState::LoadingModel;
        info!(consumer_id = %self.consumer_id, "loading model");

        for attempt in 1..=max_attempts.max(1) {
            if let Some(delivery) = self.client.get_one(simmesh_broker::topology::MODELO).await? {
                let model: Model = delivery.json()?;
                self.client.publish(simmesh_broker::topology::MODELO, &model, DeliveryMode::Persistent).await?;
                delivery.ack().await?;

                info!(modelo_id = %model.modelo_id, version = %model.version, "model loaded");
                self.model = Some(model);
                self.state = ConsumerState::Idle;
                return Ok(());
            }

            if attempt < max_attempts {
                warn!(attempt, max_attempts, "no model on queue yet, retrying");
                tokio::time::sleep(wait).await;
            }
        }

        Err(ConsumerError::ModelUnavailable { attempts: max_attempts })
    }

    /// Fetches and processes at most one scenario via `basic_get`,
    /// returning `Ok(false)` if the queue was empty.
    ///
    /// Callers drive the consume loop (via `get_one` polling or a real
    /// `basic_consume` subscription) and call this once per delivery.
    pub async fn process_delivery(&mut self, delivery: Delivery) -> Result<()> {
        self.state = ConsumerState::Processing;
        let started = Instant::now();

        let retry_count = delivery.header_i64("x-retry-count").unwrap_or(0) as u32;

        match self.evaluate(&delivery).await {
            Ok((scenario_id, value)) => {
                let duration = started.elapsed().as_secs_f64();
                let result = ScenarioResult {
                    escenario_id: scenario_id,
                    consumer_id: self.consumer_id.clone(),
                    resultado: value,
                    tiempo_ejecucion: duration,
                };
                self.client.publish(simmesh_broker::topology::RESULTADOS, &result, DeliveryMode::Persistent).await?;
                delivery.ack().await?;

                self.counters.processed += 1;
                self.counters.duration_sum += duration;
                self.counters.last_duration = duration;

                if self.counters.processed % 100 == 0 {
                    info!(consumer_id = %self.consumer_id, processed = self.counters.processed, "progress");
                }
            }
            Err(failure) => {
                self.counters.errors_total += 1;
                *self.counters.errors_by_kind.entry(failure.kind.to_string()).or_insert(0) += 1;

                match failure.class {
                    ErrorClass::Terminal => {
                        error!(consumer_id = %self.consumer_id, kind = failure.kind, detail = %failure.detail, "terminal failure, dead-lettering");
                        delivery.nack(false).await?;
                        self.counters.messages_to_dlq += 1;
                    }
                    ErrorClass::Transient => {
                        if retry_count < self.max_retries {
                            warn!(consumer_id = %self.consumer_id, kind = failure.kind, retry_count, "transient failure, republishing with incremented retry count");
                            self.republish_for_retry(&delivery, retry_count + 1, failure.kind).await?;
                            delivery.ack().await?;
                            self.counters.retries_total += 1;
                        } else {
                            error!(consumer_id = %self.consumer_id, kind = failure.kind, retry_count, "retry budget exhausted, dead-lettering");
                            delivery.nack(false).await?;
                            self.counters.messages_to_dlq += 1;
                        }
                    }
                }
            }
        }

        self.state = ConsumerState::Idle;
        if self.counters.processed % 10 == 0 && self.counters.processed > 0 {
            self.publish_telemetry().await?;
        }
        Ok(())
    }

    async fn evaluate(&self, delivery: &Delivery) -> std::result::Result<(u64, f64), ScenarioFailure> {
        let scenario: Scenario = serde_json::from_slice(&delivery.body).map_err(ScenarioFailure::from)?;
        let model = self.model.as_ref().expect("process_delivery called before load_model");
        let bindings = scenario.valores.clone();
        let value = simmesh_sandbox::evaluate_payload(&model.funcion, &bindings, self.timeout)
            .map_err(ScenarioFailure::from)?;
        Ok((scenario.escenario_id, value))
    }

    async fn republish_for_retry(&self, delivery: &Delivery, retry_count: u32, last_error: &str) -> Result<()> {
        let mut headers = FieldTable::default();
        headers.insert(ShortString::from("x-retry-count"), AMQPValue::LongInt(retry_count as i32));
        headers.insert(ShortString::from("x-last-error"), AMQPValue::LongString(LongString::from(last_error)));
        headers.insert(
            ShortString::from("x-consumer-id"),
            AMQPValue::LongString(LongString::from(self.consumer_id.as_str())),
        );

        self.client
            .publish_with_headers(
                simmesh_broker::topology::ESCENARIOS,
                &RawJson(&delivery.body),
                DeliveryMode::Persistent,
                headers,
            )
            .await?;
        Ok(())
    }

    /// Publishes a telemetry snapshot with the given lifecycle `state`
    /// label (used both for periodic updates and the final shutdown
    /// message).
    pub async fn publish_telemetry(&self) -> Result<()> {
        self.publish_telemetry_as(self.state.as_str()).await
    }

    /// Publishes one final telemetry message labeled `terminating`,
    /// called on shutdown.
    pub async fn publish_final_telemetry(&mut self) -> Result<()> {
        self.state = ConsumerState::Terminating;
        self.publish_telemetry_as(ConsumerState::Terminating.as_str()).await
    }

    async fn publish_telemetry_as(&self, state: &str) -> Result<()> {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        let avg = if self.counters.processed > 0 {
            self.counters.duration_sum / self.counters.processed as f64
        } else {
            0.0
        };
        let rate = if elapsed > 0.0 { self.counters.processed as f64 / elapsed } else { 0.0 };

        let telemetry = ConsumerTelemetry {
            consumer_id: self.consumer_id.clone(),
            emitted_at: unix_timestamp(),
            scenarios_processed: self.counters.processed,
            last_scenario_duration: self.counters.last_duration,
            avg_duration: avg,
            processing_rate: rate,
            state: state.to_string(),
            uptime: elapsed,
            errors_total: self.counters.errors_total,
            retries_total: self.counters.retries_total,
            messages_to_dlq: self.counters.messages_to_dlq,
            errors_by_kind: self.counters.errors_by_kind.clone(),
        };

        self.client
            .publish(simmesh_broker::topology::STATS_CONSUMIDORES, &telemetry, DeliveryMode::Ephemeral)
            .await?;
        debug!(consumer_id = %self.consumer_id, processed = self.counters.processed, "telemetry published");
        Ok(())
    }
}

struct RawJson<'a>(&'a [u8]);

impl serde::Serialize for RawJson<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value: serde_json::Value = serde_json::from_slice(self.0).map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }
}
