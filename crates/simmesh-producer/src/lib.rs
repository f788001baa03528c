//! Producer: reads a model file, publishes it, and generates the
//! scenario stream that drives the simulation fabric.
//!
//! Responsibilities, mirroring the original implementation's producer:
//!
//! 1. Parse the model from its source file.
//! 2. Declare the broker topology and publish the model.
//! 3. Generate `numero_escenarios` unique scenarios.
//! 4. Publish each scenario, with throttled telemetry in between.

#![deny(missing_docs)]

mod config;
mod error;

pub use config::ProducerArgs;
pub use error::{ProducerError, Result};

use std::collections::BTreeMap;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use simmesh_broker::{BrokerClient, DeliveryMode};
use simmesh_model::{parse_model_file, stamp_model, Model, ProducerTelemetry, Scenario};
use simmesh_sampler::DistributionGenerator;
use tracing::info;

fn unix_timestamp() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

/// Drives one producer run end to end against an already-connected
/// [`BrokerClient`].
pub struct Producer<'a> {
    client: &'a BrokerClient,
    model: Model,
    generator: DistributionGenerator,
    generated: u64,
    started_at: Instant,
}

impl<'a> Producer<'a> {
    /// Loads `model_path`, applying `num_escenarios_override` if given, and
    /// seeds the sampler from the model's declared seed (or OS entropy if
    /// absent).
    pub fn load(client: &'a BrokerClient, model_path: &Path, num_escenarios_override: Option<u64>) -> Result<Self> {
        let mut parsed = parse_model_file(model_path).map_err(|err| match err {
            simmesh_model::ModelError::Io(source) => ProducerError::Io { path: model_path.display().to_string(), source },
            other => ProducerError::Model(other),
        })?;

        if let Some(n) = num_escenarios_override {
            parsed.simulacion.numero_escenarios = n;
        }

        let seed = parsed.simulacion.semilla_aleatoria.map(|s| s as u64);
        let generator = DistributionGenerator::new(seed);
        let model = stamp_model(parsed, unix_timestamp());

        info!(modelo_id = %model.modelo_id, version = %model.version, "model loaded");

        Ok(Self { client, model, generator, generated: 0, started_at: Instant::now() })
    }

    /// The loaded model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Declares the fixed topology, then purges and republishes the model —
    /// the producer's own model-replacement responsibility (see the
    /// resolved open question on model-replacement in the design notes).
    pub async fn publish_model(&self) -> Result<()> {
        self.client.declare_topology().await?;
        self.client.purge_and_republish(&self.model).await?;
        info!(modelo_id = %self.model.modelo_id, "model published");
        Ok(())
    }

    /// Generates and publishes every scenario, emitting throttled
    /// telemetry every `stats_interval` and a progress log line every 10%.
    /// Stops early, mid-run, if `shutdown` reports a requested shutdown.
    pub async fn run_scenarios(
        &mut self,
        stats_interval: Duration,
        shutdown: &simmesh_core::shutdown::ShutdownToken,
    ) -> Result<()> {
        let total = self.model.simulacion.numero_escenarios;
        let progress_step = (total / 10).max(1);
        let mut last_stats_at = Instant::now();

        for i in 0..total {
            if shutdown.is_shutdown() {
                info!(generated = self.generated, total, "shutdown requested, stopping scenario generation");
                break;
            }

            let scenario = self.generate_scenario(i)?;
            self.client.publish(simmesh_broker::topology::ESCENARIOS, &scenario, DeliveryMode::Persistent).await?;
            self.generated += 1;

            if last_stats_at.elapsed() >= stats_interval {
                self.publish_stats("activo").await?;
                last_stats_at = Instant::now();
            }

            if (i + 1) % progress_step == 0 {
                let pct = (i + 1) as f64 / total as f64 * 100.0;
                info!(generated = i + 1, total, "progress: {:.1}%", pct);
            }
        }

        self.publish_stats("completado").await?;
        info!(
            modelo_id = %self.model.modelo_id,
            generated = self.generated,
            elapsed_secs = self.started_at.elapsed().as_secs_f64(),
            "producer run complete"
        );
        Ok(())
    }

    fn generate_scenario(&mut self, escenario_id: u64) -> Result<Scenario> {
        let mut valores = BTreeMap::new();
        for variable in &self.model.variables {
            let value = self.generator.generate(variable.distribucion, &variable.parametros, variable.tipo)?;
            valores.insert(variable.nombre.clone(), value);
        }
        Ok(Scenario { escenario_id, timestamp: unix_timestamp(), valores })
    }

    async fn publish_stats(&self, estado: &str) -> Result<()> {
        let total = self.model.simulacion.numero_escenarios;
        let elapsed = self.started_at.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 { self.generated as f64 / elapsed } else { 0.0 };
        let remaining = total.saturating_sub(self.generated);
        let eta = if rate > 0.0 { remaining as f64 / rate } else { 0.0 };

        let telemetry = ProducerTelemetry {
            timestamp: unix_timestamp(),
            escenarios_generados: self.generated,
            escenarios_totales: total,
            progreso: if total > 0 { self.generated as f64 / total as f64 } else { 1.0 },
            tasa_generacion: rate,
            tiempo_transcurrido: elapsed,
            tiempo_estimado_restante: eta,
            estado: estado.to_string(),
        };

        self.client
            .publish(simmesh_broker::topology::STATS_PRODUCTOR, &telemetry, DeliveryMode::Ephemeral)
            .await?;
        Ok(())
    }
}
