//! The aggregator's mutable state: every ring buffer and derived
//! statistic, behind one lock.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use simmesh_model::{ConsumerTelemetry, Model, Payload, ProducerTelemetry, ScenarioResult};

use crate::ring::RingBuffer;
use crate::stats::{convergence_point, descriptive_stats, normality_tests, ConvergencePoint, DescriptiveStats, NormalityTests};

/// Capacities for every bounded buffer the aggregator keeps, mirroring
/// §4.F's documented defaults.
#[derive(Debug, Clone, Copy)]
pub struct Capacities {
    /// Capacity of `results_ring` (bare numeric values).
    pub results: usize,
    /// Capacity of `raw_results_ring` (full result messages).
    pub raw_results: usize,
    /// Capacity of the producer/consumer/convergence history rings.
    pub history: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self { results: 50_000, raw_results: 1_000, history: 100 }
    }
}

/// A trimmed-down view of the currently published model, mirroring the
/// original implementation's `modelo_info` summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// The published model's id.
    pub modelo_id: String,
    /// The published model's version string.
    pub version: String,
    /// Display name from the model's metadata.
    pub nombre: String,
    /// Free-form description from the model's metadata.
    pub descripcion: String,
    /// Number of declared stochastic variables.
    pub num_variables: usize,
    /// `"expresion"` or `"codigo"`, depending on the function payload.
    pub tipo_funcion: String,
    /// Source text, when the function payload is a single expression.
    pub expresion: Option<String>,
}

impl From<&Model> for ModelSnapshot {
    fn from(model: &Model) -> Self {
        let (tipo_funcion, expresion) = match &model.funcion {
            Payload::Expresion { expresion } => ("expresion".to_string(), Some(expresion.clone())),
            Payload::Codigo { .. } => ("codigo".to_string(), None),
        };
        Self {
            modelo_id: model.modelo_id.clone(),
            version: model.version.clone(),
            nombre: model.metadata.nombre.clone(),
            descripcion: model.metadata.descripcion.clone(),
            num_variables: model.variables.len(),
            tipo_funcion,
            expresion,
        }
    }
}

/// A deep-copied, serializable snapshot of the whole aggregator state,
/// handed to both the `/snapshot` HTTP route and JSON export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Most recent producer telemetry sample, if any has arrived.
    pub stats_productor: Option<ProducerTelemetry>,
    /// Most recent telemetry sample per consumer, keyed by `consumer_id`.
    pub stats_consumidores: BTreeMap<String, ConsumerTelemetry>,
    /// The currently published model, if captured yet.
    pub modelo: Option<ModelSnapshot>,
    /// Most recently sampled depth of each monitored queue.
    pub queue_sizes: BTreeMap<String, u32>,
    /// Number of results currently retained in `results_ring`.
    pub num_resultados: usize,
    /// Current descriptive statistics, if at least one result arrived.
    pub estadisticas: Option<DescriptiveStats>,
    /// Current normality test outcomes, if `n >= 20`.
    pub tests_normalidad: Option<NormalityTests>,
    /// The full convergence trace.
    pub historico_convergencia: Vec<ConvergencePoint>,
    /// Unix timestamp of the last completed poll cycle.
    pub last_update: Option<f64>,
}

struct Inner {
    stats_productor: Option<ProducerTelemetry>,
    historico_productor: RingBuffer<ProducerTelemetry>,
    stats_consumidores: BTreeMap<String, ConsumerTelemetry>,
    historico_consumidores: BTreeMap<String, RingBuffer<ConsumerTelemetry>>,
    modelo: Option<ModelSnapshot>,
    queue_sizes: BTreeMap<String, u32>,
    results: RingBuffer<f64>,
    raw_results: RingBuffer<ScenarioResult>,
    estadisticas: Option<DescriptiveStats>,
    tests_normalidad: Option<NormalityTests>,
    historico_convergencia: RingBuffer<ConvergencePoint>,
    last_update: Option<f64>,
}

/// Thread-safe aggregator state. All mutation goes through one mutex;
/// every read returns a deep copy, never a reference into the lock.
pub struct AggregatorState {
    inner: Mutex<Inner>,
    capacities: Capacities,
}

impl AggregatorState {
    /// Builds empty state with the given ring capacities.
    pub fn new(capacities: Capacities) -> Self {
        Self {
            inner: Mutex::new(Inner {
                stats_productor: None,
                historico_productor: RingBuffer::new(capacities.history),
                stats_consumidores: BTreeMap::new(),
                historico_consumidores: BTreeMap::new(),
                modelo: None,
                queue_sizes: BTreeMap::new(),
                results: RingBuffer::new(capacities.results),
                raw_results: RingBuffer::new(capacities.raw_results),
                estadisticas: None,
                tests_normalidad: None,
                historico_convergencia: RingBuffer::new(capacities.history),
                last_update: None,
            }),
            capacities,
        }
    }

    /// Records one producer telemetry sample.
    pub fn record_producer_stats(&self, telemetry: ProducerTelemetry) {
        let mut inner = self.inner.lock();
        inner.historico_productor.push(telemetry.clone());
        inner.stats_productor = Some(telemetry);
    }

    /// Records one consumer telemetry sample, indexed by `consumer_id`.
    pub fn record_consumer_stats(&self, telemetry: ConsumerTelemetry) {
        let mut inner = self.inner.lock();
        let id = telemetry.consumer_id.clone();
        inner
            .historico_consumidores
            .entry(id.clone())
            .or_insert_with(|| RingBuffer::new(self.capacities.history))
            .push(telemetry.clone());
        inner.stats_consumidores.insert(id, telemetry);
    }

    /// Records the model snapshot, if not already known.
    pub fn set_model_if_absent(&self, model: &Model) {
        let mut inner = self.inner.lock();
        if inner.modelo.is_none() {
            inner.modelo = Some(ModelSnapshot::from(model));
        }
    }

    /// Whether the model snapshot has already been captured.
    pub fn has_model(&self) -> bool {
        self.inner.lock().modelo.is_some()
    }

    /// Replaces the queue-depth snapshot.
    pub fn set_queue_sizes(&self, sizes: BTreeMap<String, u32>) {
        self.inner.lock().queue_sizes = sizes;
    }

    /// Records one result, recomputing descriptive statistics,
    /// convergence and normality whenever at least one result arrived
    /// this cycle. `now` is the caller-supplied Unix timestamp (the
    /// aggregator core never reads the clock itself).
    pub fn record_result(&self, result: ScenarioResult, now: f64) {
        let mut inner = self.inner.lock();
        inner.results.push(result.resultado);
        inner.raw_results.push(result);
        self.recompute_locked(&mut inner, now);
    }

    fn recompute_locked(&self, inner: &mut Inner, now: f64) {
        let mut sorted: Vec<f64> = inner.results.iter().copied().collect();
        if sorted.is_empty() {
            inner.estadisticas = None;
            inner.tests_normalidad = None;
            return;
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

        inner.estadisticas = Some(descriptive_stats(&sorted));
        if let Some(point) = convergence_point(&sorted, now) {
            inner.historico_convergencia.push(point);
        }
        inner.tests_normalidad = normality_tests(&sorted);
    }

    /// Marks this poll cycle complete, stamping `now` as the last-update
    /// time.
    pub fn mark_updated(&self, now: f64) {
        self.inner.lock().last_update = Some(now);
    }

    /// A deep-copied snapshot of the whole state.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock();
        Snapshot {
            stats_productor: inner.stats_productor.clone(),
            stats_consumidores: inner.stats_consumidores.clone(),
            modelo: inner.modelo.clone(),
            queue_sizes: inner.queue_sizes.clone(),
            num_resultados: inner.results.len(),
            estadisticas: inner.estadisticas.clone(),
            tests_normalidad: inner.tests_normalidad.clone(),
            historico_convergencia: inner.historico_convergencia.to_vec(),
            last_update: inner.last_update,
        }
    }

    /// A deep copy of every retained bare result value, oldest first.
    pub fn results(&self) -> Vec<f64> {
        self.inner.lock().results.to_vec()
    }

    /// A deep copy of every retained full result message, oldest first.
    pub fn raw_results(&self) -> Vec<ScenarioResult> {
        self.inner.lock().raw_results.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: u64, value: f64) -> ScenarioResult {
        ScenarioResult { escenario_id: id, consumer_id: "c1".to_string(), resultado: value, tiempo_ejecucion: 0.01 }
    }

    #[test]
    fn results_ring_never_exceeds_capacity() {
        let state = AggregatorState::new(Capacities { results: 10, raw_results: 5, history: 5 });
        for i in 0..100 {
            state.record_result(result(i, i as f64), 0.0);
        }
        assert_eq!(state.results().len(), 10);
        assert_eq!(state.raw_results().len(), 5);
    }

    #[test]
    fn snapshot_has_no_statistics_when_empty() {
        let state = AggregatorState::new(Capacities::default());
        let snap = state.snapshot();
        assert!(snap.estadisticas.is_none());
        assert_eq!(snap.num_resultados, 0);
    }

    #[test]
    fn statistics_populate_after_first_result() {
        let state = AggregatorState::new(Capacities::default());
        state.record_result(result(1, 3.5), 100.0);
        let snap = state.snapshot();
        assert_eq!(snap.num_resultados, 1);
        let stats = snap.estadisticas.expect("stats present");
        assert!((stats.mean - 3.5).abs() < 1e-9);
    }
}
