use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Declared numeric type of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    /// `float` in the model file.
    Float,
    /// `int` in the model file; draws are rounded to the nearest integer.
    Int,
}

impl NumericKind {
    /// Parses the `kind` token from a `[VARIABLES]` line.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "float" => Some(Self::Float),
            "int" => Some(Self::Int),
            _ => None,
        }
    }
}

/// One of the six supported sampling distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionTag {
    /// `normal(mean, std)`
    Normal,
    /// `uniform(min, max)`
    Uniform,
    /// `exponential(lambda | scale)`
    Exponential,
    /// `lognormal(mu, sigma)`
    Lognormal,
    /// `triangular(left, mode, right)`
    Triangular,
    /// `binomial(n, p)`
    Binomial,
}

impl DistributionTag {
    /// Parses the `distribution` token from a `[VARIABLES]` line.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "normal" => Some(Self::Normal),
            "uniform" => Some(Self::Uniform),
            "exponential" => Some(Self::Exponential),
            "lognormal" => Some(Self::Lognormal),
            "triangular" => Some(Self::Triangular),
            "binomial" => Some(Self::Binomial),
            _ => None,
        }
    }

    /// Canonical wire name, as used in the model file and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Uniform => "uniform",
            Self::Exponential => "exponential",
            Self::Lognormal => "lognormal",
            Self::Triangular => "triangular",
            Self::Binomial => "binomial",
        }
    }
}

/// A single stochastic variable declared in `[VARIABLES]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name, used as a key in scenario bindings.
    pub nombre: String,
    /// Declared numeric kind.
    pub tipo: NumericKind,
    /// Sampling distribution.
    pub distribucion: DistributionTag,
    /// Distribution parameters, e.g. `media`, `std`, `min`, `max`.
    pub parametros: BTreeMap<String, f64>,
}

/// Descriptive metadata carried by a [`Model`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Model display name.
    pub nombre: String,
    /// Free-form description.
    #[serde(default)]
    pub descripcion: String,
    /// Author.
    #[serde(default)]
    pub autor: String,
    /// Creation date, as written in the model file (not parsed further).
    #[serde(default)]
    pub fecha_creacion: String,
}

/// The payload a consumer evaluates once per scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum Payload {
    /// A single arithmetic expression, evaluated by the B1 evaluator.
    Expresion {
        /// Source text of the expression.
        expresion: String,
    },
    /// A restricted multi-line code block, evaluated by the B2 interpreter.
    Codigo {
        /// Source text of the code block, dedented.
        codigo: String,
    },
}

/// Simulation-run parameters from `[SIMULACION]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationSpec {
    /// Number of scenarios to generate; must be positive.
    pub numero_escenarios: u64,
    /// Optional RNG seed; `None` means nondeterministic.
    pub semilla_aleatoria: Option<i64>,
}

/// A fully parsed and validated model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Identifier published on the wire, e.g. `"{nombre}_{timestamp}"`.
    pub modelo_id: String,
    /// Model version string, copied from `[METADATA] version`.
    pub version: String,
    /// Unix timestamp (seconds) at which this model was published.
    pub timestamp: f64,
    /// Descriptive metadata.
    pub metadata: Metadata,
    /// Ordered list of stochastic variables.
    pub variables: Vec<Variable>,
    /// The function payload to evaluate per scenario.
    pub funcion: Payload,
    /// Simulation-run parameters.
    pub simulacion: SimulationSpec,
}

/// A single generated scenario, ready to publish to the scenario queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Monotonically increasing id, unique within one model publication.
    pub escenario_id: u64,
    /// Unix timestamp (seconds) at which this scenario was generated.
    pub timestamp: f64,
    /// Sampled values keyed by variable name.
    pub valores: BTreeMap<String, f64>,
}

/// The compact result message published by a consumer.
///
/// Deliberately narrower than the original implementation's result
/// message: no timestamp, no embedded model metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// The scenario this result was computed from.
    pub escenario_id: u64,
    /// Id of the consumer that produced this result.
    pub consumer_id: String,
    /// The evaluated numeric value.
    pub resultado: f64,
    /// Wall-clock seconds spent evaluating the payload.
    pub tiempo_ejecucion: f64,
}

/// Throttled telemetry published by the producer while generating scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerTelemetry {
    /// Unix timestamp (seconds) this sample was emitted at.
    pub timestamp: f64,
    /// Scenarios emitted so far.
    pub escenarios_generados: u64,
    /// Total scenarios this run will emit.
    pub escenarios_totales: u64,
    /// `escenarios_generados / escenarios_totales`, in `[0, 1]`.
    pub progreso: f64,
    /// Scenarios emitted per second, smoothed.
    pub tasa_generacion: f64,
    /// Seconds elapsed since generation started.
    pub tiempo_transcurrido: f64,
    /// Estimated seconds remaining at the current rate.
    pub tiempo_estimado_restante: f64,
    /// `"activo"` while generating, `"completado"` once done.
    pub estado: String,
}

/// Throttled telemetry published by a consumer while processing scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerTelemetry {
    /// Id of the consumer emitting this sample.
    pub consumer_id: String,
    /// Unix timestamp (seconds) this sample was emitted at.
    pub emitted_at: f64,
    /// Scenarios successfully processed so far.
    pub scenarios_processed: u64,
    /// Duration of the most recently processed scenario, in seconds.
    pub last_scenario_duration: f64,
    /// Running average processing duration, in seconds.
    pub avg_duration: f64,
    /// Scenarios processed per second, smoothed.
    pub processing_rate: f64,
    /// Current state machine state, e.g. `"processing"`.
    pub state: String,
    /// Seconds since the consumer started.
    pub uptime: f64,
    /// Total errors observed (recoverable and terminal).
    pub errors_total: u64,
    /// Total retry republications issued.
    pub retries_total: u64,
    /// Total messages routed to a dead-letter queue.
    pub messages_to_dlq: u64,
    /// Error counts keyed by a coarse error-kind label.
    pub errors_by_kind: BTreeMap<String, u64>,
}
