//! Model, scenario and telemetry types shared across the simulation fabric,
//! plus the hand-written parser for the `.ini`-shaped model file format.

#![deny(missing_docs)]

mod error;
mod parser;
mod types;

pub use error::{ModelError, Result};
pub use parser::{parse_model_file, parse_model_str, ParsedModel};
pub use types::{
    ConsumerTelemetry, DistributionTag, Metadata, Model, NumericKind, Payload, ProducerTelemetry,
    Scenario, ScenarioResult, SimulationSpec, Variable,
};

/// Builds a wire-ready [`Model`] from a [`ParsedModel`], stamping the id and
/// publish timestamp the way the producer does at publish time: `modelo_id`
/// is `"{nombre}_{unix_timestamp}"`.
pub fn stamp_model(parsed: ParsedModel, timestamp: f64) -> Model {
    let modelo_id = format!("{}_{}", parsed.metadata.nombre, timestamp as i64);
    Model {
        modelo_id,
        version: parsed.version,
        timestamp,
        metadata: parsed.metadata,
        variables: parsed.variables,
        funcion: parsed.funcion,
        simulacion: parsed.simulacion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stamp_model_builds_expected_id() {
        let parsed = parse_model_str(
            r#"
[METADATA]
nombre = ejemplo
version = 1.0

[VARIABLES]
x, float, normal, media=0, std=1

[FUNCION]
tipo = expresion
expresion = x

[SIMULACION]
numero_escenarios = 10
"#,
        )
        .unwrap();

        let model = stamp_model(parsed, 1_700_000_000.0);
        assert_eq!(model.modelo_id, "ejemplo_1700000000");
        assert_eq!(model.simulacion.numero_escenarios, 10);
    }
}
