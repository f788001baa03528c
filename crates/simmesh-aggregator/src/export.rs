//! Multi-format export of the current snapshot: one JSON document and
//! three CSV flavors (results, statistics, convergence).

use serde::Serialize;

use crate::state::Snapshot;
use crate::AggregatorError;

#[derive(Serialize)]
struct JsonExport<'a> {
    exported_at: f64,
    n: usize,
    modelo: &'a Option<crate::state::ModelSnapshot>,
    estadisticas: &'a Option<crate::stats::DescriptiveStats>,
    tests_normalidad: &'a Option<crate::stats::NormalityTests>,
    resultados: &'a [f64],
    resultados_detallados: &'a [simmesh_model::ScenarioResult],
    convergencia: &'a [crate::stats::ConvergencePoint],
}

/// Renders the full JSON export document: metadata, statistics,
/// normality tests, and every retained result (bare and detailed).
pub fn to_json(
    snapshot: &Snapshot,
    results: &[f64],
    raw_results: &[simmesh_model::ScenarioResult],
    exported_at: f64,
) -> Result<String, AggregatorError> {
    let doc = JsonExport {
        exported_at,
        n: snapshot.num_resultados,
        modelo: &snapshot.modelo,
        estadisticas: &snapshot.estadisticas,
        tests_normalidad: &snapshot.tests_normalidad,
        resultados: results,
        resultados_detallados: raw_results,
        convergencia: &snapshot.historico_convergencia,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Renders the detailed-results CSV: one row per retained result, with
/// a commented descriptive-statistics header, matching the original
/// implementation's export layout.
pub fn results_csv(snapshot: &Snapshot, raw_results: &[simmesh_model::ScenarioResult]) -> Result<String, AggregatorError> {
    let mut out = Vec::new();
    if let Some(stats) = &snapshot.estadisticas {
        out.extend_from_slice(
            format!(
                "# Estadisticas Descriptivas\n# n: {}\n# Media: {:.6}\n# Mediana: {:.6}\n# Desviacion Estandar: {:.6}\n# Minimo: {:.6}\n# Maximo: {:.6}\n#\n",
                stats.n, stats.mean, stats.median, stats.std_dev, stats.min, stats.max
            )
            .as_bytes(),
        );
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["escenario_id", "resultado", "consumer_id", "tiempo_ejecucion"])?;
    for row in raw_results {
        writer.write_record([
            row.escenario_id.to_string(),
            format!("{:.6}", row.resultado),
            row.consumer_id.clone(),
            format!("{:.6}", row.tiempo_ejecucion),
        ])?;
    }
    out.extend_from_slice(&writer.into_inner().map_err(|e| AggregatorError::Csv(e.to_string()))?);
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// Renders the `statistic, value` CSV.
pub fn stats_csv(snapshot: &Snapshot) -> Result<String, AggregatorError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["statistic", "value"])?;
    if let Some(stats) = &snapshot.estadisticas {
        let rows: [(&str, f64); 11] = [
            ("n", stats.n as f64),
            ("mean", stats.mean),
            ("median", stats.median),
            ("variance", stats.variance),
            ("std_dev", stats.std_dev),
            ("min", stats.min),
            ("max", stats.max),
            ("p25", stats.p25),
            ("p75", stats.p75),
            ("p95", stats.p95),
            ("p99", stats.p99),
        ];
        for (name, value) in rows {
            writer.write_record([name.to_string(), format!("{:.6}", value)])?;
        }
        writer.write_record(["ci95_lower", &format!("{:.6}", stats.mean - stats.ci95_half_width)])?;
        writer.write_record(["ci95_upper", &format!("{:.6}", stats.mean + stats.ci95_half_width)])?;
    }
    let bytes = writer.into_inner().map_err(|e| AggregatorError::Csv(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Renders the `n, running_mean, running_variance, timestamp` CSV.
pub fn convergence_csv(snapshot: &Snapshot) -> Result<String, AggregatorError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(["n", "running_mean", "running_variance", "timestamp"])?;
    for point in &snapshot.historico_convergencia {
        writer.write_record([
            point.n.to_string(),
            format!("{:.6}", point.running_mean),
            format!("{:.6}", point.running_variance),
            format!("{:.6}", point.timestamp),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| AggregatorError::Csv(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AggregatorState, Capacities};

    #[test]
    fn json_export_round_trips_through_serde() {
        let state = AggregatorState::new(Capacities::default());
        let snap = state.snapshot();
        let json = to_json(&snap, &state.results(), &state.raw_results(), 1_700_000_000.0).unwrap();
        assert!(json.contains("\"n\": 0"));
    }

    #[test]
    fn stats_csv_has_header_even_when_empty() {
        let state = AggregatorState::new(Capacities::default());
        let csv = stats_csv(&state.snapshot()).unwrap();
        assert!(csv.starts_with("statistic,value"));
    }

    #[test]
    fn convergence_csv_has_header_even_when_empty() {
        let state = AggregatorState::new(Capacities::default());
        let csv = convergence_csv(&state.snapshot()).unwrap();
        assert!(csv.starts_with("n,running_mean,running_variance,timestamp"));
    }
}
