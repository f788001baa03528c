//! Hand-written line scanner for the `.ini`-shaped model file format.
//!
//! The `[VARIABLES]` section is a free-form parameter list per line and the
//! `[FUNCION]` section can carry a multi-line, indentation-continued code
//! block — neither is representable by a generic `key = value` INI grammar,
//! so this parser walks the file itself rather than deserializing through a
//! generic ini crate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ModelError, Result};
use crate::types::{DistributionTag, Metadata, NumericKind, Payload, SimulationSpec, Variable};

const REQUIRED_SECTIONS: [&str; 4] = ["METADATA", "VARIABLES", "FUNCION", "SIMULACION"];

/// A model file parsed into its four sections, prior to timestamp/id
/// stamping (that happens in the producer, which knows the publish time).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedModel {
    /// Metadata section contents.
    pub metadata: Metadata,
    /// Parsed `version` field (kept alongside metadata, mirroring the
    /// original format where version lives in `[METADATA]`).
    pub version: String,
    /// Ordered variable declarations.
    pub variables: Vec<Variable>,
    /// The function payload.
    pub funcion: Payload,
    /// Simulation-run parameters.
    pub simulacion: SimulationSpec,
}

/// Parses a model file at `path`.
pub fn parse_model_file(path: impl AsRef<Path>) -> Result<ParsedModel> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ModelError::NotFound(PathBuf::from(path)));
    }
    let source = std::fs::read_to_string(path)?;
    parse_model_str(&source)
}

/// Parses model file contents already read into memory.
pub fn parse_model_str(source: &str) -> Result<ParsedModel> {
    let sections = split_sections(source);
    validate_sections(&sections)?;

    let (metadata, version) = parse_metadata(&sections)?;
    let variables = parse_variables(source)?;
    let funcion = parse_funcion(source, &sections)?;
    let simulacion = parse_simulacion(&sections)?;

    Ok(ParsedModel {
        metadata,
        version,
        variables,
        funcion,
        simulacion,
    })
}

/// Raw `key -> value` pairs per section, in file order. Values are the
/// right-hand side of the first `=` on a line, trimmed; inline `#`
/// comments are stripped the same way `configparser` does with
/// `inline_comment_prefixes='#'`.
type Sections = BTreeMap<String, Vec<(String, String)>>;

fn split_sections(source: &str) -> Sections {
    let mut sections: Sections = BTreeMap::new();
    let mut current: Option<String> = None;

    for raw_line in source.lines() {
        let line = strip_inline_comment(raw_line).trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].to_string();
            sections.entry(name.clone()).or_default();
            current = Some(name);
            continue;
        }
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(section) = &current {
            if let Some(eq) = line.find('=') {
                let key = line[..eq].trim().to_string();
                let value = line[eq + 1..].trim().to_string();
                sections.entry(section.clone()).or_default().push((key, value));
            }
        }
    }

    sections
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn validate_sections(sections: &Sections) -> Result<()> {
    for required in REQUIRED_SECTIONS {
        if !sections.contains_key(required) {
            return Err(ModelError::MissingSection(required));
        }
    }
    Ok(())
}

fn section_get<'a>(sections: &'a Sections, section: &str, key: &str) -> Option<&'a str> {
    sections
        .get(section)
        .and_then(|entries| entries.iter().find(|(k, _)| k == key))
        .map(|(_, v)| v.as_str())
}

fn parse_metadata(sections: &Sections) -> Result<(Metadata, String)> {
    let nombre = section_get(sections, "METADATA", "nombre")
        .ok_or(ModelError::MissingField {
            section: "METADATA",
            field: "nombre",
        })?
        .to_string();
    let version = section_get(sections, "METADATA", "version")
        .ok_or(ModelError::MissingField {
            section: "METADATA",
            field: "version",
        })?
        .to_string();
    let descripcion = section_get(sections, "METADATA", "descripcion")
        .unwrap_or("")
        .to_string();
    let autor = section_get(sections, "METADATA", "autor").unwrap_or("").to_string();
    let fecha_creacion = section_get(sections, "METADATA", "fecha_creacion")
        .unwrap_or("")
        .to_string();

    Ok((
        Metadata {
            nombre,
            descripcion,
            autor,
            fecha_creacion,
        },
        version,
    ))
}

fn parse_variables(source: &str) -> Result<Vec<Variable>> {
    let mut variables = Vec::new();
    let mut in_variables = false;

    for (line_num, raw_line) in source.lines().enumerate() {
        let line_num = line_num + 1;
        let line = raw_line.trim();

        if line == "[VARIABLES]" {
            in_variables = true;
            continue;
        }
        if in_variables && line.starts_with('[') {
            break;
        }
        if in_variables && !line.is_empty() && !line.starts_with('#') {
            let variable = parse_variable_line(line).map_err(|message| ModelError::InvalidVariable {
                line: line_num,
                message,
            })?;
            variables.push(variable);
        }
    }

    if variables.is_empty() {
        return Err(ModelError::NoVariables);
    }

    Ok(variables)
}

fn parse_variable_line(line: &str) -> std::result::Result<Variable, String> {
    let parts: Vec<&str> = line.split(',').map(|p| p.trim()).collect();
    if parts.len() < 3 {
        return Err("expected: nombre, tipo, distribucion, parametros...".to_string());
    }

    let nombre = parts[0].to_string();
    let tipo_raw = parts[1].to_lowercase();
    let distribucion_raw = parts[2].to_lowercase();

    let tipo = NumericKind::parse(&tipo_raw).ok_or_else(|| {
        format!("tipo '{tipo_raw}' inválido, válidos: float, int")
    })?;
    let distribucion = DistributionTag::parse(&distribucion_raw)
        .ok_or_else(|| format!("distribución '{distribucion_raw}' no soportada"))?;

    let mut parametros = BTreeMap::new();
    for param in &parts[3..] {
        if param.is_empty() {
            continue;
        }
        let (name, value) = param
            .split_once('=')
            .ok_or_else(|| format!("parámetro inválido: '{param}', esperado param=valor"))?;
        let name = name.trim().to_string();
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("valor del parámetro '{name}' no es numérico: '{value}'"))?;
        parametros.insert(name, value);
    }

    Ok(Variable {
        nombre,
        tipo,
        distribucion,
        parametros,
    })
}

fn parse_funcion(source: &str, sections: &Sections) -> Result<Payload> {
    let tipo = section_get(sections, "FUNCION", "tipo")
        .ok_or(ModelError::MissingField {
            section: "FUNCION",
            field: "tipo",
        })?
        .to_lowercase();

    match tipo.as_str() {
        "expresion" => {
            let expresion = section_get(sections, "FUNCION", "expresion")
                .ok_or(ModelError::MissingField {
                    section: "FUNCION",
                    field: "expresion",
                })?
                .to_string();
            if expresion.is_empty() {
                return Err(ModelError::EmptyExpression);
            }
            Ok(Payload::Expresion { expresion })
        }
        "codigo" => {
            let codigo = parse_codigo_multilinea(source)?;
            if codigo.is_empty() {
                return Err(ModelError::EmptyCode);
            }
            if !assigns_resultado(&codigo) {
                return Err(ModelError::MissingResultAssignment);
            }
            Ok(Payload::Codigo { codigo })
        }
        other => Err(ModelError::InvalidFunctionType(other.to_string())),
    }
}

/// Scans `[FUNCION]` for a `codigo =` marker and collects every following
/// line (until the next section) as source, then dedents the block,
/// preserving relative indentation the way the original parser does.
fn parse_codigo_multilinea(source: &str) -> Result<String> {
    let mut lines = Vec::new();
    let mut in_funcion = false;
    let mut found_marker = false;

    for raw_line in source.lines() {
        let stripped = raw_line.trim();

        if stripped == "[FUNCION]" {
            in_funcion = true;
            continue;
        }
        if in_funcion && stripped.starts_with('[') {
            break;
        }
        if in_funcion && !found_marker {
            if stripped.starts_with("codigo") {
                if let Some(eq) = stripped.find('=') {
                    let rhs = stripped[eq + 1..].trim();
                    if !rhs.is_empty() {
                        lines.push(rhs.to_string());
                    }
                }
                found_marker = true;
                continue;
            }
        }
        if in_funcion && found_marker {
            let is_other_param = stripped.contains('=')
                && !raw_line.starts_with(' ')
                && !raw_line.starts_with('\t');
            if is_other_param {
                continue;
            }
            if stripped.starts_with('#') || stripped.starts_with(';') {
                continue;
            }
            lines.push(raw_line.trim_end().to_string());
        }
    }

    if !found_marker {
        return Err(ModelError::MissingCodeMarker);
    }

    let joined = lines.join("\n");
    Ok(dedent(&joined).trim().to_string())
}

/// Removes the common leading whitespace from every non-blank line while
/// preserving indentation relative to that minimum.
fn dedent(code: &str) -> String {
    if code.is_empty() {
        return code.to_string();
    }

    let lines: Vec<&str> = code.split('\n').collect();
    let min_indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min();

    let Some(min_indent) = min_indent else {
        return code.to_string();
    };

    lines
        .into_iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                line.chars().skip(min_indent).collect::<String>()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cheap syntactic check for an assignment (or augmented assignment) to a
/// bare name `resultado`, without a full parser — adequate for the
/// restricted code dialect the sandbox crate executes.
fn assigns_resultado(code: &str) -> bool {
    code.lines().any(|line| {
        let line = line.trim();
        let Some(eq) = line.find('=') else {
            return false;
        };
        // Skip `==`, `<=`, `>=`, `!=` and augmented-assignment operators are
        // allowed (`+=` etc.) as long as the target name matches.
        if line[eq + 1..].starts_with('=') {
            return false;
        }
        let mut target = line[..eq].trim();
        for op in ["+", "-", "*", "/", "%"] {
            if let Some(stripped) = target.strip_suffix(op) {
                target = stripped.trim_end();
            }
        }
        target == "resultado"
    })
}

fn parse_simulacion(sections: &Sections) -> Result<SimulationSpec> {
    let numero_raw = section_get(sections, "SIMULACION", "numero_escenarios").ok_or(
        ModelError::MissingField {
            section: "SIMULACION",
            field: "numero_escenarios",
        },
    )?;
    let numero_escenarios: i64 = numero_raw
        .parse()
        .map_err(|_| ModelError::InvalidScenarioCount(numero_raw.to_string()))?;
    if numero_escenarios <= 0 {
        return Err(ModelError::InvalidScenarioCount(numero_raw.to_string()));
    }

    let semilla_aleatoria = match section_get(sections, "SIMULACION", "semilla_aleatoria") {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ModelError::InvalidSeed(raw.to_string()))?,
        ),
        None => None,
    };

    Ok(SimulationSpec {
        numero_escenarios: numero_escenarios as u64,
        semilla_aleatoria,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_MODEL: &str = r#"
[METADATA]
nombre = suma_normal
version = 1.0
descripcion = ejemplo simple
autor = equipo
fecha_creacion = 2024-01-01

[VARIABLES]
x, float, normal, media=0, std=1
y, float, uniform, min=0, max=10

[FUNCION]
tipo = expresion
expresion = x + y

[SIMULACION]
numero_escenarios = 1000
semilla_aleatoria = 42
"#;

    const CODE_MODEL: &str = r#"
[METADATA]
nombre = con_codigo
version = 1.0

[VARIABLES]
x, float, normal, media=0, std=1
y, float, normal, media=0, std=1

[FUNCION]
tipo = codigo
codigo =
    suma = x + y
    producto = x * y
    resultado = suma * producto

[SIMULACION]
numero_escenarios = 500
"#;

    #[test]
    fn parses_metadata_and_expression() {
        let parsed = parse_model_str(SIMPLE_MODEL).unwrap();
        assert_eq!(parsed.metadata.nombre, "suma_normal");
        assert_eq!(parsed.version, "1.0");
        assert_eq!(parsed.variables.len(), 2);
        assert_eq!(parsed.simulacion.numero_escenarios, 1000);
        assert_eq!(parsed.simulacion.semilla_aleatoria, Some(42));
        match parsed.funcion {
            Payload::Expresion { expresion } => assert_eq!(expresion, "x + y"),
            _ => panic!("expected expression payload"),
        }
    }

    #[test]
    fn parses_variable_parameters() {
        let parsed = parse_model_str(SIMPLE_MODEL).unwrap();
        let x = &parsed.variables[0];
        assert_eq!(x.nombre, "x");
        assert_eq!(x.tipo, NumericKind::Float);
        assert_eq!(x.distribucion, DistributionTag::Normal);
        assert_eq!(x.parametros.get("media"), Some(&0.0));
        assert_eq!(x.parametros.get("std"), Some(&1.0));
    }

    #[test]
    fn parses_multiline_code_and_dedents() {
        let parsed = parse_model_str(CODE_MODEL).unwrap();
        match parsed.funcion {
            Payload::Codigo { codigo } => {
                assert!(codigo.contains("resultado = suma * producto"));
                assert!(!codigo.starts_with(' '));
            }
            _ => panic!("expected code payload"),
        }
        assert_eq!(parsed.simulacion.semilla_aleatoria, None);
    }

    #[test]
    fn rejects_code_without_resultado() {
        let bad = CODE_MODEL.replace("resultado = suma * producto", "otro = suma * producto");
        let err = parse_model_str(&bad).unwrap_err();
        assert!(matches!(err, ModelError::MissingResultAssignment));
    }

    #[test]
    fn rejects_missing_section() {
        let bad = SIMPLE_MODEL.replace("[SIMULACION]", "[OTRO]");
        let err = parse_model_str(&bad).unwrap_err();
        assert!(matches!(err, ModelError::MissingSection("SIMULACION")));
    }

    #[test]
    fn rejects_unknown_distribution() {
        let bad = SIMPLE_MODEL.replace("normal, media=0, std=1", "martian, media=0, std=1");
        let err = parse_model_str(&bad).unwrap_err();
        assert!(matches!(err, ModelError::InvalidVariable { .. }));
    }

    #[test]
    fn rejects_nonpositive_scenario_count() {
        let bad = SIMPLE_MODEL.replace("numero_escenarios = 1000", "numero_escenarios = 0");
        let err = parse_model_str(&bad).unwrap_err();
        assert!(matches!(err, ModelError::InvalidScenarioCount(_)));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let err = parse_model_file("/nonexistent/path/model.ini").unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }
}
