use super::ast::{AssignOp, Block, Stmt};
use crate::error::{Result, SandboxError};
use crate::expr::parse_expr;

/// Modules an `import`/`from ... import ...` statement is permitted to
/// name. Importing anything else raises [`SandboxError::Security`].
const ALLOWED_MODULES: [&str; 3] = ["math", "numpy", "np"];

/// Validates an `import <module>` or `from <module> import ...` line
/// against [`ALLOWED_MODULES`], without producing a statement: whitelisted
/// modules' functions are already exposed through the function table, so
/// the import itself has no further runtime effect once it passes.
fn check_import(content: &str) -> Result<()> {
    let modules: Vec<&str> = if let Some(rest) = content.strip_prefix("from ") {
        vec![rest.split_whitespace().next().unwrap_or("")]
    } else if let Some(rest) = content.strip_prefix("import ") {
        let head = rest.split(';').next().unwrap_or(rest);
        head.split(',').map(|entry| entry.trim().split_whitespace().next().unwrap_or("")).collect()
    } else {
        return Ok(());
    };

    for module in modules {
        if !ALLOWED_MODULES.contains(&module) {
            return Err(SandboxError::Security(format!("module '{module}' is not permitted")));
        }
    }
    Ok(())
}

struct Line {
    indent: usize,
    content: String,
}

fn split_lines(source: &str) -> Vec<Line> {
    source
        .lines()
        .filter_map(|raw| {
            let indent = raw.len() - raw.trim_start().len();
            let content = raw.trim().to_string();
            if content.is_empty() {
                None
            } else {
                Some(Line { indent, content })
            }
        })
        .collect()
}

/// Parses a restricted code block into a [`Block`] of statements.
pub fn parse_block(source: &str) -> Result<Block> {
    let lines = split_lines(source);
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    let base_indent = lines[0].indent;
    let (block, consumed) = parse_stmts(&lines, base_indent)?;
    if consumed != lines.len() {
        return Err(SandboxError::Syntax(format!(
            "unexpected indentation at line with content '{}'",
            lines[consumed].content
        )));
    }
    Ok(block)
}

fn parse_stmts(lines: &[Line], indent: usize) -> Result<(Block, usize)> {
    let mut stmts = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if line.indent < indent {
            break;
        }
        if line.indent > indent {
            return Err(SandboxError::Syntax(format!(
                "unexpected indentation before '{}'",
                line.content
            )));
        }

        let content = line.content.as_str();

        if content.starts_with("import ") || content.starts_with("from ") {
            check_import(content)?;
            i += 1;
            continue;
        }

        if let Some(header) = content.strip_prefix("if ") {
            let cond_src = strip_colon(header)?;
            let cond = parse_expr(cond_src)?;
            i += 1;
            let (body, consumed) = parse_nested_block(lines, i, indent)?;
            i += consumed;

            let mut branches = vec![(cond, body)];
            loop {
                if i >= lines.len() || lines[i].indent != indent {
                    break;
                }
                if let Some(header) = lines[i].content.strip_prefix("elif ") {
                    let cond_src = strip_colon(header)?;
                    let cond = parse_expr(cond_src)?;
                    i += 1;
                    let (body, consumed) = parse_nested_block(lines, i, indent)?;
                    i += consumed;
                    branches.push((cond, body));
                } else {
                    break;
                }
            }

            let else_body = if i < lines.len() && lines[i].indent == indent && lines[i].content == "else:" {
                i += 1;
                let (body, consumed) = parse_nested_block(lines, i, indent)?;
                i += consumed;
                Some(body)
            } else {
                None
            };

            stmts.push(Stmt::If { branches, else_body });
            continue;
        }

        if let Some(header) = content.strip_prefix("while ") {
            let cond_src = strip_colon(header)?;
            let cond = parse_expr(cond_src)?;
            i += 1;
            let (body, consumed) = parse_nested_block(lines, i, indent)?;
            i += consumed;
            stmts.push(Stmt::While { cond, body });
            continue;
        }

        if let Some(header) = content.strip_prefix("for ") {
            let (var, start, stop, step) = parse_for_header(strip_colon(header)?)?;
            i += 1;
            let (body, consumed) = parse_nested_block(lines, i, indent)?;
            i += consumed;
            stmts.push(Stmt::For { var, start, stop, step, body });
            continue;
        }

        if content == "pass" {
            stmts.push(Stmt::Pass);
            i += 1;
            continue;
        }

        stmts.push(parse_assignment(content)?);
        i += 1;
    }

    Ok((stmts, i))
}

fn parse_nested_block(lines: &[Line], start: usize, parent_indent: usize) -> Result<(Block, usize)> {
    if start >= lines.len() || lines[start].indent <= parent_indent {
        return Err(SandboxError::Syntax("expected an indented block".into()));
    }
    let block_indent = lines[start].indent;
    parse_stmts(&lines[start..], block_indent)
}

fn strip_colon(header: &str) -> Result<&str> {
    header
        .trim()
        .strip_suffix(':')
        .map(str::trim)
        .ok_or_else(|| SandboxError::Syntax(format!("expected ':' at end of '{header}'")))
}

fn parse_for_header(
    header: &str,
) -> Result<(String, crate::expr::ast::Expr, crate::expr::ast::Expr, crate::expr::ast::Expr)> {
    let (var, rest) = header
        .split_once(" in ")
        .ok_or_else(|| SandboxError::Syntax(format!("expected 'for <name> in range(...)' in '{header}'")))?;
    let var = var.trim().to_string();
    let rest = rest.trim();
    let inner = rest
        .strip_prefix("range(")
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| SandboxError::Syntax(format!("expected 'range(...)' in 'for' header, got '{rest}'")))?;

    let args: Vec<&str> = split_top_level_commas(inner);
    let (start_src, stop_src, step_src) = match args.as_slice() {
        [stop] => ("0", *stop, "1"),
        [start, stop] => (*start, *stop, "1"),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(SandboxError::Syntax(format!("range() expects 1-3 arguments, got '{inner}'"))),
    };

    Ok((var, parse_expr(start_src)?, parse_expr(stop_src)?, parse_expr(step_src)?))
}

fn split_top_level_commas(source: &str) -> Vec<&str> {
    let mut depth = 0i32;
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, c) in source.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(source[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    let tail = source[start..].trim();
    if !tail.is_empty() {
        parts.push(tail);
    }
    parts
}

fn parse_assignment(content: &str) -> Result<Stmt> {
    for (token, op) in [
        ("+=", AssignOp::Add),
        ("-=", AssignOp::Sub),
        ("*=", AssignOp::Mul),
        ("/=", AssignOp::Div),
    ] {
        if let Some((name, rhs)) = content.split_once(token) {
            return Ok(Stmt::Assign {
                name: name.trim().to_string(),
                op,
                value: parse_expr(rhs.trim())?,
            });
        }
    }

    let (name, rhs) = content
        .split_once('=')
        .ok_or_else(|| SandboxError::Syntax(format!("expected an assignment, got '{content}'")))?;
    if rhs.starts_with('=') {
        return Err(SandboxError::Syntax(format!("'{content}' is a comparison, not a statement")));
    }
    Ok(Stmt::Assign {
        name: name.trim().to_string(),
        op: AssignOp::Plain,
        value: parse_expr(rhs.trim())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_assignments() {
        let block = parse_block("suma = x + y\nresultado = suma * 2").unwrap();
        assert_eq!(block.len(), 2);
    }

    #[test]
    fn parses_if_elif_else() {
        let source = "if x > 0:\n    resultado = 1\nelif x < 0:\n    resultado = -1\nelse:\n    resultado = 0";
        let block = parse_block(source).unwrap();
        assert_eq!(block.len(), 1);
        match &block[0] {
            Stmt::If { branches, else_body } => {
                assert_eq!(branches.len(), 2);
                assert!(else_body.is_some());
            }
            _ => panic!("expected if statement"),
        }
    }

    #[test]
    fn parses_for_with_range() {
        let source = "total = 0\nfor i in range(0, 10):\n    total += i\nresultado = total";
        let block = parse_block(source).unwrap();
        assert_eq!(block.len(), 3);
        assert!(matches!(block[1], Stmt::For { .. }));
    }

    #[test]
    fn parses_while_loop() {
        let source = "n = 10\nresultado = 0\nwhile n > 0:\n    resultado += n\n    n -= 1";
        let block = parse_block(source).unwrap();
        assert!(matches!(block[2], Stmt::While { .. }));
    }

    #[test]
    fn rejects_unexpected_indent() {
        let source = "resultado = 1\n    huerfano = 2";
        assert!(parse_block(source).is_err());
    }

    #[test]
    fn rejects_import_of_non_whitelisted_module() {
        let err = parse_block("import os\nresultado = os.listdir('/')").unwrap_err();
        assert!(matches!(err, SandboxError::Security(_)));
    }

    #[test]
    fn rejects_import_embedded_before_a_statement_on_the_same_line() {
        let err = parse_block("import os; resultado = os.listdir('/')").unwrap_err();
        assert!(matches!(err, SandboxError::Security(_)));
    }

    #[test]
    fn rejects_from_import_of_non_whitelisted_module() {
        let err = parse_block("from os import path\nresultado = 1").unwrap_err();
        assert!(matches!(err, SandboxError::Security(_)));
    }

    #[test]
    fn allows_whitelisted_module_import() {
        let block = parse_block("import math\nresultado = 1").unwrap();
        assert_eq!(block.len(), 1);
    }
}
