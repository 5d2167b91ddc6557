//! Statement parsing for the memory driver.
//!
//! Only the statements the client issues on its own are understood:
//! `SELECT * FROM`, `CREATE ... [CONTENT {...}]`, `DELETE [FROM]` and
//! `RELATE a->edge->b`. Operands are record references or `$variables`.

use serde_json::Value;

use crate::driver::reference::RecordRef;
use crate::driver::types::{DriverError, DriverResult};
use crate::driver::Vars;

/// A statement operand before variable binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Ref(RecordRef),
    Var(String),
}

impl Operand {
    fn parse(token: &str) -> DriverResult<Self> {
        if token.is_empty() {
            return Err(DriverError::Rejected("missing statement target".into()));
        }
        match token.strip_prefix('$') {
            Some(name) if !name.is_empty() => Ok(Operand::Var(name.to_string())),
            Some(_) => Err(DriverError::Rejected("empty variable name".into())),
            None => Ok(Operand::Ref(RecordRef::parse(token))),
        }
    }

    /// Resolve against bound variables. Variables must hold strings.
    pub fn bind(&self, vars: &Vars) -> DriverResult<RecordRef> {
        match self {
            Operand::Ref(r) => Ok(r.clone()),
            Operand::Var(name) => match vars.get(name) {
                Some(Value::String(s)) => Ok(RecordRef::parse(s.as_str())),
                Some(other) => Err(DriverError::Rejected(format!(
                    "variable ${} must be a record reference, got {}",
                    name, other
                ))),
                None => Err(DriverError::Rejected(format!("unbound variable ${}", name))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select { target: Operand },
    Create { target: Operand, content: Option<Value> },
    Delete { target: Operand },
    Relate { from: Operand, edge: String, to: Operand },
}

/// Split `sql` into statements and parse each one.
pub fn parse_statements(sql: &str) -> DriverResult<Vec<Statement>> {
    split_statements(sql)
        .into_iter()
        .map(|s| parse_statement(&s))
        .collect()
}

fn parse_statement(text: &str) -> DriverResult<Statement> {
    let (keyword, rest) = match text.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (text, ""),
    };

    match keyword.to_ascii_uppercase().as_str() {
        "SELECT" => {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            match tokens.as_slice() {
                ["*", from, target] if from.eq_ignore_ascii_case("FROM") => Ok(Statement::Select {
                    target: Operand::parse(target)?,
                }),
                _ => Err(unsupported(text)),
            }
        }
        "DELETE" => {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            let target = match tokens.as_slice() {
                [from, target] if from.eq_ignore_ascii_case("FROM") => target,
                [target] => target,
                _ => return Err(unsupported(text)),
            };
            Ok(Statement::Delete {
                target: Operand::parse(target)?,
            })
        }
        "CREATE" => {
            let (target, tail) = match rest.split_once(char::is_whitespace) {
                Some((t, tail)) => (t, tail.trim()),
                None => (rest, ""),
            };
            let content = if tail.is_empty() {
                None
            } else {
                let (kw, json) = tail
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| unsupported(text))?;
                if !kw.eq_ignore_ascii_case("CONTENT") {
                    return Err(unsupported(text));
                }
                let value: Value = serde_json::from_str(json.trim())
                    .map_err(|e| DriverError::Rejected(format!("invalid CONTENT: {}", e)))?;
                Some(value)
            };
            Ok(Statement::Create {
                target: Operand::parse(target)?,
                content,
            })
        }
        "RELATE" => {
            let compact: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
            let parts: Vec<&str> = compact.split("->").collect();
            match parts.as_slice() {
                [from, edge, to] if is_identifier(edge) => Ok(Statement::Relate {
                    from: Operand::parse(from)?,
                    edge: edge.to_string(),
                    to: Operand::parse(to)?,
                }),
                _ => Err(unsupported(text)),
            }
        }
        _ => Err(unsupported(text)),
    }
}

/// Split on `;` outside of quoted strings.
fn split_statements(sql: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in sql.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    quote = None;
                }
            }
            None if c == ';' => {
                push_trimmed(&mut out, &current);
                current.clear();
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                current.push(c);
            }
        }
    }
    push_trimmed(&mut out, &current);
    out
}

fn push_trimmed(out: &mut Vec<String>, s: &str) {
    let trimmed = s.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

/// Identifier rule for table and edge names.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unsupported(text: &str) -> DriverError {
    DriverError::Rejected(format!("unsupported statement: {}", text))
}
