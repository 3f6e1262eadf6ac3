//! JSON query filter.
//!
//! The query is a JSON-encoded prefix expression passed in
//! `scheduler_hints.query`, for example:
//!
//! ```text
//! ["and", [">=", "$free_capacity_gb", 1024], ["=", "$capabilities.tier", "gold"]]
//! ```
//!
//! Strings starting with `$` name host attributes. Arguments that resolve to
//! nothing (unknown attributes, empty strings) are dropped before the
//! operator runs.

use std::cmp::Ordering;

use serde_json::Value;
use tracing::debug;

use crate::{FilterError, FilterProperties, FilterResult, HostFilter, HostState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Eq,
    Lt,
    Gt,
    In,
    Le,
    Ge,
    Not,
    Or,
    And,
}

impl Command {
    fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "=" => Command::Eq,
            "<" => Command::Lt,
            ">" => Command::Gt,
            "in" => Command::In,
            "<=" => Command::Le,
            ">=" => Command::Ge,
            "not" => Command::Not,
            "or" => Command::Or,
            "and" => Command::And,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Arg {
    Expr(Expr),
    Variable(String),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    /// `[]`, which is always true.
    Empty,
    Apply(Command, Vec<Arg>),
}

/// A parsed query expression.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonQuery(Expr);

impl JsonQuery {
    /// Parses the JSON text of a query hint.
    pub fn parse(text: &str) -> FilterResult<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| FilterError::InvalidQuery(e.to_string()))?;
        Ok(Self(parse_expr(&value)?))
    }

    /// Evaluates the query against one host.
    pub fn matches(&self, host: &HostState) -> bool {
        match eval(&self.0, host) {
            Value::Array(items) => items.iter().any(truthy),
            other => truthy(&other),
        }
    }
}

fn parse_expr(value: &Value) -> FilterResult<Expr> {
    let Value::Array(items) = value else {
        return Err(FilterError::InvalidQuery(format!("expected a list, got {value}")));
    };
    let Some((head, args)) = items.split_first() else {
        return Ok(Expr::Empty);
    };
    let command = head
        .as_str()
        .and_then(Command::parse)
        .ok_or_else(|| FilterError::InvalidQuery(format!("unknown operator {head}")))?;

    let args = args
        .iter()
        .map(|arg| match arg {
            Value::Array(_) => parse_expr(arg).map(Arg::Expr),
            Value::String(s) => Ok(match s.strip_prefix('$') {
                Some(path) => Arg::Variable(path.to_string()),
                None => Arg::Literal(arg.clone()),
            }),
            other => Ok(Arg::Literal(other.clone())),
        })
        .collect::<FilterResult<Vec<_>>>()?;

    Ok(Expr::Apply(command, args))
}

fn eval(expr: &Expr, host: &HostState) -> Value {
    let (command, args) = match expr {
        Expr::Empty => return Value::Bool(true),
        Expr::Apply(command, args) => (*command, args),
    };

    let args: Vec<Value> = args
        .iter()
        .filter_map(|arg| match arg {
            Arg::Expr(expr) => Some(eval(expr, host)),
            Arg::Variable(path) => host.attribute(path),
            Arg::Literal(Value::String(s)) if s.is_empty() => None,
            Arg::Literal(Value::Null) => None,
            Arg::Literal(value) => Some(value.clone()),
        })
        .collect();

    match command {
        Command::Eq => compare_all(&args, |o| o == Ordering::Equal),
        Command::Lt => compare_all(&args, |o| o == Ordering::Less),
        Command::Gt => compare_all(&args, |o| o == Ordering::Greater),
        Command::Le => compare_all(&args, |o| o != Ordering::Greater),
        Command::Ge => compare_all(&args, |o| o != Ordering::Less),
        Command::In => Value::Bool(args.split_first().is_some_and(|(needle, rest)| {
            rest.iter()
                .any(|v| compare(needle, v) == Some(Ordering::Equal))
        })),
        Command::Not => Value::Array(args.iter().map(|v| Value::Bool(!truthy(v))).collect()),
        Command::Or => Value::Bool(args.iter().any(truthy)),
        Command::And => Value::Bool(args.iter().all(truthy)),
    }
}

/// `args[0] op arg` for every following argument; fewer than two is false.
fn compare_all(args: &[Value], accept: impl Fn(Ordering) -> bool) -> Value {
    let Some((first, rest)) = args.split_first() else {
        return Value::Bool(false);
    };
    if rest.is_empty() {
        return Value::Bool(false);
    }
    Value::Bool(rest.iter().all(|v| compare(first, v).is_some_and(&accept)))
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ if a == b => Some(Ordering::Equal),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Keeps hosts matching the `query` scheduler hint. Requests without a
/// query accept every host.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFilter;

impl JsonFilter {
    pub const NAME: &'static str = "JsonFilter";

    fn query(props: &FilterProperties) -> Option<&str> {
        props
            .scheduler_hints
            .query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
    }
}

impl HostFilter for JsonFilter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn host_passes(&self, host: &HostState, props: &FilterProperties) -> bool {
        let Some(text) = Self::query(props) else {
            return true;
        };
        match JsonQuery::parse(text) {
            Ok(query) => query.matches(host),
            Err(e) => {
                debug!(host = %host.host, error = %e, "Rejecting host on malformed query hint");
                false
            }
        }
    }

    fn validate(&self, props: &FilterProperties) -> FilterResult<()> {
        match Self::query(props) {
            Some(text) => JsonQuery::parse(text).map(|_| ()),
            None => Ok(()),
        }
    }
}
