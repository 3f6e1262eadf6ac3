//! Extra-spec requirements and their validation.
//!
//! A requirement is either a plain string compared for equality, or an
//! operator word followed by operands:
//!
//! | requirement            | matches when                                  |
//! |------------------------|-----------------------------------------------|
//! | `= 10`                 | value as number `>= 10`                       |
//! | `== 10`, `!= 10`       | numeric equality / inequality                 |
//! | `>= 10`, `<= 10`       | numeric comparison                            |
//! | `s== a`, `s!= a`, ...  | string comparison (`s<`, `s<=`, `s>`, `s>=`)   |
//! | `<in> ssd`             | value contains `ssd`                          |
//! | `<is> True`            | value is the same boolean word                |
//! | `<or> a <or> b`        | value equals one of the alternatives          |

use std::collections::BTreeMap;

use crate::{FilterError, FilterResult};

/// Longest accepted extra spec key or string value.
const MAX_SPEC_LEN: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    AtLeast,
    NumEq,
    NumNe,
    NumGe,
    NumLe,
    StrEq,
    StrNe,
    StrLt,
    StrLe,
    StrGt,
    StrGe,
    Contains,
    Is,
}

impl Op {
    fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "=" => Op::AtLeast,
            "==" => Op::NumEq,
            "!=" => Op::NumNe,
            ">=" => Op::NumGe,
            "<=" => Op::NumLe,
            "s==" => Op::StrEq,
            "s!=" => Op::StrNe,
            "s<" => Op::StrLt,
            "s<=" => Op::StrLe,
            "s>" => Op::StrGt,
            "s>=" => Op::StrGe,
            "<in>" => Op::Contains,
            "<is>" => Op::Is,
            _ => return None,
        })
    }

    fn apply(self, value: &str, operand: &str) -> bool {
        match self {
            Op::AtLeast => numeric(value, operand, |a, b| a >= b),
            Op::NumEq => numeric(value, operand, |a, b| a == b),
            Op::NumNe => numeric(value, operand, |a, b| a != b),
            Op::NumGe => numeric(value, operand, |a, b| a >= b),
            Op::NumLe => numeric(value, operand, |a, b| a <= b),
            Op::StrEq => value == operand,
            Op::StrNe => value != operand,
            Op::StrLt => value < operand,
            Op::StrLe => value <= operand,
            Op::StrGt => value > operand,
            Op::StrGe => value >= operand,
            Op::Contains => value.contains(operand),
            Op::Is => match (parse_bool(value), parse_bool(operand)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

fn numeric(value: &str, operand: &str, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (value.trim().parse::<f64>(), operand.trim().parse::<f64>()) {
        (Ok(a), Ok(b)) => cmp(a, b),
        _ => false,
    }
}

fn parse_bool(word: &str) -> Option<bool> {
    match word.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Checks a capability value against an extra-spec requirement.
pub fn matches(value: &str, requirement: &str) -> bool {
    let mut words = requirement.split_whitespace();
    let Some(first) = words.next() else {
        return value == requirement;
    };

    if first == "<or>" {
        // v1 <or> v2 <or> v3: alternatives sit at even positions.
        return words.step_by(2).any(|alternative| alternative == value);
    }

    match Op::parse(first) {
        Some(op) => words.next().is_some_and(|operand| op.apply(value, operand)),
        None => value == requirement,
    }
}

/// String form of a capability or spec value used for matching.
///
/// Booleans render as `True`/`False`; maps, lists and null have no string
/// form.
pub fn spec_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Bool(true) => Some("True".to_string()),
        serde_json::Value::Bool(false) => Some("False".to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_valid_string(s: &str) -> bool {
    (1..=MAX_SPEC_LEN).contains(&s.chars().count())
}

/// Validates a set of extra specs.
///
/// Keys and string values must be 1 to 255 characters, values may also be
/// booleans, and nested maps are validated recursively.
pub fn validate(specs: &BTreeMap<String, serde_json::Value>) -> FilterResult<()> {
    validate_entries(specs.iter())
}

fn validate_entries<'a, I>(entries: I) -> FilterResult<()>
where
    I: Iterator<Item = (&'a String, &'a serde_json::Value)>,
{
    for (key, value) in entries {
        let valid = is_valid_string(key)
            && match value {
                serde_json::Value::String(s) => is_valid_string(s),
                serde_json::Value::Bool(_) => true,
                serde_json::Value::Object(nested) => {
                    validate_entries(nested.iter())?;
                    true
                }
                _ => false,
            };

        if !valid {
            return Err(FilterError::InvalidExtraSpec {
                key: key.clone(),
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("abc", "abc", true)]
    #[case("abc", "abd", false)]
    #[case("", "", true)]
    #[case("123", "= 123", true)]
    #[case("124", "= 123", true)]
    #[case("122", "= 123", false)]
    #[case("12.0", "== 12", true)]
    #[case("12", "!= 12", false)]
    #[case("100", ">= 99.5", true)]
    #[case("100", "<= 99.5", false)]
    #[case("fast", "= 12", false)]
    #[case("abc", "s== abc", true)]
    #[case("abc", "s!= abc", false)]
    #[case("abc", "s< abd", true)]
    #[case("abd", "s<= abd", true)]
    #[case("abd", "s> abc", true)]
    #[case("abc", "s>= abd", false)]
    #[case("ssd,nvme", "<in> nvme", true)]
    #[case("hdd", "<in> nvme", false)]
    #[case("True", "<is> true", true)]
    #[case("false", "<is> True", false)]
    #[case("maybe", "<is> True", false)]
    #[case("gold", "<or> silver <or> gold", true)]
    #[case("bronze", "<or> silver <or> gold", false)]
    #[case("<or>", "<or> silver <or> gold", false)]
    #[case("12", "=", false)]
    fn test_matches(#[case] value: &str, #[case] requirement: &str, #[case] expected: bool) {
        assert_eq!(matches(value, requirement), expected, "{value:?} vs {requirement:?}");
    }

    #[test]
    fn test_spec_string() {
        assert_eq!(spec_string(&json!(true)).as_deref(), Some("True"));
        assert_eq!(spec_string(&json!(7)).as_deref(), Some("7"));
        assert_eq!(spec_string(&json!("x")).as_deref(), Some("x"));
        assert_eq!(spec_string(&json!({"a": 1})), None);
    }

    fn specs(value: serde_json::Value) -> BTreeMap<String, serde_json::Value> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_validate_accepts_strings_bools_and_nested() {
        let valid = specs(json!({
            "driver_handles_share_servers": "True",
            "snapshot_support": true,
            "capabilities": {"tier": "gold"}
        }));
        assert!(validate(&valid).is_ok());
    }

    #[rstest]
    #[case(json!({"": "x"}))]
    #[case(json!({"key": ""}))]
    #[case(json!({"key": 5}))]
    #[case(json!({"key": null}))]
    #[case(json!({"outer": {"inner": 1}}))]
    fn test_validate_rejects(#[case] value: serde_json::Value) {
        assert!(matches!(
            validate(&specs(value)),
            Err(FilterError::InvalidExtraSpec { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_long_key() {
        let long = "k".repeat(MAX_SPEC_LEN + 1);
        let mut map = BTreeMap::new();
        map.insert(long, json!("v"));
        assert!(validate(&map).is_err());
    }
}
