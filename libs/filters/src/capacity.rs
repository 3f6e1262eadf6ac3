//! Capacity values reported by hosts.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A capacity figure in whole gigabytes, or one of the two sentinels a
/// backend may report instead of a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Capacity {
    /// A concrete number of gigabytes.
    Numeric(u64),

    /// Unbounded capacity; always sufficient.
    Infinite,

    /// Capacity was not reported.
    #[default]
    Unknown,
}

impl Capacity {
    const INFINITE: &'static str = "infinite";
    const UNKNOWN: &'static str = "unknown";

    /// Returns the number of gigabytes, or `None` for a sentinel.
    pub fn as_numeric(&self) -> Option<u64> {
        match self {
            Capacity::Numeric(gb) => Some(*gb),
            Capacity::Infinite | Capacity::Unknown => None,
        }
    }

    /// Returns true for `Infinite` and `Unknown`.
    pub fn is_sentinel(&self) -> bool {
        self.as_numeric().is_none()
    }

    /// JSON form used by query hints and serialization.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Capacity::Numeric(gb) => serde_json::Value::from(*gb),
            Capacity::Infinite => serde_json::Value::from(Self::INFINITE),
            Capacity::Unknown => serde_json::Value::from(Self::UNKNOWN),
        }
    }
}

impl From<u64> for Capacity {
    fn from(gb: u64) -> Self {
        Capacity::Numeric(gb)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capacity::Numeric(gb) => write!(f, "{gb}"),
            Capacity::Infinite => f.write_str(Self::INFINITE),
            Capacity::Unknown => f.write_str(Self::UNKNOWN),
        }
    }
}

impl Serialize for Capacity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Capacity::Numeric(gb) => serializer.serialize_u64(*gb),
            Capacity::Infinite => serializer.serialize_str(Self::INFINITE),
            Capacity::Unknown => serializer.serialize_str(Self::UNKNOWN),
        }
    }
}

impl<'de> Deserialize<'de> for Capacity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(CapacityVisitor)
    }
}

struct CapacityVisitor;

impl<'de> Visitor<'de> for CapacityVisitor {
    type Value = Capacity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative whole number of gigabytes, \"infinite\" or \"unknown\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Capacity, E> {
        Ok(Capacity::Numeric(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Capacity, E> {
        u64::try_from(v)
            .map(Capacity::Numeric)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Capacity, E> {
        if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 {
            Ok(Capacity::Numeric(v as u64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Capacity, E> {
        if v.eq_ignore_ascii_case(Capacity::INFINITE) {
            Ok(Capacity::Infinite)
        } else if v.eq_ignore_ascii_case(Capacity::UNKNOWN) {
            Ok(Capacity::Unknown)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}
