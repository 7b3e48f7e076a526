//! Resource ids and the numeric-coercion helper.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Primary-key value of an entity.
///
/// Ids arrive as strings from routes and as numbers from API payloads;
/// anything that parses cleanly as an integer is stored as `Num`, so `"42"`
/// and `42` address the same entity. Integers order before string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Id {
    Num(i64),
    Key(String),
}

impl Id {
    /// Parse `raw` as an integer if it is one, otherwise keep it verbatim.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => Id::Num(n),
            Err(_) => Id::Key(raw.to_string()),
        }
    }

    /// Best-effort conversion of a JSON scalar. Arrays, objects, booleans
    /// and null are not ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Id::Num(i)),
                None => match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                        Some(Id::Num(f as i64))
                    }
                    _ => Some(Id::Key(n.to_string())),
                },
            },
            Value::String(s) => Some(Id::coerce(s)),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Id::Num(_))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Num(n) => write!(f, "{}", n),
            Id::Key(k) => f.write_str(k),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Num(n)
    }
}

impl From<i32> for Id {
    fn from(n: i32) -> Self {
        Id::Num(n as i64)
    }
}

impl From<u32> for Id {
    fn from(n: u32) -> Self {
        Id::Num(n as i64)
    }
}

impl From<&str> for Id {
    fn from(raw: &str) -> Self {
        Id::coerce(raw)
    }
}

impl From<String> for Id {
    fn from(raw: String) -> Self {
        Id::coerce(&raw)
    }
}

impl From<&String> for Id {
    fn from(raw: &String) -> Self {
        Id::coerce(raw)
    }
}

impl From<&Id> for Id {
    fn from(id: &Id) -> Self {
        id.clone()
    }
}

/// Coerce any iterable of id-like values.
pub fn coerce<I, T>(ids: I) -> Vec<Id>
where
    I: IntoIterator<Item = T>,
    T: Into<Id>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Coerce a JSON id list.
///
/// A nested array means the caller passed a list where a flat id sequence
/// was expected. That is logged and flattened rather than rejected so the
/// dispatch still goes through.
pub fn coerce_values(raw: &[Value]) -> Vec<Id> {
    let mut out = Vec::with_capacity(raw.len());
    for value in raw {
        match value {
            Value::Array(nested) => {
                tracing::warn!(
                    ids = %serde_json::Value::Array(raw.to_vec()),
                    "Received a nested id list; expected a flat sequence of ids"
                );
                out.extend(coerce_values(nested));
            }
            other => match Id::from_value(other) {
                Some(id) => out.push(id),
                None => {
                    tracing::warn!(id = %other, "Ignoring id that is neither a number nor a string");
                }
            },
        }
    }
    out
}
