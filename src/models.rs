use calamine::Data;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell after ingestion.
///
/// Blank cells and empty strings both become `Missing`; everything downstream
/// treats them as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Missing,
    Number(f64),
    Boolean(bool),
    Text(String),
}

/// Primitive kind of a present cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Number,
    Text,
    Boolean,
}

/// Hashable identity of a present cell. Numbers and text never compare equal,
/// so `1` and `"1"` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey<'a> {
    Number(u64),
    Text(&'a str),
    Boolean(bool),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn kind(&self) -> Option<CellKind> {
        match self {
            CellValue::Missing => None,
            CellValue::Number(_) => Some(CellKind::Number),
            CellValue::Text(_) => Some(CellKind::Text),
            CellValue::Boolean(_) => Some(CellKind::Boolean),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<ValueKey<'_>> {
        match self {
            CellValue::Missing => None,
            // -0.0 and 0.0 are the same value
            CellValue::Number(n) if *n == 0.0 => Some(ValueKey::Number(0f64.to_bits())),
            CellValue::Number(n) => Some(ValueKey::Number(n.to_bits())),
            CellValue::Text(s) => Some(ValueKey::Text(s)),
            CellValue::Boolean(b) => Some(ValueKey::Boolean(*b)),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Missing,
            Data::String(s) if s.is_empty() => CellValue::Missing,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Boolean(*b),
            // Raw serial day number, the way spreadsheet readers report dates
            Data::DateTime(d) => CellValue::Number(d.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Missing
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}
