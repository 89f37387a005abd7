use std::fmt::{Display, Formatter};

use crate::constant::{Const, Side};
use crate::fractal::FractalId;

#[derive(Debug)]
pub enum FractalError {
    InvalidPeriod(usize),
    /// The detection window reached past the end of the price series.
    OutOfRange { index: usize, len: usize },
    OutOfOrder { index: usize, last: usize },
    /// A price inside the detection window is NaN or infinite.
    NonFinite { index: usize, side: Side },
    UnknownFractal(FractalId),
    Detached(FractalId),
    InvalidDatetime(String),
    UnsupportedFormat(String),
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Yaml(serde_yaml::Error),
    Polars(polars::error::PolarsError),
}

impl Display for FractalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPeriod(v) => {
                write!(f, "invalid period {v}: must be at least {}", Const::MIN_PERIOD)
            }
            Self::OutOfRange { index, len } => {
                write!(f, "series offset {index} out of range (len {len})")
            }
            Self::OutOfOrder { index, last } => {
                write!(f, "index {index} processed after {last}")
            }
            Self::NonFinite { index, side } => {
                write!(f, "non-finite {side} price at series offset {index}")
            }
            Self::UnknownFractal(id) => write!(f, "unknown fractal {id}"),
            Self::Detached(id) => write!(f, "fractal {id} already removed"),
            Self::InvalidDatetime(v) => write!(f, "invalid datetime: {v}"),
            Self::UnsupportedFormat(v) => write!(f, "unsupported file format: {v}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Csv(e) => write!(f, "csv error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Yaml(e) => write!(f, "yaml error: {e}"),
            Self::Polars(e) => write!(f, "polars error: {e}"),
        }
    }
}

impl std::error::Error for FractalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Csv(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Yaml(e) => Some(e),
            Self::Polars(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FractalError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for FractalError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for FractalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<serde_yaml::Error> for FractalError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<polars::error::PolarsError> for FractalError {
    fn from(value: polars::error::PolarsError) -> Self {
        Self::Polars(value)
    }
}
