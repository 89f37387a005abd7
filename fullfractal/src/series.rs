//! Price series providers.
//!
//! The detector only needs random access to two parallel series (highs and
//! lows). Offsets outside the series yield `None` so the caller can report
//! them instead of clamping.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FractalError;

pub trait PriceSeries {
    fn high(&self, index: usize) -> Option<f64>;
    fn low(&self, index: usize) -> Option<f64>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Two plain parallel columns.
#[derive(Debug, Clone, Default)]
pub struct HighLowSeries {
    high: Vec<f64>,
    low: Vec<f64>,
}

impl HighLowSeries {
    pub fn new(high: Vec<f64>, low: Vec<f64>) -> Self {
        Self { high, low }
    }

    pub fn push(&mut self, high: f64, low: f64) {
        self.high.push(high);
        self.low.push(low);
    }
}

impl PriceSeries for HighLowSeries {
    fn high(&self, index: usize) -> Option<f64> {
        (index < self.len()).then(|| self.high[index])
    }

    fn low(&self, index: usize) -> Option<f64> {
        (index < self.len()).then(|| self.low[index])
    }

    fn len(&self) -> usize {
        self.high.len().min(self.low.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub datetime: DateTime<Utc>,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub volume: f64,
}

impl Bar {
    pub fn total_range(&self) -> f64 {
        self.high_price - self.low_price
    }
}

#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bars(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn push(&mut self, bar: Bar) {
        self.bars.push(bar);
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, FractalError> {
        let reader = csv::Reader::from_path(path)?;
        Self::collect_rows(reader)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FractalError> {
        Self::collect_rows(csv::Reader::from_reader(reader))
    }

    fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, FractalError> {
        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvBarRow>() {
            let row = row?;
            bars.push(Bar {
                datetime: parse_datetime(&row.datetime)?,
                open_price: row.open_price,
                high_price: row.high_price,
                low_price: row.low_price,
                close_price: row.close_price,
                volume: row.volume,
            });
        }
        Ok(Self { bars })
    }
}

impl PriceSeries for BarSeries {
    fn high(&self, index: usize) -> Option<f64> {
        self.bars.get(index).map(|x| x.high_price)
    }

    fn low(&self, index: usize) -> Option<f64> {
        self.bars.get(index).map(|x| x.low_price)
    }

    fn len(&self) -> usize {
        self.bars.len()
    }
}

#[derive(Debug, Deserialize)]
struct CsvBarRow {
    datetime: String,
    #[serde(alias = "open")]
    open_price: f64,
    #[serde(alias = "high")]
    high_price: f64,
    #[serde(alias = "low")]
    low_price: f64,
    #[serde(alias = "close")]
    close_price: f64,
    #[serde(default)]
    volume: f64,
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, FractalError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .map(|x| x.and_utc())
        .map_err(|_| FractalError::InvalidDatetime(value.to_string()))
}
