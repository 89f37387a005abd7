use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    High,
    Low,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Low => "low",
        }
    }

    /// Whether `candidate` is strictly more extreme than `current` on this side.
    pub fn dominates(self, candidate: f64, current: f64) -> bool {
        match self {
            Self::High => candidate > current,
            Self::Low => candidate < current,
        }
    }

    pub(crate) fn signum(self) -> i32 {
        match self {
            Self::High => 1,
            Self::Low => -1,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FractalType {
    HigherHigh,
    LowerHigh,
    HigherLow,
    LowerLow,
}

impl FractalType {
    pub fn from_parts(side: Side, is_higher: bool) -> Self {
        match (side, is_higher) {
            (Side::High, true) => Self::HigherHigh,
            (Side::High, false) => Self::LowerHigh,
            (Side::Low, true) => Self::HigherLow,
            (Side::Low, false) => Self::LowerLow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HigherHigh => "HH",
            Self::LowerHigh => "LH",
            Self::HigherLow => "HL",
            Self::LowerLow => "LL",
        }
    }
}

pub struct Const;

impl Const {
    pub const MIN_PERIOD: usize = 5;
    pub const DEFAULT_PERIOD: usize = 5;
}
