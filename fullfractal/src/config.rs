use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constant::Const;
use crate::error::FractalError;

/// Indicator parameters. Fixed once a service is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalOptions {
    /// Detection window width; even values behave like `period - 1`.
    pub period: usize,
    pub show_horizontal_continuation_line: bool,
    pub show_vertical_continuation_line: bool,
    pub link_high_low: bool,
    pub print_debug_index: bool,
}

impl Default for FractalOptions {
    fn default() -> Self {
        Self {
            period: Const::DEFAULT_PERIOD,
            show_horizontal_continuation_line: true,
            show_vertical_continuation_line: true,
            link_high_low: true,
            print_debug_index: false,
        }
    }
}

impl FractalOptions {
    pub fn with_period(period: usize) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn half_period(&self) -> usize {
        (self.period - self.period % 2) / 2
    }

    pub fn validate(&self) -> Result<(), FractalError> {
        if self.period < Const::MIN_PERIOD {
            return Err(FractalError::InvalidPeriod(self.period));
        }
        Ok(())
    }
}

pub struct OptionsLoader;

impl OptionsLoader {
    pub fn load(path: impl AsRef<Path>) -> Result<FractalOptions, FractalError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|x| x.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(FractalError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }

    pub fn from_json_str(text: &str) -> Result<FractalOptions, FractalError> {
        let options: FractalOptions = serde_json::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_yaml_str(text: &str) -> Result<FractalOptions, FractalError> {
        let options: FractalOptions = serde_yaml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }
}
