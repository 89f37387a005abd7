//! Fractal detector.
//!
//! Consumes a price series index by index, appends detected extrema to the
//! sequence and notifies subscribers synchronously.

use polars::prelude::DataFrame;
use tracing::{debug, trace, warn};

use crate::config::FractalOptions;
use crate::constant::Side;
use crate::error::FractalError;
use crate::events::{subscriber, FractalEvent, Observable, SubscriptionId};
use crate::sequence::{FractalRef, FractalSequence};
use crate::series::PriceSeries;

pub struct FractalService {
    options: FractalOptions,
    half_period: usize,
    sequence: FractalSequence,
    observable: Observable,
    last_processed: Option<usize>,
}

impl FractalService {
    pub fn new(options: FractalOptions) -> Result<Self, FractalError> {
        options.validate()?;
        Ok(Self {
            half_period: options.half_period(),
            options,
            sequence: FractalSequence::new(),
            observable: Observable::default(),
            last_processed: None,
        })
    }

    pub fn with_period(period: usize) -> Result<Self, FractalError> {
        Self::new(FractalOptions::with_period(period))
    }

    /// Runs both extremum tests on the window centred `half_period` bars
    /// behind `index` and returns how many fractals were detected.
    ///
    /// Going backwards is an error, repeating the last processed index is a
    /// no-op, and indices below `period` are ignored, checked in that order.
    /// A NaN or infinite price read from the window is an error. A failing
    /// call appends nothing.
    pub fn process<S>(&mut self, series: &S, index: usize) -> Result<usize, FractalError>
    where
        S: PriceSeries + ?Sized,
    {
        match self.last_processed {
            Some(last) if index == last => {
                trace!(index, "index already processed");
                return Ok(0);
            }
            Some(last) if index < last => {
                warn!(index, last, "out of order index");
                return Err(FractalError::OutOfOrder { index, last });
            }
            _ => {}
        }
        if index < self.options.period {
            trace!(index, period = self.options.period, "insufficient history");
            return Ok(0);
        }
        if index >= series.len() {
            warn!(index, len = series.len(), "detection window beyond series");
            return Err(FractalError::OutOfRange {
                index,
                len: series.len(),
            });
        }

        let middle = index - self.half_period;
        let low = self.detect(series, middle, Side::Low)?;
        let high = self.detect(series, middle, Side::High)?;
        self.last_processed = Some(index);

        let mut detected = 0;
        for (side, value) in [(Side::Low, low), (Side::High, high)] {
            if let Some(value) = value {
                self.publish(index, middle, value, side);
                detected += 1;
            }
        }
        Ok(detected)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&FractalEvent<'_>) + Send + Sync + 'static,
    {
        let id = self.observable.subscribe(subscriber(listener));
        debug!(subscription = ?id, "listener subscribed");
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.observable.unsubscribe(id);
        debug!(subscription = ?id, removed, "listener unsubscribed");
        removed
    }

    pub fn last_fractal(&self, best: bool) -> Option<FractalRef<'_>> {
        let last = self.sequence.last()?;
        Some(if best { last.best() } else { last })
    }

    pub fn last_high_fractal(&self, best: bool) -> Option<FractalRef<'_>> {
        self.last_of_side(Side::High, best)
    }

    pub fn last_low_fractal(&self, best: bool) -> Option<FractalRef<'_>> {
        self.last_of_side(Side::Low, best)
    }

    /// Bar index whose extremum a call to `process(index)` tests.
    pub fn middle_index(&self, index: usize) -> Option<usize> {
        index.checked_sub(self.half_period)
    }

    pub fn period(&self) -> usize {
        self.options.period
    }

    pub fn half_period(&self) -> usize {
        self.half_period
    }

    pub fn options(&self) -> &FractalOptions {
        &self.options
    }

    pub fn sequence(&self) -> &FractalSequence {
        &self.sequence
    }

    pub fn sequence_mut(&mut self) -> &mut FractalSequence {
        &mut self.sequence
    }

    pub fn last_processed(&self) -> Option<usize> {
        self.last_processed
    }

    pub fn dataframe(&self) -> Result<DataFrame, FractalError> {
        self.sequence.dataframe()
    }

    fn last_of_side(&self, side: Side, best: bool) -> Option<FractalRef<'_>> {
        let last = self.sequence.last()?;
        if last.side() == side {
            return Some(if best { last.best() } else { last });
        }
        last.previous(best)
    }

    fn detect<S>(&self, series: &S, middle: usize, side: Side) -> Result<Option<f64>, FractalError>
    where
        S: PriceSeries + ?Sized,
    {
        let value_at = |offset: usize| {
            let value = match side {
                Side::High => series.high(offset),
                Side::Low => series.low(offset),
            };
            match value {
                Some(x) if x.is_finite() => Ok(x),
                Some(_) => {
                    warn!(index = offset, %side, "non-finite price in window");
                    Err(FractalError::NonFinite { index: offset, side })
                }
                None => Err(FractalError::OutOfRange {
                    index: offset,
                    len: series.len(),
                }),
            }
        };

        let middle_value = value_at(middle)?;
        for offset in (middle - self.half_period)..=(middle + self.half_period) {
            if side.dominates(value_at(offset)?, middle_value) {
                return Ok(None);
            }
        }
        Ok(Some(middle_value))
    }

    fn publish(&mut self, originating_index: usize, index: usize, value: f64, side: Side) {
        let id = self.sequence.append(index, value, side);
        debug!(%side, index, value, originating_index, "fractal detected");
        if let Some(fractal) = self.sequence.get(id) {
            self.observable.notify(&FractalEvent {
                originating_index,
                fractal,
            });
        }
    }
}
