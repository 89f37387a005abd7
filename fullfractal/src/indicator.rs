//! Per-bar driver combining the detector with its chart overlay.
//!
//! A chart calls `calculate` with the index of the bar being drawn. That bar
//! may still be forming, so detection runs one bar behind it.

use std::sync::{Arc, Mutex};

use crate::config::FractalOptions;
use crate::error::FractalError;
use crate::events::{FractalEvent, SubscriptionId};
use crate::overlay::{ChartObject, ChartOverlay};
use crate::series::PriceSeries;
use crate::service::FractalService;

pub struct FractalIndicator {
    service: FractalService,
    overlay: Arc<Mutex<ChartOverlay>>,
    subscription: SubscriptionId,
}

impl FractalIndicator {
    pub fn new(options: FractalOptions) -> Result<Self, FractalError> {
        let mut service = FractalService::new(options.clone())?;
        let overlay = Arc::new(Mutex::new(ChartOverlay::new(options)));
        let sink = Arc::clone(&overlay);
        let subscription = service.subscribe(move |event: &FractalEvent<'_>| {
            // a poisoned overlay only loses drawings, detection goes on
            if let Ok(mut overlay) = sink.lock() {
                overlay.plot_fractal(event);
            }
        });
        Ok(Self {
            service,
            overlay,
            subscription,
        })
    }

    pub fn calculate<S>(&mut self, series: &S, chart_index: usize) -> Result<usize, FractalError>
    where
        S: PriceSeries + ?Sized,
    {
        let detected = match chart_index.checked_sub(1) {
            Some(effective) => self.service.process(series, effective)?,
            None => 0,
        };
        if let Ok(mut overlay) = self.overlay.lock() {
            overlay.extend_horizontal(&self.service, chart_index);
        }
        Ok(detected)
    }

    pub fn service(&self) -> &FractalService {
        &self.service
    }

    pub fn overlay_snapshot(&self) -> Vec<ChartObject> {
        self.overlay
            .lock()
            .map(|x| x.objects().to_vec())
            .unwrap_or_default()
    }

    pub fn overlay_json(&self) -> Result<String, FractalError> {
        match self.overlay.lock() {
            Ok(overlay) => overlay.to_json(),
            Err(poisoned) => poisoned.into_inner().to_json(),
        }
    }

    /// Stops drawing and hands back the detector.
    pub fn into_service(mut self) -> FractalService {
        self.service.unsubscribe(self.subscription);
        self.service
    }
}
