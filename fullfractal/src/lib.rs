pub mod config;
pub mod constant;
pub mod error;
pub mod events;
pub mod fractal;
pub mod indicator;
pub mod logging;
pub mod overlay;
pub mod sequence;
pub mod series;
pub mod service;

pub use config::{FractalOptions, OptionsLoader};
pub use constant::{Const, FractalType, Side};
pub use error::FractalError;
pub use events::{subscriber, FractalEvent, Observable, Subscriber, SubscriptionId};
pub use fractal::{Fractal, FractalId};
pub use indicator::FractalIndicator;
pub use logging::init_logging;
pub use overlay::{ChartObject, ChartOverlay, Color, Glyph, LineStyle, Placement};
pub use sequence::{FractalRef, FractalSequence};
pub use series::{Bar, BarSeries, HighLowSeries, PriceSeries};
pub use service::FractalService;
