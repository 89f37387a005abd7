//! Chart-agnostic drawing instructions derived from the fractal sequence.
//!
//! Objects are keyed by name. Drawing an object whose name already exists
//! replaces it in place, which is how continuation lines get extended bar
//! after bar.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::FractalOptions;
use crate::constant::FractalType;
use crate::error::FractalError;
use crate::events::FractalEvent;
use crate::sequence::FractalRef;
use crate::service::FractalService;

const BAD_SIGNAL_OFFSET: f64 = 1.9;
const ARROW_OFFSET: f64 = 0.9;
const DEBUG_INDEX_OFFSET: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Color {
    Beige,
    Red,
    OrangeRed,
    DarkCyan,
    Blue,
    Brown,
    Aqua,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LineStyle {
    Lines,
    Dots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Placement {
    Above,
    Below,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Glyph {
    ArrowUp,
    ArrowDown,
    BadSignal,
    Index(usize),
}

impl Glyph {
    pub fn text(&self) -> String {
        match self {
            Self::ArrowUp => "▲".to_string(),
            Self::ArrowDown => "▼".to_string(),
            Self::BadSignal => "⛝".to_string(),
            Self::Index(index) => index.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartObject {
    Line {
        name: String,
        from: (usize, f64),
        to: (usize, f64),
        color: Color,
        style: LineStyle,
    },
    /// `offset` is a multiple of the renderer's vertical unit, applied
    /// away from the bar according to `placement`.
    Text {
        name: String,
        glyph: Glyph,
        index: usize,
        value: f64,
        placement: Placement,
        offset: f64,
        color: Color,
    },
}

impl ChartObject {
    pub fn name(&self) -> &str {
        match self {
            Self::Line { name, .. } | Self::Text { name, .. } => name,
        }
    }
}

pub struct ChartOverlay {
    options: FractalOptions,
    objects: Vec<ChartObject>,
    positions: HashMap<String, usize>,
}

impl ChartOverlay {
    pub fn new(options: FractalOptions) -> Self {
        Self {
            options,
            objects: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn objects(&self) -> &[ChartObject] {
        &self.objects
    }

    pub fn get(&self, name: &str) -> Option<&ChartObject> {
        self.positions.get(name).map(|&i| &self.objects[i])
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Draws link, bad-fractal markers, arrow and vertical continuation for
    /// a freshly detected fractal.
    pub fn plot_fractal(&mut self, event: &FractalEvent<'_>) {
        let fractal = event.fractal;
        let best = fractal.best();

        if self.options.link_high_low {
            if let Some(previous) = fractal.previous(true) {
                self.draw(ChartObject::Line {
                    name: format!("{}-link", previous.index()),
                    from: (previous.index(), previous.value()),
                    to: (best.index(), best.value()),
                    color: Color::Beige,
                    style: LineStyle::Lines,
                });
            }
        }

        let anchor = previous_index(fractal);
        for (i, bad) in fractal.bad_fractals().into_iter().enumerate() {
            self.draw(text(
                format!("{anchor}-badSignal-{i}"),
                Glyph::BadSignal,
                bad,
                BAD_SIGNAL_OFFSET,
                Color::Aqua,
            ));
        }

        let glyph = if fractal.is_higher() {
            Glyph::ArrowUp
        } else {
            Glyph::ArrowDown
        };
        self.draw(text(
            format!("{}-arrow-{}", fractal.index(), fractal.side()),
            glyph,
            fractal,
            ARROW_OFFSET,
            arrow_color(fractal.fractal_type()),
        ));
        if self.options.print_debug_index {
            self.draw(text(
                format!("{}-index", fractal.index()),
                Glyph::Index(fractal.index()),
                fractal,
                DEBUG_INDEX_OFFSET,
                Color::Aqua,
            ));
        }

        if self.options.show_vertical_continuation_line {
            if let Some(previous) = best.previous_of_same_side(true) {
                self.draw(ChartObject::Line {
                    name: format!("{}-vertical-line-{}", previous.index(), best.side()),
                    from: (best.index(), previous.value()),
                    to: (best.index(), best.value()),
                    color: if best.is_high() { Color::Brown } else { Color::Blue },
                    style: LineStyle::Dots,
                });
            }
        }
    }

    /// Extends the horizontal continuation lines of the latest high and low
    /// up to `chart_index`.
    pub fn extend_horizontal(&mut self, service: &FractalService, chart_index: usize) {
        if !self.options.show_horizontal_continuation_line {
            return;
        }
        let middle = chart_index
            .checked_sub(1)
            .and_then(|x| service.middle_index(x));

        for fractal in [service.last_high_fractal(true), service.last_low_fractal(true)]
            .into_iter()
            .flatten()
        {
            if middle == Some(fractal.index()) {
                if let Some(previous) = fractal.previous_of_same_side(true) {
                    let name = horizontal_name(previous);
                    self.draw(horizontal_line(name, previous, fractal.index()));
                }
            }
            let name = horizontal_name(fractal);
            self.draw(horizontal_line(name, fractal, chart_index));
        }
    }

    /// Serializes the objects in first-draw order.
    pub fn to_json(&self) -> Result<String, FractalError> {
        Ok(serde_json::to_string(&self.objects)?)
    }

    fn draw(&mut self, object: ChartObject) {
        if let Some(&i) = self.positions.get(object.name()) {
            self.objects[i] = object;
            return;
        }
        self.positions
            .insert(object.name().to_string(), self.objects.len());
        self.objects.push(object);
    }
}

fn previous_index(fractal: FractalRef<'_>) -> usize {
    fractal.previous(true).map(|x| x.index()).unwrap_or(0)
}

fn horizontal_name(fractal: FractalRef<'_>) -> String {
    format!("{}-horizontal-line-{}", fractal.side(), previous_index(fractal))
}

fn horizontal_line(name: String, fractal: FractalRef<'_>, until: usize) -> ChartObject {
    ChartObject::Line {
        name,
        from: (fractal.index(), fractal.value()),
        to: (until, fractal.value()),
        color: if fractal.is_high() {
            Color::Red
        } else {
            Color::DarkCyan
        },
        style: LineStyle::Dots,
    }
}

fn text(name: String, glyph: Glyph, at: FractalRef<'_>, offset: f64, color: Color) -> ChartObject {
    ChartObject::Text {
        name,
        glyph,
        index: at.index(),
        value: at.value(),
        placement: if at.is_high() {
            Placement::Above
        } else {
            Placement::Below
        },
        offset,
        color,
    }
}

fn arrow_color(fractal_type: FractalType) -> Color {
    match fractal_type {
        FractalType::HigherHigh => Color::OrangeRed,
        FractalType::LowerHigh => Color::Red,
        FractalType::HigherLow => Color::DarkCyan,
        FractalType::LowerLow => Color::Blue,
    }
}
