use std::fmt::{Display, Formatter};

use crate::constant::Side;

/// Stable handle of a node inside a [`crate::FractalSequence`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FractalId(pub(crate) usize);

impl Display for FractalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One detected extremum.
///
/// `index`, `value` and `side` never change after creation. The links are
/// owned by the sequence and only rewritten on append or removal.
#[derive(Debug, Clone)]
pub struct Fractal {
    index: usize,
    value: f64,
    side: Side,
    pub(crate) previous: Option<FractalId>,
    pub(crate) next: Option<FractalId>,
    pub(crate) attached: bool,
}

impl Fractal {
    pub(crate) fn new(index: usize, value: f64, side: Side) -> Self {
        Self {
            index,
            value,
            side,
            previous: None,
            next: None,
            attached: true,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn is_high(&self) -> bool {
        self.side == Side::High
    }

    pub fn is_low(&self) -> bool {
        self.side == Side::Low
    }
}
