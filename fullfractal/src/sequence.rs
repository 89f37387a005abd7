//! Chronological fractal sequence.
//!
//! Nodes live in an arena (`Vec<Fractal>`) and are linked through
//! `FractalId` handles. Removed nodes stay in the arena, detached, so every
//! handle ever returned remains valid to look up.
//!
//! Run and dominance queries walk the links on every call. Runs are short,
//! so nothing is cached.

use std::fmt::{Debug, Formatter};

use polars::df;
use polars::prelude::DataFrame;
use tracing::debug;

use crate::constant::{FractalType, Side};
use crate::error::FractalError;
use crate::fractal::{Fractal, FractalId};

#[derive(Debug, Clone, Default)]
pub struct FractalSequence {
    nodes: Vec<Fractal>,
    head: Option<FractalId>,
    tail: Option<FractalId>,
    attached: usize,
}

impl FractalSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, index: usize, value: f64, side: Side) -> FractalId {
        let id = FractalId(self.nodes.len());
        let mut node = Fractal::new(index, value, side);
        node.previous = self.tail;
        match self.tail {
            Some(tail) => self.nodes[tail.0].next = Some(id),
            None => self.head = Some(id),
        }
        self.nodes.push(node);
        self.tail = Some(id);
        self.attached += 1;
        id
    }

    /// Returns a view of an attached node.
    pub fn get(&self, id: FractalId) -> Option<FractalRef<'_>> {
        self.nodes
            .get(id.0)
            .filter(|node| node.attached)
            .map(|_| FractalRef { sequence: self, id })
    }

    pub fn first(&self) -> Option<FractalRef<'_>> {
        self.head.and_then(|id| self.get(id))
    }

    pub fn last(&self) -> Option<FractalRef<'_>> {
        self.tail.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.attached
    }

    pub fn is_empty(&self) -> bool {
        self.attached == 0
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            sequence: self,
            cursor: self.head,
        }
    }

    /// Excises a single node and links its former neighbours together.
    pub fn remove(&mut self, id: FractalId) -> Result<(), FractalError> {
        self.ensure_attached(id)?;
        self.unlink(id);
        debug!(fractal = %id, "fractal removed");
        Ok(())
    }

    /// Removes every node of the run containing `id`. Returns the number removed.
    pub fn remove_run(&mut self, id: FractalId) -> Result<usize, FractalError> {
        self.ensure_attached(id)?;
        let members: Vec<FractalId> = self
            .get(id)
            .map(|fractal| fractal.run().iter().map(|x| x.id()).collect())
            .unwrap_or_default();
        for member in &members {
            self.unlink(*member);
        }
        debug!(fractal = %id, removed = members.len(), "fractal run removed");
        Ok(members.len())
    }

    pub fn dataframe(&self) -> Result<DataFrame, FractalError> {
        let rows: Vec<FractalRef<'_>> = self.iter().collect();
        let index: Vec<u64> = rows.iter().map(|x| x.index() as u64).collect();
        let value: Vec<f64> = rows.iter().map(|x| x.value()).collect();
        let side: Vec<i32> = rows.iter().map(|x| x.side().signum()).collect();
        let best: Vec<bool> = rows.iter().map(|x| x.is_best()).collect();
        let fractal_type: Vec<&str> = rows.iter().map(|x| x.fractal_type().as_str()).collect();

        let frame = df!(
            "index" => index,
            "value" => value,
            "side" => side,
            "best" => best,
            "fractal_type" => fractal_type
        )?;
        Ok(frame)
    }

    fn ensure_attached(&self, id: FractalId) -> Result<(), FractalError> {
        match self.nodes.get(id.0) {
            None => Err(FractalError::UnknownFractal(id)),
            Some(node) if !node.attached => Err(FractalError::Detached(id)),
            Some(_) => Ok(()),
        }
    }

    fn unlink(&mut self, id: FractalId) {
        let (previous, next) = {
            let node = &self.nodes[id.0];
            (node.previous, node.next)
        };
        match previous {
            Some(p) => self.nodes[p.0].next = next,
            None => self.head = next,
        }
        // a removed tail hands over to its predecessor so later appends stay linked
        match next {
            Some(n) => self.nodes[n.0].previous = previous,
            None => self.tail = previous,
        }
        let node = &mut self.nodes[id.0];
        node.previous = None;
        node.next = None;
        node.attached = false;
        self.attached -= 1;
    }

    fn node(&self, id: FractalId) -> &Fractal {
        &self.nodes[id.0]
    }
}

pub struct Iter<'a> {
    sequence: &'a FractalSequence,
    cursor: Option<FractalId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = FractalRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let current = FractalRef {
            sequence: self.sequence,
            id,
        };
        self.cursor = current.record().next;
        Some(current)
    }
}

impl<'a> IntoIterator for &'a FractalSequence {
    type Item = FractalRef<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Borrowed view of one attached node, carrying its sequence for navigation.
#[derive(Clone, Copy)]
pub struct FractalRef<'a> {
    sequence: &'a FractalSequence,
    id: FractalId,
}

impl<'a> FractalRef<'a> {
    pub fn id(&self) -> FractalId {
        self.id
    }

    pub fn record(&self) -> &'a Fractal {
        self.sequence.node(self.id)
    }

    pub fn index(&self) -> usize {
        self.record().index()
    }

    pub fn value(&self) -> f64 {
        self.record().value()
    }

    pub fn side(&self) -> Side {
        self.record().side()
    }

    pub fn is_high(&self) -> bool {
        self.record().is_high()
    }

    pub fn is_low(&self) -> bool {
        self.record().is_low()
    }

    /// Chronological predecessor.
    ///
    /// With `filter_best` the whole run is collapsed: the step starts from
    /// the run's first node and lands on the best node of the adjacent run.
    pub fn previous(&self, filter_best: bool) -> Option<Self> {
        if !filter_best {
            return self.record().previous.map(|id| self.at(id));
        }
        self.best()
            .first_of_run()
            .previous(false)
            .map(|x| x.best())
    }

    /// Chronological successor, see [`FractalRef::previous`].
    pub fn next(&self, filter_best: bool) -> Option<Self> {
        if !filter_best {
            return self.record().next.map(|id| self.at(id));
        }
        self.best().last_of_run().next(false).map(|x| x.best())
    }

    /// The most recent earlier run of the same side (two run boundaries back).
    pub fn previous_of_same_side(&self, filter_best: bool) -> Option<Self> {
        self.previous(filter_best)?.previous(filter_best)
    }

    pub fn first_of_run(&self) -> Self {
        let mut first = *self;
        while let Some(previous) = first.same_side_previous() {
            first = previous;
        }
        first
    }

    pub fn last_of_run(&self) -> Self {
        let mut last = *self;
        while let Some(next) = last.same_side_next() {
            last = next;
        }
        last
    }

    /// Dominant node of the run. Equal extremes keep the earliest node.
    pub fn best(&self) -> Self {
        let side = self.side();
        let mut best = self.first_of_run();
        let mut cursor = best.same_side_next();
        while let Some(candidate) = cursor {
            if side.dominates(candidate.value(), best.value()) {
                best = candidate;
            }
            cursor = candidate.same_side_next();
        }
        best
    }

    pub fn is_best(&self) -> bool {
        self.best().id == self.id
    }

    /// Run members other than [`FractalRef::best`]: backward from the best
    /// node first, then forward.
    pub fn bad_fractals(&self) -> Vec<Self> {
        let best = self.best();
        let mut result = Vec::new();
        let mut cursor = best.same_side_previous();
        while let Some(fractal) = cursor {
            result.push(fractal);
            cursor = fractal.same_side_previous();
        }
        cursor = best.same_side_next();
        while let Some(fractal) = cursor {
            result.push(fractal);
            cursor = fractal.same_side_next();
        }
        result
    }

    /// All run members in chronological order.
    pub fn run(&self) -> Vec<Self> {
        let mut members = vec![self.first_of_run()];
        while let Some(next) = members.last().and_then(|x| x.same_side_next()) {
            members.push(next);
        }
        members
    }

    /// Compares against the previous same-side run's best, with the same
    /// direction for both sides: a rising low is "higher" too.
    pub fn is_higher(&self) -> bool {
        match self.previous_of_same_side(true) {
            Some(previous) => previous.value() < self.value(),
            None => true,
        }
    }

    pub fn fractal_type(&self) -> FractalType {
        FractalType::from_parts(self.side(), self.is_higher())
    }

    fn at(&self, id: FractalId) -> Self {
        Self {
            sequence: self.sequence,
            id,
        }
    }

    fn same_side_previous(&self) -> Option<Self> {
        self.previous(false).filter(|x| x.side() == self.side())
    }

    fn same_side_next(&self) -> Option<Self> {
        self.next(false).filter(|x| x.side() == self.side())
    }
}

impl PartialEq for FractalRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.sequence, other.sequence)
    }
}

impl Eq for FractalRef<'_> {}

impl Debug for FractalRef<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FractalRef")
            .field("id", &self.id)
            .field("index", &self.index())
            .field("value", &self.value())
            .field("side", &self.side())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(fractals: &[FractalRef<'_>]) -> Vec<FractalId> {
        fractals.iter().map(|x| x.id()).collect()
    }

    #[test]
    fn append_links_in_order() {
        let mut seq = FractalSequence::new();
        let a = seq.append(3, 1.0, Side::Low);
        let b = seq.append(3, 9.0, Side::High);
        let c = seq.append(5, 2.0, Side::Low);

        assert_eq!(seq.len(), 3);
        assert_eq!(seq.first().map(|x| x.id()), Some(a));
        assert_eq!(seq.last().map(|x| x.id()), Some(c));
        let b_ref = seq.get(b).expect("attached");
        assert_eq!(b_ref.previous(false).map(|x| x.id()), Some(a));
        assert_eq!(b_ref.next(false).map(|x| x.id()), Some(c));
    }

    #[test]
    fn best_keeps_earliest_on_ties_from_any_member() {
        let mut seq = FractalSequence::new();
        let a = seq.append(2, 10.0, Side::High);
        let b = seq.append(3, 10.0, Side::High);
        let c = seq.append(4, 9.0, Side::High);

        for id in [a, b, c] {
            let best = seq.get(id).expect("attached").best();
            assert_eq!(best.id(), a);
        }
        let bad = seq.get(c).expect("attached").bad_fractals();
        assert_eq!(ids(&bad), vec![b, c]);
    }

    #[test]
    fn remove_tail_moves_tail_back() {
        let mut seq = FractalSequence::new();
        let a = seq.append(2, 1.0, Side::Low);
        let b = seq.append(4, 8.0, Side::High);

        seq.remove(b).expect("removable");
        assert_eq!(seq.last().map(|x| x.id()), Some(a));
        assert!(seq.get(b).is_none());
        assert!(matches!(seq.remove(b), Err(FractalError::Detached(_))));

        let c = seq.append(6, 7.0, Side::High);
        let c_ref = seq.get(c).expect("attached");
        assert_eq!(c_ref.previous(false).map(|x| x.id()), Some(a));
    }

    #[test]
    fn remove_unknown_id_fails() {
        let mut seq = FractalSequence::new();
        assert!(matches!(
            seq.remove(FractalId(7)),
            Err(FractalError::UnknownFractal(_))
        ));
        assert!(matches!(
            seq.remove_run(FractalId(0)),
            Err(FractalError::UnknownFractal(_))
        ));
    }

    #[test]
    fn remove_everything_empties_sequence() {
        let mut seq = FractalSequence::new();
        let a = seq.append(2, 5.0, Side::High);
        seq.append(3, 6.0, Side::High);

        assert_eq!(seq.remove_run(a).expect("removable"), 2);
        assert!(seq.is_empty());
        assert!(seq.first().is_none());
        assert!(seq.last().is_none());
        assert_eq!(seq.iter().count(), 0);
    }
}
