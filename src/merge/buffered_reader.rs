use super::coordinate::Coordinate;
use crate::utils::Result;

enum Slot<T> {
    Holding(T),
    Exhausted,
}

/// Single-slot lookahead over a coordinate-sorted record stream.
///
/// The held record is handed out only when the caller asks for exactly its
/// coordinate, so any number of readers can be probed for the same
/// coordinate without consuming the ones that do not have it.
pub struct BufferedReader<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: AsRef<Coordinate>,
{
    source: I,
    slot: Slot<T>,
}

impl<I, T> BufferedReader<I, T>
where
    I: Iterator<Item = Result<T>>,
    T: AsRef<Coordinate>,
{
    pub fn new(mut source: I) -> Result<Self> {
        let slot = Self::pull(&mut source)?;
        Ok(BufferedReader { source, slot })
    }

    fn pull(source: &mut I) -> Result<Slot<T>> {
        match source.next() {
            Some(item) => Ok(Slot::Holding(item?)),
            None => Ok(Slot::Exhausted),
        }
    }

    /// Return the held record if it matches `requested` and load the next
    /// one; otherwise leave the reader untouched.
    pub fn next_if_matches(&mut self, requested: &Coordinate) -> Result<Option<T>> {
        match &self.slot {
            Slot::Holding(held) if held.as_ref() == requested => {}
            _ => return Ok(None),
        }
        let next = Self::pull(&mut self.source)?;
        match std::mem::replace(&mut self.slot, next) {
            Slot::Holding(held) => Ok(Some(held)),
            Slot::Exhausted => Ok(None),
        }
    }

    pub fn peek(&self) -> Option<&T> {
        match &self.slot {
            Slot::Holding(held) => Some(held),
            Slot::Exhausted => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.slot, Slot::Exhausted)
    }
}
