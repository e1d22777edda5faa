//! Buffered one-ahead wrapper over a lazy candidate producer.
//!
//! The merge step needs to rank the next element of two sequences without
//! consuming either. `Lookahead` owns its producer exclusively while
//! active and buffers at most one element, so repeated peeks never
//! re-poll a side-effecting source. Dropping the wrapper releases the
//! producer, which covers early termination of the merge.

pub struct Lookahead<I: Iterator> {
    source: I,
    /// Outer `None`: nothing buffered yet. `Some(None)`: source exhausted;
    /// never polled again.
    slot: Option<Option<I::Item>>,
}

impl<I: Iterator> Lookahead<I> {
    pub fn new(source: I) -> Self {
        Self { source, slot: None }
    }

    fn fill(&mut self) {
        if self.slot.is_none() {
            self.slot = Some(self.source.next());
        }
    }

    pub fn has_next(&mut self) -> bool {
        self.fill();
        matches!(self.slot, Some(Some(_)))
    }

    /// Inspect the next element without consuming it.
    pub fn peek(&mut self) -> Option<&I::Item> {
        self.fill();
        self.slot.as_ref().and_then(Option::as_ref)
    }

    /// Consume and return the buffered element.
    pub fn advance(&mut self) -> Option<I::Item> {
        self.fill();
        match self.slot.take() {
            Some(Some(item)) => Some(item),
            _ => {
                // Stay in the exhausted state so `fill` never re-polls.
                self.slot = Some(None);
                None
            }
        }
    }
}
