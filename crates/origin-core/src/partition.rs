//! Stable-partition combinator over a lazy sequence.
//!
//! Elements for which the predicate returns false are re-emitted first, in
//! their original relative order, while matching (deferred) elements are
//! buffered and re-emitted afterwards, also in original order. The source
//! is pulled one element at a time; only the deferred group is buffered,
//! which stays proportional to the deferral volume, not the input size.

pub struct StablePartition<I: Iterator, P> {
    source: Option<I>,
    defer: P,
    deferred: Vec<I::Item>,
    flush: Option<std::vec::IntoIter<I::Item>>,
}

impl<I, P> StablePartition<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    pub fn new(source: I, defer: P) -> Self {
        Self {
            source: Some(source),
            defer,
            deferred: Vec::new(),
            flush: None,
        }
    }
}

impl<I, P> Iterator for StablePartition<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        loop {
            let Some(source) = self.source.as_mut() else {
                break;
            };
            match source.next() {
                Some(item) => {
                    if (self.defer)(&item) {
                        self.deferred.push(item);
                    } else {
                        return Some(item);
                    }
                }
                None => self.source = None,
            }
        }
        let flush = self
            .flush
            .get_or_insert_with(|| std::mem::take(&mut self.deferred).into_iter());
        flush.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn kept_elements_come_first_in_original_order() {
        let split = StablePartition::new([1, 6, 2, 7, 3, 8].into_iter(), |n| *n >= 5);
        let out: Vec<i32> = split.collect();
        assert_eq!(out, vec![1, 2, 3, 6, 7, 8]);
    }

    #[test]
    fn deferred_group_preserves_relative_order() {
        let split = StablePartition::new([9, 5, 7, 6, 8].into_iter(), |n| *n % 2 == 1);
        let out: Vec<i32> = split.collect();
        assert_eq!(out, vec![6, 8, 9, 5, 7]);
    }

    #[test]
    fn pulls_no_further_than_the_next_kept_element() {
        let pulled = Cell::new(0_usize);
        let source = (0..100).inspect(|_| pulled.set(pulled.get() + 1));
        let mut split = StablePartition::new(source, |n| *n % 10 != 0);
        assert_eq!(split.next(), Some(0));
        assert_eq!(pulled.get(), 1);
        assert_eq!(split.next(), Some(10));
        assert_eq!(pulled.get(), 11);
    }

    #[test]
    fn empty_source_yields_nothing() {
        let mut split = StablePartition::new(std::iter::empty::<u8>(), |_| true);
        assert_eq!(split.next(), None);
        assert_eq!(split.next(), None);
    }
}
