use std::collections::VecDeque;

/// Iterator adaptor that replaces each maximal run of adjacent matching
/// items with the output of a reduce function.
///
/// Items that do not match pass through unchanged and in order.
/// The run is only buffered while it is being collected.
///
/// ```
/// let merged: Vec<i32> = dvi2html::merge(vec![1, 2, -1, 3, 4, 5], |i: &i32| *i > 0, |run: Vec<i32>| {
///     [run.into_iter().sum::<i32>()]
/// }).collect();
/// assert_eq!(merged, vec![3, -1, 12]);
/// ```
pub struct Merge<I: Iterator, P, R> {
    source: I,
    is_candidate: P,
    reduce: R,
    ready: VecDeque<I::Item>,
}

pub fn merge<I, P, R, J>(source: I, is_candidate: P, reduce: R) -> Merge<I::IntoIter, P, R>
where
    I: IntoIterator,
    P: FnMut(&I::Item) -> bool,
    R: FnMut(Vec<I::Item>) -> J,
    J: IntoIterator<Item = I::Item>,
{
    Merge {
        source: source.into_iter(),
        is_candidate,
        reduce,
        ready: VecDeque::new(),
    }
}

impl<I, P, R, J> Iterator for Merge<I, P, R>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
    R: FnMut(Vec<I::Item>) -> J,
    J: IntoIterator<Item = I::Item>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.ready.pop_front() {
                return Some(item);
            }
            let first = self.source.next()?;
            if !(self.is_candidate)(&first) {
                return Some(first);
            }
            let mut run = vec![first];
            let mut end = None;
            for item in self.source.by_ref() {
                if (self.is_candidate)(&item) {
                    run.push(item);
                } else {
                    end = Some(item);
                    break;
                }
            }
            self.ready.extend((self.reduce)(run));
            self.ready.extend(end);
        }
    }
}
