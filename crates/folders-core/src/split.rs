//! Cooperative splitting of sequential cursors.

/// Outcome of one splitting attempt.
#[derive(Debug)]
pub enum SplitStep<S> {
    /// Part of the remaining work now belongs to the returned cursor.
    Split(S),
    /// Nothing was split, but the cursor rearranged its state so that a
    /// further attempt may succeed.
    Deferred,
    /// Nothing can be split off.
    Declined,
}

/// A sequential iterator whose remaining work can be divided.
///
/// After a successful split, `self` and the returned cursor together yield
/// exactly the entries `self` would have yielded alone.
pub trait Splittable: Iterator + Sized {
    /// Attempt one split.
    fn split_step(&mut self) -> SplitStep<Self>;

    /// Attempt one split; deferral counts as no split this round.
    fn try_split(&mut self) -> Option<Self> {
        match self.split_step() {
            SplitStep::Split(other) => Some(other),
            SplitStep::Deferred | SplitStep::Declined => None,
        }
    }

    /// Keep attempting while the cursor defers.
    ///
    /// Deferral always consumes structure, so this terminates.
    fn split_eager(&mut self) -> Option<Self> {
        loop {
            match self.split_step() {
                SplitStep::Split(other) => return Some(other),
                SplitStep::Deferred => continue,
                SplitStep::Declined => return None,
            }
        }
    }
}
