use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// A cheap, clonable cancellation flag checked at every cooperative yield
/// point in [`crate::elkan::ElkanKmeans`] and [`crate::init::seed_plus_plus`].
///
/// `krukah-robopoker`'s `rbp-core` crate exposes a *global* `static
/// INTERRUPTED: AtomicBool` for its training loops. A single process training
/// more than one index concurrently would have every `train` call answer to
/// the same flag, so here the `AtomicBool` lives behind an `Arc` that the
/// caller clones instead: one half is passed into [`crate::train`], the other
/// is kept by whatever thread decides to cancel.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    /// Creates a fresh, not-yet-cancelled handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`Self::cancel`] has been called on this handle or any clone
    /// of it.
    pub fn requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
