//! Presenters mediate between use-cases and a transient view.
//!
//! A presenter outlives the views it serves: a view attaches with
//! [`Presenter::start`], detaches with [`Presenter::stop`], and the next view
//! to attach receives the full current state straight away. While no view is
//! attached, state pushes are dropped, never queued.

pub mod billing;
pub mod card;
pub mod date;
pub mod registry;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The receiving end of a presenter: anything that renders a UI state.
pub trait MvpView<U>: Send + Sync {
    fn on_state_updated(&self, state: &U);
}

pub type ViewRef<U> = Arc<dyn MvpView<U>>;

struct CoreInner<U> {
    view: Option<ViewRef<U>>,
    state: U,
}

/// Holds the latest UI state and the (at most one) attached view.
pub struct PresenterCore<U> {
    inner: Mutex<CoreInner<U>>,
}

impl<U: Clone + Send + 'static> PresenterCore<U> {
    pub fn new(initial: U) -> Self {
        Self {
            inner: Mutex::new(CoreInner {
                view: None,
                state: initial,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CoreInner<U>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attaches `view`, replacing any previous one, and pushes `state` to it.
    pub fn attach(&self, view: ViewRef<U>, state: U) {
        {
            let mut inner = self.lock();
            if inner.view.is_some() {
                tracing::debug!("replacing attached view");
            }
            inner.view = Some(Arc::clone(&view));
            inner.state = state.clone();
        }
        view.on_state_updated(&state);
    }

    pub fn detach(&self) {
        self.lock().view = None;
    }

    pub fn is_attached(&self) -> bool {
        self.lock().view.is_some()
    }

    pub fn state(&self) -> U {
        self.lock().state.clone()
    }

    /// Replaces the state and pushes it to the attached view, if any.
    pub fn publish(&self, state: U) {
        let view = {
            let mut inner = self.lock();
            inner.state = state.clone();
            inner.view.clone()
        };
        match view {
            Some(view) => view.on_state_updated(&state),
            None => tracing::trace!("no view attached, state push dropped"),
        }
    }

    /// Derives the next state from the current one and publishes it.
    pub fn update(&self, f: impl FnOnce(&U) -> U) -> U {
        let next = f(&self.state());
        self.publish(next.clone());
        next
    }
}

/// Common lifecycle of every presenter: `Unattached -> Attached` on
/// [`start`](Presenter::start), back on [`stop`](Presenter::stop).
pub trait Presenter: Send + Sync + 'static {
    type UiState: Clone + Send + 'static;

    fn core(&self) -> &PresenterCore<Self::UiState>;

    /// Folds the shared store back into the current state; used on attach so
    /// mutations made while detached are visible immediately.
    fn recompute(&self, current: &Self::UiState) -> Self::UiState;

    fn start(&self, view: ViewRef<Self::UiState>) {
        let state = self.recompute(&self.core().state());
        self.core().attach(view, state);
    }

    fn stop(&self) {
        self.core().detach();
    }

    fn is_attached(&self) -> bool {
        self.core().is_attached()
    }

    fn ui_state(&self) -> Self::UiState {
        self.core().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u32>>,
    }

    impl MvpView<u32> for Recorder {
        fn on_state_updated(&self, state: &u32) {
            self.seen.lock().unwrap().push(*state);
        }
    }

    #[test]
    fn test_attach_pushes_immediately() {
        let core = PresenterCore::new(1u32);
        let view = Arc::new(Recorder::default());
        core.attach(view.clone(), 2);
        assert_eq!(*view.seen.lock().unwrap(), vec![2]);
        assert!(core.is_attached());
    }

    #[test]
    fn test_detached_pushes_are_dropped() {
        let core = PresenterCore::new(0u32);
        let view = Arc::new(Recorder::default());
        core.attach(view.clone(), 0);
        core.detach();
        core.publish(5);
        core.update(|s| s + 1);
        assert_eq!(*view.seen.lock().unwrap(), vec![0]);
        assert_eq!(core.state(), 6);
    }

    #[test]
    fn test_only_latest_view_is_addressed() {
        let core = PresenterCore::new(0u32);
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        core.attach(first.clone(), 0);
        core.attach(second.clone(), 0);
        core.publish(7);
        assert_eq!(*first.seen.lock().unwrap(), vec![0]);
        assert_eq!(*second.seen.lock().unwrap(), vec![0, 7]);
    }
}
