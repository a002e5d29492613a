//! State holder shared by the one-shot views (home, search, detail).

use crate::error::LoadError;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// What a one-shot view renders
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<&'static str>,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

/// Result of a one-shot load that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Ready(T),
    /// A load was already running; nothing was issued
    Busy,
    /// The view was cancelled; state is untouched
    Cancelled,
}

impl<T> Fetched<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Fetched::Ready(value) => Some(value),
            Fetched::Busy | Fetched::Cancelled => None,
        }
    }
}

/// Runs `release` on the guarded state if dropped while still armed, so a
/// load future dropped mid-request does not keep its slot claimed
pub(crate) struct SlotGuard<'a, S> {
    state: &'a Mutex<S>,
    release: fn(&mut S),
    armed: bool,
}

impl<'a, S> SlotGuard<'a, S> {
    pub(crate) fn new(state: &'a Mutex<S>, release: fn(&mut S)) -> Self {
        Self {
            state,
            release,
            armed: true,
        }
    }

    /// The caller releases the slot itself while holding the lock
    pub(crate) fn disarm(mut self) {
        self.armed = false;
    }
}

impl<S> Drop for SlotGuard<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            (self.release)(&mut state);
        }
    }
}

pub(crate) struct ViewCell<T> {
    state: Mutex<ViewState<T>>,
    cancel: CancellationToken,
}

impl<T: Clone> ViewCell<T> {
    pub(crate) fn new(cancel: CancellationToken) -> Self {
        Self {
            state: Mutex::new(ViewState::default()),
            cancel,
        }
    }

    pub(crate) fn set_cancellation(&mut self, cancel: CancellationToken) {
        self.cancel = cancel;
    }

    /// Run `fetch` unless a load is already running, recording the outcome
    pub(crate) async fn run<F>(&self, view: &str, fetch: F) -> Result<Fetched<T>, LoadError>
    where
        F: Future<Output = Result<T, LoadError>>,
    {
        if self.cancel.is_cancelled() {
            return Ok(Fetched::Cancelled);
        }

        {
            let mut state = self.state();
            if state.loading {
                debug!(view = view, "Load already running");
                return Ok(Fetched::Busy);
            }
            state.loading = true;
            state.error = None;
        }
        let slot = SlotGuard::new(&self.state, |state: &mut ViewState<T>| state.loading = false);

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = fetch => Some(result),
        };

        let mut state = self.state();
        state.loading = false;
        slot.disarm();

        match result {
            Some(result) if !self.cancel.is_cancelled() => match result {
                Ok(value) => {
                    state.data = Some(value.clone());
                    Ok(Fetched::Ready(value))
                }
                Err(e) => {
                    state.error = Some(e.user_message());
                    Err(e)
                }
            },
            _ => {
                debug!(view = view, "Discarding cancelled load");
                Ok(Fetched::Cancelled)
            }
        }
    }

    pub(crate) fn snapshot(&self) -> ViewState<T> {
        self.state().clone()
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn state(&self) -> MutexGuard<'_, ViewState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
