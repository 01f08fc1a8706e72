// Single-owner cell for the live lens session used by event callbacks

use std::cell::RefCell;

/// Holds at most one session. Callbacks borrow it for one handler; a callback
/// that fires while another handler still holds the borrow gets `None`.
pub struct SessionCell<S> {
    inner: RefCell<Option<S>>,
}

impl<S> SessionCell<S> {
    pub const fn new() -> Self {
        Self {
            inner: RefCell::new(None),
        }
    }

    /// Replace the live session
    pub fn install(&self, session: S) {
        *self.inner.borrow_mut() = Some(session);
    }

    /// Run `f` on the live session. Returns `None` when no session is
    /// installed or the session is busy with an outer handler.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> Option<R> {
        match self.inner.try_borrow_mut() {
            Ok(mut guard) => guard.as_mut().map(f),
            Err(_) => {
                log::trace!("Skipping nested event while session is busy");
                None
            }
        }
    }
}

impl<S> Default for SessionCell<S> {
    fn default() -> Self {
        Self::new()
    }
}
