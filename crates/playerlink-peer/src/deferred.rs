//! Single-resolution deferred values.
//!
//! A [`Deferred`] is resolved or rejected at most once. Callbacks added while
//! it is pending are queued and run in registration order when it settles;
//! callbacks added afterwards run immediately, in the caller's turn, with the
//! stored outcome. Nothing here depends on an async runtime.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type SuccessCallback<T> = Box<dyn FnOnce(&T)>;
type FailureCallback<E> = Box<dyn FnOnce(&E)>;
type SettleCallback<T, E> = Box<dyn FnOnce(Result<&T, &E>)>;

/// Lifecycle state of a [`Deferred`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredState {
    Pending,
    Resolved,
    Rejected,
}

enum Outcome<T, E> {
    Pending,
    Resolved(Rc<T>),
    Rejected(Rc<E>),
}

struct Inner<T, E> {
    outcome: Outcome<T, E>,
    on_success: Vec<SuccessCallback<T>>,
    on_failure: Vec<FailureCallback<E>>,
    on_settle: Vec<SettleCallback<T, E>>,
}

impl<T, E> Inner<T, E> {
    fn settled(&self) -> Option<Result<Rc<T>, Rc<E>>> {
        match &self.outcome {
            Outcome::Pending => None,
            Outcome::Resolved(value) => Some(Ok(Rc::clone(value))),
            Outcome::Rejected(error) => Some(Err(Rc::clone(error))),
        }
    }
}

/// A value that will be available later, or an error explaining why not.
///
/// Clones share the same state.
pub struct Deferred<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
}

impl<T: 'static, E: 'static> Deferred<T, E> {
    /// Create a pending deferred.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                outcome: Outcome::Pending,
                on_success: Vec::new(),
                on_failure: Vec::new(),
                on_settle: Vec::new(),
            })),
        }
    }

    /// Create a deferred that is already resolved.
    pub fn resolved(value: T) -> Self {
        let deferred = Self::new();
        deferred.resolve(value);
        deferred
    }

    /// Create a deferred that is already rejected.
    pub fn rejected(error: E) -> Self {
        let deferred = Self::new();
        deferred.reject(error);
        deferred
    }

    /// Resolve with `value` and run queued success and settle callbacks.
    ///
    /// Returns `false` and drops `value` if already settled.
    pub fn resolve(&self, value: T) -> bool {
        let value = Rc::new(value);
        let (success, settle) = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.outcome, Outcome::Pending) {
                tracing::debug!("ignoring resolve of an already settled deferred");
                return false;
            }
            inner.outcome = Outcome::Resolved(Rc::clone(&value));
            inner.on_failure.clear();
            (
                std::mem::take(&mut inner.on_success),
                std::mem::take(&mut inner.on_settle),
            )
        };

        for callback in success {
            callback(&value);
        }
        for callback in settle {
            callback(Ok(&value));
        }
        true
    }

    /// Reject with `error` and run queued failure and settle callbacks.
    ///
    /// Returns `false` and drops `error` if already settled.
    pub fn reject(&self, error: E) -> bool {
        let error = Rc::new(error);
        let (failure, settle) = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.outcome, Outcome::Pending) {
                tracing::debug!("ignoring reject of an already settled deferred");
                return false;
            }
            inner.outcome = Outcome::Rejected(Rc::clone(&error));
            inner.on_success.clear();
            (
                std::mem::take(&mut inner.on_failure),
                std::mem::take(&mut inner.on_settle),
            )
        };

        for callback in failure {
            callback(&error);
        }
        for callback in settle {
            callback(Err(&error));
        }
        true
    }

    /// Run `callback` with the value once resolved.
    pub fn on_success(&self, callback: impl FnOnce(&T) + 'static) -> &Self {
        let settled = self.inner.borrow().settled();
        match settled {
            None => self.inner.borrow_mut().on_success.push(Box::new(callback)),
            Some(Ok(value)) => callback(&value),
            Some(Err(_)) => {}
        }
        self
    }

    /// Run `callback` with the error once rejected.
    pub fn on_failure(&self, callback: impl FnOnce(&E) + 'static) -> &Self {
        let settled = self.inner.borrow().settled();
        match settled {
            None => self.inner.borrow_mut().on_failure.push(Box::new(callback)),
            Some(Err(error)) => callback(&error),
            Some(Ok(_)) => {}
        }
        self
    }

    /// Run `callback` once settled, whichever way.
    pub fn on_settle(&self, callback: impl FnOnce(Result<&T, &E>) + 'static) -> &Self {
        let settled = self.inner.borrow().settled();
        match settled {
            None => self.inner.borrow_mut().on_settle.push(Box::new(callback)),
            Some(Ok(value)) => callback(Ok(&value)),
            Some(Err(error)) => callback(Err(&error)),
        }
        self
    }

    /// Current state.
    pub fn state(&self) -> DeferredState {
        match self.inner.borrow().outcome {
            Outcome::Pending => DeferredState::Pending,
            Outcome::Resolved(_) => DeferredState::Resolved,
            Outcome::Rejected(_) => DeferredState::Rejected,
        }
    }

    /// True while neither resolved nor rejected.
    pub fn is_pending(&self) -> bool {
        self.state() == DeferredState::Pending
    }

    /// The resolved value, if any.
    pub fn value(&self) -> Option<Rc<T>> {
        self.inner.borrow().settled().and_then(Result::ok)
    }

    /// The rejection error, if any.
    pub fn error(&self) -> Option<Rc<E>> {
        self.inner.borrow().settled().and_then(Result::err)
    }
}

impl<T: 'static, E: 'static> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        let state = match inner.outcome {
            Outcome::Pending => "pending",
            Outcome::Resolved(_) => "resolved",
            Outcome::Rejected(_) => "rejected",
        };
        f.debug_struct("Deferred")
            .field("state", &state)
            .field("queued_success", &inner.on_success.len())
            .field("queued_failure", &inner.on_failure.len())
            .field("queued_settle", &inner.on_settle.len())
            .finish()
    }
}
