//! Return shape of [`ApiMiddleware::process_action`](crate::ApiMiddleware::process_action)
//!
//! Untagged actions are forwarded synchronously and their forward result is
//! handed back directly. Tagged actions return a pending computation that
//! runs the whole call lifecycle when awaited.
//!
//! ```ignore
//! match middleware.process_action(action, get_state, forward) {
//!     DispatchResult::Forwarded(changed) => render_if(changed),
//!     DispatchResult::Pending(call) => {
//!         tokio::spawn(call);
//!     }
//! }
//! ```

use std::fmt;

use futures::future::BoxFuture;

/// How a tagged action's lifecycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<R> {
    /// The last forwarded action produced `R`
    Forwarded(R),
    /// `bailout` cancelled the call; nothing was forwarded
    BailedOut,
    /// The action was malformed and had no request type to report on
    Dropped,
}

impl<R> Outcome<R> {
    /// The forward result, if anything was forwarded
    pub fn forwarded(self) -> Option<R> {
        match self {
            Self::Forwarded(result) => Some(result),
            Self::BailedOut | Self::Dropped => None,
        }
    }

    /// Whether the call bailed out
    #[inline]
    pub fn is_bailed_out(&self) -> bool {
        matches!(self, Self::BailedOut)
    }

    /// Whether the action was dropped
    #[inline]
    pub fn is_dropped(&self) -> bool {
        matches!(self, Self::Dropped)
    }

    /// Map the forward result
    pub fn map<T>(self, f: impl FnOnce(R) -> T) -> Outcome<T> {
        match self {
            Self::Forwarded(result) => Outcome::Forwarded(f(result)),
            Self::BailedOut => Outcome::BailedOut,
            Self::Dropped => Outcome::Dropped,
        }
    }
}

/// Result of handing one action to the middleware.
///
/// A `Pending` lifecycle is lazy: nothing is forwarded and no request is
/// made until it is awaited or spawned.
pub enum DispatchResult<R> {
    /// Untagged action, forwarded synchronously
    Forwarded(R),
    /// Tagged action; resolves once the lifecycle has finished
    Pending(BoxFuture<'static, Outcome<R>>),
}

impl<R> DispatchResult<R> {
    /// Whether a lifecycle is pending
    #[inline]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The synchronous forward result, for untagged actions
    pub fn forwarded(self) -> Option<R> {
        match self {
            Self::Forwarded(result) => Some(result),
            Self::Pending(_) => None,
        }
    }

    /// Drive the lifecycle to completion
    pub async fn complete(self) -> Outcome<R> {
        match self {
            Self::Forwarded(result) => Outcome::Forwarded(result),
            Self::Pending(lifecycle) => lifecycle.await,
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for DispatchResult<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forwarded(result) => f.debug_tuple("Forwarded").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}
