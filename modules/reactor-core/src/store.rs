//! The `{actions, getState}` view handed to resolvers and plugins.

use std::sync::Arc;

use crate::action::{Action, ActionKind};
use crate::error::Result;

/// Something that owns state and a dispatch pipeline.
///
/// Implemented by reactors and combined reactors.
pub(crate) trait Host<S, K, P>: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> Arc<S>;

    /// Full pipeline: plugin chain, then the innermost dispatcher.
    fn dispatch(self: Arc<Self>, action: Action<K, P>) -> Result<()>;

    /// Innermost dispatcher only: reduce, install, notify.
    fn commit(&self, action: Action<K, P>) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Chain,
    Direct,
}

/// Live handle on a reactor's state and dispatcher.
///
/// `get_state` always reads the current state, never a frozen snapshot, so a
/// long-running resolver observes updates made by other dispatches.
///
/// Stores handed to plugins dispatch straight into the innermost dispatcher;
/// an action dispatched from inside a plugin does not re-enter the chain.
pub struct Store<S, K, P> {
    host: Arc<dyn Host<S, K, P>>,
    route: Route,
}

impl<S, K: ActionKind, P> Store<S, K, P> {
    pub(crate) fn chained(host: Arc<dyn Host<S, K, P>>) -> Self {
        Self {
            host,
            route: Route::Chain,
        }
    }

    pub(crate) fn direct(host: Arc<dyn Host<S, K, P>>) -> Self {
        Self {
            host,
            route: Route::Direct,
        }
    }

    /// Name of the owning reactor.
    pub fn name(&self) -> &str {
        self.host.name()
    }

    pub fn get_state(&self) -> Arc<S> {
        self.host.state()
    }

    pub fn dispatch(&self, action: Action<K, P>) -> Result<()> {
        match self.route {
            Route::Chain => Arc::clone(&self.host).dispatch(action),
            Route::Direct => self.host.commit(action),
        }
    }

    pub fn send(&self, kind: K, payload: P) -> Result<()> {
        self.dispatch(Action::new(kind, payload))
    }

    /// Skip the plugin chain regardless of route. Used by `Next` at the end
    /// of the chain.
    pub(crate) fn commit(&self, action: Action<K, P>) -> Result<()> {
        self.host.commit(action)
    }
}

impl<S, K, P> Clone for Store<S, K, P> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            route: self.route,
        }
    }
}

impl<S, K, P> std::fmt::Debug for Store<S, K, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("reactor", &self.host.name())
            .field("route", &self.route)
            .finish()
    }
}
