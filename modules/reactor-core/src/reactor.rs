//! The reactor: one state value, one reducer map, one plugin-wrapped dispatcher.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, trace};

use crate::action::{Action, ActionKind, Payload, State};
use crate::creators::ActionCreators;
use crate::error::{ReactorError, Result};
use crate::plugin::{Plugin, PluginChain};
use crate::reducer::ReducerMap;
use crate::store::{Host, Store};
use crate::subscription::{SubscriberSet, Subscription};

pub(crate) struct ReactorInner<S, K, P> {
    name: String,
    state: RwLock<Arc<S>>,
    reducers: ReducerMap<S, K, P>,
    subscribers: Arc<SubscriberSet<Arc<S>>>,
    plugins: PluginChain<S, K, P>,
    /// Serializes reduce → install → notify. Re-entrant so a subscriber may
    /// dispatch again on the same thread.
    commit_lock: ReentrantMutex<()>,
    /// Bumped on every notifying commit. Only written under `commit_lock`.
    commits: AtomicU64,
}

impl<S: State, K: ActionKind, P: Payload> ReactorInner<S, K, P> {
    fn current(&self) -> Arc<S> {
        Arc::clone(&self.state.read())
    }

    /// Reduce and install without notifying anyone. `None` when the kind is
    /// not declared by this reactor.
    fn apply(&self, action: &Action<K, P>) -> Result<Option<Arc<S>>> {
        let current = self.current();
        let Some(reduced) = self.reducers.reduce(&current, action) else {
            trace!(reactor = %self.name, action = action.type_name(), "Unrecognized action ignored");
            return Ok(None);
        };

        let next = Arc::new(reduced.map_err(|source| ReactorError::Reducer {
            reactor: self.name.clone(),
            kind: action.type_name(),
            source,
        })?);
        *self.state.write() = Arc::clone(&next);
        Ok(Some(next))
    }

    /// Install state on behalf of a combinator: no plugins, no subscribers.
    pub(crate) fn install(&self, action: &Action<K, P>) -> Result<bool> {
        let _guard = self.commit_lock.lock();
        Ok(self.apply(action)?.is_some())
    }
}

impl<S: State, K: ActionKind, P: Payload> Host<S, K, P> for ReactorInner<S, K, P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> Arc<S> {
        self.current()
    }

    fn dispatch(self: Arc<Self>, action: Action<K, P>) -> Result<()> {
        let store = Store::direct(Arc::clone(&self) as Arc<dyn Host<S, K, P>>);
        self.plugins.run(&store, action)
    }

    fn commit(&self, action: Action<K, P>) -> Result<()> {
        let _guard = self.commit_lock.lock();
        if let Some(next) = self.apply(&action)? {
            let seq = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
            trace!(reactor = %self.name, action = action.type_name(), seq, "State committed");
            // A nested commit from a subscriber has already notified everyone
            // with newer state; the rest of this round would be stale.
            self.subscribers
                .notify(&next, || self.commits.load(Ordering::SeqCst) != seq);
        }
        Ok(())
    }
}

/// An independent state container.
///
/// Cheap to clone; clones share the same state, subscribers and action
/// creators. State is only ever replaced through dispatch.
pub struct Reactor<S, K, P> {
    inner: Arc<ReactorInner<S, K, P>>,
    actions: Arc<ActionCreators<S, K, P>>,
}

impl<S: State, K: ActionKind, P: Payload> Reactor<S, K, P> {
    pub fn builder(
        name: impl Into<String>,
        initial_state: S,
        reducers: ReducerMap<S, K, P>,
    ) -> ReactorBuilder<S, K, P> {
        ReactorBuilder {
            name: name.into(),
            initial_state,
            reducers,
            plugins: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current state. Reflects the most recently completed dispatch.
    pub fn get_state(&self) -> Arc<S> {
        self.inner.current()
    }

    /// Apply a projection to the current state.
    pub fn select<T>(&self, selector: impl FnOnce(&S) -> T) -> T {
        selector(&self.get_state())
    }

    pub fn actions(&self) -> &ActionCreators<S, K, P> {
        &self.actions
    }

    pub fn recognizes(&self, kind: K) -> bool {
        self.inner.reducers.recognizes(kind)
    }

    /// Register a callback invoked with the new state after each committed
    /// dispatch, in registration order.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<S>) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(callback)
    }

    /// Send an action through the plugin chain.
    pub fn dispatch(&self, action: Action<K, P>) -> Result<()> {
        Arc::clone(&self.inner).dispatch(action)
    }

    /// The `{actions, getState}` view given to resolvers.
    pub fn store(&self) -> Store<S, K, P> {
        Store::chained(self.host())
    }

    pub(crate) fn install(&self, action: &Action<K, P>) -> Result<bool> {
        self.inner.install(action)
    }

    pub(crate) fn action_set(&self) -> Arc<ActionCreators<S, K, P>> {
        Arc::clone(&self.actions)
    }

    fn host(&self) -> Arc<dyn Host<S, K, P>> {
        Arc::clone(&self.inner) as Arc<dyn Host<S, K, P>>
    }
}

impl<S, K, P> Clone for Reactor<S, K, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            actions: Arc::clone(&self.actions),
        }
    }
}

impl<S: State, K: ActionKind, P: Payload> fmt::Debug for Reactor<S, K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("name", &self.inner.name)
            .field("state", &self.get_state())
            .field("actions", &self.actions)
            .field("subscribers", &self.inner.subscribers.len())
            .finish()
    }
}

pub struct ReactorBuilder<S, K, P> {
    name: String,
    initial_state: S,
    reducers: ReducerMap<S, K, P>,
    plugins: Vec<Arc<dyn Plugin<S, K, P>>>,
}

impl<S: State, K: ActionKind, P: Payload> ReactorBuilder<S, K, P> {
    /// Append a plugin. Earlier plugins wrap later ones.
    pub fn plugin(mut self, plugin: impl Plugin<S, K, P> + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Arc<dyn Plugin<S, K, P>>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    pub fn build(self) -> Reactor<S, K, P> {
        let plugins = PluginChain::new(self.plugins);
        debug!(
            reactor = %self.name,
            reducers = self.reducers.len(),
            plugins = ?plugins.names(),
            "Reactor created"
        );

        let inner = Arc::new(ReactorInner {
            name: self.name,
            state: RwLock::new(Arc::new(self.initial_state)),
            reducers: self.reducers,
            subscribers: SubscriberSet::new(),
            plugins,
            commit_lock: ReentrantMutex::new(()),
            commits: AtomicU64::new(0),
        });

        let store = Store::chained(Arc::clone(&inner) as Arc<dyn Host<S, K, P>>);
        let actions = Arc::new(ActionCreators::generate(inner.reducers.kinds(), &store));

        Reactor { inner, actions }
    }
}

/// Shorthand for `Reactor::builder(..).plugins(..).build()`.
pub fn create_reactor<S: State, K: ActionKind, P: Payload>(
    name: impl Into<String>,
    initial_state: S,
    reducers: ReducerMap<S, K, P>,
    plugins: Vec<Arc<dyn Plugin<S, K, P>>>,
) -> Reactor<S, K, P> {
    Reactor::builder(name, initial_state, reducers)
        .plugins(plugins)
        .build()
}
