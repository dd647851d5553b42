//! Dispatch interceptors ("plugins") and their composition.

use std::sync::Arc;

use crate::action::{Action, ActionKind};
use crate::error::Result;
use crate::store::Store;

/// Wraps the dispatch pipeline.
///
/// Plugins are composed in declared order around the innermost dispatcher:
/// the first plugin sees the action first on the way in and last on the way
/// out. A plugin continues the chain by calling `next.run(action)`; returning
/// without calling it drops the action.
pub trait Plugin<S, K, P>: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn intercept(
        &self,
        store: &Store<S, K, P>,
        action: Action<K, P>,
        next: Next<'_, S, K, P>,
    ) -> Result<()>;
}

/// The remainder of the chain after the current plugin.
pub struct Next<'a, S, K, P> {
    chain: &'a [Arc<dyn Plugin<S, K, P>>],
    store: &'a Store<S, K, P>,
}

impl<'a, S, K: ActionKind, P> Next<'a, S, K, P> {
    pub fn run(self, action: Action<K, P>) -> Result<()> {
        match self.chain.split_first() {
            Some((plugin, rest)) => plugin.intercept(
                self.store,
                action,
                Next {
                    chain: rest,
                    store: self.store,
                },
            ),
            None => self.store.commit(action),
        }
    }

    /// Plugins still to run after this one.
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }
}

/// Ordered plugin list, fixed at construction.
pub(crate) struct PluginChain<S, K, P> {
    plugins: Vec<Arc<dyn Plugin<S, K, P>>>,
}

impl<S, K: ActionKind, P> PluginChain<S, K, P> {
    pub(crate) fn new(plugins: Vec<Arc<dyn Plugin<S, K, P>>>) -> Self {
        Self { plugins }
    }

    pub(crate) fn run(&self, store: &Store<S, K, P>, action: Action<K, P>) -> Result<()> {
        Next {
            chain: &self.plugins,
            store,
        }
        .run(action)
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }
}

/// Plugin backed by a closure. See `plugin_fn`.
pub struct FnPlugin<F> {
    name: &'static str,
    intercept: F,
}

/// Build a plugin from a closure.
pub fn plugin_fn<S, K, P, F>(name: &'static str, intercept: F) -> Arc<dyn Plugin<S, K, P>>
where
    S: 'static,
    K: ActionKind,
    P: 'static,
    F: Fn(&Store<S, K, P>, Action<K, P>, Next<'_, S, K, P>) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(FnPlugin { name, intercept })
}

impl<S, K, P, F> Plugin<S, K, P> for FnPlugin<F>
where
    F: Fn(&Store<S, K, P>, Action<K, P>, Next<'_, S, K, P>) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn intercept(
        &self,
        store: &Store<S, K, P>,
        action: Action<K, P>,
        next: Next<'_, S, K, P>,
    ) -> Result<()> {
        (self.intercept)(store, action, next)
    }
}
