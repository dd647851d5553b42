//! Reducer maps: action kind → pure state transition.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::action::{Action, ActionKind};
use crate::error::{ReactorError, Result};

type ReducerFn<S, P> = Arc<dyn Fn(&S, &P) -> anyhow::Result<S> + Send + Sync>;

/// Pure state updates keyed by action kind. No I/O, no side effects.
///
/// Built once through `ReducerMap::builder()` and immutable afterwards. The
/// key set drives action-creator generation.
pub struct ReducerMap<S, K, P> {
    reducers: BTreeMap<K, ReducerFn<S, P>>,
}

impl<S, K: ActionKind, P> ReducerMap<S, K, P> {
    pub fn builder() -> ReducerMapBuilder<S, K, P> {
        ReducerMapBuilder {
            entries: Vec::new(),
        }
    }

    /// Declared action kinds, in `Ord` order.
    pub fn kinds(&self) -> impl Iterator<Item = K> + '_ {
        self.reducers.keys().copied()
    }

    pub fn recognizes(&self, kind: K) -> bool {
        self.reducers.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }

    /// Run the reducer for `action.kind`. `None` when the kind is not declared.
    pub(crate) fn reduce(&self, state: &S, action: &Action<K, P>) -> Option<anyhow::Result<S>> {
        self.reducers
            .get(&action.kind)
            .map(|reducer| reducer(state, &action.payload))
    }
}

impl<S, K: Clone, P> Clone for ReducerMap<S, K, P> {
    fn clone(&self) -> Self {
        Self {
            reducers: self.reducers.clone(),
        }
    }
}

impl<S, K: ActionKind, P> fmt::Debug for ReducerMap<S, K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.reducers.keys().map(|k| k.name()))
            .finish()
    }
}

/// Collects reducers before they are frozen into a `ReducerMap`.
pub struct ReducerMapBuilder<S, K, P> {
    entries: Vec<(K, ReducerFn<S, P>)>,
}

impl<S, K: ActionKind, P> ReducerMapBuilder<S, K, P> {
    /// Register an infallible reducer.
    pub fn on<F>(self, kind: K, reducer: F) -> Self
    where
        F: Fn(&S, &P) -> S + Send + Sync + 'static,
    {
        self.try_on(kind, move |state, payload| Ok(reducer(state, payload)))
    }

    /// Register a reducer that may fail. A failure leaves state untouched and
    /// surfaces as `ReactorError::Reducer` from the dispatch call.
    pub fn try_on<F>(mut self, kind: K, reducer: F) -> Self
    where
        F: Fn(&S, &P) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        self.entries.push((kind, Arc::new(reducer)));
        self
    }

    pub fn build(self) -> Result<ReducerMap<S, K, P>> {
        let mut reducers = BTreeMap::new();
        for (kind, reducer) in self.entries {
            if reducers.insert(kind, reducer).is_some() {
                return Err(ReactorError::DuplicateReducer { kind: kind.name() });
            }
        }
        Ok(ReducerMap { reducers })
    }
}
