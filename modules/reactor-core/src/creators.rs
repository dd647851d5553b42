//! Action creators generated from a reducer map.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::ops::Index;

use crate::action::{Action, ActionKind};
use crate::error::{ReactorError, Result};
use crate::store::Store;

/// Triggers dispatches of one action kind.
///
/// Accepts a literal payload (`send`), a synchronous resolver (`send_with`)
/// or an asynchronous resolver (`resolve`). Each successful call produces
/// exactly one dispatch; a failing resolver produces none.
pub struct ActionCreator<S, K, P> {
    kind: K,
    store: Store<S, K, P>,
}

impl<S, K: ActionKind, P> ActionCreator<S, K, P> {
    pub fn kind(&self) -> K {
        self.kind
    }

    /// Dispatch `payload` immediately.
    pub fn send(&self, payload: P) -> Result<()> {
        self.store.dispatch(Action::new(self.kind, payload))
    }

    /// Compute the payload from the live store, then dispatch it.
    pub fn send_with<F>(&self, resolver: F) -> Result<()>
    where
        F: FnOnce(&Store<S, K, P>) -> anyhow::Result<P>,
    {
        let payload = resolver(&self.store).map_err(|source| self.resolver_failed(source))?;
        self.send(payload)
    }

    /// Await the payload, then dispatch it.
    ///
    /// The reactor stays responsive while the resolver is pending; other
    /// dispatches may land before this one.
    pub async fn resolve<F, Fut>(&self, resolver: F) -> Result<()>
    where
        F: FnOnce(Store<S, K, P>) -> Fut,
        Fut: Future<Output = anyhow::Result<P>>,
    {
        let payload = resolver(self.store.clone())
            .await
            .map_err(|source| self.resolver_failed(source))?;
        self.send(payload)
    }

    fn resolver_failed(&self, source: anyhow::Error) -> ReactorError {
        ReactorError::Resolver {
            kind: self.kind.name(),
            source,
        }
    }
}

impl<S, K: Copy, P> Clone for ActionCreator<S, K, P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: self.store.clone(),
        }
    }
}

impl<S, K: ActionKind, P> fmt::Debug for ActionCreator<S, K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCreator")
            .field("kind", &self.kind.name())
            .field("reactor", &self.store.name())
            .finish()
    }
}

/// One action creator per declared action kind, fixed at construction.
///
/// `actions[kind]` panics when `kind` has no reducer. Use `get(kind)` where
/// the kind may be undeclared:
///
/// ```ignore
/// if let Some(creator) = reactor.actions().get(kind) {
///     creator.send(payload)?;
/// }
/// ```
pub struct ActionCreators<S, K, P> {
    creators: BTreeMap<K, ActionCreator<S, K, P>>,
}

impl<S, K: ActionKind, P> ActionCreators<S, K, P> {
    pub(crate) fn generate(kinds: impl IntoIterator<Item = K>, store: &Store<S, K, P>) -> Self {
        let mut creators = BTreeMap::new();
        for kind in kinds {
            creators.insert(
                kind,
                ActionCreator {
                    kind,
                    store: store.clone(),
                },
            );
        }
        Self { creators }
    }

    /// Non-panicking lookup; `None` when `kind` has no reducer.
    pub fn get(&self, kind: K) -> Option<&ActionCreator<S, K, P>> {
        self.creators.get(&kind)
    }

    pub fn contains(&self, kind: K) -> bool {
        self.creators.contains_key(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = K> + '_ {
        self.creators.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionCreator<S, K, P>> + '_ {
        self.creators.values()
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl<S, K: ActionKind, P> Index<K> for ActionCreators<S, K, P> {
    type Output = ActionCreator<S, K, P>;

    /// Panics if `kind` has no reducer in this reactor.
    fn index(&self, kind: K) -> &Self::Output {
        match self.creators.get(&kind) {
            Some(creator) => creator,
            None => panic!("no action creator for `{}`", kind.name()),
        }
    }
}

impl<S, K: ActionKind, P> fmt::Debug for ActionCreators<S, K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.creators.keys().map(|k| k.name()))
            .finish()
    }
}
