//! Combined reactors: one composite surface over several independent members.
//!
//! A combined dispatch fans out to every member whose reducer map declares the
//! action kind. Members are driven as storage: their own plugin chains and
//! subscribers are bypassed. Combined subscribers are notified after each
//! member update with a freshly built composite snapshot, so they never see a
//! half-applied dispatch, but may be notified more than once per dispatch when
//! several members share a kind.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, trace, warn};

use crate::action::{Action, ActionKind, Payload, State};
use crate::creators::ActionCreators;
use crate::error::{ReactorError, Result};
use crate::plugin::{Plugin, PluginChain};
use crate::reactor::Reactor;
use crate::store::{Host, Store};
use crate::subscription::{SubscriberSet, Subscription};

const DEFAULT_NAME: &str = "combined";

// ---------------------------------------------------------------------------
// Composite state
// ---------------------------------------------------------------------------

/// A member's state, type-erased for the composite view.
pub trait StateSlice: Any + fmt::Debug + Send + Sync {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + fmt::Debug + Send + Sync> StateSlice for T {
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Snapshot of every member's state at one point in time, in member order.
#[derive(Clone)]
pub struct CombinedState {
    slices: Vec<(String, Arc<dyn StateSlice>)>,
}

impl CombinedState {
    /// Typed access to one member's state. `None` if the name is unknown or
    /// the member holds a different state type.
    pub fn get<S: State>(&self, name: &str) -> Option<Arc<S>> {
        let (_, slice) = self.slices.iter().find(|(n, _)| n == name)?;
        StateSlice::into_any(Arc::clone(slice)).downcast::<S>().ok()
    }

    pub fn slice(&self, name: &str) -> Option<&dyn StateSlice> {
        self.slices
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slice)| slice.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.slices.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl fmt::Debug for CombinedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slices.iter().map(|(n, s)| (n, s)))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Composite actions
// ---------------------------------------------------------------------------

/// A member's action-creator set with its state type erased.
pub trait DynActions<K, P>: Send + Sync {
    fn kinds(&self) -> Vec<K>;

    /// Dispatch through the member's own pipeline. Kinds the member does not
    /// declare are ignored.
    fn send(&self, kind: K, payload: P) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

impl<S: State, K: ActionKind, P: Payload> DynActions<K, P> for ActionCreators<S, K, P> {
    fn kinds(&self) -> Vec<K> {
        ActionCreators::kinds(self).collect()
    }

    fn send(&self, kind: K, payload: P) -> Result<()> {
        match self.get(kind) {
            Some(creator) => creator.send(payload),
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Name → member action-creator set. Action kinds are never renamed or merged
/// across members.
pub struct CombinedActions<K, P> {
    members: Vec<(String, Arc<dyn DynActions<K, P>>)>,
}

impl<K: ActionKind, P: Payload> CombinedActions<K, P> {
    pub fn get(&self, name: &str) -> Option<&dyn DynActions<K, P>> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, actions)| actions.as_ref())
    }

    /// Typed access to one member's action creators.
    pub fn member<S: State>(&self, name: &str) -> Option<&ActionCreators<S, K, P>> {
        self.get(name)?.as_any().downcast_ref()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.members.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<K: ActionKind, P> fmt::Debug for CombinedActions<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.members.iter().map(|(n, a)| {
                let names: Vec<&str> = a.kinds().iter().map(|k| k.name()).collect();
                (n, names)
            }))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

trait Member<K, P>: Send + Sync {
    fn name(&self) -> &str;
    fn recognizes(&self, kind: K) -> bool;
    fn install(&self, action: &Action<K, P>) -> Result<bool>;
    fn slice(&self) -> Arc<dyn StateSlice>;
    fn actions(&self) -> Arc<dyn DynActions<K, P>>;
    fn as_any(&self) -> &dyn Any;
}

impl<S: State, K: ActionKind, P: Payload> Member<K, P> for Reactor<S, K, P> {
    fn name(&self) -> &str {
        Reactor::name(self)
    }

    fn recognizes(&self, kind: K) -> bool {
        Reactor::recognizes(self, kind)
    }

    fn install(&self, action: &Action<K, P>) -> Result<bool> {
        Reactor::install(self, action)
    }

    fn slice(&self) -> Arc<dyn StateSlice> {
        self.get_state()
    }

    fn actions(&self) -> Arc<dyn DynActions<K, P>> {
        self.action_set()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A reactor about to join a combinator. Built with `Reactor::into`.
pub struct MemberHandle<K, P> {
    member: Arc<dyn Member<K, P>>,
}

impl<S: State, K: ActionKind, P: Payload> From<Reactor<S, K, P>> for MemberHandle<K, P> {
    fn from(reactor: Reactor<S, K, P>) -> Self {
        Self {
            member: Arc::new(reactor),
        }
    }
}

impl<S: State, K: ActionKind, P: Payload> From<&Reactor<S, K, P>> for MemberHandle<K, P> {
    fn from(reactor: &Reactor<S, K, P>) -> Self {
        reactor.clone().into()
    }
}

// ---------------------------------------------------------------------------
// Combined reactor
// ---------------------------------------------------------------------------

struct CombinedInner<K, P> {
    name: String,
    members: Vec<Arc<dyn Member<K, P>>>,
    subscribers: Arc<SubscriberSet<Arc<CombinedState>>>,
    plugins: PluginChain<CombinedState, K, P>,
    commit_lock: ReentrantMutex<()>,
    /// Bumped on every member update made through this combinator.
    commits: AtomicU64,
}

impl<K: ActionKind, P: Payload> CombinedInner<K, P> {
    fn snapshot(&self) -> CombinedState {
        CombinedState {
            slices: self
                .members
                .iter()
                .map(|m| (m.name().to_string(), m.slice()))
                .collect(),
        }
    }
}

impl<K: ActionKind, P: Payload> Host<CombinedState, K, P> for CombinedInner<K, P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> Arc<CombinedState> {
        Arc::new(self.snapshot())
    }

    fn dispatch(self: Arc<Self>, action: Action<K, P>) -> Result<()> {
        let store = Store::direct(Arc::clone(&self) as Arc<dyn Host<CombinedState, K, P>>);
        self.plugins.run(&store, action)
    }

    fn commit(&self, action: Action<K, P>) -> Result<()> {
        let _guard = self.commit_lock.lock();
        let mut responded = 0usize;

        for member in &self.members {
            if !member.recognizes(action.kind) {
                continue;
            }
            // Updates already installed on earlier members are kept.
            if let Err(e) = member.install(&action) {
                warn!(
                    combined = %self.name,
                    member = member.name(),
                    action = action.type_name(),
                    applied = responded,
                    "Member reducer failed mid fan-out"
                );
                return Err(e);
            }
            responded += 1;
            let seq = self.commits.fetch_add(1, Ordering::SeqCst) + 1;
            let snapshot = Arc::new(self.snapshot());
            // Stop once a nested combined dispatch has delivered a newer
            // snapshot; the fan-out itself still runs to completion.
            self.subscribers
                .notify(&snapshot, || self.commits.load(Ordering::SeqCst) != seq);
        }

        if responded == 0 {
            trace!(combined = %self.name, action = action.type_name(), "No member recognized action");
        }
        Ok(())
    }
}

/// Aggregate of named reactors with one composite state/action surface.
///
/// The member set is fixed at construction. Cheap to clone.
pub struct CombinedReactor<K, P> {
    inner: Arc<CombinedInner<K, P>>,
    actions: Arc<CombinedActions<K, P>>,
}

impl<K: ActionKind, P: Payload> CombinedReactor<K, P> {
    pub fn builder() -> CombinedReactorBuilder<K, P> {
        CombinedReactorBuilder {
            name: DEFAULT_NAME.to_string(),
            members: Vec::new(),
            plugins: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Fresh composite snapshot, built from each member on every call.
    pub fn get_state(&self) -> CombinedState {
        self.inner.snapshot()
    }

    pub fn select<T>(&self, selector: impl FnOnce(&CombinedState) -> T) -> T {
        selector(&self.get_state())
    }

    pub fn actions(&self) -> &CombinedActions<K, P> {
        &self.actions
    }

    /// The member reactor under `name`, if it holds state of type `S`.
    pub fn member<S: State>(&self, name: &str) -> Option<Reactor<S, K, P>> {
        self.inner
            .members
            .iter()
            .find(|m| m.name() == name)?
            .as_any()
            .downcast_ref::<Reactor<S, K, P>>()
            .cloned()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Arc<CombinedState>) + Send + Sync + 'static,
    {
        self.inner.subscribers.subscribe(callback)
    }

    /// Send an action through the combinator's plugin chain and fan it out.
    ///
    /// If a member reducer fails, members updated before it keep their new
    /// state and the error is returned.
    pub fn dispatch(&self, action: Action<K, P>) -> Result<()> {
        Arc::clone(&self.inner).dispatch(action)
    }

    pub fn send(&self, kind: K, payload: P) -> Result<()> {
        self.dispatch(Action::new(kind, payload))
    }

    pub fn store(&self) -> Store<CombinedState, K, P> {
        Store::chained(Arc::clone(&self.inner) as Arc<dyn Host<CombinedState, K, P>>)
    }
}

impl<K, P> Clone for CombinedReactor<K, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            actions: Arc::clone(&self.actions),
        }
    }
}

impl<K: ActionKind, P: Payload> fmt::Debug for CombinedReactor<K, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedReactor")
            .field("name", &self.inner.name)
            .field("state", &self.get_state())
            .field("actions", &self.actions)
            .finish()
    }
}

pub struct CombinedReactorBuilder<K, P> {
    name: String,
    members: Vec<MemberHandle<K, P>>,
    plugins: Vec<Arc<dyn Plugin<CombinedState, K, P>>>,
}

impl<K: ActionKind, P: Payload> CombinedReactorBuilder<K, P> {
    /// Name reported to plugins and logs. Defaults to `"combined"`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add a member under its reactor name.
    pub fn member(mut self, reactor: impl Into<MemberHandle<K, P>>) -> Self {
        self.members.push(reactor.into());
        self
    }

    pub fn plugin(mut self, plugin: impl Plugin<CombinedState, K, P> + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn plugins(
        mut self,
        plugins: impl IntoIterator<Item = Arc<dyn Plugin<CombinedState, K, P>>>,
    ) -> Self {
        self.plugins.extend(plugins);
        self
    }

    pub fn build(self) -> Result<CombinedReactor<K, P>> {
        let mut members: Vec<Arc<dyn Member<K, P>>> = Vec::with_capacity(self.members.len());
        for handle in self.members {
            if members.iter().any(|m| m.name() == handle.member.name()) {
                return Err(ReactorError::DuplicateMember {
                    name: handle.member.name().to_string(),
                });
            }
            members.push(handle.member);
        }

        let actions = CombinedActions {
            members: members
                .iter()
                .map(|m| (m.name().to_string(), m.actions()))
                .collect(),
        };
        let plugins = PluginChain::new(self.plugins);

        debug!(
            combined = %self.name,
            members = ?actions.names().collect::<Vec<_>>(),
            plugins = ?plugins.names(),
            "Combined reactor created"
        );

        Ok(CombinedReactor {
            inner: Arc::new(CombinedInner {
                name: self.name,
                members,
                subscribers: SubscriberSet::new(),
                plugins,
                commit_lock: ReentrantMutex::new(()),
                commits: AtomicU64::new(0),
            }),
            actions: Arc::new(actions),
        })
    }
}

/// Members and plugins for `combine_reactors`.
pub struct CombineOptions<K, P> {
    pub reactors: Vec<MemberHandle<K, P>>,
    pub plugins: Vec<Arc<dyn Plugin<CombinedState, K, P>>>,
}

impl<K, P> Default for CombineOptions<K, P> {
    fn default() -> Self {
        Self {
            reactors: Vec::new(),
            plugins: Vec::new(),
        }
    }
}

/// Shorthand for the builder. Fails on duplicate member names.
pub fn combine_reactors<K: ActionKind, P: Payload>(
    options: CombineOptions<K, P>,
) -> Result<CombinedReactor<K, P>> {
    let mut builder = CombinedReactor::builder().plugins(options.plugins);
    for reactor in options.reactors {
        builder = builder.member(reactor);
    }
    builder.build()
}
